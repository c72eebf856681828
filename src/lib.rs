pub mod app;
pub mod crypto;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{AppError, DatabaseService, LogDelivery, OtpDelivery, OtpService};
pub use infra::Config;
pub use storage::otp::{MemoryOtpStore, OtpStore, PostgresOtpStore};
pub use transport::http::{create_router, ApiDoc, AppState};
