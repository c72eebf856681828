pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryOtpStore;
pub use postgres::PostgresOtpStore;
pub use store::{OtpEntry, OtpStore};
