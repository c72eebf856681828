pub mod auth;
pub mod error;
pub mod router;
pub mod types;
pub mod handlers {
    pub mod activity_logs;
    pub mod admin;
    pub mod appointments;
    pub mod auth;
    pub mod citizen;
    pub mod common;
    pub mod health;
    pub mod mkisan;
    pub mod sp_registration;
}

pub use error::ApiError;
pub use router::{create_router, ApiDoc};
pub use types::AppState;
