//! Workflows. Each function runs on the caller's connection, normally a transaction opened
//! by the HTTP handler, so a failure anywhere leaves nothing behind.

pub mod activity_service;
pub mod appointment_service;
pub mod auth_service;
pub mod citizen_service;
pub mod database_service;
pub mod error;
pub mod marketplace_service;
pub mod onboarding_service;
pub mod otp_service;
pub mod registration_service;

pub use database_service::DatabaseService;
pub use error::{AppError, AppResult};
pub use otp_service::{LogDelivery, OtpDelivery, OtpService};
