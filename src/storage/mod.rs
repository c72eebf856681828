pub mod otp;
pub mod repo;
pub mod schema;

pub use schema::ensure_schema;
