pub mod hashing;
pub mod tokens;

pub use hashing::{admin_identity, hash_identity, hash_password};
pub use tokens::{Claims, TokenIssuer};
