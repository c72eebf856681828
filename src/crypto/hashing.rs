// Hashing helpers for identity lookups and admin credentials.

use sha2::{Digest, Sha256};

/// Hashes a raw national ID with the configured salt into a hex digest.
///
/// The digest is the only form of the ID that is ever stored or used as a lookup key.
pub fn hash_identity(salt: &str, raw_identity: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(raw_identity.trim().as_bytes());
    hex::encode(hasher.finalize())
}

/// Unsalted SHA-256 hex digest used for admin passwords in the `admins` table.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Identity string used for the `users` row backing an admin account.
pub fn admin_identity(username: &str) -> String {
    format!("ADMIN--{}", username)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_hash_depends_on_salt() {
        let a = hash_identity("salt-a", "ABC123456789");
        let b = hash_identity("salt-b", "ABC123456789");
        assert_ne!(a, b);
        assert_eq!(a, hash_identity("salt-a", " ABC123456789 "));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn password_hash_is_plain_sha256() {
        assert_eq!(
            hash_password("admin123"),
            "240be518fabd2724ddb6f04eeb1da5967448d7e831c08c8fa822809f74c720a9"
        );
    }
}
