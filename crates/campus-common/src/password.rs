//! Password hashing

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use std::sync::OnceLock;

use crate::error::{CampusError, CampusResult};

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Generates a new password hash using argon2.
pub fn hash_password(password: &str) -> CampusResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CampusError::Internal(format!("failed to hash password: {}", e)))
}

/// Uses argon2 to verify the password hash against the provided password.
pub fn verify_password(password_hash: &str, password: &str) -> bool {
    let hash = match PasswordHash::new(password_hash) {
        Ok(hash) => hash,
        Err(err) => {
            tracing::error!("failed to parse password hash: {}", err);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &hash)
        .is_ok()
}

/// Hash verified against when no account matches the login, so unknown
/// emails take as long as wrong passwords
fn absent_account_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password("no-such-account").unwrap_or_default())
}

/// Burns one verification for a login with no matching account; never
/// succeeds
pub fn verify_absent(password: &str) -> bool {
    let _ = verify_password(absent_account_hash(), password);
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "correct horse"));
        assert!(!verify_password(&hash, "battery staple"));
    }

    #[test]
    fn test_absent_account_runs_a_real_verification() {
        assert!(absent_account_hash().starts_with("$argon2"));
        assert!(PasswordHash::new(absent_account_hash()).is_ok());
        assert!(!verify_absent("no-such-account"));
        assert!(!verify_absent("anything"));
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        assert!(!verify_password("not-a-hash", "anything"));
    }
}
