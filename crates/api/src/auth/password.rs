//! Account password storage.
//!
//! Stored values are Argon2id PHC strings, so the salt and cost parameters
//! travel with each hash and older rows keep verifying after a parameter bump.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Hash a signup or reset password for the `users.password_hash` column.
pub fn hash_password(plain: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|phc| phc.to_string())
}

/// Check a login attempt against a stored hash.
///
/// A mismatch is `Ok(false)`; only an unreadable stored hash is an error.
pub fn verify_password(candidate: &str, stored: &str) -> Result<bool, HashError> {
    let phc = PasswordHash::new(stored)?;
    match Argon2::default().verify_password(candidate.as_bytes(), &phc) {
        Ok(()) => Ok(true),
        Err(HashError::Password) => Ok(false),
        Err(other) => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_password_verifies_after_hashing() {
        let stored = hash_password("pass1234").unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(verify_password("pass1234", &stored).unwrap());
    }

    #[test]
    fn login_with_other_password_is_rejected() {
        let stored = hash_password("pass1234").unwrap();
        assert!(!verify_password("pass12345", &stored).unwrap());
    }

    #[test]
    fn two_accounts_with_same_password_store_different_hashes() {
        assert_ne!(
            hash_password("pass1234").unwrap(),
            hash_password("pass1234").unwrap()
        );
    }

    #[test]
    fn corrupt_stored_hash_surfaces_as_error() {
        assert!(verify_password("pass1234", "plaintext-by-mistake").is_err());
    }
}
