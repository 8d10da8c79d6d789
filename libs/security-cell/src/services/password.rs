// =====================================================================================
// PASSWORD SECURITY SERVICE - SECURE PASSWORD HANDLING
// =====================================================================================

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use tracing::instrument;

use crate::models::SecurityError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub struct PasswordSecurityService;

impl PasswordSecurityService {
    #[instrument(skip(password))]
    pub fn hash_password(password: &str) -> Result<String, SecurityError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| SecurityError::Hashing(e.to_string()))?;
        Ok(password_hash.to_string())
    }

    #[instrument(skip(password, hash))]
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, SecurityError> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| SecurityError::Hashing(e.to_string()))?;
        let argon2 = Argon2::default();

        match argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(SecurityError::Hashing(e.to_string())),
        }
    }

    pub fn meets_minimum_length(password: &str) -> bool {
        password.chars().count() >= MIN_PASSWORD_LENGTH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = PasswordSecurityService::hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(PasswordSecurityService::verify_password("correct horse", &hash).unwrap());
        assert!(!PasswordSecurityService::verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(PasswordSecurityService::verify_password("x", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_minimum_length() {
        assert!(!PasswordSecurityService::meets_minimum_length("short"));
        assert!(PasswordSecurityService::meets_minimum_length("long enough"));
    }
}
