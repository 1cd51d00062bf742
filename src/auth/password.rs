//! Salted one-way password comparison.
//!
//! Stored hashes are Argon2 PHC strings. Records migrated from older stores may
//! still carry bcrypt hashes (`$2a$`, `$2b$`, `$2y$`); those are verified with
//! bcrypt.

use crate::utils::{ApiError, ApiResult};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

/// Compare `plaintext` against `stored_hash`.
///
/// Returns `Ok(false)` on a mismatch and an `Internal` error if the hash
/// cannot be parsed or the comparison itself fails.
pub fn verify_password(plaintext: &str, stored_hash: &str) -> ApiResult<bool> {
    if stored_hash.starts_with("$2") {
        return bcrypt::verify(plaintext, stored_hash).map_err(|e| {
            tracing::error!("bcrypt comparison failed: {}", e);
            ApiError::internal("Password comparison failed")
        });
    }

    let parsed_hash = PasswordHash::new(stored_hash).map_err(|e| {
        tracing::error!("Malformed password hash: {}", e);
        ApiError::internal("Malformed password hash")
    })?;

    match Argon2::default().verify_password(plaintext.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => {
            tracing::error!("Argon2 comparison failed: {}", e);
            Err(ApiError::internal("Password comparison failed"))
        }
    }
}

/// Hash password for storage
pub fn hash_password(plaintext: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|_| ApiError::internal("Failed to hash password"))?;
    Ok(password_hash.to_string())
}
