//! Password hashing and credential validation.
//!
//! Passwords are stored as `salt$digest` where the digest is SHA-256 over
//! the hex salt concatenated with the plaintext. The per-user random salt is
//! a deliberate deviation from legacy unsalted storage; old credentials do
//! not verify and must be re-registered.

use rand::RngCore;
use sha2::{Digest, Sha256};

const SALT_LEN: usize = 16;

/// Minimum and maximum username length in characters.
pub const USERNAME_MIN: usize = 3;
/// See [`USERNAME_MIN`].
pub const USERNAME_MAX: usize = 20;

/// Minimum password length in characters.
pub const PASSWORD_MIN: usize = 8;

/// Hashes a plaintext password with a fresh random salt.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt_hex = hex::encode(salt);
    let digest = salted_digest(&salt_hex, password);
    format!("{salt_hex}${digest}")
}

/// Verifies a plaintext password against a stored `salt$digest` value.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    stored
        .split_once('$')
        .is_some_and(|(salt_hex, digest)| salted_digest(salt_hex, password) == digest)
}

fn salted_digest(salt_hex: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt_hex.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Validates a username: 3–20 characters, letters (any script), digits, or
/// underscore.
///
/// # Errors
///
/// Returns a human-readable rejection reason suitable for an error response.
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err("Username must be 3-20 characters long");
    }
    if !username.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err("Username may only contain letters, digits, and underscore");
    }
    Ok(())
}

/// Validates a password: at least 8 characters, not purely alphabetic, not
/// purely numeric, and at least one character outside letters and digits.
///
/// # Errors
///
/// Returns a human-readable rejection reason suitable for an error response.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < PASSWORD_MIN {
        return Err("Password must be at least 8 characters long");
    }
    if password.chars().all(char::is_alphabetic) {
        return Err("Password cannot be purely alphabetic");
    }
    if password.chars().all(char::is_numeric) {
        return Err("Password cannot be purely numeric");
    }
    if password.chars().all(char::is_alphanumeric) {
        return Err("Password must contain at least one special character");
    }
    Ok(())
}
