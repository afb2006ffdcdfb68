//! Business rules between the HTTP handlers and the `Repository`.
//!
//! Services take the acting principal explicitly, resolve the target resource first
//! (`NotFound`) and only then consult the `policy` module (`Forbidden`).

pub mod articles;
pub mod auth;
pub mod users;

/// Canonical stored form of an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
