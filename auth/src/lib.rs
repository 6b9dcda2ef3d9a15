//! Authentication utilities library
//!
//! Provides the cryptographic building blocks for the local identity
//! provider:
//! - Password hashing (Argon2id, configurable work factor)
//! - Signed bearer tokens (EdDSA/Ed25519 via JWT)
//!
//! The identity service composes these into its credential lifecycle
//! operations; nothing in this crate touches persistence or transport.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Signed Tokens
//! ```
//! use auth::TokenCodec;
//! use chrono::Duration;
//!
//! let codec = TokenCodec::new(b"an example seed of exactly 32 by", "issuer", "audience").unwrap();
//! let token = codec.sign("user123", Duration::minutes(15)).unwrap();
//! let claims = codec.verify(&token).unwrap();
//! assert_eq!(claims.sub, "user123");
//! ```

pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use jwt::Claims;
pub use jwt::TokenCodec;
pub use jwt::TokenError;
pub use password::PasswordError;
pub use password::PasswordHasher;
