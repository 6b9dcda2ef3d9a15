use thiserror::Error;

/// Error type for token signing and verification.
///
/// Verification failures are a closed set so callers can match on kind:
/// expiry is an expected, recoverable condition, while the other variants
/// indicate tampering or misconfiguration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    #[error("Failed to sign token: {0}")]
    SigningFailed(String),

    #[error("Token is expired")]
    Expired,

    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Token signature is invalid")]
    BadSignature,

    #[error("Token audience does not match")]
    AudienceMismatch,

    #[error("Token issuer does not match")]
    IssuerMismatch,
}
