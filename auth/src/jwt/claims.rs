use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Registered claims carried by every issued token.
///
/// Strongly typed: a token missing any of these fields fails deserialization
/// during verification instead of surfacing `None`s to callers. The audience
/// is serialized as a single-element list on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user identifier)
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: Vec<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Build claims for a token issued now.
    ///
    /// `exp` is always `iat` plus the given lifetime.
    pub fn new(
        subject: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        lifetime: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: subject.into(),
            iss: issuer.into(),
            aud: vec![audience.into()],
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }
}
