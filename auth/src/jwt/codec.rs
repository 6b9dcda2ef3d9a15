use chrono::Duration;
use ed25519_dalek::pkcs8::EncodePrivateKey;
use ed25519_dalek::SigningKey;
use ed25519_dalek::PUBLIC_KEY_LENGTH;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::TokenError;

/// Length in bytes of the Ed25519 seed a codec is derived from.
pub const SEED_LENGTH: usize = 32;

/// Signs and verifies bearer tokens with a seed-derived Ed25519 keypair.
///
/// The same seed always yields the same keypair, so any number of codecs
/// built from one seed interoperate. Verification is pinned to EdDSA: tokens
/// whose header names any other algorithm (including `none`) are rejected,
/// and collaborators holding only the public key can verify without signing
/// capability.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    public_key: [u8; PUBLIC_KEY_LENGTH],
    issuer: String,
    audience: String,
    algorithm: Algorithm,
    validation: Validation,
}

impl TokenCodec {
    /// Derive a codec from a fixed-length seed.
    ///
    /// # Arguments
    /// * `seed` - 32-byte Ed25519 seed
    /// * `issuer` - Value of the `iss` claim on issued tokens
    /// * `audience` - Value of the `aud` claim on issued tokens
    ///
    /// # Errors
    /// * `InvalidKey` - The derived key could not be encoded as PKCS#8
    pub fn new(
        seed: &[u8; SEED_LENGTH],
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Result<Self, TokenError> {
        let signing_key = SigningKey::from_bytes(seed);
        let document = signing_key
            .to_pkcs8_der()
            .map_err(|e| TokenError::InvalidKey(e.to_string()))?;
        let public_key = signing_key.verifying_key().to_bytes();

        let issuer = issuer.into();
        let audience = audience.into();
        let algorithm = Algorithm::EdDSA;

        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[&issuer]);
        validation.set_audience(&[&audience]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        // Signer and verifier share a clock; no skew allowance
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_ed_der(document.as_bytes()),
            decoding_key: DecodingKey::from_ed_der(&public_key),
            public_key,
            issuer,
            audience,
            algorithm,
            validation,
        })
    }

    /// Sign a token for `subject`, valid for `lifetime` from now.
    ///
    /// # Errors
    /// * `SigningFailed` - The signing operation failed
    pub fn sign(&self, subject: &str, lifetime: Duration) -> Result<String, TokenError> {
        let claims = Claims::new(subject, &self.issuer, &self.audience, lifetime);
        let header = Header::new(self.algorithm);

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| TokenError::SigningFailed(e.to_string()))
    }

    /// Verify a token and return its decoded claims.
    ///
    /// Checks, in order: wire format and header algorithm, signature against
    /// the public key, required claims (`exp` is mandatory; a token without
    /// it is malformed, never non-expiring), issuer and audience equality,
    /// and expiry against the current time.
    ///
    /// # Errors
    /// * `Expired` - Token is past its `exp` claim
    /// * `BadSignature` - Signature invalid or header algorithm differs
    /// * `AudienceMismatch` / `IssuerMismatch` - Claim equality failed
    /// * `Malformed` - Anything else (bad structure, missing claims)
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        TokenError::BadSignature
                    }
                    ErrorKind::InvalidAudience => TokenError::AudienceMismatch,
                    ErrorKind::InvalidIssuer => TokenError::IssuerMismatch,
                    _ => TokenError::Malformed(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }

    /// Raw Ed25519 public key bytes, for external verifiers.
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.public_key
    }

    /// The signing algorithm identifier.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}
