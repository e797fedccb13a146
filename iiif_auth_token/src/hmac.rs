//! HMAC signing secret and algorithm

use std::fmt;

use ring::rand::SecureRandom;
use serde::{Deserialize, Serialize};

use crate::error;

/// The development fallback used when no secret is configured
///
/// Anything signed with this secret can be forged by anyone who has read the
/// source, so deployments must supply their own.
pub const INSECURE_DEVELOPMENT_SECRET: &str = "your-secret-key-change-in-production";

/// A process-wide symmetric signing secret
///
/// Read-only after startup. The secret bytes never appear in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
#[must_use]
pub struct SigningSecret {
    secret: Vec<u8>,
    insecure: bool,
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.insecure {
            f.write_str("SigningSecret { INSECURE DEVELOPMENT DEFAULT }")
        } else {
            f.write_str("SigningSecret { secret }")
        }
    }
}

impl SigningSecret {
    /// A secret from raw bytes
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        let secret = secret.into();
        let insecure = secret == INSECURE_DEVELOPMENT_SECRET.as_bytes();
        Self { secret, insecure }
    }

    /// The well-known development secret
    ///
    /// Callers should report a deployment misconfiguration when they fall
    /// back to this.
    pub fn insecure_development_default() -> Self {
        Self {
            secret: INSECURE_DEVELOPMENT_SECRET.as_bytes().to_vec(),
            insecure: true,
        }
    }

    /// Uses `configured` when present and non-blank, otherwise the development default
    pub fn from_configured(configured: Option<&str>) -> Self {
        match configured.map(str::trim) {
            Some(s) if !s.is_empty() => Self::new(s.as_bytes()),
            _ => {
                tracing::warn!(
                    "no signing secret configured; falling back to the insecure development default"
                );
                Self::insecure_development_default()
            }
        }
    }

    /// Generates a new random secret sized for the algorithm
    ///
    /// # Errors
    ///
    /// Unable to generate a new secret.
    pub fn generate(alg: Algorithm) -> Result<Self, error::Unexpected> {
        Self::generate_with_rng(alg, &ring::rand::SystemRandom::new())
    }

    /// Generates a new random secret using the provided source of randomness
    ///
    /// # Errors
    ///
    /// Unable to generate a new secret from the provided RNG.
    pub fn generate_with_rng(
        alg: Algorithm,
        rng: &dyn SecureRandom,
    ) -> Result<Self, error::Unexpected> {
        let mut secret = vec![0; alg.recommended_key_size()];

        rng.fill(&mut secret)
            .map_err(|_| error::unexpected("random number generator failure"))?;

        Ok(Self {
            secret,
            insecure: false,
        })
    }

    /// Whether this is the well-known development secret
    #[must_use]
    pub fn is_insecure(&self) -> bool {
        self.insecure
    }

    pub(crate) fn sign(&self, alg: Algorithm, data: &[u8]) -> Vec<u8> {
        let key = ring::hmac::Key::new(alg.into_ring_algorithm(), &self.secret);
        ring::hmac::sign(&key, data).as_ref().to_owned()
    }

    pub(crate) fn verify(
        &self,
        alg: Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), error::SignatureMismatch> {
        let key = ring::hmac::Key::new(alg.into_ring_algorithm(), &self.secret);
        ring::hmac::verify(&key, data, signature).map_err(|_| error::signature_mismatch())
    }
}

/// HMAC signing algorithms
///
/// The algorithm identifier is written into every token header. Only the
/// codec's configured algorithm is accepted on verification.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[allow(clippy::upper_case_acronyms)]
#[non_exhaustive]
pub enum Algorithm {
    /// HMAC using SHA-256
    #[default]
    HS256,
    /// HMAC using SHA-384
    HS384,
    /// HMAC using SHA-512
    HS512,
}

impl Algorithm {
    #[must_use]
    fn recommended_key_size(self) -> usize {
        match self {
            Self::HS256 => 256 / 8,
            Self::HS384 => 384 / 8,
            Self::HS512 => 512 / 8,
        }
    }

    fn into_ring_algorithm(self) -> ring::hmac::Algorithm {
        match self {
            Self::HS256 => ring::hmac::HMAC_SHA256,
            Self::HS384 => ring::hmac::HMAC_SHA384,
            Self::HS512 => ring::hmac::HMAC_SHA512,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
        };

        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_configuration_falls_back_to_insecure_default() {
        assert!(SigningSecret::from_configured(None).is_insecure());
        assert!(SigningSecret::from_configured(Some("   ")).is_insecure());
        assert!(!SigningSecret::from_configured(Some("s3cr3t")).is_insecure());
    }

    #[test]
    fn configuring_the_well_known_secret_is_still_flagged() {
        assert!(SigningSecret::new(INSECURE_DEVELOPMENT_SECRET).is_insecure());
    }

    #[test]
    fn debug_output_never_contains_secret_bytes() {
        let secret = SigningSecret::new("hunter2");
        assert!(!format!("{secret:?}").contains("hunter2"));
    }

    #[test]
    fn signature_verifies_only_under_the_same_secret() {
        let a = SigningSecret::new("alpha");
        let b = SigningSecret::new("bravo");
        let sig = a.sign(Algorithm::HS256, b"payload");

        assert!(a.verify(Algorithm::HS256, b"payload", &sig).is_ok());
        assert!(b.verify(Algorithm::HS256, b"payload", &sig).is_err());
        assert!(a.verify(Algorithm::HS256, b"payloaD", &sig).is_err());
    }

    #[test]
    fn generated_secret_has_recommended_length() -> Result<(), error::Unexpected> {
        let secret = SigningSecret::generate(Algorithm::HS512)?;
        assert_eq!(secret.secret.len(), 64);
        Ok(())
    }
}
