//! Compact signed tokens
//!
//! Tokens use the JSON Web Token compact layout: three base64url sections
//! separated by `.`.
//!
//! ```text
//! eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJzdWIiOiJ1c2VyIiwiaWF0IjoxMCwiZXhwIjozNjEwfQ.<signature>
//! ```
//!
//! The header names the signing algorithm, the payload carries the subject
//! and the issue and expiry times, and the signature is an HMAC over the first
//! two sections. Nothing in the header or payload should be trusted until the
//! signature has been checked.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use iiif_auth_clock::UnixTime;
use serde::{Deserialize, Serialize};

use crate::{error, AccessToken, AccessTokenRef, Algorithm, SigningSecret, Subject};

/// Token header
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headers {
    /// Signing algorithm
    pub alg: Algorithm,
    /// Token type, always `JWT` when issued here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

impl Headers {
    /// Headers for a token signed with `alg`
    pub fn new(alg: Algorithm) -> Self {
        Self {
            alg,
            typ: Some("JWT".into()),
        }
    }
}

/// Token claims
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The identity the token was issued to
    pub sub: Subject,
    /// Issued at
    pub iat: UnixTime,
    /// Expires; a verifier must reject the token at or after this time
    pub exp: UnixTime,
}

/// A token split into its sections, with the header decoded
///
/// The header is **untrusted** until [`verify_signature`][Self::verify_signature]
/// succeeds.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct Decomposed<'a> {
    header: Headers,
    message: &'a str,
    payload: &'a str,
    signature: Vec<u8>,
}

macro_rules! expect_two {
    ($iter:expr) => {{
        let mut i = $iter;
        match (i.next(), i.next(), i.next()) {
            (Some(first), Some(second), None) => Some((first, second)),
            _ => None,
        }
    }};
}

impl<'a> Decomposed<'a> {
    /// Splits a token into its parts
    ///
    /// # Errors
    ///
    /// Returns an error if the token does not have exactly three sections or
    /// if the header or signature cannot be decoded.
    pub fn from_token(token: &'a AccessTokenRef) -> Result<Self, error::TokenVerifyError> {
        let (s_str, message) =
            expect_two!(token.as_str().rsplitn(2, '.')).ok_or_else(error::malformed_token)?;
        let (payload, h_str) =
            expect_two!(message.rsplitn(2, '.')).ok_or_else(error::malformed_token)?;
        let h_raw = URL_SAFE_NO_PAD
            .decode(h_str)
            .map_err(error::malformed_token_header)?;
        let signature = URL_SAFE_NO_PAD
            .decode(s_str)
            .map_err(error::malformed_token_signature)?;
        let header: Headers =
            serde_json::from_slice(&h_raw).map_err(error::malformed_token_header)?;
        Ok(Self {
            header,
            message,
            payload,
            signature,
        })
    }

    /// The untrusted header
    pub fn untrusted_header(&self) -> &Headers {
        &self.header
    }

    /// Checks the signature and decodes the payload
    ///
    /// Only `approved` is accepted as the header algorithm, regardless of
    /// what the token claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the algorithm is not approved, the signature does
    /// not match, or the payload is malformed. Expiry is **not** checked here.
    pub fn verify_signature(
        self,
        secret: &SigningSecret,
        approved: Algorithm,
    ) -> Result<Claims, error::TokenVerifyError> {
        if self.header.alg != approved {
            return Err(error::unapproved_algorithm(self.header.alg.to_string()).into());
        }

        secret.verify(approved, self.message.as_bytes(), &self.signature)?;

        let p_raw = URL_SAFE_NO_PAD
            .decode(self.payload)
            .map_err(error::malformed_token_payload)?;

        let claims = serde_json::from_slice(&p_raw).map_err(error::malformed_token_payload)?;

        Ok(claims)
    }
}

/// Serializes and signs a token
///
/// # Errors
///
/// Returns an error if the header or claims cannot be serialized.
pub fn encode(
    headers: &Headers,
    claims: &Claims,
    secret: &SigningSecret,
) -> Result<AccessToken, error::Unexpected> {
    let h_raw = serde_json::to_vec(headers).map_err(error::unexpected)?;
    let p_raw = serde_json::to_vec(claims).map_err(error::unexpected)?;

    let mut message = URL_SAFE_NO_PAD.encode(h_raw);
    message.push('.');
    message.push_str(&URL_SAFE_NO_PAD.encode(p_raw));

    let signature = secret.sign(headers.alg, message.as_bytes());

    message.push('.');
    message.push_str(&URL_SAFE_NO_PAD.encode(signature));

    Ok(AccessToken::new(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Headers, Claims, SigningSecret) {
        (
            Headers::new(Algorithm::HS256),
            Claims {
                sub: Subject::from_static("user"),
                iat: UnixTime(10),
                exp: UnixTime(3_610),
            },
            SigningSecret::new("test"),
        )
    }

    #[test]
    fn decomposes_what_it_encodes() -> color_eyre::Result<()> {
        let (headers, claims, secret) = sample();
        let token = encode(&headers, &claims, &secret)?;

        let decomposed = Decomposed::from_token(&token)?;
        assert_eq!(decomposed.untrusted_header(), &headers);
        assert_eq!(decomposed.verify_signature(&secret, Algorithm::HS256)?, claims);
        Ok(())
    }

    #[test]
    fn two_sections_are_malformed() {
        let token = AccessTokenRef::from_str("eyJhbGciOiJIUzI1NiJ9.e30");
        assert!(matches!(
            Decomposed::from_token(token),
            Err(error::TokenVerifyError::Malformed(_))
        ));
    }

    #[test]
    fn four_sections_are_malformed() {
        let token = AccessTokenRef::from_str("a.b.c.d");
        assert!(Decomposed::from_token(token).is_err());
    }

    #[test]
    fn tampered_payload_fails_signature() -> color_eyre::Result<()> {
        let (headers, claims, secret) = sample();
        let token = encode(&headers, &claims, &secret)?;

        let forged_claims = Claims {
            sub: Subject::from_static("admin"),
            ..claims
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims)?);
        let mut parts: Vec<&str> = token.as_str().split('.').collect();
        parts[1] = &forged_payload;
        let forged = AccessToken::new(parts.join("."));

        let result = Decomposed::from_token(&forged)?.verify_signature(&secret, Algorithm::HS256);
        assert!(matches!(
            result,
            Err(error::TokenVerifyError::SignatureMismatch(_))
        ));
        Ok(())
    }

    #[test]
    fn unapproved_algorithm_is_rejected_before_signature_check() -> color_eyre::Result<()> {
        let (_, claims, secret) = sample();
        let token = encode(&Headers::new(Algorithm::HS512), &claims, &secret)?;

        let result = Decomposed::from_token(&token)?.verify_signature(&secret, Algorithm::HS256);
        assert!(matches!(
            result,
            Err(error::TokenVerifyError::UnapprovedAlgorithm(_))
        ));
        Ok(())
    }
}
