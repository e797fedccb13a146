//! Token errors
//!
//! These stay inside the process. The public verification boundary,
//! [`TokenCodec::verify`][crate::TokenCodec::verify], collapses all of them
//! into [`Verification::Invalid`][crate::Verification::Invalid].

#![allow(missing_copy_implementations)]

use std::error::Error as StdError;

use thiserror::Error;

/// The token cannot be split into header, payload, and signature sections
#[derive(Clone, Copy, Debug, Error)]
#[error("malformed token")]
pub struct MalformedToken {
    _p: (),
}

pub(crate) const fn malformed_token() -> MalformedToken {
    MalformedToken { _p: () }
}

/// The token header section is malformed
#[derive(Debug, Error)]
#[error("malformed token header")]
pub struct MalformedTokenHeader {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn malformed_token_header(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> MalformedTokenHeader {
    MalformedTokenHeader {
        source: source.into(),
    }
}

/// The token payload section is malformed
#[derive(Debug, Error)]
#[error("malformed token payload")]
pub struct MalformedTokenPayload {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn malformed_token_payload(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> MalformedTokenPayload {
    MalformedTokenPayload {
        source: source.into(),
    }
}

/// The token signature section is malformed
#[derive(Debug, Error)]
#[error("malformed token signature")]
pub struct MalformedTokenSignature {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn malformed_token_signature(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> MalformedTokenSignature {
    MalformedTokenSignature {
        source: source.into(),
    }
}

/// The token names an algorithm this codec does not accept
#[derive(Debug, Error)]
#[error("algorithm '{alg}' is not approved")]
pub struct UnapprovedAlgorithm {
    alg: String,
}

pub(crate) fn unapproved_algorithm(alg: impl Into<String>) -> UnapprovedAlgorithm {
    UnapprovedAlgorithm { alg: alg.into() }
}

/// The signature did not match
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("signature mismatch")]
pub struct SignatureMismatch {
    _p: (),
}

pub(crate) const fn signature_mismatch() -> SignatureMismatch {
    SignatureMismatch { _p: () }
}

/// The token is past its expiry
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("token expired")]
pub struct TokenExpired {
    _p: (),
}

pub(crate) const fn token_expired() -> TokenExpired {
    TokenExpired { _p: () }
}

/// The kiosk pass is not well-formed or is outside its validity window
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("kiosk pass rejected")]
pub struct KioskPassRejected {
    _p: (),
}

pub(crate) const fn kiosk_pass_rejected() -> KioskPassRejected {
    KioskPassRejected { _p: () }
}

/// Unexpected error (possibly a bug)
#[derive(Debug, Error)]
#[error("unexpected error")]
pub struct Unexpected {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn unexpected(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> Unexpected {
    Unexpected {
        source: source.into(),
    }
}

/// An error that occurred while verifying a token
#[derive(Debug, Error)]
pub enum TokenVerifyError {
    /// The token is malformed
    #[error(transparent)]
    Malformed(#[from] MalformedToken),
    /// The token header is malformed
    #[error(transparent)]
    MalformedHeader(#[from] MalformedTokenHeader),
    /// The token payload is malformed
    #[error(transparent)]
    MalformedPayload(#[from] MalformedTokenPayload),
    /// The token signature is malformed
    #[error(transparent)]
    MalformedSignature(#[from] MalformedTokenSignature),
    /// The token names an unapproved algorithm
    #[error(transparent)]
    UnapprovedAlgorithm(#[from] UnapprovedAlgorithm),
    /// The token signature does not match its contents
    #[error(transparent)]
    SignatureMismatch(#[from] SignatureMismatch),
    /// The token has expired
    #[error(transparent)]
    Expired(#[from] TokenExpired),
    /// The kiosk pass was rejected
    #[error(transparent)]
    KioskPass(#[from] KioskPassRejected),
}

/// An error that occurred while issuing a token
#[derive(Debug, Error)]
#[error("unable to issue token")]
pub struct TokenIssueError {
    #[from]
    source: Unexpected,
}
