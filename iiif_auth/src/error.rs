//! Protocol errors

#![allow(missing_copy_implementations)]

use thiserror::Error;

/// The declared value is not a usable `http(s)` origin
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("'{declared}' is not a valid origin")]
pub struct InvalidOrigin {
    declared: String,
}

impl InvalidOrigin {
    /// The value that was rejected
    pub fn declared(&self) -> &str {
        &self.declared
    }
}

impl From<std::convert::Infallible> for InvalidOrigin {
    fn from(x: std::convert::Infallible) -> Self {
        match x {}
    }
}

pub(crate) fn invalid_origin(declared: impl Into<String>) -> InvalidOrigin {
    InvalidOrigin {
        declared: declared.into(),
    }
}

/// The system random source failed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("random number generator failure")]
pub struct RandomnessUnavailable {
    _p: (),
}

pub(crate) const fn randomness_unavailable() -> RandomnessUnavailable {
    RandomnessUnavailable { _p: () }
}

/// A hand-off arrived without the context needed to deliver a message
///
/// Fatal to the attempt; the client must start again.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum HandshakeError {
    /// No correlation identifier was supplied
    #[error("missing messageId")]
    MissingMessageId,
    /// No caller origin was supplied
    #[error("missing origin")]
    MissingOrigin,
    /// The caller origin could not be parsed
    #[error(transparent)]
    InvalidOrigin(#[from] InvalidOrigin),
}

/// An access service descriptor that a client could not act on
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// An interactive or kiosk service carries no token service
    #[error("access service '{id}' has no token service")]
    MissingTokenService {
        /// The access service identifier
        id: String,
    },
    /// An external service carries a token service
    #[error("external access service '{id}' must not carry a token service")]
    UnexpectedTokenService {
        /// The access service identifier
        id: String,
    },
}
