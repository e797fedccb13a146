//! Failures surfaced to the embedding interface

use std::error::Error as StdError;

use thiserror::Error;

/// An access attempt did not end with an accessible resource
///
/// The `Display` text of every variant is suitable for showing to the user
/// as-is.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The access service window could not be opened
    #[error("The sign-in window was blocked. Please allow pop-ups for this site and try again.")]
    PopupBlocked,
    /// No answer arrived within the wait bound
    #[error("Sign-in timed out. Please try again.")]
    TimedOut,
    /// The access service ended the attempt without a credential
    #[error("Access was not granted: {reason}")]
    Declined {
        /// The reason posted by the service window
        reason: String,
    },
    /// The user closed the access service window before it answered
    #[error("The sign-in window was closed before access was granted.")]
    WindowClosed,
    /// The challenge offered no access service this client can use
    #[error("This resource cannot be accessed from here.")]
    NoAccessService,
    /// A credential was collected, but the resource still requires one
    #[error("Access is still denied after signing in.")]
    StillDenied,
    /// A correlation identifier could not be generated
    #[error("Unable to start signing in. Please try again.")]
    Unavailable(#[from] iiif_auth::error::RandomnessUnavailable),
    /// The probe service could not be reached or answered unusably
    #[error("Unable to check access to this resource.")]
    Probe(#[from] ProbeError),
}

/// A probe request failed
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The request could not be completed
    #[error("probe request failed")]
    Request(#[source] Box<dyn StdError + Send + Sync + 'static>),
    /// The probe service answered with a status other than `200` or `401`
    #[error("probe service answered with unexpected status {0}")]
    UnexpectedStatus(u16),
    /// The body was not a probe result
    #[error("probe service returned an unreadable result")]
    Malformed(#[source] Box<dyn StdError + Send + Sync + 'static>),
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for ProbeError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Malformed(error.into())
        } else {
            Self::Request(error.into())
        }
    }
}
