//! Bearer credentials for the IIIF Authentication API 2.0
//!
//! Two kinds of credential are issued to clients and later presented back to
//! protected resources:
//!
//! * **Signed tokens**, minted by a [`TokenCodec`] after an identity has been
//!   established. These are compact HMAC-signed tokens carrying the subject,
//!   the issue time, and an absolute expiry.
//! * **Kiosk passes**, minted by [`KioskPasses`] once terms of use have been
//!   accepted. These are opaque, unsigned, and time-limited.
//!
//! Verification never explains itself to the caller. A malformed, forged, or
//! expired credential all produce [`Verification::Invalid`], and the detailed
//! reason is only emitted through `tracing` at `debug` level.
//!
//! ```
//! use iiif_auth_token::{SigningSecret, SubjectRef, TokenCodec, Verification};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let codec = TokenCodec::new(SigningSecret::new("s3cr3t"));
//! let issued = codec.issue(SubjectRef::from_str("user"))?;
//!
//! match codec.verify(issued.access_token()) {
//!     Verification::Valid(grant) => assert_eq!(grant.subject().as_str(), "user"),
//!     Verification::Invalid => unreachable!("freshly issued"),
//! }
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_must_use,
    unsafe_code
)]

mod braids;
mod codec;
pub mod error;
mod hmac;
pub mod jwt;
mod kiosk;

pub use braids::{AccessToken, AccessTokenRef, Subject, SubjectRef};
pub use codec::{Grant, IssuedToken, TokenCodec, Verification, DEFAULT_TOKEN_TTL};
pub use hmac::{Algorithm, SigningSecret, INSECURE_DEVELOPMENT_SECRET};
pub use kiosk::{KioskPasses, DEFAULT_KIOSK_TTL, KIOSK_PASS_PREFIX, KIOSK_SUBJECT};
