//! The IIIF Authentication API 2.0 negotiation engine
//!
//! A client learns that a resource is protected when the resource answers
//! with a challenge naming a probe service. The probe service describes the
//! access services that would open the resource. The client opens one of
//! them in a separate window, the user completes its ceremony, and the token
//! service posts a credential back to the client's window, which presents it
//! on every later request.
//!
//! This crate holds the protocol documents and the stateless services that
//! produce them. Nothing here performs I/O; an HTTP layer renders the
//! decisions made here.
//!
//! ```
//! use iiif_auth::{AccessPattern, Authority, ProbeService, ServiceCatalog};
//! use iiif_auth_token::{KioskPasses, SigningSecret, SubjectRef, TokenCodec};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let authority = Authority::new(TokenCodec::new(SigningSecret::new("s3cr3t")), KioskPasses::new());
//! let catalog = ServiceCatalog::new("http://localhost:3000".parse()?);
//! let probe = ProbeService::new(authority.clone(), catalog, AccessPattern::Interactive);
//!
//! let resource = "http://localhost:3000/api/iiif/image/1";
//! assert!(!probe.probe(resource, None).is_accessible());
//!
//! let issued = authority.codec().issue(SubjectRef::from_str("user"))?;
//! assert!(probe.probe(resource, Some(issued.access_token())).is_accessible());
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

mod access;
mod authority;
mod braids;
pub mod catalog;
pub mod context;
pub mod credential;
mod descriptor;
pub mod error;
mod guard;
mod handshake;
pub mod i18n;
mod logout;
pub mod message;
mod probe;
mod token_service;

pub use access::{
    AccessTokenError, Ceremony, DemoCredentials, InteractiveAccess, KioskAccess, KioskChoice,
    LoginRequest, LoginResponse, INVALID_CREDENTIALS, UNAVAILABLE,
};
pub use authority::{Access, Authority};
pub use braids::{MessageId, MessageIdRef, Origin, OriginRef};
pub use catalog::ServiceCatalog;
pub use descriptor::{
    AccessPattern, AccessServiceDescriptor, LogoutServiceDescriptor, NestedService,
    ProbeServiceReference, TokenServiceDescriptor, UnknownProfile,
};
pub use guard::{GuardDecision, ResourceChallenge, ResourceGuard};
pub use handshake::{AccessEntryError, AccessEntryParams, Handshake, HandshakeParams};
pub use i18n::{LanguageMap, Locale};
pub use logout::{LogoutPage, LogoutRequest, LogoutService};
pub use message::{
    AccessDeniedMessage, AccessTokenMessage, LogoutMessage, OpenerNotice, WindowMessage,
};
pub use probe::{
    Location, ProbeDetail, ProbeResult, ProbeService, ProbeStatus, UnsupportedStatus,
    IMAGE_RESOURCE,
};
pub use token_service::{Delivery, Handoff, TokenRequest, TokenService};
