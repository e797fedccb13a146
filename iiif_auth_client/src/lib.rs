//! Client-side orchestration of IIIF Authentication API 2.0 access attempts
//!
//! An [`Orchestrator`] ensures a resource is accessible. It probes the
//! resource with whatever credential is stored, and on a challenge opens the
//! first usable access service in a child window. The window eventually posts
//! a token message back through the orchestrator's [`MessageChannel`]; the
//! orchestrator accepts only the message carrying the correlation identifier
//! it generated for that attempt, stores the credential, closes the window,
//! and probes again.
//!
//! Every attempt is bounded. If no matching message arrives within the wait
//! bound, the window is closed, the listener is dropped, and the attempt
//! fails with [`AccessError::TimedOut`]. A message that arrives later is
//! ignored.
//!
//! The host environment is abstracted behind [`WindowOpener`],
//! [`ProbeClient`], and [`CredentialStore`].
//!
//! ```
//! use iiif_auth::{AccessPattern, Authority, Origin, ProbeService, ServiceCatalog};
//! use iiif_auth_client::{
//!     ChildWindow, CredentialStore, InMemoryCredentialStore, LocalProber, MessageChannel,
//!     Orchestrator, OrchestratorConfig, WindowOpener,
//! };
//! use iiif_auth_token::{KioskPasses, SigningSecret, SubjectRef, TokenCodec};
//! use url::Url;
//!
//! #[derive(Debug)]
//! struct NoWindows;
//!
//! #[derive(Debug)]
//! struct Never;
//!
//! impl ChildWindow for Never {
//!     fn close(&mut self) {}
//!     fn is_closed(&self) -> bool { true }
//! }
//!
//! impl WindowOpener for NoWindows {
//!     type Window = Never;
//!     fn open(&self, _: &Url, _: &MessageChannel) -> Option<Never> { None }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = ServiceCatalog::new(Url::parse("http://localhost:3000")?);
//! let authority = Authority::new(TokenCodec::new(SigningSecret::new("s3cr3t")), KioskPasses::new());
//! let prober = LocalProber::new(ProbeService::new(
//!     authority.clone(),
//!     catalog.clone(),
//!     AccessPattern::Interactive,
//! ));
//!
//! let orchestrator = Orchestrator::new(
//!     OrchestratorConfig::new(
//!         Origin::parse("https://viewer.example")?,
//!         catalog.probe_url(AccessPattern::Interactive),
//!     ),
//!     prober,
//!     NoWindows,
//!     InMemoryCredentialStore::new(),
//! );
//!
//! let issued = authority.codec().issue(SubjectRef::from_str("user"))?;
//! orchestrator.store().set(issued.into_access_token());
//!
//! let location = orchestrator
//!     .ensure_access("http://localhost:3000/api/iiif/image/1")
//!     .await?;
//! assert_eq!(location.kind, "Image");
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
    unused_must_use
)]
#![forbid(unsafe_code)]

pub mod channel;
mod error;
mod orchestrator;
mod prober;
mod store;
mod window;

pub use channel::{Envelope, Listener, MessageChannel};
pub use error::{AccessError, ProbeError};
pub use orchestrator::{Orchestrator, OrchestratorConfig, DEFAULT_WAIT};
#[cfg(feature = "http")]
pub use prober::HttpProber;
pub use prober::{LocalProber, ProbeClient};
pub use store::{CredentialStore, InMemoryCredentialStore};
pub use window::{ChildWindow, WindowOpener};
