//! An HTTP surface for the IIIF Authentication API 2.0
//!
//! [`router`] wires the probe, access, token, and logout services together
//! with a set of placeholder protected resources:
//!
//! * interactively protected images under `/api/iiif/image/{id}`, guarded by
//!   [`VerifyCredential`] and accepting signed tokens
//! * a kiosk image under `/api/iiif/image/kiosk`, accepting kiosk passes
//! * an open image under `/api/iiif/image/open`, never challenged
//!
//! ```no_run
//! use clap::Parser;
//! use iiif_auth_axum::{router, Config};
//!
//! # async fn run() -> color_eyre::Result<()> {
//! let config = Config::parse();
//! let app = router(config.app_state()?);
//!
//! let listener = tokio::net::TcpListener::bind(config.listen).await?;
//! axum::serve(listener, app).await?;
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

mod config;
mod guard;
mod interactive;
mod kiosk;
mod pages;
mod resources;
mod router;
mod state;

pub use config::{Config, ConfigError};
pub use guard::VerifyCredential;
pub use resources::{AuthService, ImageInfo, Size, Tile};
pub use router::{router, KIOSK_PARAM, TOKEN_PARAM};
pub use state::AppState;
