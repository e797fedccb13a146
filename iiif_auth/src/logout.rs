//! Logout service
//!
//! Credentials are never revoked server-side; logging out means telling the
//! client that opened the logout window to forget what it stores.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{LogoutMessage, OpenerNotice, Origin, ServiceCatalog};

/// Logout service query parameters
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutRequest {
    /// Declared origin of the opener
    #[serde(default)]
    pub origin: Option<String>,
}

/// What the logout page does once loaded
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogoutPage {
    /// Posted to the opener, when there is one and its origin is known
    pub notice: Option<OpenerNotice>,
    /// Where to navigate when the page was not opened as a popup
    pub home: Url,
}

/// The logout service
#[derive(Clone, Debug)]
pub struct LogoutService {
    catalog: ServiceCatalog,
}

impl LogoutService {
    /// A logout service for the deployment described by `catalog`
    pub fn new(catalog: ServiceCatalog) -> Self {
        Self { catalog }
    }

    /// Builds the logout page
    ///
    /// The declared `origin` parameter wins over the request's `Origin`
    /// header. Neither being parseable means nothing is posted.
    pub fn logout(&self, request: &LogoutRequest, origin_header: Option<&str>) -> LogoutPage {
        let notice = request
            .origin
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .or_else(|| origin_header.map(str::trim).filter(|o| !o.is_empty()))
            .and_then(|declared| match Origin::parse(declared) {
                Ok(origin) => Some(origin),
                Err(error) => {
                    tracing::debug!(%error, "logout without a usable origin");
                    None
                }
            })
            .map(|origin| OpenerNotice::new(origin, LogoutMessage::default()));

        LogoutPage {
            notice,
            home: self.catalog.endpoint("/"),
        }
    }
}
