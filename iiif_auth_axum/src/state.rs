use iiif_auth::{
    AccessPattern, Authority, DemoCredentials, InteractiveAccess, KioskAccess, LogoutService,
    ProbeService, ResourceGuard, ServiceCatalog, TokenService,
};

/// State shared by every handler
///
/// Holds only immutable configuration; each request builds the short-lived
/// service it needs from it.
#[derive(Clone, Debug)]
pub struct AppState {
    authority: Authority,
    catalog: ServiceCatalog,
    credentials: DemoCredentials,
}

impl AppState {
    /// Bundles the configured authority, service layout, and demo account
    pub fn new(authority: Authority, catalog: ServiceCatalog, credentials: DemoCredentials) -> Self {
        Self {
            authority,
            catalog,
            credentials,
        }
    }

    /// The credential authority
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// The service layout
    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    pub(crate) fn probe_service(&self, pattern: AccessPattern) -> ProbeService {
        ProbeService::new(self.authority.clone(), self.catalog.clone(), pattern)
    }

    pub(crate) fn token_service(&self, pattern: AccessPattern) -> TokenService {
        TokenService::new(self.authority.clone(), self.catalog.clone(), pattern)
    }

    pub(crate) fn resource_guard(&self, pattern: AccessPattern) -> ResourceGuard {
        ResourceGuard::new(self.authority.clone(), &self.catalog, pattern)
    }

    pub(crate) fn interactive_access(&self) -> InteractiveAccess {
        InteractiveAccess::new(self.authority.codec().clone(), self.credentials.clone())
    }

    pub(crate) fn kiosk_access(&self) -> KioskAccess {
        KioskAccess::new(self.authority.kiosk().clone())
    }

    pub(crate) fn logout_service(&self) -> LogoutService {
        LogoutService::new(self.catalog.clone())
    }
}
