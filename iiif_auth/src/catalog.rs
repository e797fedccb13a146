//! Where every service lives, and how each one describes itself
//!
//! All service identifiers are absolute URLs under one externally visible
//! base URL. Descriptors are rebuilt on every response; nothing here is
//! stored per request.

use url::Url;

use crate::{
    context, AccessPattern, AccessServiceDescriptor, LanguageMap, Locale,
    LogoutServiceDescriptor, NestedService, ProbeServiceReference, TokenServiceDescriptor,
};

/// Probe service for interactively protected resources
pub const PROBE_PATH: &str = "/api/iiif/probe";
/// Interactive access service entry point
pub const ACCESS_PATH: &str = "/api/iiif/access";
/// Auth 1.0 alias of the interactive access entry point
pub const LOGIN_PATH: &str = "/api/iiif/login";
/// Interactive login page
pub const AUTH_PAGE_PATH: &str = "/auth";
/// Token service for signed credentials
pub const TOKEN_PATH: &str = "/api/iiif/token";
/// Logout service
pub const LOGOUT_PATH: &str = "/api/iiif/logout";
/// Kiosk access service entry point
pub const KIOSK_ACCESS_PATH: &str = "/api/iiif/auth/kiosk";
/// Kiosk terms acceptance
pub const KIOSK_ACCEPT_PATH: &str = "/api/iiif/auth/kiosk/accept";
/// Kiosk terms refusal
pub const KIOSK_DECLINE_PATH: &str = "/api/iiif/auth/kiosk/decline";
/// Token service for kiosk passes
pub const KIOSK_TOKEN_PATH: &str = "/api/iiif/auth/kiosk/token";
/// Probe service for kiosk resources
pub const KIOSK_PROBE_PATH: &str = "/api/iiif/auth/kiosk/probe";
/// Image services
pub const IMAGE_PATH: &str = "/api/iiif/image";
/// Presentation manifests
pub const MANIFEST_PATH: &str = "/api/iiif/manifest";

/// The identifier segment of the kiosk image service
pub const KIOSK_IMAGE_ID: &str = "kiosk";

/// The identifier segment of the externally protected image service
pub const OPEN_IMAGE_ID: &str = "open";

/// The service layout of one deployment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceCatalog {
    base: Url,
}

impl ServiceCatalog {
    /// A catalog rooted at `base`
    ///
    /// A path in `base` is kept as a prefix for every service.
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    /// The externally visible base URL
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// The absolute URL of `path` under the base
    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let joined = format!("{}{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url.set_query(None);
        url.set_fragment(None);
        url
    }

    /// The probe service for resources protected by `pattern`
    ///
    /// External resources are never challenged, so they share the
    /// interactive probe service.
    pub fn probe_url(&self, pattern: AccessPattern) -> Url {
        match pattern {
            AccessPattern::Kiosk => self.endpoint(KIOSK_PROBE_PATH),
            AccessPattern::Interactive | AccessPattern::External => self.endpoint(PROBE_PATH),
        }
    }

    /// The access service entry point for `pattern`
    pub fn access_url(&self, pattern: AccessPattern) -> Url {
        match pattern {
            AccessPattern::Kiosk => self.endpoint(KIOSK_ACCESS_PATH),
            AccessPattern::Interactive | AccessPattern::External => self.endpoint(ACCESS_PATH),
        }
    }

    /// The token service for `pattern`
    pub fn token_url(&self, pattern: AccessPattern) -> Url {
        match pattern {
            AccessPattern::Kiosk => self.endpoint(KIOSK_TOKEN_PATH),
            AccessPattern::Interactive | AccessPattern::External => self.endpoint(TOKEN_PATH),
        }
    }

    /// The interactive login page
    pub fn auth_page_url(&self) -> Url {
        self.endpoint(AUTH_PAGE_PATH)
    }

    /// The logout service
    pub fn logout_url(&self) -> Url {
        self.endpoint(LOGOUT_PATH)
    }

    /// The image service identifier for `id`
    pub fn image_service_id(&self, id: &str) -> Url {
        self.endpoint(&format!("{IMAGE_PATH}/{id}"))
    }

    /// The manifest identifier for `id`
    pub fn manifest_id(&self, id: &str) -> Url {
        self.endpoint(&format!("{MANIFEST_PATH}/{id}"))
    }

    /// A reference to the probe service for `pattern`
    pub fn probe_service(&self, pattern: AccessPattern) -> ProbeServiceReference {
        ProbeServiceReference::new(self.probe_url(pattern))
    }

    /// The access service that remedies a challenge for `pattern`
    ///
    /// Set `top_level` when the descriptor is not nested in a probe result
    /// and needs its own `@context`.
    pub fn access_service(&self, pattern: AccessPattern, top_level: bool) -> AccessServiceDescriptor {
        let text = AccessText::for_pattern(pattern);

        let mut service = Vec::new();
        if pattern.uses_token_service() {
            service.push(NestedService::Token(TokenServiceDescriptor {
                context: top_level.then(context::auth2_context),
                id: self.token_url(pattern).into(),
                error_heading: LanguageMap::new(),
            }));
        }
        if pattern == AccessPattern::Interactive {
            service.push(NestedService::Logout(LogoutServiceDescriptor {
                context: top_level.then(context::auth2_context),
                id: self.logout_url().into(),
                label: LanguageMap::en("Logout").with(Locale::Ja, "ログアウト"),
            }));
        }

        AccessServiceDescriptor {
            context: top_level.then(context::auth2_context),
            id: self.access_url(pattern).into(),
            kind: context::ACCESS_SERVICE.to_owned(),
            profile: pattern,
            label: text.label,
            heading: text.heading,
            note: text.note,
            confirm_label: text.confirm_label,
            failure_header: text.failure_header,
            failure_description: text.failure_description,
            service,
        }
    }

    /// The heading and note of a probe challenge for `pattern`
    pub fn challenge_text(&self, pattern: AccessPattern) -> (LanguageMap, LanguageMap) {
        match pattern {
            AccessPattern::Kiosk => (
                LanguageMap::en("Terms of Use").with(Locale::Ja, "利用規約"),
                LanguageMap::en("Please accept the terms to view this content")
                    .with(Locale::Ja, "このコンテンツを表示するには利用規約に同意してください"),
            ),
            AccessPattern::Interactive | AccessPattern::External => (
                LanguageMap::en("Authentication Required").with(Locale::Ja, "認証が必要です"),
                LanguageMap::en("Please log in to access this resource")
                    .with(Locale::Ja, "このリソースにアクセスするにはログインしてください"),
            ),
        }
    }
}

struct AccessText {
    label: LanguageMap,
    heading: LanguageMap,
    note: LanguageMap,
    confirm_label: LanguageMap,
    failure_header: LanguageMap,
    failure_description: LanguageMap,
}

impl AccessText {
    fn for_pattern(pattern: AccessPattern) -> Self {
        match pattern {
            AccessPattern::Interactive => Self {
                label: LanguageMap::en("Login to Example Institution")
                    .with(Locale::Ja, "サンプル機関にログイン"),
                heading: LanguageMap::en("Please Log In").with(Locale::Ja, "ログインしてください"),
                note: LanguageMap::en("Example Institution requires that you log in with your account to view this content.")
                    .with(Locale::Ja, "このコンテンツを表示するには、アカウントでログインする必要があります。"),
                confirm_label: LanguageMap::en("Login").with(Locale::Ja, "ログイン"),
                failure_header: LanguageMap::en("Authentication Failed")
                    .with(Locale::Ja, "認証に失敗しました"),
                failure_description: LanguageMap::en("The username or password was not accepted.")
                    .with(Locale::Ja, "ユーザー名またはパスワードが正しくありません。"),
            },
            AccessPattern::Kiosk => Self {
                label: LanguageMap::en("Click-through Kiosk Authentication")
                    .with(Locale::Ja, "クリックスルー型キオスク認証"),
                heading: LanguageMap::en("Terms of Use").with(Locale::Ja, "利用規約"),
                note: LanguageMap::en("Please accept the terms to view this content")
                    .with(Locale::Ja, "このコンテンツを表示するには利用規約に同意してください"),
                confirm_label: LanguageMap::en("Accept Terms and Continue")
                    .with(Locale::Ja, "規約に同意して続行"),
                failure_header: LanguageMap::en("Terms Not Accepted")
                    .with(Locale::Ja, "規約に同意されませんでした"),
                failure_description: LanguageMap::en("This content is only available once the terms of use are accepted.")
                    .with(Locale::Ja, "このコンテンツは利用規約に同意した場合のみ表示できます。"),
            },
            AccessPattern::External => Self {
                label: LanguageMap::en("External Authentication")
                    .with(Locale::Ja, "外部認証"),
                heading: LanguageMap::new(),
                note: LanguageMap::new(),
                confirm_label: LanguageMap::new(),
                failure_header: LanguageMap::en("Access Unavailable")
                    .with(Locale::Ja, "アクセスできません"),
                failure_description: LanguageMap::en("Your current session does not grant access to this content.")
                    .with(Locale::Ja, "現在のセッションではこのコンテンツにアクセスできません。"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(base: &str) -> color_eyre::Result<ServiceCatalog> {
        Ok(ServiceCatalog::new(Url::parse(base)?))
    }

    #[test]
    fn endpoints_keep_a_base_path_prefix() -> color_eyre::Result<()> {
        let c = catalog("https://demo.example/iiif/")?;
        assert_eq!(
            c.probe_url(AccessPattern::Interactive).as_str(),
            "https://demo.example/iiif/api/iiif/probe"
        );

        let c = catalog("http://localhost:3000")?;
        assert_eq!(
            c.token_url(AccessPattern::Kiosk).as_str(),
            "http://localhost:3000/api/iiif/auth/kiosk/token"
        );
        Ok(())
    }

    #[test]
    fn every_generated_descriptor_is_valid() -> color_eyre::Result<()> {
        let c = catalog("http://localhost:3000")?;
        for pattern in [
            AccessPattern::Interactive,
            AccessPattern::Kiosk,
            AccessPattern::External,
        ] {
            c.access_service(pattern, false).validate()?;
            c.access_service(pattern, true).validate()?;
        }
        Ok(())
    }

    #[test]
    fn interactive_descriptor_nests_token_then_logout() -> color_eyre::Result<()> {
        let c = catalog("http://localhost:3000")?;
        let d = c.access_service(AccessPattern::Interactive, false);

        assert_eq!(d.id, "http://localhost:3000/api/iiif/access");
        assert_eq!(
            d.token_service().map(|t| t.id.as_str()),
            Some("http://localhost:3000/api/iiif/token")
        );
        assert_eq!(
            d.logout_service().map(|l| l.id.as_str()),
            Some("http://localhost:3000/api/iiif/logout")
        );
        assert!(matches!(d.service.first(), Some(NestedService::Token(_))));
        Ok(())
    }

    #[test]
    fn kiosk_descriptor_is_localized() -> color_eyre::Result<()> {
        let c = catalog("http://localhost:3000")?;
        let d = c.access_service(AccessPattern::Kiosk, true);

        assert_eq!(d.context.as_deref(), Some(context::AUTH2_CONTEXT));
        assert_eq!(d.heading.get(Locale::Ja), ["利用規約"]);
        assert_eq!(d.confirm_label.get(Locale::En), ["Accept Terms and Continue"]);
        Ok(())
    }
}
