//! Service descriptors
//!
//! These are the JSON shapes a client reads to find out where to go next. An
//! access service descriptor nests the token service the client must use to
//! collect a credential, and optionally a logout service.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{context, error, LanguageMap};

/// The login pattern an access service implements
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AccessPattern {
    /// The user supplies credentials in a form
    Interactive,
    /// The user accepts terms of use; no identity is established
    Kiosk,
    /// Access rests on ambient session state; there is nothing to show
    External,
}

/// The profile is not a known access pattern
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown access service profile '{0}'")]
pub struct UnknownProfile(String);

impl AccessPattern {
    /// The short profile name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Interactive => "interactive",
            Self::Kiosk => "kiosk",
            Self::External => "external",
        }
    }

    /// Whether a client collects a credential through a token service
    pub fn uses_token_service(self) -> bool {
        !matches!(self, Self::External)
    }

    /// Parses a short profile name or an equivalent profile URI
    ///
    /// Version 1 names (`login`, `active`, `clickthrough`) are accepted for
    /// descriptors written against the older API.
    ///
    /// # Errors
    ///
    /// Returns an error when the profile does not name a known pattern.
    pub fn parse(profile: &str) -> Result<Self, UnknownProfile> {
        let name = profile
            .trim()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        match name.as_str() {
            "interactive" | "login" | "active" => Ok(Self::Interactive),
            "kiosk" | "clickthrough" => Ok(Self::Kiosk),
            "external" => Ok(Self::External),
            _ => Err(UnknownProfile(profile.to_owned())),
        }
    }
}

impl TryFrom<String> for AccessPattern {
    type Error = UnknownProfile;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<AccessPattern> for String {
    fn from(p: AccessPattern) -> Self {
        p.as_str().to_owned()
    }
}

impl fmt::Display for AccessPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to a probe service, as embedded in resource descriptions and
/// challenges
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeServiceReference {
    /// JSON-LD context
    #[serde(rename = "@context", default = "context::auth2_context")]
    pub context: String,
    /// Probe service URL
    pub id: String,
    /// Always `AuthProbeService2`
    #[serde(rename = "type")]
    pub kind: String,
}

impl ProbeServiceReference {
    /// A reference to the probe service at `id`
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            context: context::auth2_context(),
            id: id.into(),
            kind: context::PROBE_SERVICE.to_owned(),
        }
    }
}

/// The token service a client calls to collect a credential
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenServiceDescriptor {
    /// JSON-LD context, present when the descriptor is not nested
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Token service URL
    pub id: String,
    /// Optional error heading shown when the token service fails
    #[serde(default, skip_serializing_if = "LanguageMap::is_empty")]
    pub error_heading: LanguageMap,
}

/// The logout service that ends the session behind an access service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutServiceDescriptor {
    /// JSON-LD context, present when the descriptor is not nested
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Logout service URL
    pub id: String,
    /// Label for a logout control
    #[serde(default, skip_serializing_if = "LanguageMap::is_empty")]
    pub label: LanguageMap,
}

/// A service nested under an access service, distinguished by `type`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NestedService {
    /// `AuthAccessTokenService2`
    #[serde(rename = "AuthAccessTokenService2")]
    Token(TokenServiceDescriptor),
    /// `AuthLogoutService2`
    #[serde(rename = "AuthLogoutService2")]
    Logout(LogoutServiceDescriptor),
}

/// An access service, with everything a generic client needs to drive it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessServiceDescriptor {
    /// JSON-LD context, present when the descriptor is not nested
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Access service URL
    pub id: String,
    /// Always `AuthAccessService2`
    #[serde(rename = "type")]
    pub kind: String,
    /// The login pattern
    pub profile: AccessPattern,
    /// Label for the control that opens the service
    #[serde(default, skip_serializing_if = "LanguageMap::is_empty")]
    pub label: LanguageMap,
    /// Heading shown before opening the service
    #[serde(default, skip_serializing_if = "LanguageMap::is_empty")]
    pub heading: LanguageMap,
    /// Explanatory note shown before opening the service
    #[serde(default, skip_serializing_if = "LanguageMap::is_empty")]
    pub note: LanguageMap,
    /// Label for the confirmation control
    #[serde(default, skip_serializing_if = "LanguageMap::is_empty")]
    pub confirm_label: LanguageMap,
    /// Heading shown when the interaction fails
    #[serde(default, skip_serializing_if = "LanguageMap::is_empty")]
    pub failure_header: LanguageMap,
    /// Description shown when the interaction fails
    #[serde(default, skip_serializing_if = "LanguageMap::is_empty")]
    pub failure_description: LanguageMap,
    /// Nested token and logout services
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<NestedService>,
}

impl AccessServiceDescriptor {
    /// The first nested token service
    pub fn token_service(&self) -> Option<&TokenServiceDescriptor> {
        self.service.iter().find_map(|s| match s {
            NestedService::Token(t) => Some(t),
            NestedService::Logout(_) => None,
        })
    }

    /// The nested logout service
    pub fn logout_service(&self) -> Option<&LogoutServiceDescriptor> {
        self.service.iter().find_map(|s| match s {
            NestedService::Logout(l) => Some(l),
            NestedService::Token(_) => None,
        })
    }

    /// Checks that the nested services suit the profile
    ///
    /// Interactive and kiosk services must offer a token service; external
    /// services must not.
    ///
    /// # Errors
    ///
    /// Returns an error describing the mismatch.
    pub fn validate(&self) -> Result<(), error::DescriptorError> {
        match (self.profile.uses_token_service(), self.token_service()) {
            (true, None) => Err(error::DescriptorError::MissingTokenService {
                id: self.id.clone(),
            }),
            (false, Some(_)) => Err(error::DescriptorError::UnexpectedTokenService {
                id: self.id.clone(),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn descriptor(profile: AccessPattern, service: Vec<NestedService>) -> AccessServiceDescriptor {
        AccessServiceDescriptor {
            context: None,
            id: "https://auth.example/access".into(),
            kind: context::ACCESS_SERVICE.into(),
            profile,
            label: LanguageMap::en("Login"),
            heading: LanguageMap::new(),
            note: LanguageMap::new(),
            confirm_label: LanguageMap::new(),
            failure_header: LanguageMap::new(),
            failure_description: LanguageMap::new(),
            service,
        }
    }

    fn token() -> NestedService {
        NestedService::Token(TokenServiceDescriptor {
            context: None,
            id: "https://auth.example/token".into(),
            error_heading: LanguageMap::new(),
        })
    }

    #[test]
    fn profile_accepts_short_names_and_uris() -> color_eyre::Result<()> {
        assert_eq!(AccessPattern::parse("kiosk")?, AccessPattern::Kiosk);
        assert_eq!(
            AccessPattern::parse("http://iiif.io/api/auth/2/interactive")?,
            AccessPattern::Interactive
        );
        assert_eq!(AccessPattern::parse("active")?, AccessPattern::Interactive);
        assert_eq!(
            AccessPattern::parse("http://iiif.io/api/auth/1/clickthrough")?,
            AccessPattern::Kiosk
        );
        assert!(AccessPattern::parse("telepathic").is_err());
        Ok(())
    }

    #[test]
    fn nested_services_are_tagged_by_type() -> color_eyre::Result<()> {
        let d = descriptor(
            AccessPattern::Interactive,
            vec![
                token(),
                NestedService::Logout(LogoutServiceDescriptor {
                    context: None,
                    id: "https://auth.example/logout".into(),
                    label: LanguageMap::en("Logout"),
                }),
            ],
        );

        assert_eq!(
            serde_json::to_value(&d)?,
            json!({
                "id": "https://auth.example/access",
                "type": "AuthAccessService2",
                "profile": "interactive",
                "label": { "en": ["Login"] },
                "service": [
                    { "type": "AuthAccessTokenService2", "id": "https://auth.example/token" },
                    {
                        "type": "AuthLogoutService2",
                        "id": "https://auth.example/logout",
                        "label": { "en": ["Logout"] }
                    }
                ]
            })
        );
        Ok(())
    }

    #[test]
    fn descriptor_reads_back_with_profile_uri() -> color_eyre::Result<()> {
        let d: AccessServiceDescriptor = serde_json::from_value(json!({
            "id": "https://auth.example/access",
            "type": "AuthAccessService2",
            "profile": "http://iiif.io/api/auth/2/kiosk",
            "service": [{ "id": "https://auth.example/token", "type": "AuthAccessTokenService2" }]
        }))?;

        assert_eq!(d.profile, AccessPattern::Kiosk);
        assert_eq!(
            d.token_service().map(|t| t.id.as_str()),
            Some("https://auth.example/token")
        );
        assert!(d.logout_service().is_none());
        Ok(())
    }

    #[test]
    fn interactive_and_kiosk_require_a_token_service() {
        assert!(descriptor(AccessPattern::Interactive, vec![]).validate().is_err());
        assert!(descriptor(AccessPattern::Kiosk, vec![]).validate().is_err());
        assert!(descriptor(AccessPattern::Kiosk, vec![token()]).validate().is_ok());
    }

    #[test]
    fn external_carries_no_token_service() {
        assert!(descriptor(AccessPattern::External, vec![]).validate().is_ok());
        assert!(descriptor(AccessPattern::External, vec![token()])
            .validate()
            .is_err());
    }
}
