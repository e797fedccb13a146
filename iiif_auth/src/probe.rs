//! Probe service
//!
//! Tells a client whether a resource is currently open to the credential it
//! holds and, when it is not, which access services would open it. The
//! result is computed fresh on every call and depends only on the credential
//! and the clock.

use iiif_auth_clock::{Clock, System};
use iiif_auth_token::AccessTokenRef;
use serde::{Deserialize, Serialize};

use crate::{
    context, Access, AccessPattern, AccessServiceDescriptor, Authority, LanguageMap,
    ServiceCatalog,
};

/// The `status` of a probe result, mirrored as the HTTP status
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum ProbeStatus {
    /// `200`: the resource is accessible
    Accessible,
    /// `401`: a credential is required
    ChallengeRequired,
}

/// The status code is neither `200` nor `401`
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unsupported probe status {0}")]
pub struct UnsupportedStatus(u16);

impl ProbeStatus {
    /// The numeric status
    pub fn code(self) -> u16 {
        match self {
            Self::Accessible => 200,
            Self::ChallengeRequired => 401,
        }
    }
}

impl From<ProbeStatus> for u16 {
    fn from(s: ProbeStatus) -> Self {
        s.code()
    }
}

impl TryFrom<u16> for ProbeStatus {
    type Error = UnsupportedStatus;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            200 => Ok(Self::Accessible),
            401 => Ok(Self::ChallengeRequired),
            other => Err(UnsupportedStatus(other)),
        }
    }
}

/// Where an accessible resource can be fetched
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Resource identifier
    pub id: String,
    /// Resource type, such as `Image`
    #[serde(rename = "type")]
    pub kind: String,
}

/// The status-specific part of a probe result
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProbeDetail {
    /// The resource may be fetched
    Accessible {
        /// Where to fetch it
        location: Location,
    },
    /// A credential is required
    Challenge {
        /// Heading to show the user
        #[serde(default, skip_serializing_if = "LanguageMap::is_empty")]
        heading: LanguageMap,
        /// Note to show the user
        #[serde(default, skip_serializing_if = "LanguageMap::is_empty")]
        note: LanguageMap,
        /// Access services that remedy the challenge, in order of preference
        service: Vec<AccessServiceDescriptor>,
    },
}

/// An `AuthProbeResult2` document
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// JSON-LD context
    #[serde(rename = "@context")]
    pub context: String,
    /// The probed resource
    pub id: String,
    /// Always `AuthProbeResult2`
    #[serde(rename = "type")]
    pub kind: String,
    /// Accessible or challenge-required
    pub status: ProbeStatus,
    /// Location or challenge
    #[serde(flatten)]
    pub detail: ProbeDetail,
}

impl ProbeResult {
    /// An accessible result for `resource_id`
    pub fn accessible(resource_id: impl Into<String>, kind: impl Into<String>) -> Self {
        let id = resource_id.into();
        Self {
            context: context::auth2_context(),
            id: id.clone(),
            kind: context::PROBE_RESULT.to_owned(),
            status: ProbeStatus::Accessible,
            detail: ProbeDetail::Accessible {
                location: Location {
                    id,
                    kind: kind.into(),
                },
            },
        }
    }

    /// A challenge for `resource_id`
    pub fn challenge(
        resource_id: impl Into<String>,
        heading: LanguageMap,
        note: LanguageMap,
        service: Vec<AccessServiceDescriptor>,
    ) -> Self {
        Self {
            context: context::auth2_context(),
            id: resource_id.into(),
            kind: context::PROBE_RESULT.to_owned(),
            status: ProbeStatus::ChallengeRequired,
            detail: ProbeDetail::Challenge {
                heading,
                note,
                service,
            },
        }
    }

    /// Whether the resource is accessible
    pub fn is_accessible(&self) -> bool {
        self.status == ProbeStatus::Accessible
    }

    /// The offered access services; empty when accessible
    pub fn access_services(&self) -> &[AccessServiceDescriptor] {
        match &self.detail {
            ProbeDetail::Challenge { service, .. } => service,
            ProbeDetail::Accessible { .. } => &[],
        }
    }
}

/// The resource type reported in a probe location
pub const IMAGE_RESOURCE: &str = "Image";

/// Probe service for resources protected by one access pattern
#[derive(Clone, Debug)]
pub struct ProbeService<C = System> {
    authority: Authority<C>,
    catalog: ServiceCatalog,
    pattern: AccessPattern,
}

impl<C> ProbeService<C> {
    /// A probe service for resources protected by `pattern`
    pub fn new(authority: Authority<C>, catalog: ServiceCatalog, pattern: AccessPattern) -> Self {
        Self {
            authority,
            catalog,
            pattern,
        }
    }
}

impl<C: Clock> ProbeService<C> {
    /// Probes `resource_id` with the presented credential
    pub fn probe(&self, resource_id: &str, credential: Option<&AccessTokenRef>) -> ProbeResult {
        match self.authority.check(self.pattern, credential) {
            Access::Denied => {
                tracing::debug!(resource_id, pattern = %self.pattern, "probe challenged");
                let (heading, note) = self.catalog.challenge_text(self.pattern);
                ProbeResult::challenge(
                    resource_id,
                    heading,
                    note,
                    vec![self.catalog.access_service(self.pattern, false)],
                )
            }
            Access::Granted(_) | Access::Ambient => {
                ProbeResult::accessible(resource_id, IMAGE_RESOURCE)
            }
        }
    }
}
