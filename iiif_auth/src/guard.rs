//! Resource guard
//!
//! Decides whether a request for a protected resource may be served. A
//! refusal carries a challenge body naming the probe service the client
//! should consult next, and never any of the resource itself.

use iiif_auth_clock::{Clock, System};
use iiif_auth_token::AccessTokenRef;
use serde::{Deserialize, Serialize};

use crate::{Access, AccessPattern, Authority, ProbeServiceReference, ServiceCatalog};

/// The `401` body returned for a protected resource
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceChallenge {
    /// Human-readable reason
    pub error: String,
    /// Exactly one probe service reference
    pub service: Vec<ProbeServiceReference>,
}

/// The outcome of guarding a resource
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub enum GuardDecision {
    /// Serve the resource
    Allow(Access),
    /// Refuse with this challenge
    Challenge(ResourceChallenge),
}

/// Guards resources protected by one access pattern
#[derive(Clone, Debug)]
pub struct ResourceGuard<C = System> {
    authority: Authority<C>,
    pattern: AccessPattern,
    probe: ProbeServiceReference,
}

impl<C> ResourceGuard<C> {
    /// A guard for resources protected by `pattern`
    pub fn new(authority: Authority<C>, catalog: &ServiceCatalog, pattern: AccessPattern) -> Self {
        Self {
            authority,
            pattern,
            probe: catalog.probe_service(pattern),
        }
    }

    /// The pattern this guard enforces
    pub fn pattern(&self) -> AccessPattern {
        self.pattern
    }
}

impl<C: Clock> ResourceGuard<C> {
    /// Decides access for the presented credential
    pub fn check(&self, credential: Option<&AccessTokenRef>) -> GuardDecision {
        match self.authority.check(self.pattern, credential) {
            Access::Denied => GuardDecision::Challenge(self.challenge()),
            allowed => GuardDecision::Allow(allowed),
        }
    }

    fn challenge(&self) -> ResourceChallenge {
        let error = match self.pattern {
            AccessPattern::Kiosk => "Kiosk confirmation required",
            AccessPattern::Interactive | AccessPattern::External => "Authentication required",
        };

        ResourceChallenge {
            error: error.to_owned(),
            service: vec![self.probe.clone()],
        }
    }
}

#[cfg(test)]
mod tests {
    use iiif_auth_clock::{TestClock, UnixTime};
    use iiif_auth_token::{KioskPasses, SigningSecret, SubjectRef, TokenCodec};
    use serde_json::json;
    use url::Url;

    use super::*;

    fn guard(pattern: AccessPattern) -> color_eyre::Result<ResourceGuard<TestClock>> {
        let clock = TestClock::new(UnixTime(1_700_000_000));
        let authority = Authority::new(
            TokenCodec::with_clock(SigningSecret::new("test"), clock.clone()),
            KioskPasses::with_clock(clock),
        );
        let catalog = ServiceCatalog::new(Url::parse("http://localhost:3000")?);
        Ok(ResourceGuard::new(authority, &catalog, pattern))
    }

    #[test]
    fn challenge_names_exactly_one_probe_service() -> color_eyre::Result<()> {
        let guard = guard(AccessPattern::Interactive)?;

        let GuardDecision::Challenge(challenge) = guard.check(None) else {
            panic!("expected a challenge");
        };

        assert_eq!(
            serde_json::to_value(&challenge)?,
            json!({
                "error": "Authentication required",
                "service": [{
                    "@context": "http://iiif.io/api/auth/2/context.json",
                    "id": "http://localhost:3000/api/iiif/probe",
                    "type": "AuthProbeService2"
                }]
            })
        );
        Ok(())
    }

    #[test]
    fn valid_credential_is_allowed() -> color_eyre::Result<()> {
        let guard = guard(AccessPattern::Interactive)?;
        let token = guard.authority.codec().issue(SubjectRef::from_str("user"))?;

        assert!(matches!(
            guard.check(Some(token.access_token())),
            GuardDecision::Allow(Access::Granted(_))
        ));
        Ok(())
    }

    #[test]
    fn forged_credential_is_challenged_like_a_missing_one() -> color_eyre::Result<()> {
        let guard = guard(AccessPattern::Interactive)?;
        let forged = AccessTokenRef::from_str("eyJhbGciOiJIUzI1NiJ9.e30.c2ln");

        assert_eq!(guard.check(Some(forged)), guard.check(None));
        Ok(())
    }

    #[test]
    fn kiosk_challenge_points_at_the_kiosk_probe() -> color_eyre::Result<()> {
        let guard = guard(AccessPattern::Kiosk)?;

        let GuardDecision::Challenge(challenge) = guard.check(None) else {
            panic!("expected a challenge");
        };
        assert_eq!(
            challenge.service[0].id,
            "http://localhost:3000/api/iiif/auth/kiosk/probe"
        );
        Ok(())
    }

    #[test]
    fn external_resource_is_never_challenged() -> color_eyre::Result<()> {
        let guard = guard(AccessPattern::External)?;
        assert_eq!(guard.check(None), GuardDecision::Allow(Access::Ambient));
        Ok(())
    }
}
