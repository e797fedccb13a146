use iiif_auth_clock::{Clock, System, UnixTime};
use iiif_auth_token::{AccessTokenRef, Grant, KioskPasses, TokenCodec, Verification};

use crate::AccessPattern;

/// Whether a presented credential opens a resource
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub enum Access {
    /// A valid credential was presented
    Granted(Grant),
    /// The resource relies on ambient session state and is never challenged
    Ambient,
    /// No usable credential was presented
    Denied,
}

impl Access {
    /// Whether the resource may be served
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Self::Denied)
    }
}

/// The credential checks shared by every guard, probe, and token service
///
/// Cloning is cheap; the signing secret is shared.
#[derive(Clone, Debug)]
pub struct Authority<C = System> {
    codec: TokenCodec<C>,
    kiosk: KioskPasses<C>,
}

impl<C> Authority<C> {
    /// An authority checking signed tokens with `codec` and kiosk passes with `kiosk`
    pub fn new(codec: TokenCodec<C>, kiosk: KioskPasses<C>) -> Self {
        Self { codec, kiosk }
    }

    /// The signed token codec
    pub fn codec(&self) -> &TokenCodec<C> {
        &self.codec
    }

    /// The kiosk pass issuer
    pub fn kiosk(&self) -> &KioskPasses<C> {
        &self.kiosk
    }
}

impl<C: Clock> Authority<C> {
    /// The current time, as seen by the codec
    pub fn now(&self) -> UnixTime {
        self.codec.clock().now()
    }

    /// Checks `credential` against a resource protected by `pattern`
    ///
    /// * interactive resources accept only signed tokens
    /// * kiosk resources accept kiosk passes, and signed tokens as well since
    ///   an identified user is at least as trusted as one who accepted terms
    /// * external resources are never challenged
    pub fn check(&self, pattern: AccessPattern, credential: Option<&AccessTokenRef>) -> Access {
        if pattern == AccessPattern::External {
            return Access::Ambient;
        }

        let Some(credential) = credential else {
            tracing::trace!(%pattern, "no credential presented");
            return Access::Denied;
        };

        let verification = match pattern {
            AccessPattern::Kiosk if KioskPasses::is_kiosk_pass(credential) => {
                self.kiosk.check(credential)
            }
            _ => self.codec.verify(credential),
        };

        match verification {
            Verification::Valid(grant) => Access::Granted(grant),
            Verification::Invalid => Access::Denied,
        }
    }

    /// Checks a credential presented to the token service for `pattern`
    ///
    /// Only the kind of credential that pattern's access service mints is
    /// accepted here.
    pub fn verify_minted(&self, pattern: AccessPattern, credential: &AccessTokenRef) -> Verification {
        match pattern {
            AccessPattern::Kiosk => self.kiosk.check(credential),
            AccessPattern::Interactive | AccessPattern::External => self.codec.verify(credential),
        }
    }
}

#[cfg(test)]
mod tests {
    use iiif_auth_clock::{DurationSecs, TestClock};
    use iiif_auth_token::{SigningSecret, SubjectRef};

    use super::*;

    fn authority() -> (Authority<TestClock>, TestClock) {
        let clock = TestClock::new(UnixTime(1_700_000_000));
        let codec = TokenCodec::with_clock(SigningSecret::new("test"), clock.clone());
        let kiosk = KioskPasses::with_clock(clock.clone());
        (Authority::new(codec, kiosk), clock)
    }

    #[test]
    fn external_resources_are_never_denied() {
        let (authority, _) = authority();
        assert_eq!(authority.check(AccessPattern::External, None), Access::Ambient);
    }

    #[test]
    fn kiosk_pass_does_not_open_interactive_resources() -> color_eyre::Result<()> {
        let (authority, _) = authority();
        let pass = authority.kiosk().mint()?;

        assert!(authority
            .check(AccessPattern::Kiosk, Some(pass.access_token()))
            .is_allowed());
        assert_eq!(
            authority.check(AccessPattern::Interactive, Some(pass.access_token())),
            Access::Denied
        );
        Ok(())
    }

    #[test]
    fn signed_token_opens_kiosk_resources() -> color_eyre::Result<()> {
        let (authority, _) = authority();
        let token = authority.codec().issue(SubjectRef::from_str("user"))?;

        assert!(authority
            .check(AccessPattern::Kiosk, Some(token.access_token()))
            .is_allowed());
        Ok(())
    }

    #[test]
    fn expired_kiosk_pass_is_denied() -> color_eyre::Result<()> {
        let (authority, clock) = authority();
        let pass = authority.kiosk().mint()?;

        clock.advance(DurationSecs(3_600));
        assert_eq!(
            authority.check(AccessPattern::Kiosk, Some(pass.access_token())),
            Access::Denied
        );
        Ok(())
    }

    #[test]
    fn kiosk_token_service_rejects_signed_tokens() -> color_eyre::Result<()> {
        let (authority, _) = authority();
        let token = authority.codec().issue(SubjectRef::from_str("user"))?;

        assert_eq!(
            authority.verify_minted(AccessPattern::Kiosk, token.access_token()),
            Verification::Invalid
        );
        assert!(authority
            .verify_minted(AccessPattern::Interactive, token.access_token())
            .is_valid());
        Ok(())
    }
}
