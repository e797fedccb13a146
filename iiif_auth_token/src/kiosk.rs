//! Kiosk passes
//!
//! A kiosk pass records that terms of use were accepted in a browsing
//! session. It asserts nothing about identity and is not signed:
//!
//! ```text
//! kiosk-confirmed-<issued unix seconds>-<random>
//! ```
//!
//! A pass is accepted when the prefix matches, the issue time is not in the
//! future, and the configured lifetime has not elapsed.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use iiif_auth_clock::{Clock, DurationSecs, System, UnixTime};
use ring::rand::{SecureRandom, SystemRandom};

use crate::{error, AccessToken, AccessTokenRef, Grant, IssuedToken, Subject, Verification};

/// The marker every kiosk pass starts with
pub const KIOSK_PASS_PREFIX: &str = "kiosk-confirmed-";

/// The subject reported for a verified kiosk pass
pub const KIOSK_SUBJECT: &str = "kiosk";

/// Default kiosk pass lifetime: one hour
pub const DEFAULT_KIOSK_TTL: DurationSecs = DurationSecs(3_600);

const NONCE_LEN: usize = 12;

/// Mints and checks kiosk passes
#[derive(Clone, Debug)]
pub struct KioskPasses<C = System> {
    ttl: DurationSecs,
    clock: C,
    rng: SystemRandom,
}

impl KioskPasses {
    /// Kiosk passes with the default lifetime and the system clock
    pub fn new() -> Self {
        Self::with_clock(System)
    }

    /// Whether `token` is shaped like a kiosk pass
    ///
    /// Says nothing about validity.
    pub fn is_kiosk_pass(token: &AccessTokenRef) -> bool {
        token.as_str().starts_with(KIOSK_PASS_PREFIX)
    }
}

impl Default for KioskPasses {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> KioskPasses<C> {
    /// Kiosk passes reading the time from `clock`
    pub fn with_clock(clock: C) -> Self {
        Self {
            ttl: DEFAULT_KIOSK_TTL,
            clock,
            rng: SystemRandom::new(),
        }
    }

    /// Overrides the pass lifetime
    pub fn with_ttl(mut self, ttl: DurationSecs) -> Self {
        self.ttl = ttl;
        self
    }

    /// The lifetime given to new passes
    pub fn ttl(&self) -> DurationSecs {
        self.ttl
    }
}

impl<C: Clock> KioskPasses<C> {
    /// Mints a pass issued now
    ///
    /// # Errors
    ///
    /// Returns an error if the system random source fails.
    pub fn mint(&self) -> Result<IssuedToken, error::TokenIssueError> {
        let mut nonce = [0_u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce)
            .map_err(|_| error::unexpected("random number generator failure"))?;

        let issued = self.clock.now();
        let expiry = issued + self.ttl;
        let pass = format!(
            "{KIOSK_PASS_PREFIX}{}-{}",
            issued.0,
            URL_SAFE_NO_PAD.encode(nonce)
        );

        tracing::info!(expiry = expiry.0, "minted kiosk pass");

        Ok(IssuedToken::new(
            AccessToken::new(pass),
            Subject::from_static(KIOSK_SUBJECT),
            issued,
            expiry,
        ))
    }

    /// Checks a presented kiosk pass
    pub fn check(&self, token: &AccessTokenRef) -> Verification {
        Verification::from_result(self.try_check(token))
    }

    fn try_check(&self, token: &AccessTokenRef) -> Result<Grant, error::KioskPassRejected> {
        let rest = token
            .as_str()
            .strip_prefix(KIOSK_PASS_PREFIX)
            .ok_or_else(error::kiosk_pass_rejected)?;

        let (issued, nonce) = rest
            .split_once('-')
            .ok_or_else(error::kiosk_pass_rejected)?;

        if nonce.is_empty() {
            return Err(error::kiosk_pass_rejected());
        }

        let issued = UnixTime(issued.parse().map_err(|_| error::kiosk_pass_rejected())?);
        let expiry = issued + self.ttl;
        let now = self.clock.now();

        if issued > now || now >= expiry {
            return Err(error::kiosk_pass_rejected());
        }

        Ok(Grant::new(Subject::from_static(KIOSK_SUBJECT), expiry))
    }
}

#[cfg(test)]
mod tests {
    use iiif_auth_clock::TestClock;

    use super::*;

    const START: UnixTime = UnixTime(1_700_000_000);

    fn passes() -> (KioskPasses<TestClock>, TestClock) {
        let clock = TestClock::new(START);
        (KioskPasses::with_clock(clock.clone()), clock)
    }

    #[test]
    fn minted_pass_carries_the_prefix_and_is_accepted() -> color_eyre::Result<()> {
        let (passes, _) = passes();
        let issued = passes.mint()?;

        assert!(issued
            .access_token()
            .as_str()
            .starts_with("kiosk-confirmed-1700000000-"));
        assert!(KioskPasses::is_kiosk_pass(issued.access_token()));

        let verification = passes.check(issued.access_token());
        let grant = verification.grant().expect("pass should be valid");
        assert_eq!(grant.subject().as_str(), KIOSK_SUBJECT);
        assert_eq!(grant.expires_at(), START + DEFAULT_KIOSK_TTL);
        Ok(())
    }

    #[test]
    fn two_passes_are_distinct() -> color_eyre::Result<()> {
        let (passes, _) = passes();
        assert_ne!(passes.mint()?, passes.mint()?);
        Ok(())
    }

    #[test]
    fn pass_expires_after_its_lifetime() -> color_eyre::Result<()> {
        let (passes, clock) = passes();
        let passes = passes.with_ttl(DurationSecs(60));
        let issued = passes.mint()?;

        clock.advance(DurationSecs(59));
        assert!(passes.check(issued.access_token()).is_valid());

        clock.advance(DurationSecs(1));
        assert_eq!(passes.check(issued.access_token()), Verification::Invalid);
        Ok(())
    }

    #[test]
    fn pass_from_the_future_is_rejected() {
        let (passes, _) = passes();
        let token = AccessToken::new(format!("{KIOSK_PASS_PREFIX}{}-abc", START.0 + 10));

        assert_eq!(passes.check(&token), Verification::Invalid);
    }

    #[test]
    fn malformed_passes_are_rejected() {
        let (passes, _) = passes();

        for raw in [
            "kiosk-confirmed-",
            "kiosk-confirmed-abc-def",
            "kiosk-confirmed-1700000000",
            "kiosk-confirmed-1700000000-",
            "kiosk-1700000000-abc",
            "eyJhbGciOiJIUzI1NiJ9.e30.c2ln",
        ] {
            assert_eq!(
                passes.check(AccessTokenRef::from_str(raw)),
                Verification::Invalid,
                "{raw} should be rejected"
            );
        }
    }
}
