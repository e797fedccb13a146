use std::sync::Arc;

use iiif_auth_clock::{Clock, DurationSecs, System, UnixTime};

use crate::{
    error,
    jwt::{self, Claims, Decomposed, Headers},
    AccessToken, AccessTokenRef, Algorithm, SigningSecret, Subject, SubjectRef,
};

/// Default credential lifetime: one hour
pub const DEFAULT_TOKEN_TTL: DurationSecs = DurationSecs(3_600);

/// A successfully verified credential
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grant {
    subject: Subject,
    expires_at: UnixTime,
}

impl Grant {
    /// Constructs a grant for `subject` lasting until `expires_at`
    pub fn new(subject: Subject, expires_at: UnixTime) -> Self {
        Self {
            subject,
            expires_at,
        }
    }

    /// The identity the credential was issued to
    pub fn subject(&self) -> &SubjectRef {
        &self.subject
    }

    /// The absolute expiry of the credential
    pub fn expires_at(&self) -> UnixTime {
        self.expires_at
    }

    /// Seconds left before expiry as of `now`
    pub fn expires_in(&self, now: UnixTime) -> DurationSecs {
        self.expires_at - now
    }
}

/// The outcome of checking a presented credential
///
/// Malformed, forged, and expired credentials are indistinguishable here. The
/// reason is only ever written to the log.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub enum Verification {
    /// The credential is currently valid
    Valid(Grant),
    /// The credential must be treated as absent
    Invalid,
}

impl Verification {
    /// Whether the credential was accepted
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// The grant, when the credential was accepted
    pub fn grant(&self) -> Option<&Grant> {
        match self {
            Self::Valid(grant) => Some(grant),
            Self::Invalid => None,
        }
    }

    pub(crate) fn from_result<E: std::error::Error + 'static>(
        result: Result<Grant, E>,
    ) -> Self {
        match result {
            Ok(grant) => Self::Valid(grant),
            Err(error) => {
                let error: &(dyn std::error::Error + 'static) = &error;
                tracing::debug!(error, "credential rejected");
                Self::Invalid
            }
        }
    }
}

/// A freshly issued credential
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedToken {
    access_token: AccessToken,
    subject: Subject,
    issued: UnixTime,
    expiry: UnixTime,
}

impl IssuedToken {
    pub(crate) fn new(
        access_token: AccessToken,
        subject: Subject,
        issued: UnixTime,
        expiry: UnixTime,
    ) -> Self {
        Self {
            access_token,
            subject,
            issued,
            expiry,
        }
    }

    /// The signed representation to hand to the client
    pub fn access_token(&self) -> &AccessTokenRef {
        &self.access_token
    }

    /// Consumes the issued token, returning its signed representation
    pub fn into_access_token(self) -> AccessToken {
        self.access_token
    }

    /// The identity the token was issued to
    pub fn subject(&self) -> &SubjectRef {
        &self.subject
    }

    /// When the token was issued
    pub fn issued(&self) -> UnixTime {
        self.issued
    }

    /// When the token stops being valid
    pub fn expiry(&self) -> UnixTime {
        self.expiry
    }

    /// The full lifetime of the token
    pub fn lifetime(&self) -> DurationSecs {
        self.expiry - self.issued
    }
}

/// Issues and verifies signed, time-limited bearer credentials
///
/// Cloning is cheap; clones share the signing secret.
#[derive(Clone, Debug)]
pub struct TokenCodec<C = System> {
    secret: Arc<SigningSecret>,
    alg: Algorithm,
    ttl: DurationSecs,
    clock: C,
}

impl TokenCodec {
    /// A codec using HS256, the default one hour lifetime, and the system clock
    pub fn new(secret: SigningSecret) -> Self {
        Self::with_clock(secret, System)
    }
}

impl<C> TokenCodec<C> {
    /// A codec reading the time from `clock`
    pub fn with_clock(secret: SigningSecret, clock: C) -> Self {
        Self {
            secret: Arc::new(secret),
            alg: Algorithm::HS256,
            ttl: DEFAULT_TOKEN_TTL,
            clock,
        }
    }

    /// Overrides the credential lifetime
    pub fn with_ttl(mut self, ttl: DurationSecs) -> Self {
        self.ttl = ttl;
        self
    }

    /// Overrides the signing algorithm
    pub fn with_algorithm(mut self, alg: Algorithm) -> Self {
        self.alg = alg;
        self
    }

    /// The lifetime given to newly issued credentials
    pub fn ttl(&self) -> DurationSecs {
        self.ttl
    }

    /// The clock used for issue and expiry times
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<C: Clock> TokenCodec<C> {
    /// Issues a credential for `subject`, valid from now for the configured lifetime
    ///
    /// # Errors
    ///
    /// Returns an error only if the token cannot be serialized.
    pub fn issue(&self, subject: &SubjectRef) -> Result<IssuedToken, error::TokenIssueError> {
        let issued = self.clock.now();
        let expiry = issued + self.ttl;

        let claims = Claims {
            sub: subject.to_owned(),
            iat: issued,
            exp: expiry,
        };

        let access_token = jwt::encode(&Headers::new(self.alg), &claims, &self.secret)?;

        tracing::info!(%subject, expiry = expiry.0, "issued access token");

        Ok(IssuedToken {
            access_token,
            subject: claims.sub,
            issued,
            expiry,
        })
    }

    /// Verifies a credential's structure, signature, and expiry
    pub fn verify(&self, token: &AccessTokenRef) -> Verification {
        Verification::from_result(self.try_verify(token))
    }

    /// Verifies a credential, keeping the reason for any rejection
    ///
    /// Only for in-process diagnostics; never return the error to a caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, its signature does not
    /// match, or it has expired.
    pub fn try_verify(&self, token: &AccessTokenRef) -> Result<Grant, error::TokenVerifyError> {
        let claims = Decomposed::from_token(token)?.verify_signature(&self.secret, self.alg)?;

        if self.clock.now() >= claims.exp {
            return Err(error::token_expired().into());
        }

        Ok(Grant::new(claims.sub, claims.exp))
    }
}

#[cfg(test)]
mod tests {
    use iiif_auth_clock::TestClock;
    use tracing_test::traced_test;

    use super::*;

    const START: UnixTime = UnixTime(1_700_000_000);

    fn codec() -> (TokenCodec<TestClock>, TestClock) {
        let clock = TestClock::new(START);
        (
            TokenCodec::with_clock(SigningSecret::new("test secret"), clock.clone()),
            clock,
        )
    }

    #[test]
    fn verify_returns_the_subject_it_was_issued_for() -> color_eyre::Result<()> {
        let (codec, _) = codec();
        let issued = codec.issue(SubjectRef::from_str("user"))?;

        let verification = codec.verify(issued.access_token());

        let grant = verification.grant().expect("token should be valid");
        assert_eq!(grant.subject().as_str(), "user");
        assert_eq!(grant.expires_at(), START + DEFAULT_TOKEN_TTL);
        Ok(())
    }

    #[test]
    fn issued_token_lives_for_one_hour() -> color_eyre::Result<()> {
        let (codec, _) = codec();
        let issued = codec.issue(SubjectRef::from_str("user"))?;

        assert_eq!(issued.issued(), START);
        assert_eq!(issued.lifetime(), DurationSecs(3_600));
        Ok(())
    }

    #[test]
    fn token_is_invalid_once_expiry_is_reached() -> color_eyre::Result<()> {
        let (codec, clock) = codec();
        let issued = codec.issue(SubjectRef::from_str("user"))?;

        clock.advance(DurationSecs(3_599));
        assert!(codec.verify(issued.access_token()).is_valid());

        clock.advance(DurationSecs(1));
        assert_eq!(codec.verify(issued.access_token()), Verification::Invalid);
        Ok(())
    }

    #[test]
    fn token_signed_with_another_secret_is_invalid() -> color_eyre::Result<()> {
        let (codec, clock) = codec();
        let other = TokenCodec::with_clock(SigningSecret::new("other"), clock);
        let issued = other.issue(SubjectRef::from_str("user"))?;

        assert_eq!(codec.verify(issued.access_token()), Verification::Invalid);
        Ok(())
    }

    #[test]
    fn flipping_any_signature_byte_invalidates_the_token() -> color_eyre::Result<()> {
        let (codec, _) = codec();
        let issued = codec.issue(SubjectRef::from_str("user"))?;
        let original = issued.access_token().as_str();

        let last = original.len() - 1;
        let replacement = if original.ends_with('A') { "B" } else { "A" };
        let tampered = AccessToken::new(format!("{}{replacement}", &original[..last]));

        assert_eq!(codec.verify(&tampered), Verification::Invalid);
        Ok(())
    }

    #[test]
    #[traced_test]
    fn rejection_reason_is_logged_but_not_returned() {
        let (codec, _) = codec();

        let verification = codec.verify(AccessTokenRef::from_str("not-a-token"));

        assert_eq!(verification, Verification::Invalid);
        assert!(logs_contain("credential rejected"));
    }

    #[test]
    fn malformed_expired_and_forged_tokens_collapse_to_one_outcome() -> color_eyre::Result<()> {
        let (codec, clock) = codec();
        let expired = codec.issue(SubjectRef::from_str("user"))?;
        clock.advance(DurationSecs(7_200));

        let forger = TokenCodec::with_clock(SigningSecret::new("forger"), clock.clone());
        let forged = forger.issue(SubjectRef::from_str("user"))?;

        let outcomes = [
            codec.verify(AccessTokenRef::from_str("garbage")),
            codec.verify(expired.access_token()),
            codec.verify(forged.access_token()),
        ];

        assert!(outcomes.iter().all(|v| *v == Verification::Invalid));
        Ok(())
    }
}
