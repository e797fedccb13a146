//! Token service
//!
//! Hands a minted credential back to the window that started the attempt.
//! The credential is only ever posted to the origin that window declared;
//! when the declared origin is unusable nothing is posted at all.

use std::time::Duration;

use iiif_auth_clock::{Clock, System};
use iiif_auth_token::{AccessToken, Verification};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    credential, error, message::CLOSE_GRACE, AccessPattern, AccessTokenMessage, Authority,
    Handshake, HandshakeParams, Origin, ServiceCatalog,
};

/// Token service query parameters
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    /// Correlation identifier and declared origin
    #[serde(flatten)]
    pub handshake: HandshakeParams,
    /// The credential minted by the access service
    #[serde(default, alias = "kioskToken")]
    pub access_token: Option<String>,
}

/// A message to post from the hand-off page
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    /// The exact origin to target; never a wildcard
    pub target_origin: Origin,
    /// The payload
    pub message: AccessTokenMessage,
    /// Delay between posting and closing the window
    pub close_after: Duration,
}

/// What the token service does with a request
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub enum Handoff {
    /// Post the credential to the opener and close
    Deliver(Delivery),
    /// No valid credential; send the window back into the access service
    RestartAccess {
        /// The access service entry point, carrying the attempt context
        location: Url,
    },
    /// The attempt context is unusable; respond with a client error
    Malformed(error::HandshakeError),
}

/// The token service for credentials minted by one access pattern
#[derive(Clone, Debug)]
pub struct TokenService<C = System> {
    authority: Authority<C>,
    catalog: ServiceCatalog,
    pattern: AccessPattern,
}

impl<C> TokenService<C> {
    /// A token service accepting credentials minted for `pattern`
    pub fn new(authority: Authority<C>, catalog: ServiceCatalog, pattern: AccessPattern) -> Self {
        Self {
            authority,
            catalog,
            pattern,
        }
    }
}

impl<C: Clock> TokenService<C> {
    /// Decides how to answer a token service request
    pub fn deliver(&self, request: &TokenRequest) -> Handoff {
        let handshake = match Handshake::from_params(&request.handshake) {
            Ok(h) => h,
            Err(error) => {
                tracing::debug!(%error, "malformed token service hand-off");
                return Handoff::Malformed(error);
            }
        };

        let Some(token) = credential::normalize(request.access_token.as_deref()) else {
            return self.restart(&handshake);
        };

        match self.authority.verify_minted(self.pattern, token) {
            Verification::Valid(grant) => {
                let expires_in = grant.expires_in(self.authority.now());
                tracing::debug!(
                    message_id = %handshake.message_id(),
                    target_origin = %handshake.origin(),
                    "delivering credential"
                );
                Handoff::Deliver(Delivery {
                    target_origin: handshake.origin().clone(),
                    message: AccessTokenMessage::new(
                        handshake.message_id().clone(),
                        AccessToken::from(token),
                        expires_in,
                    ),
                    close_after: CLOSE_GRACE,
                })
            }
            Verification::Invalid => self.restart(&handshake),
        }
    }

    fn restart(&self, handshake: &Handshake) -> Handoff {
        Handoff::RestartAccess {
            location: handshake.attach_to(self.catalog.access_url(self.pattern)),
        }
    }
}

#[cfg(test)]
mod tests {
    use iiif_auth_clock::{DurationSecs, TestClock, UnixTime};
    use iiif_auth_token::{KioskPasses, SigningSecret, SubjectRef, TokenCodec};

    use super::*;

    fn service(pattern: AccessPattern) -> color_eyre::Result<(TokenService<TestClock>, TestClock)> {
        let clock = TestClock::new(UnixTime(1_700_000_000));
        let authority = Authority::new(
            TokenCodec::with_clock(SigningSecret::new("test"), clock.clone()),
            KioskPasses::with_clock(clock.clone()),
        );
        let catalog = ServiceCatalog::new(Url::parse("http://localhost:3000")?);
        Ok((TokenService::new(authority, catalog, pattern), clock))
    }

    fn request(message_id: Option<&str>, origin: Option<&str>, token: Option<&str>) -> TokenRequest {
        TokenRequest {
            handshake: HandshakeParams {
                message_id: message_id.map(Into::into),
                origin: origin.map(Into::into),
            },
            access_token: token.map(Into::into),
        }
    }

    #[test]
    fn valid_credential_is_delivered_to_the_declared_origin_only() -> color_eyre::Result<()> {
        let (service, clock) = service(AccessPattern::Interactive)?;
        let issued = service.authority.codec().issue(SubjectRef::from_str("user"))?;
        clock.advance(DurationSecs(600));

        let handoff = service.deliver(&request(
            Some("m-1"),
            Some("https://viewer.example"),
            Some(issued.access_token().as_str()),
        ));

        let Handoff::Deliver(delivery) = handoff else {
            panic!("expected delivery, got {handoff:?}");
        };
        assert_eq!(delivery.target_origin.as_str(), "https://viewer.example");
        assert_eq!(delivery.message.message_id.as_str(), "m-1");
        assert_eq!(
            delivery.message.access_token.as_str(),
            issued.access_token().as_str()
        );
        assert_eq!(delivery.message.expires_in, 3_000);
        assert_eq!(delivery.close_after, Duration::from_millis(100));
        Ok(())
    }

    #[test]
    fn missing_or_invalid_credential_restarts_access() -> color_eyre::Result<()> {
        let (service, _) = service(AccessPattern::Interactive)?;

        for token in [None, Some("null"), Some("forged.token.value")] {
            let handoff = service.deliver(&request(Some("m-1"), Some("https://viewer.example"), token));
            let Handoff::RestartAccess { location } = handoff else {
                panic!("expected restart for {token:?}");
            };
            assert_eq!(location.path(), "/api/iiif/access");
            let pairs: Vec<(String, String)> = location.query_pairs().into_owned().collect();
            assert!(pairs.contains(&("messageId".into(), "m-1".into())));
            assert!(pairs.contains(&("origin".into(), "https://viewer.example".into())));
        }
        Ok(())
    }

    #[test]
    #[tracing_test::traced_test]
    fn missing_handshake_values_are_malformed() -> color_eyre::Result<()> {
        let (service, _) = service(AccessPattern::Interactive)?;

        assert_eq!(
            service.deliver(&request(None, Some("https://viewer.example"), Some("t"))),
            Handoff::Malformed(error::HandshakeError::MissingMessageId)
        );
        assert_eq!(
            service.deliver(&request(Some("m-1"), None, Some("t"))),
            Handoff::Malformed(error::HandshakeError::MissingOrigin)
        );
        assert!(logs_contain("malformed token service hand-off"));
        Ok(())
    }

    #[test]
    fn wildcard_origin_fails_closed_even_with_a_valid_credential() -> color_eyre::Result<()> {
        let (service, _) = service(AccessPattern::Interactive)?;
        let issued = service.authority.codec().issue(SubjectRef::from_str("user"))?;

        for origin in ["*", "null", "::::"] {
            let handoff = service.deliver(&request(
                Some("m-1"),
                Some(origin),
                Some(issued.access_token().as_str()),
            ));
            assert!(
                matches!(handoff, Handoff::Malformed(error::HandshakeError::InvalidOrigin(_))),
                "{origin:?} produced {handoff:?}"
            );
        }
        Ok(())
    }

    #[test]
    fn kiosk_token_service_delivers_passes_and_restarts_into_kiosk() -> color_eyre::Result<()> {
        let (service, _) = service(AccessPattern::Kiosk)?;
        let pass = service.authority.kiosk().mint()?;

        let handoff = service.deliver(&request(
            Some("m-2"),
            Some("http://localhost:3001"),
            Some(pass.access_token().as_str()),
        ));
        assert!(matches!(handoff, Handoff::Deliver(_)));

        let Handoff::RestartAccess { location } =
            service.deliver(&request(Some("m-2"), Some("http://localhost:3001"), None))
        else {
            panic!("expected restart");
        };
        assert_eq!(location.path(), "/api/iiif/auth/kiosk");
        Ok(())
    }

    #[test]
    fn kiosk_token_parameter_alias_is_accepted() -> color_eyre::Result<()> {
        let parsed: TokenRequest = serde_json::from_value(serde_json::json!({
            "messageId": "m", "origin": "https://a.example", "kioskToken": "kiosk-confirmed-1-x"
        }))?;
        assert_eq!(parsed.access_token.as_deref(), Some("kiosk-confirmed-1-x"));
        Ok(())
    }
}
