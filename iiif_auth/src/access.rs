//! Access services
//!
//! Each access pattern runs its own small ceremony. Every ceremony starts
//! `Presented` and ends `Confirmed` with a freshly minted credential,
//! `Declined`, or `Failed`; only a confirmed ceremony hands off to the token
//! service.
//!
//! | pattern     | confirm                         | decline          | fail                 |
//! |-------------|---------------------------------|------------------|----------------------|
//! | interactive | demo credential pair matches    | not reachable    | credentials rejected |
//! | kiosk       | terms accepted                  | terms declined   | pass cannot be minted |
//! | external    | no ceremony; never challenged   |                  |                      |

use std::fmt;

use iiif_auth_clock::{Clock, System};
use iiif_auth_token::{IssuedToken, KioskPasses, SubjectRef, TokenCodec};
use serde::{Deserialize, Serialize};

use crate::{
    context, i18n::Locale, message::TERMS_DECLINED, AccessDeniedMessage, AccessTokenMessage,
    Handshake, HandshakeParams, LanguageMap, MessageId, OpenerNotice,
};

/// Where a ceremony stands
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub enum Ceremony {
    /// Waiting for the user
    Presented,
    /// A credential was minted
    Confirmed(IssuedToken),
    /// The user refused
    Declined,
    /// The attempt was rejected; the user may try again
    Failed(AccessTokenError),
}

/// The single account the demo accepts
#[derive(Clone, PartialEq, Eq)]
pub struct DemoCredentials {
    username: String,
    password: String,
}

impl fmt::Debug for DemoCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DemoCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Default for DemoCredentials {
    fn default() -> Self {
        Self::new("user", "pass")
    }
}

impl DemoCredentials {
    /// The accepted username and password
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Whether the submitted pair matches
    pub fn accepts(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

/// A login submission
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    /// Username
    #[serde(default)]
    pub username: String,
    /// Password
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// An `AuthAccessTokenError2` document
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenError {
    /// JSON-LD context
    #[serde(rename = "@context")]
    pub context: String,
    /// Always `AuthAccessTokenError2`
    #[serde(rename = "type")]
    pub kind: String,
    /// Error profile, such as `invalidCredentials`
    pub profile: String,
    /// Heading to show the user
    pub heading: LanguageMap,
    /// Note to show the user
    pub note: LanguageMap,
    /// Machine-readable error code
    pub error: String,
}

/// The error profile for a rejected username or password
pub const INVALID_CREDENTIALS: &str = "invalidCredentials";

/// The error profile for an unexpected failure
pub const UNAVAILABLE: &str = "unavailable";

impl AccessTokenError {
    /// The credentials were not accepted
    pub fn invalid_credentials() -> Self {
        Self::with_profile(
            INVALID_CREDENTIALS,
            LanguageMap::en("Invalid Credentials").with(Locale::Ja, "認証情報が無効です"),
            LanguageMap::en("Please check your username and password")
                .with(Locale::Ja, "ユーザー名とパスワードを確認してください"),
        )
    }

    /// A credential could not be minted
    pub fn unavailable() -> Self {
        Self::with_profile(
            UNAVAILABLE,
            LanguageMap::en("Service Unavailable").with(Locale::Ja, "サービスを利用できません"),
            LanguageMap::en("Please try again later")
                .with(Locale::Ja, "しばらくしてから再度お試しください"),
        )
    }

    fn with_profile(profile: &str, heading: LanguageMap, note: LanguageMap) -> Self {
        Self {
            context: context::auth2_context(),
            kind: context::ACCESS_TOKEN_ERROR.to_owned(),
            profile: profile.to_owned(),
            heading,
            note,
            error: profile.to_owned(),
        }
    }
}

/// The response to a JSON login submission
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginResponse {
    /// `200` with the credential
    Issued(AccessTokenMessage),
    /// `401` with the reason
    Rejected(AccessTokenError),
}

/// The interactive access service
#[derive(Clone, Debug)]
pub struct InteractiveAccess<C = System> {
    codec: TokenCodec<C>,
    credentials: DemoCredentials,
}

impl<C> InteractiveAccess<C> {
    /// Logs in against `credentials`, issuing tokens with `codec`
    pub fn new(codec: TokenCodec<C>, credentials: DemoCredentials) -> Self {
        Self { codec, credentials }
    }
}

impl<C: Clock> InteractiveAccess<C> {
    /// Completes the ceremony for a submitted form
    pub fn submit(&self, request: &LoginRequest) -> Ceremony {
        if !self.credentials.accepts(&request.username, &request.password) {
            tracing::info!(username = %request.username, "login rejected");
            return Ceremony::Failed(AccessTokenError::invalid_credentials());
        }

        match self.codec.issue(SubjectRef::from_str(&request.username)) {
            Ok(issued) => Ceremony::Confirmed(issued),
            Err(error) => {
                let error: &(dyn std::error::Error + 'static) = &error;
                tracing::error!(error, "unable to issue credential");
                Ceremony::Failed(AccessTokenError::unavailable())
            }
        }
    }

    /// Handles a JSON login submission outside the window hand-off
    ///
    /// A fresh correlation identifier is attached to a successful response.
    pub fn login(&self, request: &LoginRequest) -> LoginResponse {
        match self.submit(request) {
            Ceremony::Confirmed(issued) => match MessageId::generate() {
                Ok(message_id) => {
                    let expires_in = issued.lifetime();
                    LoginResponse::Issued(AccessTokenMessage::new(
                        message_id,
                        issued.into_access_token(),
                        expires_in,
                    ))
                }
                Err(error) => {
                    tracing::error!(%error, "unable to generate message id");
                    LoginResponse::Rejected(AccessTokenError::unavailable())
                }
            },
            Ceremony::Failed(error) => LoginResponse::Rejected(error),
            Ceremony::Presented | Ceremony::Declined => {
                LoginResponse::Rejected(AccessTokenError::invalid_credentials())
            }
        }
    }
}

/// A choice made on the kiosk terms page
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KioskChoice {
    /// The terms were accepted
    Accept,
    /// The terms were declined
    Decline,
}

/// The kiosk access service
#[derive(Clone, Debug)]
pub struct KioskAccess<C = System> {
    passes: KioskPasses<C>,
}

impl<C> KioskAccess<C> {
    /// Mints passes with `passes`
    pub fn new(passes: KioskPasses<C>) -> Self {
        Self { passes }
    }
}

impl<C: Clock> KioskAccess<C> {
    /// Completes the ceremony for the user's choice
    pub fn respond(&self, choice: KioskChoice) -> Ceremony {
        match choice {
            KioskChoice::Decline => {
                tracing::info!("kiosk terms declined");
                Ceremony::Declined
            }
            KioskChoice::Accept => match self.passes.mint() {
                Ok(pass) => Ceremony::Confirmed(pass),
                Err(error) => {
                    let error: &(dyn std::error::Error + 'static) = &error;
                    tracing::error!(error, "unable to mint kiosk pass");
                    Ceremony::Failed(AccessTokenError::unavailable())
                }
            },
        }
    }

    /// The notice a declined ceremony posts to its opener
    ///
    /// `None` when the hand-off context is unusable; the window then closes
    /// without posting anything.
    pub fn decline_notice(&self, params: &HandshakeParams) -> Option<OpenerNotice> {
        let handshake = Handshake::from_params(params)
            .map_err(|error| tracing::debug!(%error, "decline without a usable hand-off"))
            .ok()?;

        Some(OpenerNotice::new(
            handshake.origin().clone(),
            AccessDeniedMessage {
                message_id: handshake.message_id().clone(),
                error: TERMS_DECLINED.to_owned(),
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use iiif_auth_clock::{DurationSecs, TestClock, UnixTime};
    use iiif_auth_token::{SigningSecret, Verification};
    use serde_json::json;

    use super::*;

    fn interactive() -> InteractiveAccess<TestClock> {
        let clock = TestClock::new(UnixTime(1_700_000_000));
        InteractiveAccess::new(
            TokenCodec::with_clock(SigningSecret::new("test"), clock),
            DemoCredentials::default(),
        )
    }

    fn login(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.into(),
            password: password.into(),
        }
    }

    #[test]
    fn correct_pair_confirms_with_a_verifiable_token() {
        let access = interactive();

        let Ceremony::Confirmed(issued) = access.submit(&login("user", "pass")) else {
            panic!("expected confirmation");
        };

        assert_eq!(issued.subject().as_str(), "user");
        assert!(matches!(
            access.codec.verify(issued.access_token()),
            Verification::Valid(_)
        ));
    }

    #[test]
    fn wrong_password_fails_without_a_credential() {
        let access = interactive();

        assert_eq!(
            access.submit(&login("user", "wrong")),
            Ceremony::Failed(AccessTokenError::invalid_credentials())
        );
        assert!(matches!(
            access.submit(&login("", "")),
            Ceremony::Failed(_)
        ));
    }

    #[test]
    fn json_login_reports_one_hour_expiry() -> color_eyre::Result<()> {
        let LoginResponse::Issued(message) = interactive().login(&login("user", "pass")) else {
            panic!("expected a token");
        };

        assert_eq!(message.expires_in, 3_600);
        assert!(!message.access_token.as_str().is_empty());
        assert_eq!(message.kind, "AuthAccessToken2");
        Ok(())
    }

    #[test]
    fn json_login_rejection_has_the_wire_shape() -> color_eyre::Result<()> {
        let LoginResponse::Rejected(error) = interactive().login(&login("user", "wrong")) else {
            panic!("expected a rejection");
        };

        let value = serde_json::to_value(&error)?;
        assert_eq!(value["type"], "AuthAccessTokenError2");
        assert_eq!(value["profile"], "invalidCredentials");
        assert_eq!(value["error"], "invalidCredentials");
        assert_eq!(value["heading"]["en"], json!(["Invalid Credentials"]));
        assert_eq!(
            value["note"]["en"],
            json!(["Please check your username and password"])
        );
        Ok(())
    }

    #[test]
    fn kiosk_accept_mints_a_pass_and_decline_mints_nothing() {
        let clock = TestClock::new(UnixTime(1_700_000_000));
        let access = KioskAccess::new(
            KioskPasses::with_clock(clock).with_ttl(DurationSecs(60)),
        );

        let Ceremony::Confirmed(pass) = access.respond(KioskChoice::Accept) else {
            panic!("expected confirmation");
        };
        assert!(KioskPasses::is_kiosk_pass(pass.access_token()));
        assert_eq!(pass.lifetime(), DurationSecs(60));

        assert_eq!(access.respond(KioskChoice::Decline), Ceremony::Declined);
    }

    #[test]
    fn decline_notice_targets_the_declared_origin_or_nobody() {
        let access = KioskAccess::new(KioskPasses::new());
        let params = |origin: &str| HandshakeParams {
            message_id: Some("m-9".into()),
            origin: Some(origin.into()),
        };

        let notice = access
            .decline_notice(&params("http://localhost:3001/viewer"))
            .expect("notice for a parseable origin");
        assert_eq!(notice.target_origin.as_str(), "http://localhost:3001");
        let crate::WindowMessage::Denied(denied) = notice.message else {
            panic!("expected a denial");
        };
        assert_eq!(denied.message_id.as_str(), "m-9");
        assert_eq!(denied.error, "User declined terms");

        assert_eq!(access.decline_notice(&params("*")), None);
    }

    #[test]
    fn password_is_never_debug_printed() {
        let debug = format!("{:?} {:?}", DemoCredentials::default(), login("user", "hunter2"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("\"pass\""));
    }
}
