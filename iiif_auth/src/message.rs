//! Cross-window message payloads
//!
//! These are posted from a service window to the window that opened it. The
//! target origin is always the origin the opener declared when it started the
//! attempt; it is carried alongside the payload, never inside it.

use std::time::Duration;

use iiif_auth_clock::DurationSecs;
use iiif_auth_token::AccessToken;
use serde::{Deserialize, Serialize};

use crate::{context, MessageId, MessageIdRef, Origin};

/// How long a service window waits after posting before closing itself
pub const CLOSE_GRACE: Duration = Duration::from_millis(100);

/// A delivered credential
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenMessage {
    /// JSON-LD context
    #[serde(rename = "@context", default = "context::auth2_context")]
    pub context: String,
    /// Always `AuthAccessToken2`
    #[serde(rename = "type", default = "access_token_type")]
    pub kind: String,
    /// The correlation identifier of the attempt
    pub message_id: MessageId,
    /// The credential
    pub access_token: AccessToken,
    /// Seconds until the credential expires
    pub expires_in: u64,
}

fn access_token_type() -> String {
    context::ACCESS_TOKEN.to_owned()
}

impl AccessTokenMessage {
    /// A message delivering `access_token` for attempt `message_id`
    pub fn new(message_id: MessageId, access_token: AccessToken, expires_in: DurationSecs) -> Self {
        Self {
            context: context::auth2_context(),
            kind: access_token_type(),
            message_id,
            access_token,
            expires_in: expires_in.0,
        }
    }
}

/// Notice that an attempt ended without a credential
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDeniedMessage {
    /// The correlation identifier of the attempt
    pub message_id: MessageId,
    /// Why no credential was issued
    pub error: String,
}

/// The reason posted when the kiosk terms are declined
pub const TERMS_DECLINED: &str = "User declined terms";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum LogoutTag {
    Logout,
}

/// Instruction to forget the stored credential
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutMessage {
    #[serde(rename = "type")]
    tag: LogoutTag,
    /// JSON-LD context
    #[serde(rename = "@context", default = "context::auth2_context")]
    pub context: String,
}

impl Default for LogoutMessage {
    fn default() -> Self {
        Self {
            tag: LogoutTag::Logout,
            context: context::auth2_context(),
        }
    }
}

/// Any payload a service window posts to its opener
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WindowMessage {
    /// A credential was delivered
    Token(AccessTokenMessage),
    /// The attempt ended without a credential
    Denied(AccessDeniedMessage),
    /// The session ended
    Logout(LogoutMessage),
}

impl WindowMessage {
    /// The correlation identifier, when the payload belongs to an attempt
    pub fn message_id(&self) -> Option<&MessageIdRef> {
        match self {
            Self::Token(m) => Some(&m.message_id),
            Self::Denied(m) => Some(&m.message_id),
            Self::Logout(_) => None,
        }
    }

    /// Whether the payload belongs to attempt `id`
    pub fn answers(&self, id: &MessageIdRef) -> bool {
        self.message_id() == Some(id)
    }
}

impl From<AccessTokenMessage> for WindowMessage {
    fn from(m: AccessTokenMessage) -> Self {
        Self::Token(m)
    }
}

impl From<AccessDeniedMessage> for WindowMessage {
    fn from(m: AccessDeniedMessage) -> Self {
        Self::Denied(m)
    }
}

impl From<LogoutMessage> for WindowMessage {
    fn from(m: LogoutMessage) -> Self {
        Self::Logout(m)
    }
}

/// A message a service window posts to its opener before closing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenerNotice {
    /// The exact origin to target; never a wildcard
    pub target_origin: Origin,
    /// The payload
    pub message: WindowMessage,
    /// Delay between posting and closing the window
    pub close_after: Duration,
}

impl OpenerNotice {
    /// A notice posting `message` to `target_origin`
    pub fn new(target_origin: Origin, message: impl Into<WindowMessage>) -> Self {
        Self {
            target_origin,
            message: message.into(),
            close_after: CLOSE_GRACE,
        }
    }
}
