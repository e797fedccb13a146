//! The context of one login attempt
//!
//! The opener starts an attempt by opening an access service with a fresh
//! `messageId` and its own `origin`. Both values travel through every
//! redirect until the token service posts the credential back, so they are
//! validated the same way wherever they arrive.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{error, MessageId, Origin};

/// Raw hand-off parameters, as they appear in a query string
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeParams {
    /// Correlation identifier
    #[serde(default)]
    pub message_id: Option<String>,
    /// Declared origin of the opener
    #[serde(default)]
    pub origin: Option<String>,
}

/// A validated hand-off context
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Handshake {
    message_id: MessageId,
    origin: Origin,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl Handshake {
    /// A context for a known attempt
    pub fn new(message_id: MessageId, origin: Origin) -> Self {
        Self { message_id, origin }
    }

    /// Validates raw hand-off parameters
    ///
    /// # Errors
    ///
    /// Returns an error if either value is missing or the origin cannot be
    /// parsed. Nothing may be posted for such a hand-off.
    pub fn from_params(params: &HandshakeParams) -> Result<Self, error::HandshakeError> {
        let message_id =
            present(params.message_id.as_deref()).ok_or(error::HandshakeError::MissingMessageId)?;
        let origin = present(params.origin.as_deref()).ok_or(error::HandshakeError::MissingOrigin)?;

        Ok(Self {
            message_id: MessageId::from(message_id),
            origin: Origin::parse(origin)?,
        })
    }

    /// The correlation identifier
    pub fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    /// The origin every message for this attempt must target
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// `url` with this context appended as `messageId` and `origin`
    pub fn attach_to(&self, mut url: Url) -> Url {
        url.query_pairs_mut()
            .append_pair("messageId", self.message_id.as_str())
            .append_pair("origin", self.origin.as_str());
        url
    }
}

/// Entry parameters of an access service, before any fallback is applied
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessEntryParams {
    /// Correlation identifier
    #[serde(default)]
    pub message_id: Option<String>,
    /// Declared origin of the opener
    #[serde(default)]
    pub origin: Option<String>,
    /// Requested user interface language
    #[serde(default)]
    pub locale: Option<String>,
}

impl AccessEntryParams {
    /// Resolves the attempt context for an access service entry point
    ///
    /// Clients written against the version 1 API send the token service URL
    /// where a correlation identifier belongs, so a `messageId` that looks
    /// like a URL is replaced with a fresh one, as is a missing one. A
    /// missing `origin` falls back to the `Referer`.
    ///
    /// # Errors
    ///
    /// Returns an error if no origin can be determined or a fresh
    /// identifier cannot be generated.
    pub fn resolve(&self, referer: Option<&str>) -> Result<Handshake, AccessEntryError> {
        let message_id = match present(self.message_id.as_deref()) {
            Some(id) if !id.starts_with("http") => MessageId::from(id),
            _ => MessageId::generate()?,
        };

        let origin = present(self.origin.as_deref())
            .or_else(|| present(referer))
            .ok_or(error::HandshakeError::MissingOrigin)?;

        Ok(Handshake {
            message_id,
            origin: Origin::parse(origin).map_err(error::HandshakeError::from)?,
        })
    }
}

/// An access service entry could not be resolved
#[derive(Debug, thiserror::Error)]
pub enum AccessEntryError {
    /// The hand-off context is unusable
    #[error(transparent)]
    Handshake(#[from] error::HandshakeError),
    /// A correlation identifier could not be generated
    #[error(transparent)]
    Randomness(#[from] error::RandomnessUnavailable),
}
