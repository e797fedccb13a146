//! The message channel of the window that starts access attempts
//!
//! This models a browsing context's `message` events. A service window posts
//! a payload together with the origin it targets; the payload reaches the
//! listeners only when that target is exactly the origin of the receiving
//! window.

use iiif_auth::{OpenerNotice, Origin, OriginRef, WindowMessage};
use tokio::sync::broadcast;

const CAPACITY: usize = 16;

/// A payload that reached the receiving window
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    /// The origin of the window that posted the payload
    pub source: Origin,
    /// The payload
    pub data: WindowMessage,
}

/// The receiving side of a window's messages
#[derive(Clone, Debug)]
pub struct MessageChannel {
    own_origin: Origin,
    tx: broadcast::Sender<Envelope>,
}

impl MessageChannel {
    /// The channel of a window at `own_origin`
    pub fn new(own_origin: Origin) -> Self {
        let (tx, _) = broadcast::channel(CAPACITY);
        Self { own_origin, tx }
    }

    /// The origin of the receiving window
    pub fn own_origin(&self) -> &OriginRef {
        &self.own_origin
    }

    /// Posts `data` from a window at `source`, targeting `target_origin`
    ///
    /// Returns whether any listener received the payload. Payloads targeting
    /// any other origin are dropped, as are payloads posted while nobody is
    /// listening.
    pub fn post(
        &self,
        source: Origin,
        target_origin: &OriginRef,
        data: impl Into<WindowMessage>,
    ) -> bool {
        if target_origin != &*self.own_origin {
            tracing::debug!(%target_origin, own_origin = %self.own_origin, "dropping message for another origin");
            return false;
        }

        self.tx
            .send(Envelope {
                source,
                data: data.into(),
            })
            .is_ok()
    }

    /// Posts a service window's notice from a window at `source`
    pub fn post_notice(&self, source: Origin, notice: &OpenerNotice) -> bool {
        self.post(source, &notice.target_origin, notice.message.clone())
    }

    /// Starts listening; only payloads posted after this call are observed
    pub fn listen(&self) -> Listener {
        Listener {
            rx: self.tx.subscribe(),
        }
    }
}

/// An active listener on a [`MessageChannel`]
///
/// Dropping the listener stops delivery to it.
#[derive(Debug)]
pub struct Listener {
    rx: broadcast::Receiver<Envelope>,
}

impl Listener {
    /// The next payload, or `None` once the channel is gone
    pub async fn recv(&mut self) -> Option<Envelope> {
        loop {
            match self.rx.recv().await {
                Ok(envelope) => return Some(envelope),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "message listener fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use iiif_auth::{AccessDeniedMessage, LogoutMessage, MessageId};

    use super::*;

    fn origin(s: &str) -> color_eyre::Result<Origin> {
        Ok(Origin::parse(s)?)
    }

    #[tokio::test]
    async fn only_payloads_targeting_the_own_origin_are_delivered() -> color_eyre::Result<()> {
        let channel = MessageChannel::new(origin("https://viewer.example")?);
        let mut listener = channel.listen();
        let service = origin("http://localhost:3000")?;

        assert!(!channel.post(
            service.clone(),
            &origin("https://other.example")?,
            LogoutMessage::default()
        ));
        assert!(channel.post(
            service.clone(),
            &origin("https://viewer.example")?,
            AccessDeniedMessage {
                message_id: MessageId::from_static("m-1"),
                error: "nope".into(),
            }
        ));

        let envelope = listener.recv().await;
        assert_eq!(envelope.map(|e| e.source), Some(service));
        Ok(())
    }

    #[test]
    fn nothing_is_delivered_without_a_listener() -> color_eyre::Result<()> {
        let own = origin("https://viewer.example")?;
        let channel = MessageChannel::new(own.clone());

        assert!(!channel.post(origin("http://localhost:3000")?, &own, LogoutMessage::default()));
        Ok(())
    }
}
