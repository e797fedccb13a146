//! Drives an access attempt from challenge to accessible resource

use std::{future, time::Duration};

use iiif_auth::{
    AccessServiceDescriptor, Handshake, Location, MessageId, Origin, ProbeDetail, WindowMessage,
};
use tokio::time;
use url::Url;

use crate::{
    channel::Listener, AccessError, ChildWindow, CredentialStore, InMemoryCredentialStore,
    MessageChannel, ProbeClient, WindowOpener,
};

/// How long an attempt waits for its service window to answer
pub const DEFAULT_WAIT: Duration = Duration::from_secs(30);

/// Configuration of an [`Orchestrator`]
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// The origin of the window starting attempts
    pub own_origin: Origin,
    /// The probe service to ask
    pub probe_url: Url,
    /// Upper bound on the wait for a service window's answer
    pub wait: Duration,
    /// How often to check whether the user closed the service window
    ///
    /// When unset, a manually closed window is only noticed when the wait
    /// bound elapses.
    pub close_poll: Option<Duration>,
}

impl OrchestratorConfig {
    /// Configuration with the default wait bound and no close polling
    pub fn new(own_origin: Origin, probe_url: Url) -> Self {
        Self {
            own_origin,
            probe_url,
            wait: DEFAULT_WAIT,
            close_poll: None,
        }
    }

    /// Sets the wait bound
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    /// Polls the service window for closure every `interval`
    pub fn with_close_poll(mut self, interval: Duration) -> Self {
        self.close_poll = Some(interval);
        self
    }
}

/// Ensures access to resources, collecting credentials through service
/// windows when challenged
#[derive(Debug)]
pub struct Orchestrator<P, W, S = InMemoryCredentialStore> {
    config: OrchestratorConfig,
    prober: P,
    opener: W,
    store: S,
    channel: MessageChannel,
}

enum Answer {
    Message(WindowMessage),
    Closed,
}

impl<P, W, S> Orchestrator<P, W, S>
where
    P: ProbeClient,
    W: WindowOpener,
    S: CredentialStore,
{
    /// Constructs an orchestrator
    pub fn new(config: OrchestratorConfig, prober: P, opener: W, store: S) -> Self {
        let channel = MessageChannel::new(config.own_origin.clone());
        Self {
            config,
            prober,
            opener,
            store,
            channel,
        }
    }

    /// The channel service windows post to
    pub fn channel(&self) -> &MessageChannel {
        &self.channel
    }

    /// The credential store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The configuration
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Ensures `resource` is accessible
    ///
    /// Probes with the stored credential. On a challenge, opens the first
    /// access service this client can complete, waits for its token message,
    /// stores the credential, and probes once more.
    ///
    /// # Errors
    ///
    /// Returns an error when the resource is not accessible at the end of the
    /// attempt.
    pub async fn ensure_access(&self, resource: &str) -> Result<Location, AccessError> {
        let services = match self.probe(resource).await? {
            ProbeDetail::Accessible { location } => return Ok(location),
            ProbeDetail::Challenge { service, .. } => service,
        };

        let service = services
            .iter()
            .find(|s| s.profile.uses_token_service())
            .ok_or(AccessError::NoAccessService)?;
        self.collect_credential(service).await?;

        match self.probe(resource).await? {
            ProbeDetail::Accessible { location } => Ok(location),
            ProbeDetail::Challenge { .. } => {
                tracing::debug!(resource, "still challenged with a fresh credential");
                Err(AccessError::StillDenied)
            }
        }
    }

    /// Signs out through the logout service at `logout_url`
    ///
    /// The stored credential is forgotten however the logout window ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the window could not be opened or did not confirm
    /// the logout in time.
    pub async fn sign_out(&self, logout_url: &Url) -> Result<(), AccessError> {
        let mut url = logout_url.clone();
        url.query_pairs_mut()
            .append_pair("origin", self.config.own_origin.as_str());

        let outcome = self
            .await_window(&url, |m| matches!(m, WindowMessage::Logout(_)))
            .await;
        self.forget();
        outcome.map(|_| ())
    }

    /// Forgets the stored credential without contacting any service
    pub fn forget(&self) {
        self.store.clear();
        tracing::debug!("forgot stored credential");
    }

    async fn probe(&self, resource: &str) -> Result<ProbeDetail, AccessError> {
        let credential = self.store.get();
        let result = self
            .prober
            .probe(&self.config.probe_url, resource, credential.as_deref())
            .await?;
        Ok(result.detail)
    }

    async fn collect_credential(&self, service: &AccessServiceDescriptor) -> Result<(), AccessError> {
        let access_url = Url::parse(&service.id).map_err(|error| {
            tracing::debug!(%error, id = %service.id, "access service id is not a URL");
            AccessError::NoAccessService
        })?;

        let message_id = MessageId::generate()?;
        let url = Handshake::new(message_id.clone(), self.config.own_origin.clone())
            .attach_to(access_url);

        match self.await_window(&url, |m| m.answers(&message_id)).await? {
            WindowMessage::Token(message) => {
                tracing::info!(
                    %message_id,
                    expires_in = message.expires_in,
                    "received credential"
                );
                self.store.set(message.access_token);
                Ok(())
            }
            WindowMessage::Denied(message) => Err(AccessError::Declined {
                reason: message.error,
            }),
            // carries no message id, so never answers an attempt
            WindowMessage::Logout(_) => Err(AccessError::WindowClosed),
        }
    }

    async fn await_window<F>(&self, url: &Url, accept: F) -> Result<WindowMessage, AccessError>
    where
        F: Fn(&WindowMessage) -> bool + Send + Sync,
    {
        let mut listener = self.channel.listen();
        let Some(mut window) = self.opener.open(url, &self.channel) else {
            tracing::warn!(%url, "service window was blocked");
            return Err(AccessError::PopupBlocked);
        };

        let outcome = time::timeout(
            self.config.wait,
            next_answer(&mut listener, &window, self.config.close_poll, &accept),
        )
        .await;

        window.close();
        drop(listener);

        match outcome {
            Ok(Answer::Message(message)) => Ok(message),
            Ok(Answer::Closed) => Err(AccessError::WindowClosed),
            Err(_) => {
                tracing::debug!(wait = ?self.config.wait, "service window did not answer in time");
                Err(AccessError::TimedOut)
            }
        }
    }
}

async fn next_answer<W, F>(
    listener: &mut Listener,
    window: &W,
    close_poll: Option<Duration>,
    accept: &F,
) -> Answer
where
    W: ChildWindow,
    F: Fn(&WindowMessage) -> bool,
{
    let closed = window_closed(window, close_poll);
    tokio::pin!(closed);

    loop {
        tokio::select! {
            envelope = listener.recv() => match envelope {
                Some(envelope) if accept(&envelope.data) => return Answer::Message(envelope.data),
                Some(envelope) => {
                    tracing::trace!(source = %envelope.source, "ignoring message for another attempt");
                }
                None => return Answer::Closed,
            },
            () = &mut closed => return Answer::Closed,
        }
    }
}

async fn window_closed<W: ChildWindow>(window: &W, poll: Option<Duration>) {
    let Some(period) = poll else {
        return future::pending().await;
    };

    let mut interval = time::interval(period);
    loop {
        interval.tick().await;
        if window.is_closed() {
            return;
        }
    }
}
