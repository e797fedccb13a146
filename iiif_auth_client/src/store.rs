//! Where the client keeps its active credential

use std::sync::Arc;

use iiif_auth_token::AccessToken;
use tokio::sync::watch;

/// A shared cell holding the active credential
///
/// Only a successful access attempt and an explicit sign-out write to the
/// store. Every write notifies subscribers, so other parts of an interface
/// can follow the sign-in state.
pub trait CredentialStore: Send + Sync {
    /// The active credential, if any
    fn get(&self) -> Option<AccessToken>;

    /// Replaces the active credential
    fn set(&self, token: AccessToken);

    /// Forgets the active credential
    fn clear(&self);

    /// A receiver that observes every change to the active credential
    fn subscribe(&self) -> watch::Receiver<Option<AccessToken>>;
}

/// A credential store that lives as long as the process
#[derive(Clone, Debug)]
pub struct InMemoryCredentialStore {
    cell: Arc<watch::Sender<Option<AccessToken>>>,
}

impl InMemoryCredentialStore {
    /// Constructs an empty store
    pub fn new() -> Self {
        let (cell, _) = watch::channel(None);
        Self {
            cell: Arc::new(cell),
        }
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn get(&self) -> Option<AccessToken> {
        self.cell.borrow().clone()
    }

    fn set(&self, token: AccessToken) {
        self.cell.send_replace(Some(token));
    }

    fn clear(&self) {
        self.cell.send_if_modified(|current| current.take().is_some());
    }

    fn subscribe(&self) -> watch::Receiver<Option<AccessToken>> {
        self.cell.subscribe()
    }
}
