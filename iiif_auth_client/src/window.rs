//! Opening and closing service windows

use url::Url;

use crate::MessageChannel;

/// Opens service windows on behalf of the orchestrator
///
/// A real implementation wraps whatever the host offers for pop-up
/// windows. The opened window posts its messages back through `opener`.
pub trait WindowOpener: Send + Sync {
    /// The handle to an opened window
    type Window: ChildWindow;

    /// Opens `url` in a new window
    ///
    /// Returns `None` when the host refused to open the window, such as when
    /// a pop-up blocker intervened.
    fn open(&self, url: &Url, opener: &MessageChannel) -> Option<Self::Window>;
}

/// A window opened by a [`WindowOpener`]
///
/// The handle is held exclusively by the attempt that opened it.
pub trait ChildWindow: Send + Sync {
    /// Closes the window; closing an already closed window does nothing
    fn close(&mut self);

    /// Whether the window has been closed, by the user or otherwise
    fn is_closed(&self) -> bool;
}
