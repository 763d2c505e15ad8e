//! services/study/src/adapters/notifier.rs
//!
//! Implements the `Notifier` capability by queueing notices for the session
//! driver, which turns them into output events.

use study_core::ports::{Notice, Notifier};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

/// A notifier that forwards every notice into a channel.
#[derive(Clone)]
pub struct ChannelNotifier {
    tx: UnboundedSender<Notice>,
}

impl ChannelNotifier {
    /// Creates the notifier together with the receiving end of its channel.
    pub fn new() -> (Self, UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: &Notice) {
        info!(notice = %notice.message(), "Notice");
        if self.tx.send(notice.clone()).is_err() {
            debug!("Notice receiver dropped");
        }
    }
}
