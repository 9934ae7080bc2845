//! Types shared between the startup core and the application shell.
//!
//! The startup core never touches UI objects directly. Anything that crosses
//! from the control thread to the UI-owning thread goes through the types in
//! this crate:
//! - Result payloads produced during preload and surfaced after the main
//!   window is shown ([`results`]).
//! - User-visible notification payloads ([`notification`]).
//! - Loading progress, pushed over a bounded [`tokio::sync::mpsc`] channel
//!   wrapped in [`ProgressSender`] / [`ProgressReceiver`].

pub mod config;
pub mod notification;
pub mod results;

use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};

/// A single progress step reported while the loading window is visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// One-based index of the step that just started.
    pub current: u32,
    /// Total number of steps in the current operation.
    pub total: u32,
    /// Human-readable description of the step.
    pub message: String,
}

/// Sending half of the loading progress channel, held by the control thread.
///
/// Reporting never waits on the UI: when the receiver lags behind and the
/// buffer is full, the update is dropped.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: Sender<ProgressUpdate>,
}

impl ProgressSender {
    /// Reports progress without blocking. Returns `false` if the update was
    /// dropped because the buffer is full or the receiver is gone.
    pub fn report(&self, current: u32, total: u32, message: impl Into<String>) -> bool {
        let update = ProgressUpdate {
            current,
            total,
            message: message.into(),
        };
        match self.tx.try_send(update) {
            Ok(()) => true,
            Err(TrySendError::Full(_) | TrySendError::Closed(_)) => false,
        }
    }
}

/// Receiving half of the loading progress channel, handed to the loading
/// window which applies updates on the UI thread.
#[derive(Debug)]
pub struct ProgressReceiver {
    rx: Receiver<ProgressUpdate>,
}

impl ProgressReceiver {
    /// Waits for the next update. Returns `None` once every sender is dropped.
    pub async fn recv(&mut self) -> Option<ProgressUpdate> {
        self.rx.recv().await
    }

    /// Takes the next update if one is already buffered.
    pub fn try_recv(&mut self) -> Option<ProgressUpdate> {
        self.rx.try_recv().ok()
    }
}

/// Creates a bounded progress channel with the given buffer capacity.
pub fn progress_channel(buffer: usize) -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    (ProgressSender { tx }, ProgressReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_drops_updates_when_buffer_is_full() {
        let (tx, mut rx) = progress_channel(1);
        assert!(tx.report(1, 2, "first"));
        assert!(!tx.report(2, 2, "second"));

        let update = rx.try_recv().expect("first update should be buffered");
        assert_eq!(update.message, "first");
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn report_returns_false_once_receiver_is_gone() {
        let (tx, rx) = progress_channel(4);
        drop(rx);
        assert!(!tx.report(1, 1, "orphaned"));
    }

    #[tokio::test]
    async fn recv_ends_when_all_senders_drop() {
        let (tx, mut rx) = progress_channel(4);
        tx.report(1, 1, "only");
        drop(tx);

        assert_eq!(rx.recv().await.map(|update| update.current), Some(1));
        assert_eq!(rx.recv().await, None);
    }
}
