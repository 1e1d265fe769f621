// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Status line and cancel flag shared with the front end.
//!
//! The worker writes, the front end reads. Status is a single overwritten
//! string, there is no queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::info;

/// Latest human readable status
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    text: Arc<Mutex<String>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, message: impl Into<String>) {
        let message = message.into();
        info!(status = %message);
        let mut text = self.text.lock().unwrap_or_else(|e| e.into_inner());
        *text = message;
    }

    pub fn get(&self) -> String {
        self.text.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Cooperative cancel flag, polled at the top of each channel pass
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub(crate) fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// What the front end holds while the worker runs
#[derive(Debug, Clone, Default)]
pub struct SequencerHandle {
    pub(crate) status: StatusBoard,
    pub(crate) cancel: CancelToken,
}

impl SequencerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect before the next channel.
    pub fn cancel(&self) {
        info!("cancel requested");
        self.cancel.cancel();
    }

    pub fn status(&self) -> String {
        self.status.get()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_overwrites() {
        let board = StatusBoard::new();
        assert_eq!(board.get(), "");
        board.set("Recording...");
        board.set("End of Recording");
        assert_eq!(board.get(), "End of Recording");
    }

    #[test]
    fn test_status_shared_between_clones() {
        let board = StatusBoard::new();
        let reader = board.clone();
        std::thread::spawn(move || board.set("Sequence started"))
            .join()
            .unwrap();
        assert_eq!(reader.get(), "Sequence started");
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        let remote = token.clone();
        assert!(!token.is_cancelled());
        remote.cancel();
        assert!(token.is_cancelled());
        token.reset();
        assert!(!remote.is_cancelled());
    }
}
