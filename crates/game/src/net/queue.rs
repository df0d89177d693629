use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

/// FIFO handed across the network/simulation thread boundary.
pub fn queue<T>() -> (Producer<T>, Consumer<T>) {
    let (tx, rx) = mpsc::channel();
    (Producer(tx), Consumer(rx))
}

#[derive(Debug)]
pub struct Producer<T>(mpsc::Sender<T>);

impl<T> Producer<T> {
    /// Returns false once the consuming side is gone.
    pub fn push(&self, item: T) -> bool {
        self.0.send(item).is_ok()
    }
}

impl<T> Clone for Producer<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

#[derive(Debug)]
pub struct Consumer<T>(mpsc::Receiver<T>);

impl<T> Consumer<T> {
    /// Everything queued at the time of the call, oldest first.
    pub fn drain(&self) -> Vec<T> {
        self.0.try_iter().collect()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        match self.0.recv_timeout(timeout) {
            Ok(item) => Some(item),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}
