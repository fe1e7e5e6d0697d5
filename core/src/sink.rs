//! Where decoded messages go
//!
//! The decoder only knows the `MessageSink` trait; closures, channels and a
//! polling queue are provided.

use log::warn;
use std::collections::VecDeque;
use std::sync::mpsc::Sender;
use std::sync::{Mutex, PoisonError};

/// Receives each decoded, non-empty message exactly once
pub trait MessageSink: Send + Sync {
    fn on_message(&self, text: String);
}

impl<F> MessageSink for F
where
    F: Fn(String) + Send + Sync,
{
    fn on_message(&self, text: String) {
        self(text)
    }
}

/// Forwards messages into an mpsc channel
pub struct ChannelSink {
    sender: Mutex<Sender<String>>,
}

impl ChannelSink {
    pub fn new(sender: Sender<String>) -> Self {
        Self {
            sender: Mutex::new(sender),
        }
    }
}

impl MessageSink for ChannelSink {
    fn on_message(&self, text: String) {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        if sender.send(text).is_err() {
            warn!("Decoded message dropped: receiver disconnected");
        }
    }
}

/// FIFO of decoded messages for consumers that poll
#[derive(Debug, Default)]
pub struct MessageQueue {
    messages: Mutex<VecDeque<String>>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pop(&self) -> Option<String> {
        self.lock().pop_front()
    }

    pub fn drain(&self) -> Vec<String> {
        self.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<String>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MessageSink for MessageQueue {
    fn on_message(&self, text: String) {
        self.lock().push_back(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_closure_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |text: String| seen.lock().unwrap().push(text);
        sink.on_message("one".into());
        sink.on_message("two".into());
        assert_eq!(*seen.lock().unwrap(), vec!["one", "two"]);
    }

    #[test]
    fn test_channel_sink() {
        let (tx, rx) = mpsc::channel();
        let sink = ChannelSink::new(tx);
        sink.on_message("hello".into());
        assert_eq!(rx.recv().unwrap(), "hello");

        drop(rx);
        // A gone receiver is logged, not fatal.
        sink.on_message("lost".into());
    }

    #[test]
    fn test_message_queue_is_fifo() {
        let queue = MessageQueue::new();
        assert!(queue.is_empty());
        queue.on_message("a".into());
        queue.on_message("b".into());
        queue.on_message("c".into());
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop().as_deref(), Some("a"));
        assert_eq!(queue.drain(), vec!["b", "c"]);
        assert!(queue.pop().is_none());
    }
}
