//! In-process conversation memory.
//!
//! Message histories are keyed by an opaque thread identifier and live only
//! for the lifetime of the process. The store handle is cheap to clone and
//! is passed explicitly alongside the thread identifier, so independent
//! sessions can run in one process without sharing state by accident.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::models::message::Message;

#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    threads: Arc<Mutex<HashMap<String, Vec<Message>>>>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the message history for a thread, empty if the thread is new
    pub fn get(&self, thread_id: &str) -> Vec<Message> {
        self.threads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Replace the message history for a thread
    pub fn put(&self, thread_id: &str, messages: Vec<Message>) {
        self.threads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(thread_id.to_string(), messages);
    }

    /// Number of messages recorded for a thread
    pub fn len(&self, thread_id: &str) -> usize {
        self.threads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(thread_id)
            .map_or(0, Vec::len)
    }

    pub fn is_empty(&self, thread_id: &str) -> bool {
        self.len(thread_id) == 0
    }
}
