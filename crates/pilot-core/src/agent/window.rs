use std::collections::VecDeque;

use super::wire::Message;

/// Bounded, ordered buffer of exchanged messages.
///
/// Insertion appends; overflow evicts the oldest entry, so the window always
/// holds the most recent `capacity` messages in their original relative
/// order. Accessed only by the owning session between batches.
#[derive(Debug, Clone)]
pub struct ConversationWindow {
    messages: VecDeque<Message>,
    capacity: usize,
}

impl ConversationWindow {
    pub const DEFAULT_CAPACITY: usize = 10;

    pub fn new(capacity: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push_back(message);
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
    }

    /// The current ordered sequence, cloned for transmission.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }
}

impl Default for ConversationWindow {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
