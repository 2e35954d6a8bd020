use crate::error::ScenarioError;
use crate::network::{HostAddress, Message, MessageId};
use std::collections::VecDeque;

/// A host's bounded message store, FIFO-evicted on overflow.
#[derive(Debug)]
pub struct MessageBuffer {
    owner: HostAddress,
    capacity: u64,
    used: u64,
    messages: VecDeque<Message>,
}

impl MessageBuffer {
    pub fn new(owner: HostAddress, capacity: u64) -> Self {
        Self {
            owner,
            capacity,
            used: 0,
            messages: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.messages.iter().any(|m| m.id == id)
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn get_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    /// Messages in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn fits(&self, size: u64) -> bool {
        size <= self.capacity
    }

    /// Stores a message, evicting oldest-first until it fits. The evicted
    /// messages are returned so the caller can report the drops. A message
    /// larger than the whole buffer must be refused by the caller beforehand.
    pub fn insert(&mut self, message: Message) -> Result<Vec<Message>, ScenarioError> {
        if message.size > self.capacity {
            return Err(ScenarioError::BufferOverCapacity {
                host: self.owner,
                used: self.used + message.size,
                capacity: self.capacity,
            });
        }

        let mut evicted = Vec::new();
        while self.used + message.size > self.capacity {
            // Non-empty: used > 0 whenever the loop condition holds here
            let oldest = self.messages.pop_front().expect("buffer accounting broken");
            self.used -= oldest.size;
            evicted.push(oldest);
        }

        self.used += message.size;
        self.messages.push_back(message);
        Ok(evicted)
    }

    pub fn remove(&mut self, id: MessageId) -> Option<Message> {
        let position = self.messages.iter().position(|m| m.id == id)?;
        let message = self.messages.remove(position)?;
        self.used -= message.size;
        Some(message)
    }
}
