// In-process broadcast fabric
//
// Every registered node gets an inbox; a broadcast encodes the message once
// and delivers the same bytes to every inbox except the sender's. Receivers
// decode their own copy, so no node shares memory with a peer's view of a
// transaction or block.

use std::collections::HashMap;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::network::Message;

/// A frame delivered to a node's inbox
#[derive(Debug, Clone)]
pub struct Delivery {
    pub from: String,
    pub bytes: Vec<u8>,
}

/// Broadcast fabric connecting every registered node to every other
#[derive(Default)]
pub struct Network {
    inboxes: HashMap<String, UnboundedSender<Delivery>>,
}

impl Network {
    /// Create an empty fabric
    pub fn new() -> Self {
        Self {
            inboxes: HashMap::new(),
        }
    }

    /// Register a node and hand back its inbox
    pub fn register(&mut self, id: &str) -> UnboundedReceiver<Delivery> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.inboxes.insert(id.to_string(), sender);
        receiver
    }

    /// Deliver a message to every registered node except the sender
    pub fn broadcast(&self, from: &str, message: &Message) {
        let bytes = message.encode();
        for (id, inbox) in &self.inboxes {
            if id == from {
                continue;
            }
            let delivery = Delivery {
                from: from.to_string(),
                bytes: bytes.clone(),
            };
            if inbox.send(delivery).is_err() {
                log::warn!("inbox of {} is closed, dropping delivery", id);
            }
        }
    }

    /// Number of registered nodes
    pub fn peer_count(&self) -> usize {
        self.inboxes.len()
    }
}
