// Broadcast message types

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::codec;
use crate::core::{Block, Transaction};

/// Reasons an incoming frame cannot be decoded
#[derive(Debug, Error)]
pub enum MessageError {
    /// Frame is not an encoding of any known message
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Messages nodes broadcast to their peers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Message {
    /// A freshly signed transaction for mempool admission
    TransactionAnnounce { transaction: Transaction },
    /// A freshly mined block for chain extension
    BlockAnnounce { block: Block },
}

impl Message {
    /// Canonical bytes of this message, the form put on the wire
    pub fn encode(&self) -> Vec<u8> {
        codec::canonical_bytes(self)
    }

    /// Decode a frame received from a peer
    pub fn decode(bytes: &[u8]) -> Result<Self, MessageError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
