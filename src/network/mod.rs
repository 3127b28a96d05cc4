// Peer broadcast and the node runtime

mod actor;
mod fabric;
mod message;
mod node;

pub use actor::{Command, NodeHandle, StateReport};
pub use fabric::{Delivery, Network};
pub use message::{Message, MessageError};
pub use node::Node;
