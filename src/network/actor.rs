// Tokio actors around nodes
//
// Each node runs on its own task and owns its state outright, so peers
// never share memory. Commands and deliveries arrive over channels. The
// proof-of-work search runs on the blocking pool behind an abort flag the
// task raises whenever a newly accepted block makes the search stale.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::consensus::{BlockError, pow};
use crate::core::{Address, Block, Hash256};
use crate::network::{Delivery, Message, Network, Node};

/// Instructions a running node accepts
pub enum Command {
    /// Build, sign, admit, and broadcast a payment
    Send { to: Address, amount: u64, fee: u64 },
    /// Mine the current mempool and broadcast the result
    Mine,
    /// Reply with a snapshot of the node's state
    Report { reply: oneshot::Sender<StateReport> },
    /// Stop the task and hand the node back
    Shutdown,
}

/// Snapshot of a node's externally visible state
#[derive(Debug, Clone)]
pub struct StateReport {
    pub id: String,
    pub address: Address,
    pub balance: u64,
    pub chain_len: usize,
    pub tip: Hash256,
    pub mempool_len: usize,
    pub utxo_len: usize,
}

/// Handle to a node running on its own task
pub struct NodeHandle {
    pub id: String,
    pub address: Address,
    commands: UnboundedSender<Command>,
    task: JoinHandle<Node>,
}

impl NodeHandle {
    /// Spawn a node onto its own task.
    ///
    /// `deliveries` is the inbox the fabric handed out when the node's id
    /// was registered; `network` is where the task broadcasts its own
    /// transactions and blocks.
    pub fn spawn(
        node: Node,
        deliveries: UnboundedReceiver<Delivery>,
        network: Arc<Network>,
    ) -> Self {
        let id = node.id.clone();
        let address = node.address();
        let (commands, commands_rx) = unbounded_channel();
        let task = tokio::spawn(run_node(node, commands_rx, deliveries, network));

        Self {
            id,
            address,
            commands,
            task,
        }
    }

    /// Ask the node to pay `amount` to `to`
    pub fn send_payment(&self, to: Address, amount: u64, fee: u64) {
        let _ = self.commands.send(Command::Send { to, amount, fee });
    }

    /// Ask the node to mine its mempool into a block
    pub fn mine(&self) {
        let _ = self.commands.send(Command::Mine);
    }

    /// Snapshot the node's state; None once the task is gone
    pub async fn report(&self) -> Option<StateReport> {
        let (reply, response) = oneshot::channel();
        self.commands.send(Command::Report { reply }).ok()?;
        response.await.ok()
    }

    /// Stop the task and take the node back
    pub async fn stop(self) -> Option<Node> {
        let _ = self.commands.send(Command::Shutdown);
        self.task.await.ok()
    }
}

/// Abort flag of the proof-of-work search currently on the blocking pool
type ActiveRound = Option<Arc<AtomicBool>>;

async fn run_node(
    mut node: Node,
    mut commands: UnboundedReceiver<Command>,
    mut deliveries: UnboundedReceiver<Delivery>,
    network: Arc<Network>,
) -> Node {
    let (mined, mut mined_rx) = unbounded_channel::<Option<Block>>();
    let mut round: ActiveRound = None;
    let mut mine_pending = false;

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                match command {
                    Command::Send { to, amount, fee } => match node.send(&to, amount, fee) {
                        Ok(transaction) => {
                            network.broadcast(&node.id, &Message::TransactionAnnounce { transaction });
                        }
                        Err(reason) => log::warn!("[{}] payment failed: {}", node.id, reason),
                    },
                    Command::Mine => {
                        mine_pending = true;
                        maybe_start_round(&node, &mut round, &mut mine_pending, &mined);
                    }
                    Command::Report { reply } => {
                        let _ = reply.send(state_report(&node));
                    }
                    Command::Shutdown => break,
                }
            }
            delivery = deliveries.recv() => {
                let Some(delivery) = delivery else { break };
                handle_delivery(&mut node, &mut round, delivery);
                maybe_start_round(&node, &mut round, &mut mine_pending, &mined);
            }
            result = mined_rx.recv() => {
                // The sender lives in this scope, so recv never yields None
                if let Some(result) = result {
                    round = None;
                    if let Some(block) = result {
                        match node.receive_block(block.clone()) {
                            Ok(()) => {
                                mine_pending = false;
                                network.broadcast(&node.id, &Message::BlockAnnounce { block });
                            }
                            Err(reason) => {
                                log::debug!("[{}] discarding mined block: {}", node.id, reason);
                            }
                        }
                    }
                    maybe_start_round(&node, &mut round, &mut mine_pending, &mined);
                }
            }
        }
    }

    // Stop any search still running before handing the node back
    if let Some(abort) = &round {
        abort.store(true, Ordering::Relaxed);
    }
    node
}

/// Start a proof-of-work round on the blocking pool if one is owed and none
/// is running. Clears the demand when the mempool has nothing to mine.
fn maybe_start_round(
    node: &Node,
    round: &mut ActiveRound,
    mine_pending: &mut bool,
    mined: &UnboundedSender<Option<Block>>,
) {
    if round.is_some() || !*mine_pending {
        return;
    }

    let Some(candidate) = node.build_candidate() else {
        log::debug!("[{}] nothing left to mine", node.id);
        *mine_pending = false;
        return;
    };

    let abort = Arc::new(AtomicBool::new(false));
    let worker_abort = abort.clone();
    let difficulty = node.params().difficulty;
    let results = mined.clone();

    let Block {
        header,
        transactions,
    } = candidate;

    tokio::task::spawn_blocking(move || {
        let block = pow::mine(header, difficulty, &worker_abort)
            .map(|header| Block::new(header, transactions));
        let _ = results.send(block);
    });

    *round = Some(abort);
}

/// Decode and apply one frame from a peer. An accepted block moves the tip,
/// so it also aborts any search running against the old one.
fn handle_delivery(node: &mut Node, round: &mut ActiveRound, delivery: Delivery) {
    let message = match Message::decode(&delivery.bytes) {
        Ok(message) => message,
        Err(reason) => {
            log::warn!(
                "[{}] dropping malformed frame from {}: {}",
                node.id,
                delivery.from,
                reason
            );
            return;
        }
    };

    match message {
        Message::TransactionAnnounce { transaction } => {
            node.receive_transaction(transaction);
        }
        Message::BlockAnnounce { block } => match node.receive_block(block) {
            Ok(()) => {
                if let Some(abort) = round {
                    abort.store(true, Ordering::Relaxed);
                }
            }
            Err(BlockError::NotContiguous) => {
                log::debug!(
                    "[{}] ignoring block from {} that does not extend the tip",
                    node.id,
                    delivery.from
                );
            }
            Err(reason) => {
                log::warn!(
                    "[{}] rejected block from {}: {}",
                    node.id,
                    delivery.from,
                    reason
                );
            }
        },
    }
}

fn state_report(node: &Node) -> StateReport {
    StateReport {
        id: node.id.clone(),
        address: node.address(),
        balance: node.balance(),
        chain_len: node.chain_len(),
        tip: node.tip_hash(),
        mempool_len: node.mempool_len(),
        utxo_len: node.utxo_len(),
    }
}
