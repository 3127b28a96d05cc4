// CLI commands

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::core::{Block, ChainParams};
use crate::network::{Network, Node, NodeHandle, StateReport};
use crate::wallet::Keystore;

#[derive(Parser)]
#[command(name = "simcoin")]
#[command(about = "Multi-node UTXO ledger simulation", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the three-node broadcast scenario
    Demo {
        /// Leading zero hex digits a block hash must carry
        #[arg(short, long, default_value_t = 3)]
        difficulty: usize,

        /// Coins a mined block grants its miner
        #[arg(short, long, default_value_t = 50)]
        reward: u64,
    },

    /// Mine a chain on a single node, no peers involved
    Solo {
        /// Leading zero hex digits a block hash must carry
        #[arg(short, long, default_value_t = 3)]
        difficulty: usize,

        /// Coins a mined block grants its miner
        #[arg(short, long, default_value_t = 50)]
        reward: u64,

        /// Number of blocks to mine
        #[arg(short, long, default_value_t = 3)]
        blocks: u32,
    },
}

/// Run a parsed command to completion
pub async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Demo { difficulty, reward } => run_demo(difficulty, reward).await,
        Commands::Solo {
            difficulty,
            reward,
            blocks,
        } => run_solo(difficulty, reward, blocks),
    }
}

/// Poll node reports until `done` approves them or the wait times out
async fn wait_for<F>(handles: &[NodeHandle], mut done: F, what: &str) -> Result<(), String>
where
    F: FnMut(&[StateReport]) -> bool,
{
    for _ in 0..200 {
        let mut reports = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.report().await {
                Some(report) => reports.push(report),
                None => return Err(format!("a node task exited while waiting for {}", what)),
            }
        }
        if done(&reports) {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    Err(format!("timed out waiting for {}", what))
}

/// Three nodes on one broadcast fabric: a payment spreads to every mempool,
/// the miner confirms it, and the block brings every node to the same tip.
async fn run_demo(difficulty: usize, reward: u64) -> Result<(), String> {
    let mut alice_keystore = Keystore::new();
    let alice_address = alice_keystore.new_address();
    let params =
        ChainParams::new(difficulty, reward).with_allocation(alice_address.clone(), 100);
    let genesis = Block::genesis(&params);

    let mut network = Network::new();
    let alice_inbox = network.register("alice");
    let bob_inbox = network.register("bob");
    let miner_inbox = network.register("miner");
    let network = Arc::new(network);

    let handles = [
        NodeHandle::spawn(
            Node::with_keystore("alice", alice_keystore, params.clone(), genesis.clone()),
            alice_inbox,
            network.clone(),
        ),
        NodeHandle::spawn(
            Node::new("bob", params.clone(), genesis.clone()),
            bob_inbox,
            network.clone(),
        ),
        NodeHandle::spawn(Node::new("miner", params, genesis), miner_inbox, network),
    ];
    let [alice, bob, miner] = &handles;

    println!("three nodes share a genesis block granting alice 100 coins");
    println!("alice pays bob 60 with a fee of 5");
    alice.send_payment(bob.address.clone(), 60, 5);

    wait_for(
        &handles,
        |reports| reports.iter().all(|report| report.mempool_len == 1),
        "the payment to reach every mempool",
    )
    .await?;
    println!("every node holds the payment in its mempool");

    println!("the miner starts a proof-of-work round at difficulty {}", difficulty);
    miner.mine();

    wait_for(
        &handles,
        |reports| {
            reports
                .iter()
                .all(|report| report.chain_len == 2 && report.mempool_len == 0)
                && reports.iter().all(|report| report.tip == reports[0].tip)
        },
        "the block to reach every chain",
    )
    .await?;
    println!("the mined block was adopted by every node");

    for handle in handles {
        let node = handle.stop().await.ok_or("a node task panicked")?;
        node.log_state();
        println!(
            "  {:<5} height {}  balance {:>3}  tip {}",
            node.id,
            node.chain_height(),
            node.balance(),
            node.tip_hash()
        );
    }

    Ok(())
}

/// One node paying its own second address and mining each payment into a
/// block, no fabric involved
fn run_solo(difficulty: usize, reward: u64, blocks: u32) -> Result<(), String> {
    let mut keystore = Keystore::new();
    let primary = keystore.new_address();
    let params = ChainParams::new(difficulty, reward).with_allocation(primary, 100);

    let genesis = Block::genesis(&params);
    let mut node = Node::with_keystore("solo", keystore, params, genesis);
    let savings = node.new_address();

    let abort = AtomicBool::new(false);
    for round in 1..=blocks {
        node.send(&savings, 10, 1).map_err(|e| e.to_string())?;
        let block = node
            .mine_block(&abort)
            .ok_or("the proof-of-work search returned nothing")?;
        println!(
            "round {}: mined block {} at height {}",
            round,
            block.hash(),
            block.header.height
        );
    }

    node.log_state();
    println!(
        "final: height {}  primary balance {}  savings balance {}",
        node.chain_height(),
        node.balance(),
        node.balance_of(&savings)
    );

    Ok(())
}
