// Block chain

use crate::core::{Block, BlockHeader, Hash256};

/// Linear chain of accepted blocks, genesis first, append-only
///
/// There is no fork resolution: a block either extends the tip or was
/// rejected before reaching `push`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    blocks: Vec<Block>,
}

impl Chain {
    /// Start a chain from its genesis block
    pub fn new(genesis: Block) -> Self {
        Self {
            blocks: vec![genesis],
        }
    }

    /// The newest accepted block
    pub fn tip(&self) -> &Block {
        self.blocks.last().expect("chain always holds genesis")
    }

    pub fn tip_header(&self) -> &BlockHeader {
        &self.tip().header
    }

    pub fn tip_hash(&self) -> Hash256 {
        self.tip().hash()
    }

    /// Height of the tip, genesis is 0
    pub fn height(&self) -> u64 {
        self.tip().header.height
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn get(&self, height: u64) -> Option<&Block> {
        self.blocks.get(height as usize)
    }

    /// Append a validated block extending the tip
    pub fn push(&mut self, block: Block) {
        debug_assert_eq!(
            block.header.previous_hash,
            self.tip_hash(),
            "pushed block does not extend the tip"
        );
        self.blocks.push(block);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }
}
