//! Tower: ordered, height-bounded stack of landed blocks.

use crate::stepper::BlockColor;
use thiserror::Error;

/// A placed or falling block. Coordinates are world units, y-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: BlockColor,
}

#[derive(Debug, Error)]
pub enum TowerError {
    /// The tower lost its seed block; a lifecycle/reset bug, not a
    /// recoverable game situation.
    #[error("tower has no blocks (seeding invariant broken)")]
    Empty,
}

/// Insertion order is landing order, oldest first. `len() <= capacity`
/// always holds: an overflowing append evicts the oldest block and shifts
/// the survivors down one block-height, keeping the stack contiguous.
#[derive(Debug, Clone)]
pub struct Tower {
    blocks: Vec<Block>,
    capacity: usize,
}

impl Tower {
    /// New tower seeded with a single base block.
    pub fn new(capacity: usize, seed: Block) -> Self {
        Self {
            blocks: vec![seed],
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Add a landed block on top. Evicts the oldest block when the window
    /// is exceeded, shifting every survivor down by the evicted height.
    pub fn append(&mut self, block: Block) {
        self.blocks.push(block);
        if self.blocks.len() > self.capacity {
            let evicted = self.blocks.remove(0);
            for b in &mut self.blocks {
                b.y -= evicted.height;
            }
        }
    }

    /// Shift every block horizontally; the per-tick tower sway.
    pub fn apply_offset(&mut self, dx: f64) {
        for b in &mut self.blocks {
            b.x += dx;
        }
    }

    /// Landing reference: the top-of-tower block. Errors only if the
    /// seeding invariant was broken.
    pub fn top(&self) -> Result<&Block, TowerError> {
        self.blocks.last().ok_or(TowerError::Empty)
    }
}
