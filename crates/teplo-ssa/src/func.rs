//! The lowered block/value model.

use teplo_core::Counter;
use teplo_ir::Pos;

/// Stable block identity; survives reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// Value opcodes the counter transfer distinguishes; everything else is
/// `Plain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    Phi,
    /// Out-of-bounds trap; its block is cold by construction.
    PanicBounds,
    StaticCall { callee: String },
    StaticLeCall { callee: String },
    Plain,
}

/// One SSA value: opcode plus the source position it was lowered from.
#[derive(Debug, Clone)]
pub struct Value {
    pub kind: ValueKind,
    pub pos: Pos,
}

impl Value {
    pub fn plain(line: u32) -> Self {
        Self { kind: ValueKind::Plain, pos: Pos::line(line) }
    }

    pub fn call(callee: impl Into<String>, line: u32) -> Self {
        Self {
            kind: ValueKind::StaticCall { callee: callee.into() },
            pos: Pos::line(line),
        }
    }
}

/// A basic block: values, successor edges and the counter slot the transfer
/// pass fills.
#[derive(Debug, Clone)]
pub struct Block {
    pub id: BlockId,
    pub values: Vec<Value>,
    pub succs: Vec<BlockId>,
    pub preds: Vec<BlockId>,
    pub counter: Counter,
}

/// A lowered function: blocks in their current emission order.
#[derive(Debug, Clone)]
pub struct SsaFunc {
    pub name: String,
    pub blocks: Vec<Block>,
    pub entry: BlockId,
}

impl SsaFunc {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocks: Vec::new(),
            entry: BlockId(0),
        }
    }

    pub fn add_block(&mut self, values: Vec<Value>) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(Block {
            id,
            values,
            succs: Vec::new(),
            preds: Vec::new(),
            counter: 0,
        });
        if self.blocks.len() == 1 {
            self.entry = id;
        }
        id
    }

    /// Add a control edge, keeping both adjacency lists in sync.
    pub fn add_edge(&mut self, from: BlockId, to: BlockId) {
        if let Some(i) = self.position_of(from) {
            self.blocks[i].succs.push(to);
        }
        if let Some(i) = self.position_of(to) {
            self.blocks[i].preds.push(from);
        }
    }

    /// Current position of `id` in the emission order.
    pub fn position_of(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == id)
    }

    pub fn block(&self, id: BlockId) -> &Block {
        let idx = self.position_of(id).expect("unknown block id");
        &self.blocks[idx]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut Block {
        let idx = self.position_of(id).expect("unknown block id");
        &mut self.blocks[idx]
    }

    /// The block order as ids, for assertions and dumps.
    pub fn order(&self) -> Vec<BlockId> {
        self.blocks.iter().map(|b| b.id).collect()
    }
}
