//! Builders shared by the annotation tests.

use teplo_ir::{Arena, BinOp, NodeId, NodeKind, Pos};
use teplo_profile::{LineEntry, Location, Profile, Sample};

pub fn name(arena: &mut Arena, ident: &str) -> NodeId {
    arena.alloc(NodeKind::Name { ident: ident.into() }, Pos::line(0))
}

pub fn lit(arena: &mut Arena, repr: &str) -> NodeId {
    arena.alloc(NodeKind::Lit { repr: repr.into() }, Pos::line(0))
}

pub fn bin(arena: &mut Arena, op: BinOp, lhs: NodeId, rhs: NodeId, line: u32) -> NodeId {
    arena.alloc(NodeKind::Binary { op, lhs, rhs }, Pos::line(line))
}

pub fn assign(arena: &mut Arena, lhs: NodeId, rhs: NodeId, line: u32) -> NodeId {
    arena.alloc(NodeKind::Assign { lhs, rhs }, Pos::line(line))
}

pub fn add_assign(arena: &mut Arena, lhs: NodeId, rhs: NodeId, line: u32) -> NodeId {
    arena.alloc(NodeKind::OpAssign { op: BinOp::Add, lhs, rhs }, Pos::line(line))
}

pub fn call(arena: &mut Arena, callee: &str, args: Vec<NodeId>, line: u32) -> NodeId {
    let callee = name(arena, callee);
    arena.alloc(NodeKind::Call { callee, args }, Pos::line(line))
}

pub fn ret(arena: &mut Arena, results: Vec<NodeId>, line: u32) -> NodeId {
    arena.alloc(NodeKind::Return { results }, Pos::line(line))
}

pub fn if_stmt(
    arena: &mut Arena,
    cond: NodeId,
    body: Vec<NodeId>,
    else_: Vec<NodeId>,
    line: u32,
) -> NodeId {
    arena.alloc(NodeKind::If { cond, body, else_ }, Pos::line(line))
}

pub fn for_stmt(
    arena: &mut Arena,
    init: Option<NodeId>,
    cond: Option<NodeId>,
    body: Vec<NodeId>,
    post: Option<NodeId>,
    line: u32,
) -> NodeId {
    arena.alloc(NodeKind::For { init, cond, body, post }, Pos::line(line))
}

/// One sample with the given cumulative value; each `(function, line)` pair
/// becomes its own stack location.
pub fn sample(cumulative: i64, frames: &[(&str, u32)]) -> Sample {
    Sample {
        values: vec![1, cumulative],
        stack: frames
            .iter()
            .map(|&(function, line)| Location {
                lines: vec![LineEntry { function: function.into(), line }],
            })
            .collect(),
    }
}

pub fn profile(samples: Vec<Sample>) -> Profile {
    Profile { samples }
}
