//! Post-propagation integrity checks.
//!
//! Catches algorithm bugs, not bad profiles: a violation here means a
//! propagation pass wrote an inconsistent table. The driver runs this only
//! when block PGO is enabled.

use teplo_core::Counter;

use crate::func::Function;
use crate::node::{visit_list, Arena, NodeKind};

/// An inconsistency in a function's node-profile table.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CheckError {
    #[error("{func}: line {line}: if counter {total} below branch sum {body} + {else_count}")]
    IfBranchSum {
        func: String,
        line: u32,
        total: Counter,
        body: Counter,
        else_count: Counter,
    },

    #[error("{func}: line {line}: nil check carries counter {counter}")]
    NilCheckCounter {
        func: String,
        line: u32,
        counter: Counter,
    },
}

/// Verify the propagation invariants on one function.
///
/// For every `if`, the node's counter must cover the sum of its branch
/// heads; nil checks must stay at zero.
pub fn check_func(arena: &Arena, func: &Function) -> Result<(), CheckError> {
    let mut violation = None;
    visit_list(arena, &func.body, &mut |id| {
        if violation.is_some() {
            return;
        }
        match arena.kind(id) {
            NodeKind::If { body, else_, .. } => {
                let total = func.counters.get(id);
                let body_count = body.first().map(|&n| func.counters.get(n)).unwrap_or(0);
                let else_count = else_.first().map(|&n| func.counters.get(n)).unwrap_or(0);
                if total < body_count + else_count {
                    violation = Some(CheckError::IfBranchSum {
                        func: func.link_name.clone(),
                        line: arena.pos(id).line,
                        total,
                        body: body_count,
                        else_count,
                    });
                }
            }
            NodeKind::NilCheck { .. } => {
                let counter = func.counters.get(id);
                if counter != 0 {
                    violation = Some(CheckError::NilCheckCounter {
                        func: func.link_name.clone(),
                        line: arena.pos(id).line,
                        counter,
                    });
                }
            }
            _ => {}
        }
    });
    match violation {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
