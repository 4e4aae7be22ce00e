//! Exact maximum-weight Hamiltonian-path layout for small functions.
//!
//! Bitmask DP over `(visited set, last block)` starting at the entry block.
//! The objective is the plain sum of adjacent successor-edge weights, which
//! the DP maximizes exactly; at ten blocks or fewer the 2^n * n table is
//! cheap.

use crate::func::SsaFunc;

/// Compute the best block order as positional indices. The entry block
/// (index 0) always leads; blocks the best path never reached follow in
/// their original order.
pub(crate) fn layout_exact(f: &SsaFunc) -> Vec<usize> {
    let n = f.blocks.len();
    if n <= 1 {
        return (0..n).collect();
    }

    // Successor edge i -> j scored with the destination block's counter.
    let mut weight = vec![vec![0i64; n]; n];
    for (i, block) in f.blocks.iter().enumerate() {
        for succ in &block.succs {
            let Some(j) = f.position_of(*succ) else {
                continue;
            };
            if i != j {
                weight[i][j] = f.blocks[j].counter;
            }
        }
    }

    let states = 1usize << n;
    let mut dp = vec![vec![i64::MIN; n]; states];
    let mut parent = vec![vec![usize::MAX; n]; states];
    dp[1][0] = 0;

    let mut best = (1usize, 0usize);
    for set in 1..states {
        for last in 0..n {
            if dp[set][last] == i64::MIN {
                continue;
            }
            for next in 1..n {
                if set & (1 << next) != 0 {
                    continue;
                }
                let next_set = set | (1 << next);
                let candidate = dp[set][last] + weight[last][next];
                if candidate > dp[next_set][next] {
                    dp[next_set][next] = candidate;
                    parent[next_set][next] = last;
                }
            }
            if dp[set][last] > dp[best.0][best.1] {
                best = (set, last);
            }
        }
    }

    // Rebuild the best path from the parent links.
    let (mut set, mut last) = best;
    let mut path = Vec::new();
    while last != usize::MAX {
        path.push(last);
        let prev = parent[set][last];
        set &= !(1 << last);
        last = prev;
    }
    path.reverse();

    let mut placed = vec![false; n];
    for &i in &path {
        placed[i] = true;
    }
    let mut order = path;
    for (i, placed) in placed.into_iter().enumerate() {
        if !placed {
            order.push(i);
        }
    }
    order
}
