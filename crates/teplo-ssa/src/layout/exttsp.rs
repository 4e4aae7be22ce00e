//! ExtTSP chain-merging layout.
//!
//! Scores an ordering by how jumps land: exact fallthroughs count full
//! weight, near forward/backward jumps a distance-scaled fraction, far
//! jumps nothing. Every block starts as a singleton chain; the passes then
//! concatenate fallthrough runs, greedily merge hot chain pairs while the
//! objective improves, glue cold neighbors, and emit the chains by density.
//!
//! Chains and inter-chain edges live in index arenas; a merge moves the
//! absorbed chain's blocks and edges into the survivor and leaves an empty
//! husk behind, so block-to-chain links never dangle.

use std::collections::HashMap;

use teplo_core::LayoutConfig;

use crate::func::{SsaFunc, ValueKind};

type ChainId = usize;
type EdgeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MergeType {
    /// ChainPred then ChainSucc.
    XY,
    /// ChainPred split at the offset, ChainSucc between the halves.
    X1YX2,
    /// ChainSucc, then the second half, then the first half.
    YX2X1,
    /// The second half, the first half, then ChainSucc.
    X2X1Y,
}

#[derive(Debug, Clone, Copy)]
struct MergeGain {
    score: f64,
    offset: usize,
    ty: MergeType,
}

impl MergeGain {
    fn none() -> Self {
        Self {
            score: -1.0,
            offset: 0,
            ty: MergeType::XY,
        }
    }

    /// EPS-gated comparison: `other` wins only when its score is positive
    /// and beats this one by more than the epsilon.
    fn is_less_than(&self, other: MergeGain, eps: f64) -> bool {
        other.score > eps && other.score > self.score + eps
    }
}

/// One observed jump between blocks (positional indices). The weight is the
/// source block's counter; no per-edge counts exist in this pipeline.
#[derive(Debug, Clone, Copy)]
struct Jump {
    src: usize,
    dst: usize,
    weight: u64,
}

/// Mutable per-block layout state.
struct BlockNode {
    /// Position in the entry-normalized input order; 0 is the entry.
    index: usize,
    size: u64,
    exec: u64,
    chain: ChainId,
    chain_index: usize,
    fallthrough_succ: Option<usize>,
    fallthrough_pred: Option<usize>,
    out_jumps: Vec<(usize, u64)>,
    in_weight: u64,
    out_weight: u64,
}

/// An ordered run of blocks. Cleared to an empty husk when absorbed.
struct Chain {
    id: ChainId,
    is_entry: bool,
    exec: u64,
    size: u64,
    score: f64,
    blocks: Vec<usize>,
    /// Adjacent chains and the shared edge.
    edges: Vec<(ChainId, EdgeId)>,
}

impl Chain {
    fn density(&self) -> f64 {
        self.exec as f64 / self.size as f64
    }
}

/// Aggregated jumps between two chains, with the merge-gain cache. The
/// forward cache answers gains with `src` as the predecessor, the backward
/// cache the reverse orientation.
struct Edge {
    src: ChainId,
    dst: ChainId,
    jumps: Vec<Jump>,
    cached_forward: Option<MergeGain>,
    cached_backward: Option<MergeGain>,
}

impl Edge {
    fn cached_gain(&self, pred: ChainId) -> Option<MergeGain> {
        if pred == self.src {
            self.cached_forward
        } else {
            self.cached_backward
        }
    }

    fn set_cached_gain(&mut self, pred: ChainId, gain: MergeGain) {
        if pred == self.src {
            self.cached_forward = Some(gain);
        } else {
            self.cached_backward = Some(gain);
        }
    }

    fn invalidate(&mut self) {
        self.cached_forward = None;
        self.cached_backward = None;
    }

    fn change_endpoint(&mut self, from: ChainId, to: ChainId) {
        if self.src == from {
            self.src = to;
        }
        if self.dst == from {
            self.dst = to;
        }
    }

    /// Record a jump unless the (src, dst) pair is already present.
    fn append_jump(&mut self, jump: Jump) {
        if !self
            .jumps
            .iter()
            .any(|j| j.src == jump.src && j.dst == jump.dst)
        {
            self.jumps.push(jump);
        }
    }
}

/// Lay out `f` and return the new order as positional indices.
pub(crate) fn layout(f: &SsaFunc, config: &LayoutConfig) -> Vec<usize> {
    ExtTsp::new(f, config).run()
}

struct ExtTsp<'a> {
    config: &'a LayoutConfig,
    /// Successor lists as positional indices, in CFG order.
    cfg_succs: Vec<Vec<usize>>,
    blocks: Vec<BlockNode>,
    chains: Vec<Chain>,
    edges: Vec<Edge>,
    /// Live hot chains; shrinks as merges retire chains.
    hot: Vec<ChainId>,
}

impl<'a> ExtTsp<'a> {
    fn new(f: &SsaFunc, config: &'a LayoutConfig) -> Self {
        let n = f.blocks.len();
        let position: HashMap<_, _> = f
            .blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.id, i))
            .collect();
        let cfg_succs: Vec<Vec<usize>> = f
            .blocks
            .iter()
            .map(|b| {
                b.succs
                    .iter()
                    .filter_map(|s| position.get(s).copied())
                    .collect()
            })
            .collect();

        let mut blocks: Vec<BlockNode> = f
            .blocks
            .iter()
            .enumerate()
            .map(|(i, b)| BlockNode {
                index: i,
                size: code_size(b),
                exec: b.counter.max(0) as u64,
                chain: i,
                chain_index: 0,
                fallthrough_succ: None,
                fallthrough_pred: None,
                out_jumps: Vec::new(),
                in_weight: 0,
                out_weight: 0,
            })
            .collect();

        // Jump records; the weight approximation is the source block's
        // counter.
        for i in 0..n {
            let count = f.blocks[i].counter.max(0) as u64;
            if count == 0 {
                continue;
            }
            for &j in &cfg_succs[i] {
                if j == i {
                    continue;
                }
                blocks[i].out_jumps.push((j, count));
                blocks[i].out_weight += count;
                blocks[j].in_weight += count;
            }
        }

        // A block executed at least as often as anything flowing through it.
        for block in &mut blocks {
            block.exec = block.exec.max(block.in_weight).max(block.out_weight);
        }

        let chains: Vec<Chain> = blocks
            .iter()
            .enumerate()
            .map(|(i, b)| Chain {
                id: i,
                is_entry: i == 0,
                exec: b.exec,
                size: b.size,
                score: 0.0,
                blocks: vec![i],
                edges: Vec::new(),
            })
            .collect();
        let hot = chains
            .iter()
            .filter(|c| c.exec > config.cold_threshold)
            .map(|c| c.id)
            .collect();

        let mut this = Self {
            config,
            cfg_succs,
            blocks,
            chains,
            edges: Vec::new(),
            hot,
        };

        for i in 0..n {
            for (j, weight) in this.blocks[i].out_jumps.clone() {
                let src_chain = this.blocks[i].chain;
                let dst_chain = this.blocks[j].chain;
                let jump = Jump { src: i, dst: j, weight };
                if let Some(edge) = this.chain_edge(src_chain, dst_chain) {
                    this.edges[edge].append_jump(jump);
                    continue;
                }
                let edge = this.edges.len();
                this.edges.push(Edge {
                    src: src_chain,
                    dst: dst_chain,
                    jumps: vec![jump],
                    cached_forward: None,
                    cached_backward: None,
                });
                this.chains[src_chain].edges.push((dst_chain, edge));
                this.chains[dst_chain].edges.push((src_chain, edge));
            }
        }

        this
    }

    fn run(mut self) -> Vec<usize> {
        self.merge_fallthroughs();
        self.merge_chain_pairs();
        self.merge_cold_chains();
        let order = self.concat_chains();
        debug_assert_eq!(order.len(), self.blocks.len());
        order
    }

    /// Pass 1: pin one-to-one neighbors together and concatenate each
    /// maximal fallthrough run into a single chain.
    fn merge_fallthroughs(&mut self) {
        let n = self.blocks.len();
        let mut pred_count = vec![0usize; n];
        for succs in &self.cfg_succs {
            for &j in succs {
                pred_count[j] += 1;
            }
        }

        for i in 0..n {
            // Structural pair: the only successor whose only predecessor is
            // this block.
            if let &[j] = self.cfg_succs[i].as_slice()
                && pred_count[j] == 1
                && j != 0
            {
                self.blocks[i].fallthrough_succ = Some(j);
                self.blocks[j].fallthrough_pred = Some(i);
                continue;
            }
            if self.blocks[i].out_weight == 0 {
                continue;
            }
            // Profile pair: all observed flow out of `i` lands in `j`, and
            // everything arriving at `j` came from `i`.
            for (j, weight) in self.blocks[i].out_jumps.clone() {
                if self.blocks[i].out_weight == weight
                    && self.blocks[j].in_weight == weight
                    && j != 0
                {
                    self.blocks[i].fallthrough_succ = Some(j);
                    self.blocks[j].fallthrough_pred = Some(i);
                    break;
                }
            }
        }

        // Profile noise can close a fallthrough cycle. Break each one at
        // its smallest-index block, which becomes the run's head.
        for i in 0..n {
            if self.blocks[i].fallthrough_succ.is_none()
                || self.blocks[i].fallthrough_pred.is_none()
            {
                continue;
            }
            let mut cursor = self.blocks[i].fallthrough_succ;
            while let Some(b) = cursor
                && b != i
            {
                cursor = self.blocks[b].fallthrough_succ;
            }
            if cursor.is_none() {
                continue;
            }
            let pred = self.blocks[i].fallthrough_pred.take().expect("cycle member");
            self.blocks[pred].fallthrough_succ = None;
        }

        for i in 0..n {
            if self.blocks[i].fallthrough_pred.is_some() {
                continue;
            }
            let head_chain = self.blocks[i].chain;
            let mut cursor = self.blocks[i].fallthrough_succ;
            while let Some(next) = cursor {
                let next_chain = self.blocks[next].chain;
                self.merge_chains(head_chain, next_chain, 0, MergeType::XY);
                cursor = self.blocks[next].fallthrough_succ;
            }
        }
    }

    /// Pass 2: merge the hot chain pair with the best gain until nothing
    /// improves the objective by more than the epsilon.
    fn merge_chain_pairs(&mut self) {
        while self.hot.len() > 1 {
            if self.config.debug > 2 {
                self.dump_hot_chains();
            }

            let mut best: Option<(ChainId, ChainId)> = None;
            let mut best_gain = MergeGain::none();
            let hot = self.hot.clone();
            for &pred in &hot {
                for (succ, edge) in self.chains[pred].edges.clone() {
                    if pred == succ {
                        continue;
                    }
                    // Only score the orientation the edge actually records.
                    if self.edges[edge].src != pred || self.edges[edge].dst != succ {
                        continue;
                    }
                    if self.chains[pred].exec < self.config.cold_threshold
                        || self.chains[succ].exec < self.config.cold_threshold
                    {
                        continue;
                    }

                    let gain = self.merge_gain(pred, succ, edge);
                    let tied = (gain.score - best_gain.score).abs() < self.config.eps;
                    let better = best_gain.is_less_than(gain, self.config.eps)
                        || (tied
                            && best.is_some_and(|(best_pred, best_succ)| {
                                compare_chain_pairs(
                                    &self.chains,
                                    pred,
                                    succ,
                                    best_pred,
                                    best_succ,
                                )
                            }));
                    if better {
                        best_gain = gain;
                        best = Some((pred, succ));
                    }
                }
            }

            if best_gain.score <= self.config.eps {
                break;
            }
            let Some((pred, succ)) = best else {
                break;
            };
            self.merge_chains(pred, succ, best_gain.offset, best_gain.ty);
        }
    }

    /// Pass 3: glue chains along remaining CFG edges when tail meets head
    /// and both sides sit on the same side of the cold threshold.
    fn merge_cold_chains(&mut self) {
        for src in 0..self.cfg_succs.len() {
            // Reverse successor order merges original fallthrough edges
            // first.
            for idx in (0..self.cfg_succs[src].len()).rev() {
                let dst = self.cfg_succs[src][idx];
                let src_chain = self.blocks[src].chain;
                let dst_chain = self.blocks[dst].chain;
                if src_chain == dst_chain || self.chains[dst_chain].is_entry {
                    continue;
                }
                let src_last = *self.chains[src_chain].blocks.last().expect("live chain");
                let dst_first = self.chains[dst_chain].blocks[0];
                if src_last != src || dst_first != dst {
                    continue;
                }
                let cold = self.config.cold_threshold;
                let same_side =
                    (self.chains[src_chain].exec <= cold) == (self.chains[dst_chain].exec <= cold);
                if same_side {
                    self.merge_chains(src_chain, dst_chain, 0, MergeType::XY);
                }
            }
        }
    }

    /// Emit the surviving chains: entry chain first, then by decreasing
    /// density, chain id as the final tie-break.
    fn concat_chains(&self) -> Vec<usize> {
        let mut ordered: Vec<ChainId> = self
            .chains
            .iter()
            .filter(|c| !c.blocks.is_empty())
            .map(|c| c.id)
            .collect();
        ordered.sort_by(|&a, &b| {
            let (ca, cb) = (&self.chains[a], &self.chains[b]);
            cb.is_entry
                .cmp(&ca.is_entry)
                .then_with(|| {
                    cb.density()
                        .partial_cmp(&ca.density())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| ca.id.cmp(&cb.id))
        });

        if self.config.debug > 2 {
            eprintln!("chain order:");
            for &c in &ordered {
                eprintln!("  c{} blocks {:?}", c, self.chains[c].blocks);
            }
        }

        ordered
            .iter()
            .flat_map(|&c| self.chains[c].blocks.iter().copied())
            .collect()
    }

    /// Best way to merge `(pred, succ)` along `edge`, from the cache when
    /// it is still valid.
    fn merge_gain(&mut self, pred: ChainId, succ: ChainId, edge: EdgeId) -> MergeGain {
        if let Some(gain) = self.edges[edge].cached_gain(pred) {
            return gain;
        }

        // Fold the predecessor's self-jumps in so splits are scored against
        // them too.
        if let Some(self_edge) = self.chain_edge(pred, pred)
            && self_edge != edge
        {
            let self_jumps = self.edges[self_edge].jumps.clone();
            for jump in self_jumps {
                self.edges[edge].append_jump(jump);
            }
        }
        let jumps = self.edges[edge].jumps.clone();

        let mut gain = MergeGain::none();
        gain = self.compute_merge_gain(gain, pred, succ, &jumps, 0, MergeType::XY);

        if self.chains[pred].blocks.len() < self.config.chain_split_threshold {
            for offset in 1..self.chains[pred].blocks.len() {
                // Splitting through a fallthrough pair would undo pass 1.
                let before = self.chains[pred].blocks[offset - 1];
                if self.blocks[before].fallthrough_succ.is_some() {
                    continue;
                }
                gain = self.compute_merge_gain(gain, pred, succ, &jumps, offset, MergeType::X1YX2);
                gain = self.compute_merge_gain(gain, pred, succ, &jumps, offset, MergeType::YX2X1);
                gain = self.compute_merge_gain(gain, pred, succ, &jumps, offset, MergeType::X2X1Y);
            }
        }

        self.edges[edge].set_cached_gain(pred, gain);
        gain
    }

    /// Score one merge candidate and keep it if it beats `cur`.
    fn compute_merge_gain(
        &self,
        cur: MergeGain,
        pred: ChainId,
        succ: ChainId,
        jumps: &[Jump],
        offset: usize,
        ty: MergeType,
    ) -> MergeGain {
        let merged = merge_blocks(&self.chains[pred].blocks, &self.chains[succ].blocks, offset, ty);

        // A merge may not displace the entry block from absolute index 0.
        if (self.chains[pred].is_entry || self.chains[succ].is_entry)
            && self.blocks[merged[0]].index != 0
        {
            return cur;
        }

        let gain = MergeGain {
            score: self.score(&merged, jumps) - self.chains[pred].score,
            offset,
            ty,
        };
        if cur.is_less_than(gain, self.config.eps) {
            gain
        } else {
            cur
        }
    }

    /// ExtTSP score of the sequence under the given jumps. Addresses are
    /// prefix sums of block sizes; jumps with an endpoint outside the
    /// sequence contribute nothing.
    fn score(&self, seq: &[usize], jumps: &[Jump]) -> f64 {
        if jumps.is_empty() {
            return 0.0;
        }
        let mut addr = HashMap::with_capacity(seq.len());
        let mut cursor = 0u64;
        for &b in seq {
            addr.insert(b, cursor);
            cursor += self.blocks[b].size;
        }

        let mut total = 0.0;
        for jump in jumps {
            let (Some(&src_addr), Some(&dst_addr)) = (addr.get(&jump.src), addr.get(&jump.dst))
            else {
                continue;
            };
            total += jump_score(
                src_addr,
                self.blocks[jump.src].size,
                dst_addr,
                jump.weight,
                self.config,
            );
        }
        total
    }

    /// Merge `from` into `into` with the given offset and type, then patch
    /// every block/edge reference and drop the stale gain caches.
    fn merge_chains(&mut self, into: ChainId, from: ChainId, offset: usize, ty: MergeType) {
        debug_assert_ne!(into, from);
        let merged = merge_blocks(&self.chains[into].blocks, &self.chains[from].blocks, offset, ty);
        for (pos, &b) in merged.iter().enumerate() {
            self.blocks[b].chain = into;
            self.blocks[b].chain_index = pos;
        }

        self.chains[into].is_entry |= self.chains[from].is_entry;
        self.chains[into].exec += self.chains[from].exec;
        self.chains[into].size += self.chains[from].size;
        self.chains[into].blocks = merged;

        self.merge_chain_edges(into, from);
        self.chains[from].blocks.clear();
        self.chains[from].edges.clear();

        // The merged chain's own score feeds the next gain computations.
        if let Some(self_edge) = self.chain_edge(into, into) {
            let seq = self.chains[into].blocks.clone();
            let jumps = self.edges[self_edge].jumps.clone();
            self.chains[into].score = self.score(&seq, &jumps);
        }

        self.hot.retain(|&c| c != from);
        for (_, edge) in self.chains[into].edges.clone() {
            self.edges[edge].invalidate();
        }
    }

    /// Re-home `from`'s edges onto `into`, combining duplicates so at most
    /// one edge connects any pair of chains.
    fn merge_chain_edges(&mut self, into: ChainId, from: ChainId) {
        let from_edges = self.chains[from].edges.clone();
        for (dst_chain, edge) in from_edges {
            let target = if dst_chain == from { into } else { dst_chain };
            match self.chain_edge(into, target) {
                Some(existing) if existing != edge => {
                    let moved = std::mem::take(&mut self.edges[edge].jumps);
                    for jump in moved {
                        self.edges[existing].append_jump(jump);
                    }
                }
                Some(_) => {}
                None => {
                    self.edges[edge].change_endpoint(from, into);
                    self.chains[into].edges.push((target, edge));
                    if dst_chain != into && dst_chain != from {
                        self.chains[dst_chain].edges.push((into, edge));
                    }
                }
            }
            if dst_chain != from {
                self.remove_chain_edge(dst_chain, from);
            }
        }
    }

    fn chain_edge(&self, chain: ChainId, other: ChainId) -> Option<EdgeId> {
        self.chains[chain]
            .edges
            .iter()
            .find(|&&(c, _)| c == other)
            .map(|&(_, e)| e)
    }

    fn remove_chain_edge(&mut self, chain: ChainId, other: ChainId) {
        let edges = &mut self.chains[chain].edges;
        if let Some(pos) = edges.iter().position(|&(c, _)| c == other) {
            edges.remove(pos);
        }
    }

    fn dump_hot_chains(&self) {
        eprintln!("hot chains:");
        for &c in &self.hot {
            let chain = &self.chains[c];
            eprintln!(
                "  c{} exec {} size {} score {:.3} blocks {:?}",
                chain.id, chain.exec, chain.size, chain.score, chain.blocks
            );
        }
    }

    #[cfg(test)]
    fn assert_chain_invariants(&self) {
        for chain in &self.chains {
            for (pos, &b) in chain.blocks.iter().enumerate() {
                assert_eq!(self.blocks[b].chain, chain.id);
                assert_eq!(self.blocks[b].chain_index, pos);
            }
        }
    }
}

/// Per-block size estimate: the non-Phi value count, floored to one.
fn code_size(block: &crate::func::Block) -> u64 {
    let count = block
        .values
        .iter()
        .filter(|v| v.kind != ValueKind::Phi)
        .count();
    count.max(1) as u64
}

/// Combine two chains' block runs for the given merge type; the split
/// offset applies to the first chain.
fn merge_blocks(x: &[usize], y: &[usize], offset: usize, ty: MergeType) -> Vec<usize> {
    let (x1, x2) = x.split_at(offset);
    let mut out = Vec::with_capacity(x.len() + y.len());
    match ty {
        MergeType::XY => {
            out.extend_from_slice(x);
            out.extend_from_slice(y);
        }
        MergeType::X1YX2 => {
            out.extend_from_slice(x1);
            out.extend_from_slice(y);
            out.extend_from_slice(x2);
        }
        MergeType::YX2X1 => {
            out.extend_from_slice(y);
            out.extend_from_slice(x2);
            out.extend_from_slice(x1);
        }
        MergeType::X2X1Y => {
            out.extend_from_slice(x2);
            out.extend_from_slice(x1);
            out.extend_from_slice(y);
        }
    }
    out
}

fn jump_score(src_addr: u64, src_size: u64, dst_addr: u64, count: u64, config: &LayoutConfig) -> f64 {
    let end = src_addr + src_size;
    if end == dst_addr {
        return count as f64;
    }
    if end < dst_addr {
        let dist = dst_addr - end;
        if dist < config.forward_distance {
            let prob = 1.0 - dist as f64 / config.forward_distance as f64;
            return config.forward_weight * prob * count as f64;
        }
        return 0.0;
    }
    let dist = end - dst_addr;
    if dist <= config.backward_distance {
        let prob = 1.0 - dist as f64 / config.backward_distance as f64;
        return config.backward_weight * prob * count as f64;
    }
    0.0
}

/// Deterministic pair ordering for gain ties: the pair with the smaller
/// combined execution count wins, then smaller ids.
fn compare_chain_pairs(
    chains: &[Chain],
    a1: ChainId,
    b1: ChainId,
    a2: ChainId,
    b2: ChainId,
) -> bool {
    let samples1 = chains[a1].exec + chains[b1].exec;
    let samples2 = chains[a2].exec + chains[b2].exec;
    if samples1 != samples2 {
        return samples1 < samples2;
    }
    if a1 != a2 {
        return chains[a1].id < chains[a2].id;
    }
    chains[b1].id < chains[b2].id
}
