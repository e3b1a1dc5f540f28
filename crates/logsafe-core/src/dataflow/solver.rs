//! Dataflow analysis framework with worklist-based fixpoint solver

use super::cfg::{BasicBlock, BlockId, Cfg};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{trace, warn};

/// Generic trait for forward dataflow analyses
pub trait DataflowAnalysis {
    /// The type of facts being propagated
    type Fact: Clone + PartialEq;

    /// Fact on entry to the CFG's entry block
    fn initial_fact(&self) -> Self::Fact;

    /// Join/merge facts from multiple predecessors
    fn join(&self, facts: &[Self::Fact]) -> Self::Fact;

    /// Transfer function: compute output fact from input fact for a block
    fn transfer(&mut self, cfg: &Cfg, block: &BasicBlock, input: &Self::Fact) -> Self::Fact;
}

/// Result of fixpoint computation
#[derive(Debug)]
pub struct FixpointResult<F> {
    /// Facts at entry of each reached block
    pub in_facts: HashMap<BlockId, F>,
    /// Facts at exit of each reached block
    pub out_facts: HashMap<BlockId, F>,
    /// Number of block visits performed
    pub iterations: usize,
    /// False when the iteration bound stopped the solver early
    pub converged: bool,
}

/// Worklist-based fixpoint solver
#[derive(Debug, Clone, Copy)]
pub struct FixpointSolver {
    max_iterations: usize,
}

impl FixpointSolver {
    pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    /// Compute the forward fixpoint of `analysis` over `cfg`.
    ///
    /// Blocks are only visited once something flows into them, so blocks
    /// unreachable from the entry never appear in the result.
    pub fn solve<A: DataflowAnalysis>(&self, analysis: &mut A, cfg: &Cfg) -> FixpointResult<A::Fact> {
        let mut in_facts: HashMap<BlockId, A::Fact> = HashMap::new();
        let mut out_facts: HashMap<BlockId, A::Fact> = HashMap::new();

        // Initialize worklist with blocks in reverse postorder
        let mut worklist: VecDeque<BlockId> = cfg.reverse_postorder().into_iter().collect();
        let mut in_worklist: HashSet<BlockId> = worklist.iter().copied().collect();

        let mut iterations = 0;
        let mut converged = true;

        while let Some(block_id) = worklist.pop_front() {
            in_worklist.remove(&block_id);

            if iterations >= self.max_iterations {
                warn!(
                    max_iterations = self.max_iterations,
                    pending = worklist.len() + 1,
                    "dataflow iteration bound reached before fixpoint"
                );
                converged = false;
                break;
            }
            iterations += 1;

            let block = match cfg.blocks.get(&block_id) {
                Some(b) => b,
                None => continue,
            };

            // Compute input by joining predecessor outputs seen so far
            let mut pred_facts: Vec<A::Fact> = block
                .predecessors
                .iter()
                .filter_map(|pred_id| out_facts.get(pred_id).cloned())
                .collect();
            if block_id == cfg.entry {
                pred_facts.push(analysis.initial_fact());
            }
            if pred_facts.is_empty() {
                continue;
            }
            let new_in = analysis.join(&pred_facts);

            // Apply transfer function
            let new_out = analysis.transfer(cfg, block, &new_in);
            in_facts.insert(block_id, new_in);

            // Check if output changed
            let changed = out_facts.get(&block_id).map_or(true, |old| old != &new_out);
            trace!(block = block_id.0, changed, "visited block");

            if changed {
                out_facts.insert(block_id, new_out);

                // Add successors to worklist
                for &succ_id in &block.successors {
                    if in_worklist.insert(succ_id) {
                        worklist.push_back(succ_id);
                    }
                }
            }
        }

        FixpointResult {
            in_facts,
            out_facts,
            iterations,
            converged,
        }
    }
}

impl Default for FixpointSolver {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ITERATIONS)
    }
}
