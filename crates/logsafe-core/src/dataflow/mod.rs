//! Forward dataflow analysis for log safety
//!
//! This module implements the propagation half of the engine:
//! - Control Flow Graph (CFG) of safety-relevant nodes, built from procedures
//! - Worklist-based forward fixpoint solver
//! - Per-node transfer function over the access-path store

mod cfg;
mod solver;
mod transfer;

pub use cfg::{BasicBlock, BlockId, Cfg, CfgBuilder, Node, NodeId, NodeKind, Operands, Terminator};
pub use solver::{DataflowAnalysis, FixpointResult, FixpointSolver};
pub use transfer::{NodeValues, SafetyAnalysis, SafetyTransfer, TransferResult};
