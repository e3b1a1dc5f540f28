//! High-level API for running the safety analysis over one procedure

use crate::access_path::AccessPath;
use crate::config::AnalysisConfig;
use crate::dataflow::{
    BlockId, Cfg, CfgBuilder, DataflowAnalysis, FixpointSolver, NodeId, SafetyAnalysis, SafetyTransfer,
};
use crate::hir::{Procedure, SymbolTable};
use crate::resolver::SafetyResolver;
use crate::safety::Safety;
use crate::store::AccessPathStore;
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::debug;

/// Per-node classifications and stores of one analyzed procedure
#[derive(Debug, Clone)]
pub struct SafetyAnalysisResult {
    node_values: IndexMap<NodeId, Safety>,
    node_stores: IndexMap<NodeId, AccessPathStore>,
    entry_stores: HashMap<BlockId, AccessPathStore>,
    exit_store: Option<AccessPathStore>,
    /// Number of block visits the solver performed
    pub iterations: usize,
    /// False when the iteration bound cut the analysis short
    pub converged: bool,
}

impl SafetyAnalysisResult {
    /// Safety of the value produced by `node`.
    ///
    /// Nodes in unreachable blocks were never visited and read as `Unknown`.
    pub fn value_of(&self, node: NodeId) -> Safety {
        self.node_values.get(&node).copied().unwrap_or(Safety::Unknown)
    }

    /// Whether `node` was reached by the analysis
    pub fn visited(&self, node: NodeId) -> bool {
        self.node_values.contains_key(&node)
    }

    /// Store immediately after `node`
    pub fn store_after(&self, node: NodeId) -> Option<&AccessPathStore> {
        self.node_stores.get(&node)
    }

    /// Store on entry to `block`
    pub fn store_at_entry(&self, block: BlockId) -> Option<&AccessPathStore> {
        self.entry_stores.get(&block)
    }

    /// Join of the stores at every return; `None` when the procedure never returns
    pub fn exit_store(&self) -> Option<&AccessPathStore> {
        self.exit_store.as_ref()
    }

    /// Safety of `path` on procedure exit
    pub fn exit_safety(&self, path: &AccessPath) -> Safety {
        self.exit_store.as_ref().map_or(Safety::Unknown, |store| store.get(path))
    }

    /// Every visited node with its value, in visit order
    pub fn values(&self) -> impl Iterator<Item = (NodeId, Safety)> + '_ {
        self.node_values.iter().map(|(id, safety)| (*id, *safety))
    }
}

/// Dataflow-based safety analysis.
///
/// Holds only configuration; each call builds its own resolver and transfer
/// function over the borrowed symbol table.
#[derive(Debug, Clone, Default)]
pub struct SafetyEngine {
    config: AnalysisConfig,
}

impl SafetyEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Lower `procedure` to a CFG and analyze it
    pub fn analyze_procedure<S: SymbolTable + ?Sized>(
        &self,
        symbols: &S,
        procedure: &Procedure,
    ) -> (Cfg, SafetyAnalysisResult) {
        let cfg = CfgBuilder::new(symbols).build_procedure(procedure);
        let result = self.analyze(symbols, &cfg);
        (cfg, result)
    }

    /// Run the forward analysis to a fixpoint over `cfg`
    pub fn analyze<S: SymbolTable + ?Sized>(&self, symbols: &S, cfg: &Cfg) -> SafetyAnalysisResult {
        debug!(
            method = ?cfg.method,
            blocks = cfg.blocks.len(),
            nodes = cfg.node_count(),
            "starting safety analysis"
        );

        let resolver = SafetyResolver::new(symbols, &self.config.annotations);
        let mut analysis = SafetyAnalysis::new(SafetyTransfer::new(resolver, cfg));
        let fixpoint = FixpointSolver::new(self.config.max_iterations).solve(&mut analysis, cfg);

        // Replay each reached block from its final entry store to record
        // per-node results
        let mut node_values = IndexMap::new();
        let mut node_stores = IndexMap::new();
        for block_id in cfg.reverse_postorder() {
            let (Some(block), Some(entry)) = (cfg.block(block_id), fixpoint.in_facts.get(&block_id)) else {
                continue;
            };
            let mut store = entry.clone();
            for node in block.nodes.iter().filter_map(|&id| cfg.node(id)) {
                let result = analysis.visit_node(node, &store);
                node_values.insert(node.id, result.value);
                node_stores.insert(node.id, result.store.clone());
                store = result.store;
            }
        }

        let exit_store = fixpoint.in_facts.get(&cfg.exit).cloned();

        debug!(
            method = ?cfg.method,
            iterations = fixpoint.iterations,
            converged = fixpoint.converged,
            visited = node_values.len(),
            "finished safety analysis"
        );

        SafetyAnalysisResult {
            node_values,
            node_stores,
            entry_stores: fixpoint.in_facts,
            exit_store,
            iterations: fixpoint.iterations,
            converged: fixpoint.converged,
        }
    }

    /// Store on entry to `cfg` (parameters seeded from their declarations)
    pub fn initial_store<S: SymbolTable + ?Sized>(&self, symbols: &S, cfg: &Cfg) -> AccessPathStore {
        let resolver = SafetyResolver::new(symbols, &self.config.annotations);
        SafetyAnalysis::new(SafetyTransfer::new(resolver, cfg)).initial_fact()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DO_NOT_LOG_ANNOTATION, UNSAFE_ANNOTATION};
    use crate::hir::{Expr, Literal, PrimitiveKind, Program, Stmt, Type};

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SafetyEngine>();
    }

    #[test]
    fn test_straight_line_procedure() {
        let mut program = Program::new();
        let method = program.add_method("run", Type::Void);
        let token = program.add_parameter(method, "token", Type::Null);
        program.annotate(token, DO_NOT_LOG_ANNOTATION);
        let copy = program.add_local("copy", Type::Null);

        let procedure = Procedure::for_method(
            &program,
            method,
            vec![
                Stmt::LocalDecl {
                    var: copy,
                    init: Some(Expr::local(token, Type::Null)),
                },
                Stmt::Return(None),
            ],
        );

        let (cfg, result) = SafetyEngine::default().analyze_procedure(&program, &procedure);

        assert!(result.converged);
        assert_eq!(result.exit_safety(&AccessPath::local(copy)), Safety::DoNotLog);
        assert_eq!(result.exit_safety(&AccessPath::local(token)), Safety::DoNotLog);
        let entry = result.store_at_entry(cfg.entry).unwrap();
        assert_eq!(entry.get(&AccessPath::local(token)), Safety::DoNotLog);
        assert!(!entry.contains(&AccessPath::local(copy)));
    }

    #[test]
    fn test_store_after_tracks_each_node() {
        let mut program = Program::new();
        let method = program.add_method("run", Type::Void);
        let p = program.add_parameter(method, "p", Type::Null);
        program.annotate(p, UNSAFE_ANNOTATION);
        let x = program.add_local("x", Type::Primitive(PrimitiveKind::Int));

        let procedure = Procedure::for_method(
            &program,
            method,
            vec![
                Stmt::Expr(Expr::assign(
                    Expr::local(x, Type::Primitive(PrimitiveKind::Int)),
                    Expr::literal(Literal::Int(1), Type::Primitive(PrimitiveKind::Int)),
                )),
                Stmt::Expr(Expr::assign(
                    Expr::local(x, Type::Primitive(PrimitiveKind::Int)),
                    Expr::local(p, Type::Null),
                )),
            ],
        );

        let (cfg, result) = SafetyEngine::default().analyze_procedure(&program, &procedure);

        let assignments: Vec<NodeId> = cfg
            .nodes()
            .filter(|n| matches!(n.kind, crate::dataflow::NodeKind::Assignment { .. }))
            .map(|n| n.id)
            .collect();
        assert_eq!(assignments.len(), 2);
        let x_path = AccessPath::local(x);
        assert_eq!(result.store_after(assignments[0]).unwrap().get(&x_path), Safety::Safe);
        assert_eq!(result.store_after(assignments[1]).unwrap().get(&x_path), Safety::Unsafe);
        assert_eq!(result.value_of(assignments[1]), Safety::Unsafe);
    }

    #[test]
    fn test_unreachable_nodes_are_not_visited() {
        let mut program = Program::new();
        let method = program.add_method("run", Type::Void);
        let procedure = Procedure::for_method(
            &program,
            method,
            vec![
                Stmt::Return(None),
                Stmt::Expr(Expr::literal(Literal::Int(1), Type::Primitive(PrimitiveKind::Int))),
            ],
        );

        let (cfg, result) = SafetyEngine::default().analyze_procedure(&program, &procedure);

        let dead = cfg
            .nodes()
            .find(|n| matches!(n.kind, crate::dataflow::NodeKind::Literal(_)))
            .map(|n| n.id)
            .unwrap();
        assert!(!result.visited(dead));
        assert_eq!(result.value_of(dead), Safety::Unknown);
        assert!(result.exit_store().is_some());
    }

    #[test]
    fn test_initial_store() {
        let mut program = Program::new();
        let method = program.add_method("run", Type::Void);
        let p = program.add_parameter(method, "p", Type::Null);
        program.annotate(p, UNSAFE_ANNOTATION);
        let procedure = Procedure::for_method(&program, method, vec![]);
        let cfg = CfgBuilder::new(&program).build_procedure(&procedure);

        let store = SafetyEngine::default().initial_store(&program, &cfg);
        assert_eq!(store.get(&AccessPath::local(p)), Safety::Unsafe);
    }
}
