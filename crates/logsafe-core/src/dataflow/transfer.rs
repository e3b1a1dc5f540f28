//! Forward transfer function over CFG nodes

use super::cfg::{BasicBlock, Cfg, Node, NodeId, NodeKind};
use super::solver::DataflowAnalysis;
use crate::access_path::AccessPath;
use crate::hir::{SymbolTable, Type};
use crate::resolver::SafetyResolver;
use crate::safety::Safety;
use crate::store::AccessPathStore;
use std::collections::HashMap;

/// Safety of every node visited so far
pub type NodeValues = HashMap<NodeId, Safety>;

/// Output of visiting one node
#[derive(Debug, Clone, PartialEq)]
pub struct TransferResult {
    pub value: Safety,
    pub store: AccessPathStore,
}

pub struct SafetyTransfer<'a, S: SymbolTable + ?Sized> {
    resolver: SafetyResolver<'a, S>,
    cfg: &'a Cfg,
}

impl<'a, S: SymbolTable + ?Sized> SafetyTransfer<'a, S> {
    pub fn new(resolver: SafetyResolver<'a, S>, cfg: &'a Cfg) -> Self {
        Self { resolver, cfg }
    }

    pub fn resolver(&self) -> &SafetyResolver<'a, S> {
        &self.resolver
    }

    /// Store on procedure entry: every formal parameter at its declared safety
    pub fn initial_store(&self) -> AccessPathStore {
        self.cfg
            .parameters
            .iter()
            .map(|&param| (AccessPath::local(param), self.resolver.resolve_symbol(param)))
            .collect()
    }

    /// Compute the safety of `node` and the store after it.
    ///
    /// Operand values are looked up in `values`; operands never visited read
    /// as `Unknown`.
    pub fn visit(&self, node: &Node, store: &AccessPathStore, values: &NodeValues) -> TransferResult {
        let value_of = |id: NodeId| values.get(&id).copied().unwrap_or(Safety::Unknown);
        let unchanged = |value: Safety| TransferResult {
            value,
            store: store.clone(),
        };

        match &node.kind {
            NodeKind::Literal(_) | NodeKind::NullCheck { .. } => unchanged(Safety::Safe),
            NodeKind::Unary { operand, .. } | NodeKind::StringConversion { operand } => unchanged(value_of(*operand)),
            NodeKind::Binary { left, right, .. }
            | NodeKind::StringConcat { left, right }
            | NodeKind::StringConcatAssign { left, right } => {
                unchanged(value_of(*left).restrictive_merge(value_of(*right)))
            }
            NodeKind::Ternary {
                then_operand,
                else_operand,
                ..
            } => unchanged(value_of(*then_operand).restrictive_merge(value_of(*else_operand))),
            NodeKind::Assignment { target, value } => {
                let safety = value_of(*value);
                TransferResult {
                    value: safety,
                    store: self.assign(*target, safety, store, &value_of),
                }
            }
            NodeKind::LocalVariable { var } => {
                let constant = self
                    .resolver
                    .symbols()
                    .symbol(*var)
                    .is_some_and(|s| s.is_constant_local());
                if constant {
                    unchanged(Safety::Safe)
                } else {
                    unchanged(store.get(&AccessPath::local(*var)))
                }
            }
            NodeKind::VariableDeclaration { var } => {
                let declared = self
                    .resolver
                    .symbols()
                    .symbol(*var)
                    .and_then(|s| s.declared_type())
                    .map_or(Safety::Unknown, |ty| self.resolver.resolve_type(ty));
                unchanged(declared)
            }
            NodeKind::FieldAccess { field, .. } => unchanged(self.resolver.resolve_declaration(*field)),
            NodeKind::NumericConversion { operand, target, .. } => {
                let target_type = self.resolver.resolve_type(&Type::Primitive(*target));
                unchanged(value_of(*operand).combine_independent(target_type))
            }
            NodeKind::TypeCast { operand, target } => {
                unchanged(value_of(*operand).combine_independent(self.resolver.resolve_type(target)))
            }
            NodeKind::Return { result } => unchanged(result.map_or(Safety::Safe, value_of)),
            NodeKind::MethodInvocation {
                method, result_type, ..
            } => {
                let result_type = self.resolver.resolve_type(result_type);
                unchanged(result_type.combine_independent(self.resolver.resolve_symbol(*method)))
            }
            NodeKind::ObjectCreation { constructor, ty, .. } => {
                let created = self.resolver.resolve_type(ty);
                unchanged(created.combine_independent(self.resolver.resolve_symbol(*constructor)))
            }
            _ => unchanged(Safety::Unknown),
        }
    }

    /// Store after writing a value of `safety` through `target`
    fn assign(
        &self,
        target: NodeId,
        safety: Safety,
        store: &AccessPathStore,
        value_of: &impl Fn(NodeId) -> Safety,
    ) -> AccessPathStore {
        let Some(node) = self.cfg.node(target) else {
            return store.clone();
        };

        let mut updates = store.to_builder();
        match &node.kind {
            NodeKind::LocalVariable { var } => {
                updates.set(AccessPath::local(*var), safety);
            }
            // Element writes taint the whole array
            NodeKind::ArrayAccess { array, .. } => {
                if let Some(path) = AccessPath::of_node(self.cfg, *array) {
                    updates.set(path, value_of(*array).restrictive_merge(safety));
                }
            }
            NodeKind::FieldAccess {
                receiver, is_static, ..
            } => {
                if let Some(path) = AccessPath::of_node(self.cfg, target) {
                    updates.set(path, safety);
                }
                // Writing into an object taints the object itself
                if !is_static {
                    if let Some(receiver) = *receiver {
                        if let Some(path) = AccessPath::of_node(self.cfg, receiver) {
                            updates.set(path, value_of(receiver).restrictive_merge(safety));
                        }
                    }
                }
            }
            _ => {}
        }
        updates.build()
    }
}

/// [`SafetyTransfer`] driven block by block by the fixpoint solver
pub struct SafetyAnalysis<'a, S: SymbolTable + ?Sized> {
    transfer: SafetyTransfer<'a, S>,
    values: NodeValues,
}

impl<'a, S: SymbolTable + ?Sized> SafetyAnalysis<'a, S> {
    pub fn new(transfer: SafetyTransfer<'a, S>) -> Self {
        Self {
            transfer,
            values: NodeValues::new(),
        }
    }

    /// Visit one node, recording its value for later operand lookups
    pub fn visit_node(&mut self, node: &Node, store: &AccessPathStore) -> TransferResult {
        let result = self.transfer.visit(node, store, &self.values);
        self.values.insert(node.id, result.value);
        result
    }

    pub fn values(&self) -> &NodeValues {
        &self.values
    }
}

impl<S: SymbolTable + ?Sized> DataflowAnalysis for SafetyAnalysis<'_, S> {
    type Fact = AccessPathStore;

    fn initial_fact(&self) -> AccessPathStore {
        self.transfer.initial_store()
    }

    fn join(&self, facts: &[AccessPathStore]) -> AccessPathStore {
        AccessPathStore::join_all(facts).unwrap_or_default()
    }

    fn transfer(&mut self, cfg: &Cfg, block: &BasicBlock, input: &AccessPathStore) -> AccessPathStore {
        let mut store = input.clone();
        for node in block.nodes.iter().filter_map(|&id| cfg.node(id)) {
            store = self.visit_node(node, &store).store;
        }
        store
    }
}
