//! Violation detection on top of engine results
//!
//! A violation is a value flowing into a declaration whose declared safety
//! does not allow it: an argument to a parameter, a returned value to its
//! method, or an assigned value to a variable or field.

use logsafe_core::config::AnnotationNames;
use logsafe_core::dataflow::{Cfg, Node, NodeId, NodeKind};
use logsafe_core::hir::{SymbolId, SymbolTable};
use logsafe_core::{Safety, SafetyAnalysisResult, SafetyResolver};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Argument passed to a parameter that does not allow it
    Argument,
    /// Value returned from a method that does not allow it
    Return,
    /// Value stored into a variable or field that does not allow it
    Assignment,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViolationKind::Argument => "argument",
            ViolationKind::Return => "return",
            ViolationKind::Assignment => "assignment",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyViolation {
    pub kind: ViolationKind,
    /// Node producing the offending value
    pub node: usize,
    /// Declaration receiving the value
    pub target: SymbolId,
    pub target_name: String,
    pub declared: Safety,
    pub actual: Safety,
}

impl fmt::Display for SafetyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to `{}` declared {} receives a {} value",
            self.kind, self.target_name, self.declared, self.actual
        )
    }
}

pub struct SafetyChecker<'a, S: SymbolTable + ?Sized> {
    resolver: SafetyResolver<'a, S>,
}

impl<'a, S: SymbolTable + ?Sized> SafetyChecker<'a, S> {
    pub fn new(symbols: &'a S, annotations: &'a AnnotationNames) -> Self {
        Self {
            resolver: SafetyResolver::new(symbols, annotations),
        }
    }

    /// Every violation among the nodes the analysis reached, in node order
    pub fn check(&self, cfg: &Cfg, result: &SafetyAnalysisResult) -> Vec<SafetyViolation> {
        let mut violations = Vec::new();

        for node in cfg.nodes().filter(|n| result.visited(n.id)) {
            match &node.kind {
                NodeKind::MethodInvocation { method, args, .. } => {
                    self.check_arguments(*method, args, result, &mut violations)
                }
                NodeKind::ObjectCreation { constructor, args, .. } => {
                    self.check_arguments(*constructor, args, result, &mut violations)
                }
                NodeKind::Return { result: Some(value) } => {
                    if let Some(method) = cfg.method {
                        let declared = self.resolver.resolve_symbol(method);
                        self.check_flow(ViolationKind::Return, method, declared, *value, result, &mut violations);
                    }
                }
                NodeKind::Assignment { target, value } => {
                    if let Some(symbol) = cfg.node(*target).and_then(assigned_symbol) {
                        let declared = self.resolver.resolve_symbol(symbol);
                        self.check_flow(ViolationKind::Assignment, symbol, declared, *value, result, &mut violations);
                    }
                }
                _ => {}
            }
        }

        debug!(method = ?cfg.method, violations = violations.len(), "checked procedure");
        violations
    }

    /// Arguments past the last parameter belong to a trailing varargs parameter
    fn check_arguments(
        &self,
        callee: SymbolId,
        args: &[NodeId],
        result: &SafetyAnalysisResult,
        violations: &mut Vec<SafetyViolation>,
    ) {
        let params = self.resolver.symbols().parameters_of(callee);
        let Some(&last) = params.last() else {
            return;
        };
        for (index, &arg) in args.iter().enumerate() {
            let param = params.get(index).copied().unwrap_or(last);
            let declared = self.resolver.resolve_symbol(param);
            self.check_flow(ViolationKind::Argument, param, declared, arg, result, violations);
        }
    }

    fn check_flow(
        &self,
        kind: ViolationKind,
        target: SymbolId,
        declared: Safety,
        value: NodeId,
        result: &SafetyAnalysisResult,
        violations: &mut Vec<SafetyViolation>,
    ) {
        let actual = result.value_of(value);
        if declared.allows_value_with(actual) {
            return;
        }
        let target_name = self
            .resolver
            .symbols()
            .symbol(target)
            .map_or_else(|| target.to_string(), |s| s.name.clone());
        violations.push(SafetyViolation {
            kind,
            node: value.0,
            target,
            target_name,
            declared,
            actual,
        });
    }
}

/// Declaration written by an assignment target
fn assigned_symbol(target: &Node) -> Option<SymbolId> {
    match target.kind {
        NodeKind::LocalVariable { var } => Some(var),
        NodeKind::FieldAccess { field, .. } => Some(field),
        _ => None,
    }
}
