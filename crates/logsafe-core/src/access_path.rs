//! Access paths: storage locations tracked by the dataflow store
//!
//! A path is a root (local variable, `this`, or a static field) followed by a
//! chain of instance field dereferences. Array elements and arbitrary
//! expressions have no path and are never tracked on their own.

use crate::dataflow::{Cfg, NodeId, NodeKind};
use crate::hir::SymbolId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathRoot {
    /// Local variable or formal parameter
    Local(SymbolId),
    /// Receiver of the procedure being analyzed
    This,
    /// A static field
    Static(SymbolId),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessPath {
    root: PathRoot,
    fields: SmallVec<[SymbolId; 4]>,
}

impl AccessPath {
    pub fn local(var: SymbolId) -> Self {
        Self {
            root: PathRoot::Local(var),
            fields: SmallVec::new(),
        }
    }

    pub fn this() -> Self {
        Self {
            root: PathRoot::This,
            fields: SmallVec::new(),
        }
    }

    pub fn static_field(field: SymbolId) -> Self {
        Self {
            root: PathRoot::Static(field),
            fields: SmallVec::new(),
        }
    }

    /// Path reached by dereferencing `field` from this one
    pub fn with_field(&self, field: SymbolId) -> Self {
        let mut fields = self.fields.clone();
        fields.push(field);
        Self { root: self.root, fields }
    }

    pub fn root(&self) -> PathRoot {
        self.root
    }

    pub fn fields(&self) -> &[SymbolId] {
        &self.fields
    }

    /// Path denoted by a CFG node, if the node is a trackable location
    pub fn of_node(cfg: &Cfg, node: NodeId) -> Option<AccessPath> {
        match &cfg.node(node)?.kind {
            NodeKind::LocalVariable { var } => Some(AccessPath::local(*var)),
            NodeKind::ImplicitThis | NodeKind::ExplicitThis => Some(AccessPath::this()),
            NodeKind::FieldAccess {
                is_static: true, field, ..
            } => Some(AccessPath::static_field(*field)),
            NodeKind::FieldAccess {
                receiver: Some(receiver),
                field,
                ..
            } => AccessPath::of_node(cfg, *receiver).map(|base| base.with_field(*field)),
            _ => None,
        }
    }
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root {
            PathRoot::Local(id) => write!(f, "local{id}")?,
            PathRoot::This => f.write_str("this")?,
            PathRoot::Static(id) => write!(f, "static{id}")?,
        }
        for field in &self.fields {
            write!(f, ".{field}")?;
        }
        Ok(())
    }
}
