//! # Logsafe Core
//!
//! Forward dataflow engine that classifies every value in a procedure by how
//! safe it is to write to logs.
//!
//! ## Modules
//!
//! - **[`safety`]** - The four-point safety lattice
//! - **[`resolver`]** - Declared safety from annotations and overrides
//! - **[`dataflow`]** - CFG, fixpoint solver and transfer function
//! - **[`engine`]** - One-call driver producing per-node results
//!
//! ## Quick Start
//!
//! ```rust
//! use logsafe_core::prelude::*;
//!
//! let mut program = Program::new();
//! let method = program.add_method("handle", Type::Void);
//! let token = program.add_parameter(method, "token", Type::Null);
//! program.annotate(token, DO_NOT_LOG_ANNOTATION);
//!
//! let body = vec![Stmt::Return(None)];
//! let procedure = Procedure::for_method(&program, method, body);
//! let (_cfg, result) = SafetyEngine::default().analyze_procedure(&program, &procedure);
//!
//! assert_eq!(result.exit_safety(&AccessPath::local(token)), Safety::DoNotLog);
//! ```

pub mod access_path;
pub mod config;
pub mod dataflow;
pub mod engine;
pub mod error;
pub mod hir;
pub mod resolver;
pub mod safety;
pub mod store;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::access_path::{AccessPath, PathRoot};
    pub use crate::config::{AnalysisConfig, AnnotationNames, DO_NOT_LOG_ANNOTATION, SAFE_ANNOTATION, UNSAFE_ANNOTATION};
    pub use crate::dataflow::{BlockId, Cfg, CfgBuilder, Node, NodeId, NodeKind};
    pub use crate::engine::{SafetyAnalysisResult, SafetyEngine};
    pub use crate::error::ConfigError;
    pub use crate::hir::{Expr, ExprKind, Literal, Procedure, Program, Stmt, SymbolId, SymbolTable, Type};
    pub use crate::resolver::SafetyResolver;
    pub use crate::safety::Safety;
    pub use crate::store::AccessPathStore;
}

// Re-export main types at crate root for convenience
pub use access_path::AccessPath;
pub use config::{AnalysisConfig, AnnotationNames};
pub use engine::{SafetyAnalysisResult, SafetyEngine};
pub use error::ConfigError;
pub use resolver::SafetyResolver;
pub use safety::Safety;
pub use store::AccessPathStore;
