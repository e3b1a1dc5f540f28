//! # Logsafe Analysis
//!
//! Checks built on the `logsafe-core` engine: finds values whose safety is
//! not allowed where they flow, and summarizes the findings per procedure.
//!
//! ## Modules
//!
//! - **[`checker`]** - Argument, return and assignment violations
//! - **[`report`]** - Serializable per-procedure reports
//!
//! ## Quick Start
//!
//! ```rust
//! use logsafe_analysis::prelude::*;
//! use logsafe_core::prelude::*;
//!
//! let mut program = Program::new();
//! let method = program.add_method("handle", Type::Void);
//! let procedure = Procedure::for_method(&program, method, vec![Stmt::Return(None)]);
//!
//! let report = check_procedure(&SafetyEngine::default(), &program, &procedure);
//! assert!(report.is_clean());
//! ```

pub mod checker;
pub mod report;

use anyhow::{Context, Result};
use logsafe_core::hir::{Procedure, SymbolTable};
use logsafe_core::{AnalysisConfig, SafetyEngine};
use std::path::Path;
use tracing::{info, warn};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::checker::{SafetyChecker, SafetyViolation, ViolationKind};
    pub use crate::report::{SafetyReport, ViolationSummary};
    pub use crate::{check_procedure, check_procedures_with_config};
}

pub use checker::{SafetyChecker, SafetyViolation, ViolationKind};
pub use report::{SafetyReport, ViolationSummary};

/// Analyze one procedure and check it for violations
pub fn check_procedure<S: SymbolTable + ?Sized>(
    engine: &SafetyEngine,
    symbols: &S,
    procedure: &Procedure,
) -> SafetyReport {
    let (cfg, result) = engine.analyze_procedure(symbols, procedure);
    if !result.converged {
        warn!(method = %procedure.method, "analysis stopped before reaching a fixpoint");
    }
    let violations = SafetyChecker::new(symbols, &engine.config().annotations).check(&cfg, &result);
    SafetyReport::new(cfg.method, &result, violations)
}

/// Load an engine configuration from `config_path` and check every procedure
pub fn check_procedures_with_config<S: SymbolTable + ?Sized>(
    config_path: &Path,
    symbols: &S,
    procedures: &[Procedure],
) -> Result<Vec<SafetyReport>> {
    let config = AnalysisConfig::from_file(config_path)
        .with_context(|| format!("loading analysis config from {}", config_path.display()))?;
    let engine = SafetyEngine::new(config);

    let reports: Vec<SafetyReport> = procedures
        .iter()
        .map(|procedure| check_procedure(&engine, symbols, procedure))
        .collect();

    let total: usize = reports.iter().map(|r| r.summary.total()).sum();
    info!(procedures = reports.len(), violations = total, "safety check complete");
    Ok(reports)
}
