//! Serializable per-procedure reports

use crate::checker::{SafetyViolation, ViolationKind};
use anyhow::Result;
use logsafe_core::hir::SymbolId;
use logsafe_core::SafetyAnalysisResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationSummary {
    pub arguments: usize,
    pub returns: usize,
    pub assignments: usize,
}

impl ViolationSummary {
    pub fn add(&mut self, kind: ViolationKind) {
        match kind {
            ViolationKind::Argument => self.arguments += 1,
            ViolationKind::Return => self.returns += 1,
            ViolationKind::Assignment => self.assignments += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.arguments + self.returns + self.assignments
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyReport {
    pub method: Option<SymbolId>,
    pub violations: Vec<SafetyViolation>,
    pub summary: ViolationSummary,
    pub iterations: usize,
    pub converged: bool,
}

impl SafetyReport {
    pub fn new(method: Option<SymbolId>, result: &SafetyAnalysisResult, violations: Vec<SafetyViolation>) -> Self {
        let mut summary = ViolationSummary::default();
        for violation in &violations {
            summary.add(violation.kind);
        }
        Self {
            method,
            violations,
            summary,
            iterations: result.iterations,
            converged: result.converged,
        }
    }

    /// No violations and a complete analysis
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty() && self.converged
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
