//! Safety lattice for log-sensitivity analysis
//!
//! A four-point chain ordered by restrictiveness:
//! - `Safe` (bottom) may appear in any log message
//! - `Unknown` carries no information either way
//! - `Unsafe` may only be logged through unsafe arguments
//! - `DoNotLog` (top) must never reach a log
//!
//! The chain has height 4, so any monotone fixpoint over it terminates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a value by how safe it is to log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Safety {
    Safe,
    #[default]
    Unknown,
    Unsafe,
    DoNotLog,
}

impl Safety {
    /// Every value, from least to most restrictive
    pub const ALL: [Safety; 4] = [Safety::Safe, Safety::Unknown, Safety::Unsafe, Safety::DoNotLog];

    /// Restrictiveness rank (higher = harder to log)
    pub fn rank(self) -> u8 {
        match self {
            Safety::Safe => 0,
            Safety::Unknown => 1,
            Safety::Unsafe => 2,
            Safety::DoNotLog => 3,
        }
    }

    /// Join (least upper bound): the more restrictive of the two.
    ///
    /// Used whenever a result may come from either of two control-flow
    /// dependent values, such as binary operands or ternary branches.
    pub fn restrictive_merge(self, other: Safety) -> Safety {
        if self.rank() >= other.rank() {
            self
        } else {
            other
        }
    }

    /// Combine two independent signals about the same value, treating
    /// `Unknown` as carrying no information.
    ///
    /// The signals are expected to agree; disagreement falls back to
    /// [`Safety::restrictive_merge`].
    pub fn combine_independent(self, other: Safety) -> Safety {
        match (self, other) {
            (Safety::Unknown, s) | (s, Safety::Unknown) => s,
            (a, b) if a == b => a,
            (a, b) => a.restrictive_merge(b),
        }
    }

    /// Whether a value classified `actual` may be passed where `self` was declared.
    pub fn allows_value_with(self, actual: Safety) -> bool {
        match self {
            // Nothing can be expressed about an unknown declaration, and
            // do-not-log parameters place no burden on callers.
            Safety::Unknown | Safety::DoNotLog => true,
            Safety::Unsafe => actual != Safety::DoNotLog,
            Safety::Safe => matches!(actual, Safety::Unknown | Safety::Safe),
        }
    }

    /// Check if this value is at least as restrictive as `other`
    pub fn is_at_least(self, other: Safety) -> bool {
        self.rank() >= other.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Safety::Safe => "SAFE",
            Safety::Unknown => "UNKNOWN",
            Safety::Unsafe => "UNSAFE",
            Safety::DoNotLog => "DO_NOT_LOG",
        }
    }
}

impl fmt::Display for Safety {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
