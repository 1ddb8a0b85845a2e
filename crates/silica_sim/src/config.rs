//! Evaluator configuration.

use serde::{Deserialize, Serialize};

/// How several connections driving one input port are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverPolicy {
    /// Logical OR of every driver; independent of connection order
    #[default]
    WiredOr,
    /// The last connection in circuit order wins
    LastWriter,
}

/// Evaluator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Tick budget for `stabilize`, also used inside composite chips
    pub max_iterations: usize,
    /// Multiple-driver resolution
    pub driver_policy: DriverPolicy,
    /// Deepest allowed composite nesting; chips at this depth produce no outputs
    pub max_composite_depth: usize,
}

impl EvaluatorConfig {
    /// Default stabilization budget
    pub const DEFAULT_MAX_ITERATIONS: usize = 100;
    /// Default composite nesting limit
    pub const DEFAULT_MAX_COMPOSITE_DEPTH: usize = 32;

    /// Create the default config
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            driver_policy: DriverPolicy::default(),
            max_composite_depth: Self::DEFAULT_MAX_COMPOSITE_DEPTH,
        }
    }

    /// Set stabilization budget
    #[must_use]
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set driver policy
    #[must_use]
    pub fn with_driver_policy(mut self, policy: DriverPolicy) -> Self {
        self.driver_policy = policy;
        self
    }

    /// Set composite nesting limit
    #[must_use]
    pub fn with_max_composite_depth(mut self, depth: usize) -> Self {
        self.max_composite_depth = depth;
        self
    }
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self::new()
    }
}
