//! Node behaviors.
//!
//! A behavior is a pure function `(inputs, state, config) -> (outputs, state)`.
//! Built-in gates are a closed enum; hosts plug in their own behaviors through
//! [`NodeBehavior`], and composite chips carry their sub-circuit definition.

use crate::builtin::BuiltinGate;
use crate::composite::CompositeNodeDef;
use silica_core::{LogicValue, NodeConfig, NodeState, PortValues};
use std::fmt;
use std::sync::Arc;

/// Result of evaluating one node for one tick
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Evaluation {
    /// Output port values
    pub outputs: PortValues,
    /// Replacement state for the node
    pub state: NodeState,
}

impl Evaluation {
    /// Outputs plus new state
    #[must_use]
    pub fn new(outputs: PortValues, state: NodeState) -> Self {
        Self { outputs, state }
    }

    /// A single `out` port, state carried through unchanged
    #[must_use]
    pub fn single(value: LogicValue, state: &NodeState) -> Self {
        let mut outputs = PortValues::new();
        outputs.insert("out".to_string(), value);
        Self {
            outputs,
            state: state.clone(),
        }
    }
}

/// Host-supplied node behavior
pub trait NodeBehavior: Send + Sync {
    /// Evaluate one node for one tick
    fn evaluate(&self, inputs: &PortValues, state: &NodeState, config: &NodeConfig) -> Evaluation;
}

impl<F> NodeBehavior for F
where
    F: Fn(&PortValues, &NodeState, &NodeConfig) -> Evaluation + Send + Sync,
{
    fn evaluate(&self, inputs: &PortValues, state: &NodeState, config: &NodeConfig) -> Evaluation {
        self(inputs, state, config)
    }
}

/// Behavior registered for a node type
#[derive(Clone)]
pub enum Behavior {
    /// One of the engine's own gates
    Builtin(BuiltinGate),
    /// Host behavior
    Custom(Arc<dyn NodeBehavior>),
    /// Sub-circuit evaluated by a nested evaluator
    Composite(Arc<CompositeNodeDef>),
}

impl Behavior {
    /// Wrap a host behavior
    #[must_use]
    pub fn custom(behavior: impl NodeBehavior + 'static) -> Self {
        Self::Custom(Arc::new(behavior))
    }

    /// Whether this behavior owns a nested evaluator
    #[must_use]
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(gate) => f.debug_tuple("Builtin").field(gate).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
            Self::Composite(def) => f.debug_tuple("Composite").field(&def.name).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_a_behavior() {
        let invert = |inputs: &PortValues, state: &NodeState, _: &NodeConfig| {
            let a = inputs.get("in").copied().unwrap_or_default();
            Evaluation::single(a.not(), state)
        };
        let behavior = Behavior::custom(invert);
        let Behavior::Custom(inner) = behavior else {
            panic!("expected custom behavior");
        };
        let out = inner.evaluate(&PortValues::new(), &NodeState::new(), &NodeConfig::new());
        assert_eq!(out.outputs["out"], LogicValue::High);
    }

    #[test]
    fn test_single_output_keeps_state() {
        let mut state = NodeState::new();
        state.insert("k".to_string(), serde_json::json!(1));
        let eval = Evaluation::single(LogicValue::Low, &state);
        assert_eq!(eval.state, state);
        assert_eq!(eval.outputs.len(), 1);
    }
}
