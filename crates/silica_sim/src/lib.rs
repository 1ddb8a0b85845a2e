//! SILICA Logic Simulation
//!
//! Synchronous evaluation of node/port graphs. Every tick reads the signal
//! cache left by the previous tick, evaluates all nodes in id order, and writes
//! the new outputs back. Feedback loops settle through repeated ticks.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod behavior;
pub mod builtin;
pub mod composite;
pub mod config;
pub mod engine;
pub mod evaluator;
pub mod registry;

pub use behavior::{Behavior, Evaluation, NodeBehavior};
pub use builtin::BuiltinGate;
pub use composite::{CompositeNodeDef, PortPath};
pub use config::{DriverPolicy, EvaluatorConfig};
pub use engine::{EngineFactory, EvaluatorFactory, SimulationEngine};
pub use evaluator::Evaluator;
pub use registry::{Registry, RegistryError};
