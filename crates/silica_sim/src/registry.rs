//! Node type registry.

use crate::behavior::{Behavior, NodeBehavior};
use crate::builtin::BuiltinGate;
use crate::composite::CompositeNodeDef;
use indexmap::IndexMap;
use std::sync::Arc;

/// Error from registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Type already registered
    AlreadyRegistered {
        /// Node type name
        name: String,
    },
    /// Type not registered
    UnknownType {
        /// Node type name
        name: String,
    },
    /// Composite definition failed validation
    InvalidComposite {
        /// Chip name
        name: String,
        /// Why it failed
        reason: String,
    },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyRegistered { name } => write!(f, "Node type already registered: {}", name),
            Self::UnknownType { name } => write!(f, "Unknown node type: {}", name),
            Self::InvalidComposite { name, reason } => {
                write!(f, "Invalid composite {}: {}", name, reason)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Mapping from node type name to behavior
///
/// Registration order is preserved so listings are stable.
#[derive(Clone)]
pub struct Registry {
    behaviors: IndexMap<String, Behavior>,
}

impl Registry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            behaviors: IndexMap::new(),
        }
    }

    /// Create a registry holding every built-in gate
    #[must_use]
    pub fn with_builtins() -> Self {
        let behaviors = BuiltinGate::TYPE_NAMES
            .iter()
            .map(|(name, gate)| ((*name).to_string(), Behavior::Builtin(*gate)))
            .collect();
        Self { behaviors }
    }

    /// Register a behavior
    ///
    /// # Errors
    ///
    /// Returns error if the type name is taken
    pub fn register(&mut self, name: impl Into<String>, behavior: Behavior) -> Result<(), RegistryError> {
        let name = name.into();
        if self.behaviors.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered { name });
        }
        self.behaviors.insert(name, behavior);
        Ok(())
    }

    /// Register a host behavior
    ///
    /// # Errors
    ///
    /// Returns error if the type name is taken
    pub fn register_custom(
        &mut self,
        name: impl Into<String>,
        behavior: impl NodeBehavior + 'static,
    ) -> Result<(), RegistryError> {
        self.register(name, Behavior::custom(behavior))
    }

    /// Register a composite chip under its own name.
    ///
    /// Every node type the sub-circuit uses must already be registered, so a
    /// chip can never contain itself.
    ///
    /// # Errors
    ///
    /// Returns error if the definition is invalid, uses an unregistered type,
    /// or the name is taken
    pub fn register_composite(&mut self, def: CompositeNodeDef) -> Result<(), RegistryError> {
        def.validate().map_err(|e| RegistryError::InvalidComposite {
            name: def.name.clone(),
            reason: e.to_string(),
        })?;
        if let Some(node) = def.circuit.nodes.iter().find(|n| !self.has(&n.node_type)) {
            return Err(RegistryError::InvalidComposite {
                name: def.name.clone(),
                reason: format!("node `{}` uses unregistered type `{}`", node.id, node.node_type),
            });
        }
        let name = def.name.clone();
        self.register(name, Behavior::Composite(Arc::new(def)))
    }

    /// Look up a behavior
    ///
    /// # Errors
    ///
    /// Returns error if the type is not registered
    pub fn get(&self, name: &str) -> Result<&Behavior, RegistryError> {
        self.behaviors
            .get(name)
            .ok_or_else(|| RegistryError::UnknownType {
                name: name.to_string(),
            })
    }

    /// Check if a type is registered
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.behaviors.contains_key(name)
    }

    /// Remove a type
    ///
    /// # Errors
    ///
    /// Returns error if the type is not registered
    pub fn unregister(&mut self, name: &str) -> Result<Behavior, RegistryError> {
        self.behaviors
            .shift_remove(name)
            .ok_or_else(|| RegistryError::UnknownType {
                name: name.to_string(),
            })
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.behaviors.clear();
    }

    /// Registered type names in registration order
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.behaviors.keys().map(String::as_str)
    }

    /// Number of registered types
    #[must_use]
    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.behaviors.keys().collect::<Vec<_>>())
            .finish()
    }
}
