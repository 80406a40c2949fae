#![forbid(unsafe_code)]

//! Name-to-factory registry for command reconstruction.
//!
//! Deserializing a history record is the one place the engine needs
//! dynamic dispatch by name: a record carries `<COMMAND_CLASS=tag>` and
//! the matching constructor must be found at runtime. The registry is an
//! explicit map populated once at startup; there is no reflective code
//! loading.
//!
//! Factories return *unbound* instances: payload fields empty, document
//! handles already captured by the factory closure. The caller follows up
//! with [`Command::deserialize`] to populate the payload.

use std::collections::HashMap;
use std::fmt;

use crate::command::Command;

/// Constructor for an unbound command instance.
pub type CommandFactory = Box<dyn Fn() -> Box<dyn Command> + Send + Sync>;

/// A serialized record names a command kind nobody registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The registry tag found on the wire.
    UnknownKind(String),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKind(kind) => write!(f, "unknown command kind '{kind}'"),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Registry mapping stable command tags to factories.
#[derive(Default)]
pub struct CommandRegistry {
    factories: HashMap<String, CommandFactory>,
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl CommandRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under a stable tag.
    ///
    /// Registering the same tag again replaces the previous factory; the
    /// last registration wins.
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Command> + Send + Sync + 'static,
    {
        let kind = kind.into();
        if self
            .factories
            .insert(kind.clone(), Box::new(factory))
            .is_some()
        {
            tracing::debug!(kind = %kind, "command factory replaced");
        }
    }

    /// Construct a fresh unbound instance of the named kind.
    pub fn resolve(&self, kind: &str) -> Result<Box<dyn Command>, ResolveError> {
        self.factories
            .get(kind)
            .map(|factory| factory())
            .ok_or_else(|| ResolveError::UnknownKind(kind.to_string()))
    }

    /// Check whether a kind is registered.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered tags, sorted for stable display.
    #[must_use]
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Number of registered kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Check whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
