//! The command registry: alias strings to handlers, populated once at
//! startup and read-only afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::{AccessLevel, CommandContext, PreconditionGate};

/// A leaf command handler. `args` is the raw text after the command token.
#[async_trait]
pub trait Command: Send + Sync {
    async fn run(&self, ctx: &CommandContext, args: &str) -> Result<()>;
}

/// One registered command: aliases (first is canonical), the minimum access
/// level the gate checks, the handler, and free-text usage remarks.
#[derive(Clone)]
pub struct CommandSpec {
    pub aliases: Vec<String>,
    pub required: AccessLevel,
    pub usage: String,
    pub handler: Arc<dyn Command>,
}

impl CommandSpec {
    pub fn new(
        aliases: impl IntoIterator<Item = String>,
        required: AccessLevel,
        usage: impl Into<String>,
        handler: Arc<dyn Command>,
    ) -> Self {
        Self {
            aliases: aliases.into_iter().collect(),
            required,
            usage: usage.into(),
            handler,
        }
    }

    /// The canonical name is the first alias.
    #[must_use]
    pub fn name(&self) -> &str {
        self.aliases.first().map_or("", String::as_str)
    }
}

impl core::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("aliases", &self.aliases)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
    /// Alias strings are unique across the whole table, case-insensitively.
    #[error("duplicate command alias {0:?}")]
    DuplicateAlias(String),
    #[error("command registered without aliases")]
    NoAliases,
}

/// Registration-ordered command table. Mutated only during startup wiring;
/// the router holds it behind an `Arc` afterwards.
#[derive(Debug, Default)]
pub struct CommandTable {
    specs: Vec<Arc<CommandSpec>>,
    by_alias: HashMap<String, usize>,
}

impl CommandTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects the whole spec on any alias collision; a failed registration
    /// leaves the table untouched.
    pub fn register(&mut self, spec: CommandSpec) -> Result<(), RegisterError> {
        if spec.aliases.is_empty() {
            return Err(RegisterError::NoAliases);
        }
        let keys: Vec<String> = spec.aliases.iter().map(|a| a.to_lowercase()).collect();
        for (i, key) in keys.iter().enumerate() {
            if self.by_alias.contains_key(key) || keys[..i].contains(key) {
                return Err(RegisterError::DuplicateAlias(spec.aliases[i].clone()));
            }
        }
        let index = self.specs.len();
        self.specs.push(Arc::new(spec));
        for key in keys {
            self.by_alias.insert(key, index);
        }
        Ok(())
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Arc<CommandSpec>> {
        self.by_alias
            .get(&name.to_lowercase())
            .map(|&i| &self.specs[i])
    }

    /// Substring search over names and aliases, for help and typo
    /// suggestions. Results keep registration order.
    #[must_use]
    pub fn search(&self, fragment: &str) -> Vec<&Arc<CommandSpec>> {
        let needle = fragment.to_lowercase();
        self.specs
            .iter()
            .filter(|spec| {
                spec.aliases
                    .iter()
                    .any(|a| a.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Commands the gate would currently authorize for `level`, for building
    /// per-user help text.
    #[must_use]
    pub fn list_visible(&self, level: AccessLevel, gate: PreconditionGate) -> Vec<&Arc<CommandSpec>> {
        self.specs
            .iter()
            .filter(|spec| gate.authorize(spec.required, level).is_allowed())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
