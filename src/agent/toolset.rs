//! The tools an agent may call, tagged by provenance.

use std::sync::Arc;

use crate::context::DerivedTool;
use crate::tools::{Tool, ToolDefinition};

/// A tool fetched from the remote server, or one derived from those.
#[derive(Clone)]
pub enum ToolEntry {
    Base(Arc<dyn Tool>),
    Derived(DerivedTool),
}

impl ToolEntry {
    pub fn as_tool(&self) -> &dyn Tool {
        match self {
            Self::Base(tool) => tool.as_ref(),
            Self::Derived(tool) => tool,
        }
    }

    pub fn name(&self) -> &str {
        self.as_tool().name()
    }

    pub fn is_derived(&self) -> bool {
        matches!(self, Self::Derived(_))
    }
}

impl std::fmt::Debug for ToolEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base(tool) => f.debug_tuple("Base").field(&tool.name()).finish(),
            Self::Derived(tool) => f.debug_tuple("Derived").field(tool).finish(),
        }
    }
}

/// Ordered tool collection; lookups return the first entry with a given name.
#[derive(Clone, Debug, Default)]
pub struct ToolSet {
    entries: Vec<ToolEntry>,
}

impl ToolSet {
    /// Base tools first, then derived tools.
    pub fn from_parts(base: Vec<Arc<dyn Tool>>, derived: Vec<DerivedTool>) -> Self {
        let entries = base
            .into_iter()
            .map(ToolEntry::Base)
            .chain(derived.into_iter().map(ToolEntry::Derived))
            .collect();
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.entries
            .iter()
            .find(|entry| entry.name() == name)
            .map(ToolEntry::as_tool)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(ToolEntry::name).collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.entries
            .iter()
            .map(|entry| entry.as_tool().definition())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
