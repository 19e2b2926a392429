//! Code blocks and the script locations they generate into.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::component::ComponentId;
use crate::core::fragment::Fragment;

/// Newtype wrapper for code block IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeBlockId(pub u64);

impl fmt::Display for CodeBlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block #{}", self.0)
    }
}

/// Where a code block's code ends up: the slot keyword plus the text of
/// the subject it is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub slot: String,
    #[serde(default)]
    pub subject: Option<String>,
}

impl Location {
    pub fn new(slot: &str, subject: Option<&str>) -> Self {
        Self {
            slot: slot.to_string(),
            subject: subject.map(str::to_string),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            Some(subject) => write!(f, "{}@{}", self.slot, subject),
            None => f.write_str(&self.slot),
        }
    }
}

/// A code template attached to a ScriptIt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlock {
    #[serde(default = "unassigned")]
    pub id: CodeBlockId,
    #[serde(default)]
    pub owner: Option<ComponentId>,
    pub slot: String,
    /// Display text of the parameter this block is attached to.
    #[serde(default)]
    pub subject: Option<String>,
    /// Library entry the block was instantiated from. Blocks sharing a source
    /// are copies of the same library code.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<ComponentId>,
    #[serde(default)]
    pub implicits: Vec<ComponentId>,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub code: Vec<Fragment>,
}

fn unassigned() -> CodeBlockId {
    CodeBlockId(0)
}

impl CodeBlock {
    pub fn new(slot: &str) -> Self {
        Self {
            id: unassigned(),
            owner: None,
            slot: slot.to_string(),
            subject: None,
            source: None,
            types: Vec::new(),
            parameters: Vec::new(),
            implicits: Vec::new(),
            includes: Vec::new(),
            code: Vec::new(),
        }
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.subject = Some(subject.to_string());
        self
    }

    pub fn source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn types(mut self, types: &[&str]) -> Self {
        self.types = types.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn includes(mut self, includes: &[&str]) -> Self {
        self.includes = includes.iter().map(|i| i.to_string()).collect();
        self
    }

    pub fn code(mut self, code: Vec<Fragment>) -> Self {
        self.code = code;
        self
    }
}
