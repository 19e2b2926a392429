//! Conversation trees bound to KnowIts.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::component::ComponentId;

/// Newtype wrapper for dialogue line IDs. Doubles as the line's unique id in
/// generated code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DialogueLineId(pub u64);

impl fmt::Display for DialogueLineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line #{}", self.0)
    }
}

/// Who says a line. Replies alternate between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    Player,
    Npc,
}

impl Speaker {
    pub fn other(self) -> Self {
        match self {
            Self::Player => Self::Npc,
            Self::Npc => Self::Player,
        }
    }

    /// Speaker code emitted into generated scripts.
    pub fn code(self) -> &'static str {
        match self {
            Self::Npc => "2",
            Self::Player => "1",
        }
    }
}

fn enabled_by_default() -> bool {
    true
}

/// One line of a conversation tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueLine {
    #[serde(default)]
    pub id: DialogueLineId,
    pub text: String,
    pub speaker: Speaker,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Rebuilt from child lists when a model is loaded.
    #[serde(default)]
    pub parent: Option<DialogueLineId>,
    #[serde(default)]
    pub children: Vec<DialogueLineId>,
    /// KnowIt holding the line's voice clip.
    #[serde(default)]
    pub audio: Option<ComponentId>,
    /// KnowIt holding the line's portrait.
    #[serde(default)]
    pub image: Option<ComponentId>,
}

impl DialogueLine {
    pub fn new(text: &str, speaker: Speaker) -> Self {
        Self {
            id: DialogueLineId::default(),
            text: text.to_string(),
            speaker,
            enabled: true,
            parent: None,
            children: Vec::new(),
            audio: None,
            image: None,
        }
    }

    /// Roots open a conversation; every other line is a reply.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
