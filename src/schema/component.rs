//! Story components: the closed set of authored node kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::binding::Binding;
use super::code_block::CodeBlockId;

/// Newtype wrapper for story component IDs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub u64);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What part a scripted component plays in the story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptRole {
    /// Fires when a game event occurs; owns active/inactive/always blocks.
    Cause,
    /// Performs an action in the game world.
    Effect,
    /// Wraps its children in flow control (delays, repeats, ...).
    Control,
}

/// A component backed by one or more code blocks from the translator library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptIt {
    pub role: ScriptRole,
    #[serde(default)]
    pub code_blocks: Vec<CodeBlockId>,
    #[serde(default)]
    pub children: Vec<ComponentId>,
    /// Dictionary format used by control scripts.
    #[serde(default)]
    pub control_format: Option<String>,
}

impl ScriptIt {
    pub fn new(role: ScriptRole) -> Self {
        Self {
            role,
            code_blocks: Vec::new(),
            children: Vec::new(),
            control_format: None,
        }
    }

    /// The first code block carries the script's name, type and subject.
    pub fn main_code_block(&self) -> Option<CodeBlockId> {
        self.code_blocks.first().copied()
    }
}

/// A typed variable slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowIt {
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub binding: Binding,
}

impl KnowIt {
    pub fn typed(types: &[&str]) -> Self {
        Self {
            types: types.iter().map(|t| t.to_string()).collect(),
            binding: Binding::Unbound,
        }
    }

    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.binding = binding;
        self
    }
}

/// A conditional branch: an `if` container, an `else` container and a
/// boolean KnowIt deciding between them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AskIt {
    #[serde(default)]
    pub condition: Option<ComponentId>,
    #[serde(default)]
    pub if_child: Option<ComponentId>,
    #[serde(default)]
    pub else_child: Option<ComponentId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryPoint {
    #[serde(default)]
    pub children: Vec<ComponentId>,
    #[serde(default)]
    pub successors: Vec<ComponentId>,
    #[serde(default = "default_fan_in")]
    pub fan_in: u32,
}

fn default_fan_in() -> u32 {
    1
}

impl Default for StoryPoint {
    fn default() -> Self {
        Self {
            children: Vec::new(),
            successors: Vec::new(),
            fan_in: default_fan_in(),
        }
    }
}

/// Names of the two parties in a collaborative task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaborativeRoles {
    pub initiator: String,
    pub responder: String,
}

/// A unit of behaviour. Collaborative tasks hold an initiator container
/// followed by a responder container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub children: Vec<ComponentId>,
    #[serde(default)]
    pub successors: Vec<ComponentId>,
    #[serde(default = "default_chance")]
    pub chance: u32,
    #[serde(default)]
    pub roles: Option<CollaborativeRoles>,
}

fn default_chance() -> u32 {
    100
}

impl Default for Task {
    fn default() -> Self {
        Self {
            children: Vec::new(),
            successors: Vec::new(),
            chance: default_chance(),
            roles: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub children: Vec<ComponentId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Behaviour {
    #[serde(default)]
    pub children: Vec<ComponentId>,
}

/// The closed set of component variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ComponentKind {
    StoryPoint(StoryPoint),
    ScriptIt(ScriptIt),
    KnowIt(KnowIt),
    AskIt(AskIt),
    Container(Container),
    Note,
    Task(Task),
    Behaviour(Behaviour),
}

impl ComponentKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StoryPoint(_) => "story point",
            Self::ScriptIt(script) => match script.role {
                ScriptRole::Cause => "cause",
                ScriptRole::Effect => "effect",
                ScriptRole::Control => "control",
            },
            Self::KnowIt(_) => "knowit",
            Self::AskIt(_) => "askit",
            Self::Container(_) => "container",
            Self::Note => "note",
            Self::Task(_) => "task",
            Self::Behaviour(_) => "behaviour",
        }
    }
}

/// A node in the authored story tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryComponent {
    /// Taken from the model's component table key when loaded.
    #[serde(default)]
    pub id: ComponentId,
    pub display_text: String,
    /// Rebuilt from child lists when a model is loaded.
    #[serde(default)]
    pub owner: Option<ComponentId>,
    pub kind: ComponentKind,
}

impl StoryComponent {
    /// Structural children in authored order, including branch containers.
    pub fn child_ids(&self) -> Vec<ComponentId> {
        match &self.kind {
            ComponentKind::StoryPoint(point) => point.children.clone(),
            ComponentKind::ScriptIt(script) => script.children.clone(),
            ComponentKind::Container(container) => container.children.clone(),
            ComponentKind::Task(task) => task.children.clone(),
            ComponentKind::Behaviour(behaviour) => behaviour.children.clone(),
            ComponentKind::AskIt(ask) => ask.if_child.into_iter().chain(ask.else_child).collect(),
            ComponentKind::KnowIt(_) | ComponentKind::Note => Vec::new(),
        }
    }

    /// The mutable child list, for variants that have one.
    pub fn children_mut(&mut self) -> Option<&mut Vec<ComponentId>> {
        match &mut self.kind {
            ComponentKind::StoryPoint(point) => Some(&mut point.children),
            ComponentKind::ScriptIt(script) => Some(&mut script.children),
            ComponentKind::Container(container) => Some(&mut container.children),
            ComponentKind::Task(task) => Some(&mut task.children),
            ComponentKind::Behaviour(behaviour) => Some(&mut behaviour.children),
            ComponentKind::AskIt(_) | ComponentKind::KnowIt(_) | ComponentKind::Note => None,
        }
    }

    pub fn as_script(&self) -> Option<&ScriptIt> {
        match &self.kind {
            ComponentKind::ScriptIt(script) => Some(script),
            _ => None,
        }
    }

    pub fn as_knowit(&self) -> Option<&KnowIt> {
        match &self.kind {
            ComponentKind::KnowIt(knowit) => Some(knowit),
            _ => None,
        }
    }

    pub fn is_cause(&self) -> bool {
        matches!(self.as_script(), Some(script) if script.role == ScriptRole::Cause)
    }
}
