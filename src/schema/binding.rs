//! KnowIt bindings: the value a variable slot holds.

use serde::{Deserialize, Serialize};

use super::component::ComponentId;
use super::dialogue::DialogueLineId;

/// A literal game resource, such as a number, a string or a game object tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    /// Raw text emitted into generated code before escaping.
    pub code_text: String,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub template_id: Option<String>,
}

impl Resource {
    pub fn new(name: &str, code_text: &str, types: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            code_text: code_text.to_string(),
            types: types.iter().map(|t| t.to_string()).collect(),
            template_id: None,
        }
    }
}

/// The value attached to a KnowIt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Binding {
    #[default]
    Unbound,
    Resource(Resource),
    /// Refers to another KnowIt by identity.
    Reference(ComponentId),
    /// Calls a ScriptIt.
    Function(ComponentId),
    StoryPoint(ComponentId),
    /// Refers to a KnowIt declared elsewhere that has no value yet.
    Uninitialized(ComponentId),
    /// A conversation, by its opening line.
    Dialogue(DialogueLineId),
}

impl Binding {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Unbound => "unbound",
            Self::Resource(_) => "resource",
            Self::Reference(_) => "reference",
            Self::Function(_) => "function",
            Self::StoryPoint(_) => "story point",
            Self::Uninitialized(_) => "uninitialized",
            Self::Dialogue(_) => "dialogue",
        }
    }

    pub fn is_bound(&self) -> bool {
        !matches!(self, Self::Unbound)
    }

    /// The component this binding points at, if any.
    pub fn target(&self) -> Option<ComponentId> {
        match self {
            Self::Reference(id) | Self::Function(id) | Self::StoryPoint(id) | Self::Uninitialized(id) => {
                Some(*id)
            }
            Self::Unbound | Self::Resource(_) | Self::Dialogue(_) => None,
        }
    }
}
