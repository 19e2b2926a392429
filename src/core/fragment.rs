//! Fragment trees: the immutable code templates resolved against contexts.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::dictionary::DictionaryError;
use super::series::Series;

/// A node of a code template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Fragment {
    /// Text emitted verbatim.
    Literal(String),
    /// A value fetched from the current context: `name`, `type`, `value`, ...
    /// `legal` overrides the naming pattern when the lookup assigns a name.
    Reference {
        data: String,
        #[serde(default)]
        legal: Option<String>,
    },
    /// Resolve `body` against a sub-object of the current context.
    Scope {
        data: String,
        #[serde(default)]
        name_ref: Option<String>,
        body: Vec<Fragment>,
    },
    /// Resolve a body once per element of a collection.
    Series(Series),
    /// Indentation, body, newline.
    Line(Vec<Fragment>),
    /// Resolve `body` one indent level deeper.
    Indent(Vec<Fragment>),
    /// Resolve a named dictionary format in place.
    Format {
        id: String,
        #[serde(default)]
        only_for: Option<FormatTarget>,
    },
    /// Indentation and body, only when a context condition holds.
    /// `!` in front of the condition negates it.
    Conditional { condition: String, body: Vec<Fragment> },
}

impl Fragment {
    pub fn literal(text: &str) -> Self {
        Self::Literal(text.to_string())
    }

    pub fn reference(data: &str) -> Self {
        Self::Reference {
            data: data.to_string(),
            legal: None,
        }
    }

    pub fn scope(data: &str, body: Vec<Fragment>) -> Self {
        Self::Scope {
            data: data.to_string(),
            name_ref: None,
            body,
        }
    }

    pub fn named_scope(data: &str, name_ref: &str, body: Vec<Fragment>) -> Self {
        Self::Scope {
            data: data.to_string(),
            name_ref: Some(name_ref.to_string()),
            body,
        }
    }

    pub fn format(id: &str) -> Self {
        Self::Format {
            id: id.to_string(),
            only_for: None,
        }
    }

    pub fn conditional(condition: &str, body: Vec<Fragment>) -> Self {
        Self::Conditional {
            condition: condition.to_string(),
            body,
        }
    }

    /// Parse inline template text into literals and references.
    ///
    /// Syntax:
    /// - `{label}` becomes a `Reference`
    /// - `{{` and `}}` become a literal brace
    /// - everything else is a `Literal`
    pub fn parse_inline(input: &str) -> Result<Vec<Fragment>, DictionaryError> {
        let mut fragments = Vec::new();
        let mut literal_buf = String::new();
        let mut chars = input.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal_buf.push('{');
                }
                '{' => {
                    if !literal_buf.is_empty() {
                        fragments.push(Fragment::Literal(std::mem::take(&mut literal_buf)));
                    }
                    let mut label = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') => {
                                return Err(DictionaryError::TemplateParse(
                                    "nested braces are not allowed".to_string(),
                                ))
                            }
                            Some(other) => label.push(other),
                            None => {
                                return Err(DictionaryError::TemplateParse(
                                    "unclosed brace".to_string(),
                                ))
                            }
                        }
                    }
                    let label = label.trim();
                    if label.is_empty() {
                        return Err(DictionaryError::TemplateParse("empty braces".to_string()));
                    }
                    fragments.push(Fragment::reference(label));
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal_buf.push('}');
                }
                '}' => {
                    return Err(DictionaryError::TemplateParse(
                        "unmatched closing brace".to_string(),
                    ))
                }
                other => literal_buf.push(other),
            }
        }

        if !literal_buf.is_empty() {
            fragments.push(Fragment::Literal(literal_buf));
        }
        Ok(fragments)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => write!(f, "literal {text:?}"),
            Self::Reference { data, .. } => write!(f, "reference '{data}'"),
            Self::Scope { data, name_ref: Some(name), .. } => write!(f, "scope '{data}({name})'"),
            Self::Scope { data, .. } => write!(f, "scope '{data}'"),
            Self::Series(series) => write!(f, "series '{}'", series.source),
            Self::Line(_) => f.write_str("line"),
            Self::Indent(_) => f.write_str("indent"),
            Self::Format { id, .. } => write!(f, "format '{id}'"),
            Self::Conditional { condition, .. } => write!(f, "conditional '{condition}'"),
        }
    }
}

/// Context kinds a `Format` fragment can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatTarget {
    AskIt,
    KnowIt,
    Note,
    ScriptIt,
    Cause,
    Effect,
    ControlIt,
    StoryPoint,
    Container,
    Task,
    Behaviour,
    DialogueLine,
}

/// Values a `Reference` fragment can fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKey {
    Name,
    Note,
    Type,
    Code,
    Value,
    FormattedValue,
    Condition,
    Include,
    TemplateId,
    UniqueId,
    FanIn,
    Index,
    ControlItFormat,
    Subject,
    Slot,
    CurrentStoryPoint,
    Declaration,
    Definition,
    ProbabilityCount,
    TaskProbabilityLowerBound,
    TaskProbabilityUpperBound,
    Text,
    Speaker,
    Enabled,
}

impl DataKey {
    pub const ALL: [DataKey; 24] = [
        Self::Name,
        Self::Note,
        Self::Type,
        Self::Code,
        Self::Value,
        Self::FormattedValue,
        Self::Condition,
        Self::Include,
        Self::TemplateId,
        Self::UniqueId,
        Self::FanIn,
        Self::Index,
        Self::ControlItFormat,
        Self::Subject,
        Self::Slot,
        Self::CurrentStoryPoint,
        Self::Declaration,
        Self::Definition,
        Self::ProbabilityCount,
        Self::TaskProbabilityLowerBound,
        Self::TaskProbabilityUpperBound,
        Self::Text,
        Self::Speaker,
        Self::Enabled,
    ];

    /// Case-insensitive lookup.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_lowercase();
        let key = match label.as_str() {
            "name" => Self::Name,
            "note" | "displaytext" => Self::Note,
            "type" => Self::Type,
            "code" => Self::Code,
            "value" => Self::Value,
            "formattedvalue" => Self::FormattedValue,
            "condition" => Self::Condition,
            "include" => Self::Include,
            "templateid" => Self::TemplateId,
            "uniqueid" => Self::UniqueId,
            "fanin" => Self::FanIn,
            "index" => Self::Index,
            "controlitformat" | "controlformat" => Self::ControlItFormat,
            "subject" => Self::Subject,
            "slot" => Self::Slot,
            "currentstorypoint" => Self::CurrentStoryPoint,
            "declaration" => Self::Declaration,
            "definition" => Self::Definition,
            "probabilitycount" => Self::ProbabilityCount,
            "taskprobabilitylowerbound" => Self::TaskProbabilityLowerBound,
            "taskprobabilityupperbound" => Self::TaskProbabilityUpperBound,
            "text" => Self::Text,
            "speaker" => Self::Speaker,
            "enabled" => Self::Enabled,
            _ => return None,
        };
        Some(key)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Note => "note",
            Self::Type => "type",
            Self::Code => "code",
            Self::Value => "value",
            Self::FormattedValue => "formattedValue",
            Self::Condition => "condition",
            Self::Include => "include",
            Self::TemplateId => "templateId",
            Self::UniqueId => "uniqueId",
            Self::FanIn => "fanIn",
            Self::Index => "index",
            Self::ControlItFormat => "controlItFormat",
            Self::Subject => "subject",
            Self::Slot => "slot",
            Self::CurrentStoryPoint => "currentStoryPoint",
            Self::Declaration => "declaration",
            Self::Definition => "definition",
            Self::ProbabilityCount => "probabilityCount",
            Self::TaskProbabilityLowerBound => "taskProbabilityLowerBound",
            Self::TaskProbabilityUpperBound => "taskProbabilityUpperBound",
            Self::Text => "text",
            Self::Speaker => "speaker",
            Self::Enabled => "enabled",
        }
    }
}

/// Sub-objects a `Scope` fragment can rebind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKey {
    Owner,
    Start,
    StoryPoint,
    Subject,
    Argument,
    SlotParameter,
    MainCodeBlock,
    Cause,
    IfChild,
    ElseChild,
    Condition,
    Binding,
    ActiveChild,
    InactiveChild,
    AlwaysChild,
    Initiator,
    Responder,
    Behaviour,
    Dialogue,
    Audio,
    Image,
}

impl ScopeKey {
    /// Case-insensitive lookup.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_lowercase();
        let key = match label.as_str() {
            "owner" => Self::Owner,
            "start" => Self::Start,
            "storypoint" => Self::StoryPoint,
            "subject" => Self::Subject,
            "argument" => Self::Argument,
            "slotparameter" => Self::SlotParameter,
            "maincodeblock" => Self::MainCodeBlock,
            "cause" => Self::Cause,
            "ifchild" => Self::IfChild,
            "elsechild" => Self::ElseChild,
            "condition" => Self::Condition,
            "binding" => Self::Binding,
            "activechild" => Self::ActiveChild,
            "inactivechild" => Self::InactiveChild,
            "alwayschild" => Self::AlwaysChild,
            "initiator" => Self::Initiator,
            "responder" => Self::Responder,
            "behaviour" | "behavior" => Self::Behaviour,
            "dialogue" => Self::Dialogue,
            "audio" => Self::Audio,
            "image" => Self::Image,
            _ => return None,
        };
        Some(key)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Start => "start",
            Self::StoryPoint => "storyPoint",
            Self::Subject => "subject",
            Self::Argument => "argument",
            Self::SlotParameter => "slotParameter",
            Self::MainCodeBlock => "mainCodeBlock",
            Self::Cause => "cause",
            Self::IfChild => "ifChild",
            Self::ElseChild => "elseChild",
            Self::Condition => "condition",
            Self::Binding => "binding",
            Self::ActiveChild => "activeChild",
            Self::InactiveChild => "inactiveChild",
            Self::AlwaysChild => "alwaysChild",
            Self::Initiator => "initiator",
            Self::Responder => "responder",
            Self::Behaviour => "behaviour",
            Self::Dialogue => "dialogue",
            Self::Audio => "audio",
            Self::Image => "image",
        }
    }

    /// Keys that select among several same-kind objects by name.
    pub fn takes_name(self) -> bool {
        matches!(self, Self::Argument | Self::SlotParameter)
    }
}

/// Context facts a `Conditional` fragment can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKey {
    /// The task ends its chain: it has no successor tasks.
    IsLastTask,
    /// More than one child (successors for tasks and story points).
    HasMultipleChildren,
}

impl ConditionKey {
    /// Case-insensitive lookup.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "islasttask" => Some(Self::IsLastTask),
            "hasmultiplechildren" => Some(Self::HasMultipleChildren),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::IsLastTask => "isLastTask",
            Self::HasMultipleChildren => "hasMultipleChildren",
        }
    }
}

/// A parsed `Conditional` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    pub key: ConditionKey,
    pub negated: bool,
}

impl Condition {
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (negated, label) = match text.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        ConditionKey::parse(label).map(|key| Self { key, negated })
    }

    /// Whether the body runs given the context's answer.
    pub fn holds(self, answer: bool) -> bool {
        answer != self.negated
    }
}
