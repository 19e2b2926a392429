//! Contexts: read-only views binding one domain object to a point in the
//! resolution scope chain.
//!
//! Every context answers the same accessor protocol (`data`, `scope`,
//! `series`). Variants answer the subset that makes sense for the object
//! they wrap and reject the rest with `UnknownAccessor`.

use std::fmt;

use super::bindings;
use super::dictionary::LanguageDictionary;
use super::error::CodegenError;
use super::factory::create_context;
use super::fragment::{ConditionKey, DataKey, FormatTarget, ScopeKey};
use super::namifier::{AliasKey, Identity};
use super::pass::GenerationPass;
use super::resolve::resolve;
use super::series::SeriesSource;
use crate::schema::binding::{Binding, Resource};
use crate::schema::code_block::{CodeBlock, CodeBlockId};
use crate::schema::component::{
    AskIt, Behaviour, ComponentId, ComponentKind, Container, KnowIt, ScriptIt, ScriptRole,
    StoryComponent, StoryPoint, Task,
};
use crate::schema::dialogue::{DialogueLine, DialogueLineId};
use crate::schema::model::StoryModel;

/// Something a context can be created for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Element {
    Component(ComponentId),
    CodeBlock(CodeBlockId),
    /// The binding of the given KnowIt.
    Binding(ComponentId),
    DialogueLine(DialogueLineId),
    Text(String),
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component(id) => write!(f, "component {id}"),
            Self::CodeBlock(id) => write!(f, "{id}"),
            Self::Binding(id) => write!(f, "binding of component {id}"),
            Self::DialogueLine(id) => write!(f, "dialogue {id}"),
            Self::Text(text) => write!(f, "text {text:?}"),
        }
    }
}

/// The binding variants, resolved against the model.
#[derive(Debug, Clone, Copy)]
pub enum BindingKind<'a> {
    Unbound,
    Resource(&'a Resource),
    Reference(&'a StoryComponent),
    Function(&'a StoryComponent),
    StoryPoint(&'a StoryComponent),
    Uninitialized(&'a StoryComponent),
    Dialogue(&'a DialogueLine),
}

impl BindingKind<'_> {
    pub fn name(&self) -> &'static str {
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
}

/// What a context wraps.
#[derive(Debug, Clone)]
pub enum ContextKind<'a> {
    /// The root story point, viewed as the whole generated script.
    File(&'a StoryComponent),
    StoryPoint(&'a StoryComponent, &'a StoryPoint),
    ScriptIt(&'a StoryComponent, &'a ScriptIt),
    KnowIt(&'a StoryComponent, &'a KnowIt),
    AskIt(&'a StoryComponent, &'a AskIt),
    Container(&'a StoryComponent, &'a Container),
    Note(&'a StoryComponent),
    Task(&'a StoryComponent, &'a Task),
    Behaviour(&'a StoryComponent, &'a Behaviour),
    CodeBlock(&'a CodeBlock),
    /// A KnowIt's binding; the component is the KnowIt.
    Binding(&'a StoryComponent, BindingKind<'a>),
    DialogueLine(&'a DialogueLine),
    Text(String),
}

#[derive(Clone)]
pub struct Context<'a> {
    pass: &'a GenerationPass<'a>,
    parent: Option<&'a Context<'a>>,
    kind: ContextKind<'a>,
    indent: String,
}

impl<'a> Context<'a> {
    pub(crate) fn root(pass: &'a GenerationPass<'a>) -> Result<Self, CodegenError> {
        let model = pass.model();
        let root = model
            .get(model.root)
            .ok_or_else(|| CodegenError::dangling(Element::Component(model.root)))?;
        if !matches!(root.kind, ComponentKind::StoryPoint(_)) {
            return Err(CodegenError::missing("root story point", root.display_text.as_str()));
        }
        Ok(Self {
            pass,
            parent: None,
            kind: ContextKind::File(root),
            indent: String::new(),
        })
    }

    pub(crate) fn child(&'a self, kind: ContextKind<'a>) -> Context<'a> {
        Context {
            pass: self.pass,
            parent: Some(self),
            kind,
            indent: self.indent.clone(),
        }
    }

    pub fn pass(&self) -> &'a GenerationPass<'a> {
        self.pass
    }

    pub fn parent(&self) -> Option<&'a Context<'a>> {
        self.parent
    }

    pub fn kind(&self) -> &ContextKind<'a> {
        &self.kind
    }

    pub fn indent(&self) -> &str {
        &self.indent
    }

    /// The same context one indent level deeper.
    pub fn indented(&self) -> Context<'a> {
        let mut deeper = self.clone();
        deeper.indent.push_str(&self.dictionary().indent);
        deeper
    }

    fn model(&self) -> &'a StoryModel {
        self.pass.model()
    }

    fn dictionary(&self) -> &'a LanguageDictionary {
        self.pass.dictionary()
    }

    /// The wrapped component, for component contexts.
    pub fn component(&self) -> Option<&'a StoryComponent> {
        match &self.kind {
            ContextKind::File(c)
            | ContextKind::StoryPoint(c, _)
            | ContextKind::ScriptIt(c, _)
            | ContextKind::KnowIt(c, _)
            | ContextKind::AskIt(c, _)
            | ContextKind::Container(c, _)
            | ContextKind::Note(c)
            | ContextKind::Task(c, _)
            | ContextKind::Behaviour(c, _) => Some(*c),
            ContextKind::CodeBlock(_)
            | ContextKind::Binding(..)
            | ContextKind::DialogueLine(_)
            | ContextKind::Text(_) => None,
        }
    }

    /// The element this context was created for.
    pub fn element(&self) -> Element {
        match &self.kind {
            ContextKind::CodeBlock(block) => Element::CodeBlock(block.id),
            ContextKind::Binding(knowit, _) => Element::Binding(knowit.id),
            ContextKind::DialogueLine(line) => Element::DialogueLine(line.id),
            ContextKind::Text(text) => Element::Text(text.clone()),
            _ => match self.component() {
                Some(component) => Element::Component(component.id),
                None => Element::Text(String::new()),
            },
        }
    }

    pub(crate) fn unsupported(&self, accessor: &str) -> CodegenError {
        CodegenError::unknown_accessor(accessor, self)
    }

    fn missing(&self, what: impl Into<String>) -> CodegenError {
        CodegenError::missing(what, self)
    }

    fn context_for(&self, id: ComponentId) -> Result<Context<'_>, CodegenError> {
        create_context(self, &Element::Component(id))
    }

    /// Whether a `Format` fragment restricted to `target` applies here.
    pub fn is_target(&self, target: FormatTarget) -> bool {
        match (target, &self.kind) {
            (FormatTarget::AskIt, ContextKind::AskIt(..))
            | (FormatTarget::KnowIt, ContextKind::KnowIt(..))
            | (FormatTarget::Note, ContextKind::Note(_))
            | (FormatTarget::ScriptIt, ContextKind::ScriptIt(..))
            | (FormatTarget::StoryPoint, ContextKind::StoryPoint(..) | ContextKind::File(_))
            | (FormatTarget::Container, ContextKind::Container(..))
            | (FormatTarget::Task, ContextKind::Task(..))
            | (FormatTarget::Behaviour, ContextKind::Behaviour(..))
            | (FormatTarget::DialogueLine, ContextKind::DialogueLine(_)) => true,
            (FormatTarget::Cause, ContextKind::ScriptIt(_, s)) => s.role == ScriptRole::Cause,
            (FormatTarget::Effect, ContextKind::ScriptIt(_, s)) => s.role == ScriptRole::Effect,
            (FormatTarget::ControlIt, ContextKind::ScriptIt(_, s)) => s.role == ScriptRole::Control,
            _ => false,
        }
    }

    /// Unique legal name of the wrapped object.
    pub fn name(&self, legal: Option<&str>) -> Result<String, CodegenError> {
        match &self.kind {
            ContextKind::ScriptIt(_, script) => {
                let block = self.main_code_block(script)?;
                self.code_block_name(block, legal)
            }
            ContextKind::CodeBlock(block) => self.code_block_name(block, legal),
            ContextKind::Binding(_, binding) => match binding {
                BindingKind::Resource(resource) => Ok(resource.name.clone()),
                BindingKind::Reference(target)
                | BindingKind::Function(target)
                | BindingKind::StoryPoint(target)
                | BindingKind::Uninitialized(target) => self.context_for(target.id)?.name(legal),
                BindingKind::Dialogue(line) => create_context(self, &Element::DialogueLine(line.id))?.name(legal),
                BindingKind::Unbound => Err(self.missing("binding")),
            },
            ContextKind::DialogueLine(line) => self
                .pass
                .name(Identity::DialogueLine(line.id), &line.text, None, legal)
                .map_err(|e| e.in_context(self)),
            ContextKind::Text(text) => Ok(text.clone()),
            _ => match self.component() {
                Some(component) => {
                    let alias = AliasKey::for_component(self.model(), component.id);
                    self.pass
                        .name(
                            Identity::Component(component.id),
                            &component.display_text,
                            alias.as_ref(),
                            legal,
                        )
                        .map_err(|e| e.in_context(self))
                }
                None => Err(self.unsupported(DataKey::Name.label())),
            },
        }
    }

    fn code_block_name(&self, block: &CodeBlock, legal: Option<&str>) -> Result<String, CodegenError> {
        let display = block
            .owner
            .and_then(|owner| self.model().get(owner))
            .map(|owner| owner.display_text.as_str())
            .unwrap_or_default();
        self.pass
            .name(Identity::CodeBlock(block.id), display, None, legal)
            .map_err(|e| e.in_context(self))
    }

    /// Authored text of the wrapped object.
    pub fn display_text(&self) -> String {
        match &self.kind {
            ContextKind::CodeBlock(block) => block
                .owner
                .and_then(|owner| self.model().get(owner))
                .map(|owner| owner.display_text.clone())
                .unwrap_or_default(),
            ContextKind::Binding(knowit, binding) => match binding {
                BindingKind::Resource(resource) => resource.name.clone(),
                BindingKind::Reference(target)
                | BindingKind::Function(target)
                | BindingKind::StoryPoint(target)
                | BindingKind::Uninitialized(target) => target.display_text.clone(),
                BindingKind::Dialogue(line) => line.text.clone(),
                BindingKind::Unbound => knowit.display_text.clone(),
            },
            ContextKind::DialogueLine(line) => line.text.clone(),
            ContextKind::Text(text) => text.clone(),
            _ => self
                .component()
                .map(|c| c.display_text.clone())
                .unwrap_or_default(),
        }
    }

    /// The object of the enclosing context.
    pub fn owner(&self) -> Result<Element, CodegenError> {
        self.parent
            .map(Context::element)
            .ok_or_else(|| CodegenError::NoOwner {
                fragment: String::new(),
                context: self.to_string(),
            })
    }

    /// Nearest story point up the context chain, falling back to the
    /// model's ownership chain.
    pub fn enclosing_story_point(&self) -> Option<&'a StoryComponent> {
        let mut current = Some(self);
        while let Some(context) = current {
            match &context.kind {
                ContextKind::File(c) | ContextKind::StoryPoint(c, _) => return Some(*c),
                _ => current = context.parent,
            }
        }
        let start = self.component().map(|c| c.id).or_else(|| match &self.kind {
            ContextKind::CodeBlock(block) => block.owner,
            ContextKind::Binding(knowit, _) => Some(knowit.id),
            _ => None,
        })?;
        self.model()
            .enclosing(start, |c| matches!(c.kind, ComponentKind::StoryPoint(_)))
    }

    fn main_code_block(&self, script: &ScriptIt) -> Result<&'a CodeBlock, CodegenError> {
        script
            .main_code_block()
            .and_then(|id| self.model().code_block(id))
            .ok_or_else(|| self.missing("main code block"))
    }

    /// Code blocks of `script` that apply at the pass location.
    fn located_blocks(&self, script: &ScriptIt) -> Vec<&'a CodeBlock> {
        let model = self.model();
        let location = self.pass.location();
        script
            .code_blocks
            .iter()
            .filter_map(|id| model.code_block(*id))
            .filter(|block| model.applies_at(block, location))
            .collect()
    }

    fn code_symbol(&self, type_name: Option<&str>) -> Result<String, CodegenError> {
        let type_name = type_name.ok_or_else(|| self.missing("type"))?;
        self.dictionary()
            .type_info(type_name)
            .map(|info| info.code_symbol.clone())
            .ok_or_else(|| CodegenError::UnknownType {
                type_name: type_name.to_string(),
                fragment: String::new(),
                context: self.to_string(),
            })
    }

    fn subject_value(&self, block: &CodeBlock, legal: Option<&str>) -> Result<String, CodegenError> {
        let subject = self
            .model()
            .subject_of(block)
            .ok_or_else(|| self.missing("subject"))?;
        self.context_for(subject)?.data(DataKey::Value, legal)
    }

    fn index(&self) -> Result<String, CodegenError> {
        let model = self.model();
        let position = match &self.kind {
            ContextKind::CodeBlock(block) => block
                .owner
                .and_then(|owner| model.get(owner))
                .and_then(|owner| owner.as_script())
                .and_then(|script| script.code_blocks.iter().position(|id| *id == block.id)),
            ContextKind::DialogueLine(line) => line
                .parent
                .and_then(|parent| model.dialogue_line(parent))
                .and_then(|parent| parent.children.iter().position(|id| *id == line.id)),
            _ => self.component().and_then(|component| {
                let owner = component.owner.and_then(|owner| model.get(owner))?;
                owner
                    .child_ids()
                    .iter()
                    .position(|id| *id == component.id)
                    .or_else(|| model.parameters_of(owner).iter().position(|id| *id == component.id))
            }),
        };
        position
            .map(|p| p.to_string())
            .ok_or_else(|| self.unsupported(DataKey::Index.label()))
    }

    /// Fetch a value for a `Reference` fragment.
    pub fn data(&self, key: DataKey, legal: Option<&str>) -> Result<String, CodegenError> {
        let model = self.model();
        match (key, &self.kind) {
            (DataKey::Name, _) => self.name(legal),
            (DataKey::Note, _) => Ok(self.display_text()),
            (DataKey::Index, _) => self.index(),
            (DataKey::CurrentStoryPoint, _) => {
                let point = self
                    .enclosing_story_point()
                    .ok_or_else(|| self.missing("enclosing story point"))?;
                self.context_for(point.id)?.name(legal)
            }

            (DataKey::Slot, ContextKind::File(_)) => Ok(self.pass.location().slot.clone()),
            (DataKey::Subject, ContextKind::File(_)) => self
                .pass
                .location()
                .subject
                .clone()
                .ok_or_else(|| self.missing("subject")),

            (DataKey::Value | DataKey::FormattedValue, ContextKind::StoryPoint(..)) => self.name(legal),
            (DataKey::UniqueId, ContextKind::StoryPoint(c, _)) => Ok(c.id.0.to_string()),
            (DataKey::UniqueId, ContextKind::Task(c, _)) => Ok(format!("task{}", c.id.0)),
            (DataKey::ProbabilityCount, ContextKind::Task(_, task)) => {
                Ok(self.total_chance(&task.successors).to_string())
            }
            (DataKey::TaskProbabilityLowerBound, ContextKind::Task(c, _)) => {
                Ok(self.chance_lower_bound(c)?.to_string())
            }
            (DataKey::TaskProbabilityUpperBound, ContextKind::Task(c, task)) => {
                Ok((self.chance_lower_bound(c)? + task.chance).to_string())
            }
            (DataKey::FanIn, ContextKind::StoryPoint(_, point)) => Ok(point.fan_in.to_string()),

            (DataKey::Type, ContextKind::ScriptIt(_, script)) => {
                let block = self.main_code_block(script)?;
                self.code_symbol(block.types.first().map(String::as_str))
            }
            (DataKey::Code, ContextKind::ScriptIt(_, script)) => {
                let mut code = String::new();
                for block in self.located_blocks(script) {
                    let block_context = create_context(self, &Element::CodeBlock(block.id))?;
                    code.push_str(&resolve(&block.code, &block_context)?);
                }
                Ok(code)
            }
            (DataKey::Condition, ContextKind::ScriptIt(_, script)) => {
                let block = self.main_code_block(script)?;
                model
                    .slot(&block.slot)
                    .and_then(|slot| slot.condition.clone())
                    .ok_or_else(|| self.missing(format!("condition of slot '{}'", block.slot)))
            }
            (DataKey::Subject, ContextKind::ScriptIt(_, script)) => {
                let block = self.main_code_block(script)?;
                self.subject_value(block, legal)
            }
            (DataKey::Slot, ContextKind::ScriptIt(_, script)) => Ok(self.main_code_block(script)?.slot.clone()),
            (DataKey::ControlItFormat, ContextKind::ScriptIt(_, script))
                if script.role == ScriptRole::Control =>
            {
                let format = script
                    .control_format
                    .as_deref()
                    .ok_or_else(|| self.missing("control format"))?;
                resolve(self.dictionary().format(format)?, self)
            }
            (DataKey::Declaration, ContextKind::ScriptIt(..)) => {
                resolve(&self.dictionary().function.declaration, self)
            }
            (DataKey::Definition, ContextKind::ScriptIt(..)) => {
                resolve(&self.dictionary().function.definition, self)
            }

            (DataKey::Type, ContextKind::KnowIt(_, knowit)) => {
                self.code_symbol(knowit.types.first().map(String::as_str))
            }
            (
                DataKey::Value | DataKey::FormattedValue | DataKey::TemplateId | DataKey::UniqueId,
                ContextKind::KnowIt(c, _),
            ) => create_context(self, &Element::Binding(c.id))?.data(key, legal),

            (DataKey::Condition, ContextKind::AskIt(_, ask)) => {
                let condition = ask.condition.ok_or_else(|| self.missing("condition"))?;
                self.context_for(condition)?.name(legal)
            }

            (DataKey::Type, ContextKind::CodeBlock(block)) => {
                self.code_symbol(block.types.first().map(String::as_str))
            }
            (DataKey::Code, ContextKind::CodeBlock(block)) => resolve(&block.code, self),
            (DataKey::Slot, ContextKind::CodeBlock(block)) => Ok(block.slot.clone()),
            (DataKey::Subject, ContextKind::CodeBlock(block)) => self.subject_value(block, legal),

            (DataKey::Value, ContextKind::Binding(knowit, binding)) => {
                bindings::value(self, knowit, *binding, legal)
            }
            (DataKey::FormattedValue, ContextKind::Binding(knowit, binding)) => {
                bindings::formatted_value(self, knowit, *binding, legal)
            }
            (DataKey::Type, ContextKind::Binding(knowit, binding)) => {
                self.code_symbol(bindings::type_name(knowit, binding))
            }
            (DataKey::TemplateId, ContextKind::Binding(_, BindingKind::Resource(resource))) => resource
                .template_id
                .clone()
                .ok_or_else(|| self.missing("template id")),
            (DataKey::UniqueId, ContextKind::Binding(_, BindingKind::StoryPoint(point))) => {
                Ok(point.id.0.to_string())
            }
            (DataKey::UniqueId, ContextKind::Binding(_, BindingKind::Dialogue(line))) => Ok(line.id.0.to_string()),

            (DataKey::Value | DataKey::UniqueId, ContextKind::DialogueLine(line)) => Ok(line.id.0.to_string()),
            (DataKey::FormattedValue, ContextKind::DialogueLine(line)) => {
                let format = self
                    .dialogue_type(line)
                    .and_then(|t| self.dictionary().type_info(t))
                    .map(|info| info.format.as_slice())
                    .unwrap_or_default();
                if format.is_empty() {
                    Ok(line.id.0.to_string())
                } else {
                    resolve(format, self)
                }
            }
            (DataKey::Type, ContextKind::DialogueLine(line)) => self.code_symbol(self.dialogue_type(line)),
            (DataKey::Text, ContextKind::DialogueLine(line)) => Ok(line.text.clone()),
            (DataKey::Speaker, ContextKind::DialogueLine(line)) => Ok(line.speaker.code().to_string()),
            (DataKey::Enabled, ContextKind::DialogueLine(line)) => Ok(line.enabled.to_string()),

            (DataKey::Value | DataKey::Include, ContextKind::Text(text)) => Ok(text.clone()),

            _ => Err(self.unsupported(key.label())),
        }
    }

    /// Find the sub-object a `Scope` fragment rebinds to.
    pub fn scope(&self, key: ScopeKey, name_ref: Option<&str>) -> Result<Element, CodegenError> {
        let model = self.model();
        match (key, &self.kind) {
            (ScopeKey::Owner, _) => self.owner(),
            (ScopeKey::Start, _) => Ok(Element::Component(model.root)),
            (ScopeKey::StoryPoint, _) => self
                .enclosing_story_point()
                .map(|point| Element::Component(point.id))
                .ok_or_else(|| self.missing("enclosing story point")),

            (ScopeKey::Argument, ContextKind::ScriptIt(c, _)) => {
                self.find_named(key, name_ref, &model.parameters_of(c))
            }
            (ScopeKey::Argument, ContextKind::CodeBlock(block)) => {
                let mut candidates = block.parameters.clone();
                if let Some(owner) = block.owner.and_then(|owner| model.get(owner)) {
                    candidates.extend(model.parameters_of(owner));
                }
                self.find_named(key, name_ref, &candidates)
            }
            (ScopeKey::Argument, ContextKind::Binding(_, BindingKind::Function(script))) => {
                self.find_named(key, name_ref, &model.parameters_of(script))
            }
            (ScopeKey::SlotParameter, ContextKind::ScriptIt(_, script)) => {
                let parameters = self.slot_parameters(script)?;
                self.find_named(key, name_ref, &parameters)
            }

            (ScopeKey::Subject, ContextKind::ScriptIt(_, script)) => {
                let block = self.main_code_block(script)?;
                model
                    .subject_of(block)
                    .map(Element::Component)
                    .ok_or_else(|| self.missing("subject"))
            }
            (ScopeKey::Subject, ContextKind::CodeBlock(block)) => model
                .subject_of(block)
                .map(Element::Component)
                .ok_or_else(|| self.missing("subject")),
            (ScopeKey::MainCodeBlock, ContextKind::ScriptIt(_, script)) => {
                Ok(Element::CodeBlock(self.main_code_block(script)?.id))
            }

            (ScopeKey::Cause, ContextKind::ScriptIt(..) | ContextKind::CodeBlock(_)) => {
                Ok(Element::Component(self.cause()?.id))
            }
            (
                ScopeKey::ActiveChild | ScopeKey::InactiveChild | ScopeKey::AlwaysChild,
                ContextKind::ScriptIt(..) | ContextKind::CodeBlock(_),
            ) => {
                let index = match key {
                    ScopeKey::ActiveChild => 0,
                    ScopeKey::InactiveChild => 1,
                    _ => 2,
                };
                self.cause()?
                    .child_ids()
                    .get(index)
                    .copied()
                    .map(Element::Component)
                    .ok_or_else(|| self.missing(key.label()))
            }

            (ScopeKey::IfChild, ContextKind::AskIt(_, ask)) => ask
                .if_child
                .map(Element::Component)
                .ok_or_else(|| self.missing("if branch")),
            (ScopeKey::ElseChild, ContextKind::AskIt(_, ask)) => ask
                .else_child
                .map(Element::Component)
                .ok_or_else(|| self.missing("else branch")),
            (ScopeKey::Condition, ContextKind::AskIt(_, ask)) => ask
                .condition
                .map(Element::Component)
                .ok_or_else(|| self.missing("condition")),

            (ScopeKey::Binding, ContextKind::KnowIt(c, _)) => Ok(Element::Binding(c.id)),
            (ScopeKey::Dialogue, ContextKind::KnowIt(_, knowit)) => match &knowit.binding {
                Binding::Dialogue(line) => Ok(Element::DialogueLine(*line)),
                _ => Err(self.missing("dialogue binding")),
            },
            (ScopeKey::Dialogue, ContextKind::Binding(_, BindingKind::Dialogue(line))) => {
                Ok(Element::DialogueLine(line.id))
            }
            (ScopeKey::Audio, ContextKind::DialogueLine(line)) => line
                .audio
                .map(Element::Component)
                .ok_or_else(|| self.missing("audio")),
            (ScopeKey::Image, ContextKind::DialogueLine(line)) => line
                .image
                .map(Element::Component)
                .ok_or_else(|| self.missing("image")),

            (ScopeKey::Initiator | ScopeKey::Responder, ContextKind::Task(_, task)) => {
                if task.roles.is_none() {
                    return Err(self.missing(format!("{} of a collaborative task", key.label())));
                }
                let index = usize::from(key == ScopeKey::Responder);
                task.children
                    .get(index)
                    .copied()
                    .map(Element::Component)
                    .ok_or_else(|| self.missing(key.label()))
            }
            (ScopeKey::Behaviour, ContextKind::Task(c, _)) => model
                .enclosing(c.id, |b| matches!(b.kind, ComponentKind::Behaviour(_)))
                .map(|b| Element::Component(b.id))
                .ok_or_else(|| self.missing("behaviour")),

            _ => Err(self.unsupported(key.label())),
        }
    }

    fn find_named(
        &self,
        key: ScopeKey,
        name_ref: Option<&str>,
        candidates: &[ComponentId],
    ) -> Result<Element, CodegenError> {
        let name = name_ref.ok_or_else(|| self.missing(format!("{} name", key.label())))?;
        candidates
            .iter()
            .copied()
            .find(|id| {
                self.model()
                    .get(*id)
                    .is_some_and(|c| c.display_text.eq_ignore_ascii_case(name))
            })
            .map(Element::Component)
            .ok_or_else(|| self.missing(format!("{} '{name}'", key.label())))
    }

    fn slot_parameters(&self, script: &ScriptIt) -> Result<Vec<ComponentId>, CodegenError> {
        let block = self.main_code_block(script)?;
        Ok(self
            .model()
            .slot(&block.slot)
            .map(|slot| slot.parameters.clone())
            .unwrap_or_default())
    }

    /// The cause this script or code block belongs to.
    fn cause(&self) -> Result<&'a StoryComponent, CodegenError> {
        let start = match &self.kind {
            ContextKind::CodeBlock(block) => block.owner,
            _ => self.component().map(|c| c.id),
        }
        .ok_or_else(|| self.missing("cause"))?;
        self.model()
            .enclosing(start, StoryComponent::is_cause)
            .ok_or_else(|| self.missing("cause"))
    }

    /// Causes whose main code block sits at the pass location.
    fn located_causes(&self) -> Vec<&'a StoryComponent> {
        let model = self.model();
        let location = self.pass.location();
        model
            .all_components()
            .into_iter()
            .filter_map(|id| model.get(id))
            .filter(|c| c.is_cause())
            .filter(|c| {
                c.as_script()
                    .and_then(ScriptIt::main_code_block)
                    .and_then(|id| model.code_block(id))
                    .is_some_and(|block| model.location_of(block) == *location)
            })
            .collect()
    }

    /// Located causes followed by the scripts nested in each.
    fn file_scripts(&self) -> Vec<&'a StoryComponent> {
        let model = self.model();
        let mut out: Vec<&'a StoryComponent> = Vec::new();
        for cause in self.located_causes() {
            let nested = model
                .descendants(cause.id)
                .into_iter()
                .filter_map(|id| model.get(id))
                .filter(|c| c.as_script().is_some());
            for script in std::iter::once(cause).chain(nested) {
                if !out.iter().any(|c| c.id == script.id) {
                    out.push(script);
                }
            }
        }
        out
    }

    fn file_code_blocks(&self) -> Vec<&'a CodeBlock> {
        self.file_scripts()
            .into_iter()
            .filter_map(StoryComponent::as_script)
            .flat_map(|script| self.located_blocks(script))
            .collect()
    }

    fn knowits_among(&self, ids: impl IntoIterator<Item = ComponentId>) -> Vec<Element> {
        ids.into_iter()
            .filter(|id| self.model().get(*id).and_then(StoryComponent::as_knowit).is_some())
            .map(Element::Component)
            .collect()
    }

    fn identical_causes(&self, cause: &StoryComponent, script: &ScriptIt) -> Result<Vec<Element>, CodegenError> {
        let model = self.model();
        let main = self.main_code_block(script)?;
        let Some(source) = main.source.as_deref() else {
            return Ok(vec![Element::Component(cause.id)]);
        };
        let location = model.location_of(main);
        Ok(model
            .all_components()
            .into_iter()
            .filter_map(|id| model.get(id))
            .filter(|c| c.is_cause())
            .filter(|c| {
                c.as_script()
                    .and_then(ScriptIt::main_code_block)
                    .and_then(|id| model.code_block(id))
                    .is_some_and(|block| {
                        block.source.as_deref() == Some(source) && model.location_of(block) == location
                    })
            })
            .map(|c| Element::Component(c.id))
            .collect())
    }

    /// Sum of the chances of the tasks among `ids`.
    fn total_chance(&self, ids: &[ComponentId]) -> u32 {
        ids.iter()
            .filter_map(|id| self.model().get(*id))
            .filter_map(|c| match &c.kind {
                ComponentKind::Task(task) => Some(task.chance),
                _ => None,
            })
            .sum()
    }

    /// Chances of the siblings walked before `task` by the enclosing task's
    /// successor series.
    fn chance_lower_bound(&self, task: &StoryComponent) -> Result<u32, CodegenError> {
        let siblings = self
            .parent
            .and_then(|parent| match &parent.kind {
                ContextKind::Task(_, parent_task) => Some(&parent_task.successors),
                _ => None,
            })
            .filter(|successors| successors.contains(&task.id))
            .ok_or_else(|| self.missing("enclosing task series"))?;
        let before: Vec<ComponentId> = siblings.iter().copied().take_while(|id| *id != task.id).collect();
        Ok(self.total_chance(&before))
    }

    /// Type naming the line's format: the dialogue type for opening lines,
    /// the dialogue line type for replies.
    fn dialogue_type(&self, line: &DialogueLine) -> Option<&'a str> {
        let dictionary = self.dictionary();
        let type_name = if line.is_root() {
            dictionary.dialogue_type.as_deref()
        } else {
            None
        };
        type_name.or(dictionary.dialogue_line_type.as_deref())
    }

    /// Answer a `Conditional` fragment's test.
    pub fn condition(&self, key: ConditionKey) -> Result<bool, CodegenError> {
        match (key, &self.kind) {
            (ConditionKey::IsLastTask, ContextKind::Task(_, task)) => Ok(task.successors.is_empty()),
            (ConditionKey::HasMultipleChildren, ContextKind::Task(_, task)) => Ok(task.successors.len() > 1),
            (ConditionKey::HasMultipleChildren, ContextKind::StoryPoint(_, point)) => {
                Ok(point.successors.len() > 1)
            }
            (ConditionKey::HasMultipleChildren, ContextKind::File(root)) => match &root.kind {
                ComponentKind::StoryPoint(point) => Ok(point.successors.len() > 1),
                _ => Err(self.unsupported(key.label())),
            },
            (ConditionKey::HasMultipleChildren, ContextKind::DialogueLine(line)) => Ok(line.children.len() > 1),
            (ConditionKey::HasMultipleChildren, _) => match self.component() {
                Some(component) => Ok(component.child_ids().len() > 1),
                None => Err(self.unsupported(key.label())),
            },
            _ => Err(self.unsupported(key.label())),
        }
    }

    /// Elements of a named collection, in authored order.
    pub fn series(&self, source: SeriesSource) -> Result<Vec<Element>, CodegenError> {
        let model = self.model();
        let ids = |ids: Vec<ComponentId>| -> Vec<Element> { ids.into_iter().map(Element::Component).collect() };
        let lines =
            |lines: Vec<DialogueLineId>| -> Vec<Element> { lines.into_iter().map(Element::DialogueLine).collect() };
        let texts = |blocks: Vec<&CodeBlock>| -> Vec<Element> {
            blocks
                .into_iter()
                .flat_map(|block| block.includes.iter().cloned().map(Element::Text))
                .collect()
        };
        let scripts_with_role = |role: ScriptRole| -> Vec<Element> {
            self.file_scripts()
                .into_iter()
                .filter(|c| c.as_script().is_some_and(|s| s.role == role))
                .map(|c| Element::Component(c.id))
                .collect()
        };

        let elements = match (source, &self.kind) {
            (SeriesSource::StoryPoints, ContextKind::File(_) | ContextKind::StoryPoint(..)) => {
                ids(model.story_points())
            }
            (SeriesSource::OrderedStoryPoints, ContextKind::File(_) | ContextKind::StoryPoint(..)) => {
                ids(model.ordered_story_points())
            }
            (SeriesSource::ScriptIts, ContextKind::File(_) | ContextKind::StoryPoint(..)) => self
                .file_scripts()
                .into_iter()
                .map(|c| Element::Component(c.id))
                .collect(),
            (SeriesSource::Causes, ContextKind::File(_) | ContextKind::StoryPoint(..)) => {
                scripts_with_role(ScriptRole::Cause)
            }
            (SeriesSource::Effects, ContextKind::File(_) | ContextKind::StoryPoint(..)) => {
                scripts_with_role(ScriptRole::Effect)
            }
            (SeriesSource::CodeBlocks, ContextKind::File(_) | ContextKind::StoryPoint(..)) => self
                .file_code_blocks()
                .into_iter()
                .map(|block| Element::CodeBlock(block.id))
                .collect(),
            (SeriesSource::Includes, ContextKind::File(_) | ContextKind::StoryPoint(..)) => {
                texts(self.file_code_blocks())
            }
            (SeriesSource::Children, ContextKind::File(root)) => ids(root.child_ids()),
            (SeriesSource::Variables, ContextKind::File(_)) => {
                let causes = self.located_causes();
                self.knowits_among(causes.iter().flat_map(|cause| model.descendants(cause.id)))
            }

            (SeriesSource::Children, ContextKind::StoryPoint(c, _)) => ids(c.child_ids()),
            (SeriesSource::Variables, ContextKind::StoryPoint(c, _)) => {
                self.knowits_among(model.descendants(c.id))
            }
            (SeriesSource::ParentNodes, ContextKind::StoryPoint(c, _)) => ids(model.parents_of(c.id)),
            (SeriesSource::ChildrenNodes, ContextKind::StoryPoint(_, point)) => {
                ids(point.successors.clone())
            }

            (SeriesSource::Parameters | SeriesSource::Arguments, ContextKind::ScriptIt(c, _)) => {
                ids(model.parameters_of(c))
            }
            (SeriesSource::ParametersWithSlot, ContextKind::ScriptIt(c, script)) => {
                let mut all = model.parameters_of(c);
                all.extend(self.slot_parameters(script)?);
                ids(all)
            }
            (SeriesSource::SlotParameters, ContextKind::ScriptIt(_, script)) => {
                ids(self.slot_parameters(script)?)
            }
            (SeriesSource::Variables, ContextKind::ScriptIt(_, script)) => {
                let mut variables: Vec<ComponentId> = Vec::new();
                for block in self.located_blocks(script) {
                    for parameter in &block.parameters {
                        if !variables.contains(parameter) {
                            variables.push(*parameter);
                        }
                    }
                }
                ids(variables)
            }
            (SeriesSource::Implicits, ContextKind::ScriptIt(_, script)) => {
                ids(self.main_code_block(script)?.implicits.clone())
            }
            (SeriesSource::CodeBlocks, ContextKind::ScriptIt(_, script)) => self
                .located_blocks(script)
                .into_iter()
                .map(|block| Element::CodeBlock(block.id))
                .collect(),
            (SeriesSource::Includes, ContextKind::ScriptIt(_, script)) => {
                texts(self.located_blocks(script))
            }
            (SeriesSource::Children, ContextKind::ScriptIt(_, script)) => ids(script.children.clone()),
            (SeriesSource::IdenticalCauses, ContextKind::ScriptIt(c, script))
                if script.role == ScriptRole::Cause =>
            {
                self.identical_causes(c, script)?
            }

            (SeriesSource::Variables, ContextKind::KnowIt(_, knowit)) => match knowit.binding.target() {
                Some(target) => match &knowit.binding {
                    Binding::Function(_) => match model.get(target) {
                        Some(script) => ids(model.parameters_of(script)),
                        None => Vec::new(),
                    },
                    _ => ids(vec![target]),
                },
                None => Vec::new(),
            },

            (SeriesSource::Children, ContextKind::AskIt(c, _)) => ids(c.child_ids()),
            (SeriesSource::Variables, ContextKind::AskIt(_, ask)) => ids(ask.condition.into_iter().collect()),

            (SeriesSource::Children, ContextKind::Container(c, _) | ContextKind::Behaviour(c, _)) => {
                ids(c.child_ids())
            }
            (SeriesSource::Variables, ContextKind::Container(c, _) | ContextKind::Behaviour(c, _)) => {
                self.knowits_among(model.descendants(c.id))
            }

            (SeriesSource::Children, ContextKind::Task(c, _)) => ids(c.child_ids()),
            (SeriesSource::ChildrenNodes, ContextKind::Task(_, task)) => ids(task.successors.clone()),

            (SeriesSource::Parameters, ContextKind::CodeBlock(block)) => ids(block.parameters.clone()),
            (SeriesSource::Implicits, ContextKind::CodeBlock(block)) => ids(block.implicits.clone()),
            (SeriesSource::Includes, ContextKind::CodeBlock(block)) => texts(vec![*block]),
            (SeriesSource::Children, ContextKind::CodeBlock(block)) => block
                .owner
                .and_then(|owner| model.get(owner))
                .map(|owner| ids(owner.child_ids()))
                .unwrap_or_default(),
            (SeriesSource::Variables, ContextKind::CodeBlock(block)) => match block.owner {
                Some(owner) => self.knowits_among(model.descendants(owner)),
                None => Vec::new(),
            },

            (
                SeriesSource::Arguments | SeriesSource::Parameters,
                ContextKind::Binding(_, BindingKind::Function(script)),
            ) => ids(model.parameters_of(script)),

            (SeriesSource::ChildLines, ContextKind::DialogueLine(line)) => lines(line.children.clone()),
            (
                SeriesSource::OrderedDialogueLines,
                ContextKind::DialogueLine(line) | ContextKind::Binding(_, BindingKind::Dialogue(line)),
            ) => lines(model.ordered_dialogue_lines(line.id)),

            _ => return Err(self.unsupported(source.label())),
        };
        Ok(elements)
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("kind", &self.kind)
            .field("indent", &self.indent)
            .field("parent", &self.parent.map(ToString::to_string))
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ContextKind::File(root) => write!(
                f,
                "file context for '{}' at {}",
                root.display_text,
                self.pass.location()
            ),
            ContextKind::CodeBlock(block) => write!(f, "code block context for {} ({})", block.id, block.slot),
            ContextKind::Binding(knowit, binding) => {
                write!(f, "{} binding context for '{}'", binding.name(), knowit.display_text)
            }
            ContextKind::DialogueLine(line) => write!(f, "dialogue line context for {} {:?}", line.id, line.text),
            ContextKind::Text(text) => write!(f, "text context {text:?}"),
            _ => match self.component() {
                Some(c) => write!(f, "{} context for '{}'", c.kind.name(), c.display_text),
                None => f.write_str("context"),
            },
        }
    }
}
