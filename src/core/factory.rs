//! Context factory: maps a domain element to the context variant wrapping it.

use super::context::{BindingKind, Context, ContextKind, Element};
use super::error::CodegenError;
use crate::schema::binding::Binding;
use crate::schema::component::{ComponentKind, StoryComponent};
use crate::schema::model::StoryModel;

/// Create the context for `element` as a child of `parent`.
///
/// Every element kind maps to exactly one variant; ids that do not resolve
/// in the model are reported as dangling references.
pub fn create_context<'a>(parent: &'a Context<'a>, element: &Element) -> Result<Context<'a>, CodegenError> {
    let model = parent.pass().model();
    let dangling = || CodegenError::dangling(element);
    let kind = match element {
        Element::Component(id) => component_kind(model.get(*id).ok_or_else(dangling)?),
        Element::CodeBlock(id) => ContextKind::CodeBlock(model.code_block(*id).ok_or_else(dangling)?),
        Element::Binding(id) => {
            let component = model.get(*id).ok_or_else(dangling)?;
            let knowit = component
                .as_knowit()
                .ok_or_else(|| CodegenError::missing("knowit", parent))?;
            ContextKind::Binding(component, binding_kind(model, &knowit.binding).ok_or_else(dangling)?)
        }
        Element::DialogueLine(id) => ContextKind::DialogueLine(model.dialogue_line(*id).ok_or_else(dangling)?),
        Element::Text(text) => ContextKind::Text(text.clone()),
    };
    Ok(parent.child(kind))
}

fn component_kind(component: &StoryComponent) -> ContextKind<'_> {
    match &component.kind {
        ComponentKind::StoryPoint(point) => ContextKind::StoryPoint(component, point),
        ComponentKind::ScriptIt(script) => ContextKind::ScriptIt(component, script),
        ComponentKind::KnowIt(knowit) => ContextKind::KnowIt(component, knowit),
        ComponentKind::AskIt(ask) => ContextKind::AskIt(component, ask),
        ComponentKind::Container(container) => ContextKind::Container(component, container),
        ComponentKind::Note => ContextKind::Note(component),
        ComponentKind::Task(task) => ContextKind::Task(component, task),
        ComponentKind::Behaviour(behaviour) => ContextKind::Behaviour(component, behaviour),
    }
}

fn binding_kind<'a>(model: &'a StoryModel, binding: &'a Binding) -> Option<BindingKind<'a>> {
    let kind = match binding {
        Binding::Unbound => BindingKind::Unbound,
        Binding::Resource(resource) => BindingKind::Resource(resource),
        Binding::Reference(id) => BindingKind::Reference(model.get(*id)?),
        Binding::Function(id) => BindingKind::Function(model.get(*id)?),
        Binding::StoryPoint(id) => BindingKind::StoryPoint(model.get(*id)?),
        Binding::Uninitialized(id) => BindingKind::Uninitialized(model.get(*id)?),
        Binding::Dialogue(id) => BindingKind::Dialogue(model.dialogue_line(*id)?),
    };
    Some(kind)
}
