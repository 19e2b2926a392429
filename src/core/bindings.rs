//! Rendering a KnowIt's binding as a target-language value.

use super::context::{BindingKind, Context, Element};
use super::error::CodegenError;
use super::factory::create_context;
use super::legal::escape_value;
use super::resolve::resolve;
use crate::schema::component::StoryComponent;

/// Game type of a binding: the KnowIt's declared type, else the resource's.
pub fn type_name<'b>(knowit: &'b StoryComponent, binding: &BindingKind<'b>) -> Option<&'b str> {
    knowit
        .as_knowit()
        .and_then(|k| k.types.first())
        .or_else(|| match binding {
            BindingKind::Resource(resource) => resource.types.first(),
            _ => None,
        })
        .map(String::as_str)
}

/// The raw value of a binding.
///
/// Resources are escaped through their type's escape table and legal value
/// pattern. Component targets evaluate to their unique name, dialogues to
/// the unique id of their opening line. Function
/// bindings render the dictionary's call template against the called script.
pub fn value(
    ctx: &Context<'_>,
    knowit: &StoryComponent,
    binding: BindingKind<'_>,
    legal: Option<&str>,
) -> Result<String, CodegenError> {
    match binding {
        BindingKind::Unbound => Err(CodegenError::missing("binding", ctx)),
        BindingKind::Resource(resource) => {
            let dictionary = ctx.pass().dictionary();
            let Some(info) = type_name(knowit, &binding).and_then(|t| dictionary.type_info(t)) else {
                return Ok(resource.code_text.clone());
            };
            let legal_chars = info
                .legal_values
                .as_deref()
                .map(|pattern| ctx.pass().legal_pattern(Some(pattern)))
                .transpose()?;
            Ok(escape_value(&resource.code_text, &info.escapes, legal_chars.as_ref()))
        }
        BindingKind::Reference(target) | BindingKind::StoryPoint(target) | BindingKind::Uninitialized(target) => {
            create_context(ctx, &Element::Component(target.id))?.name(legal)
        }
        BindingKind::Dialogue(line) => Ok(line.id.0.to_string()),
        BindingKind::Function(script) => {
            let call = &ctx.pass().dictionary().function.call;
            if call.is_empty() {
                return Err(CodegenError::unknown_format("function call"));
            }
            let script_context = create_context(ctx, &Element::Component(script.id))?;
            resolve(call, &script_context)
        }
    }
}

/// The value passed through the type's format template, when it has one.
pub fn formatted_value(
    ctx: &Context<'_>,
    knowit: &StoryComponent,
    binding: BindingKind<'_>,
    legal: Option<&str>,
) -> Result<String, CodegenError> {
    let format = type_name(knowit, &binding)
        .and_then(|t| ctx.pass().dictionary().type_info(t))
        .map(|info| info.format.as_slice())
        .unwrap_or_default();
    if format.is_empty() {
        value(ctx, knowit, binding, legal)
    } else {
        resolve(format, ctx)
    }
}
