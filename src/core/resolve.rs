//! The resolution driver: walks a fragment tree against a context.

use super::context::Context;
use super::error::CodegenError;
use super::factory::create_context;
use super::fragment::{Condition, DataKey, Fragment, ScopeKey};
use super::series::{uniquify, Series, SeriesSource};

/// Resolve `fragments` in order against `ctx`, concatenating the results.
pub fn resolve(fragments: &[Fragment], ctx: &Context<'_>) -> Result<String, CodegenError> {
    let mut out = String::new();
    for fragment in fragments {
        resolve_one(fragment, ctx, &mut out).map_err(|e| e.in_fragment(fragment))?;
    }
    Ok(out)
}

fn resolve_one(fragment: &Fragment, ctx: &Context<'_>, out: &mut String) -> Result<(), CodegenError> {
    match fragment {
        Fragment::Literal(text) => out.push_str(text),
        Fragment::Reference { data, legal } => {
            let key = DataKey::parse(data).ok_or_else(|| ctx.unsupported(data))?;
            out.push_str(&ctx.data(key, legal.as_deref())?);
        }
        Fragment::Scope { data, name_ref, body } => {
            let key = ScopeKey::parse(data).ok_or_else(|| ctx.unsupported(data))?;
            let element = ctx.scope(key, name_ref.as_deref())?;
            let inner = create_context(ctx, &element)?;
            out.push_str(&resolve(body, &inner)?);
        }
        Fragment::Series(series) => out.push_str(&resolve_series(series, fragment, ctx)?),
        Fragment::Line(body) => {
            out.push_str(ctx.indent());
            out.push_str(&resolve(body, ctx)?);
            out.push_str(&ctx.pass().dictionary().newline);
        }
        Fragment::Indent(body) => out.push_str(&resolve(body, &ctx.indented())?),
        Fragment::Conditional { condition, body } => {
            let parsed = Condition::parse(condition).ok_or_else(|| ctx.unsupported(condition))?;
            if parsed.holds(ctx.condition(parsed.key)?) {
                out.push_str(ctx.indent());
                out.push_str(&resolve(body, ctx)?);
            }
        }
        Fragment::Format { id, only_for } => {
            if only_for.map_or(true, |target| ctx.is_target(target)) {
                let format = ctx.pass().dictionary().format(id)?;
                out.push_str(&resolve(format, ctx)?);
            }
        }
    }
    Ok(())
}

fn resolve_series(series: &Series, fragment: &Fragment, ctx: &Context<'_>) -> Result<String, CodegenError> {
    let source = SeriesSource::parse(&series.source).ok_or_else(|| CodegenError::UnknownSeriesSource {
        label: series.source.clone(),
        fragment: fragment.to_string(),
        context: ctx.to_string(),
    })?;
    let mut elements = ctx.series(source)?;
    if series.unique {
        elements = uniquify(ctx.pass().model(), elements);
    }
    let elements = series
        .filter
        .apply(ctx.pass().model(), elements, &fragment.to_string())?;

    let mut parts = Vec::with_capacity(elements.len());
    for element in &elements {
        let element_context = create_context(ctx, element)?;
        parts.push(resolve(&series.body, &element_context)?);
    }
    Ok(parts.join(&series.separator))
}
