//! Errors raised while resolving fragments, tagged with the context and the
//! innermost fragment they surfaced from.

use thiserror::Error;

use super::fragment::Fragment;

fn at(fragment: &str) -> String {
    if fragment.is_empty() {
        String::new()
    } else {
        format!(" (in {fragment})")
    }
}

/// Failures raised while resolving fragments. All of them abort the pass.
#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("missing required {what} in {context}{}", at(.fragment))]
    MissingRequiredBinding {
        what: String,
        fragment: String,
        context: String,
    },
    #[error("'{accessor}' is not supported by {context}{}", at(.fragment))]
    UnknownAccessor {
        accessor: String,
        fragment: String,
        context: String,
    },
    #[error("unknown series source '{label}' in {context}{}", at(.fragment))]
    UnknownSeriesSource {
        label: String,
        fragment: String,
        context: String,
    },
    #[error("no unique legal name for '{base}' in {context} after {attempts} attempts{}", at(.fragment))]
    NameSpaceExhausted {
        base: String,
        attempts: usize,
        fragment: String,
        context: String,
    },
    #[error("invalid filter pattern '{pattern}': {reason}{}", at(.fragment))]
    InvalidFilterPattern {
        pattern: String,
        fragment: String,
        reason: String,
    },
    #[error("invalid legality pattern '{pattern}': {reason}{}", at(.fragment))]
    InvalidLegalityPattern {
        pattern: String,
        fragment: String,
        reason: String,
    },
    #[error("{context} has no owner{}", at(.fragment))]
    NoOwner { fragment: String, context: String },
    #[error("unknown format '{id}'{}", at(.fragment))]
    UnknownFormat { id: String, fragment: String },
    #[error("type '{type_name}' has no entry in the dictionary (in {context}){}", at(.fragment))]
    UnknownType {
        type_name: String,
        fragment: String,
        context: String,
    },
    #[error("dangling reference to {element}{}", at(.fragment))]
    DanglingReference { element: String, fragment: String },
}

impl CodegenError {
    pub fn missing(what: impl Into<String>, context: impl ToString) -> Self {
        Self::MissingRequiredBinding {
            what: what.into(),
            fragment: String::new(),
            context: context.to_string(),
        }
    }

    pub fn unknown_accessor(accessor: &str, context: impl ToString) -> Self {
        Self::UnknownAccessor {
            accessor: accessor.to_string(),
            fragment: String::new(),
            context: context.to_string(),
        }
    }

    pub fn unknown_format(id: impl Into<String>) -> Self {
        Self::UnknownFormat {
            id: id.into(),
            fragment: String::new(),
        }
    }

    pub fn dangling(element: impl ToString) -> Self {
        Self::DanglingReference {
            element: element.to_string(),
            fragment: String::new(),
        }
    }

    /// The fragment recorded on this error, empty when raised outside a
    /// fragment walk.
    pub fn fragment(&self) -> &str {
        match self {
            Self::MissingRequiredBinding { fragment, .. }
            | Self::UnknownAccessor { fragment, .. }
            | Self::UnknownSeriesSource { fragment, .. }
            | Self::NameSpaceExhausted { fragment, .. }
            | Self::InvalidFilterPattern { fragment, .. }
            | Self::InvalidLegalityPattern { fragment, .. }
            | Self::NoOwner { fragment, .. }
            | Self::UnknownFormat { fragment, .. }
            | Self::UnknownType { fragment, .. }
            | Self::DanglingReference { fragment, .. } => fragment,
        }
    }

    /// Record the innermost fragment an error was raised from.
    pub(crate) fn in_fragment(mut self, raised_in: &Fragment) -> Self {
        let slot = match &mut self {
            Self::MissingRequiredBinding { fragment, .. }
            | Self::UnknownAccessor { fragment, .. }
            | Self::UnknownSeriesSource { fragment, .. }
            | Self::NameSpaceExhausted { fragment, .. }
            | Self::InvalidFilterPattern { fragment, .. }
            | Self::InvalidLegalityPattern { fragment, .. }
            | Self::NoOwner { fragment, .. }
            | Self::UnknownFormat { fragment, .. }
            | Self::UnknownType { fragment, .. }
            | Self::DanglingReference { fragment, .. } => fragment,
        };
        if slot.is_empty() {
            *slot = raised_in.to_string();
        }
        self
    }

    /// Record the context an error was raised in, for errors created below
    /// the context layer.
    pub(crate) fn in_context(mut self, ctx: impl ToString) -> Self {
        if let Self::NameSpaceExhausted { context, .. } = &mut self {
            if context.is_empty() {
                *context = ctx.to_string();
            }
        }
        self
    }
}
