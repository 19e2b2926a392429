//! Story Codegen: fragment-based code generation for story models.
//!
//! Walks an authored story graph and renders it into source text for an
//! arbitrary game engine, using code templates (fragments) and a naming
//! grammar supplied by a per-language dictionary.

pub mod core;
pub mod schema;

pub use crate::core::context::{Context, Element};
pub use crate::core::dictionary::{LanguageDictionary, TypeInfo};
pub use crate::core::error::CodegenError;
pub use crate::core::fragment::Fragment;
pub use crate::core::generator::{CodeGenerator, GeneratorError, ScriptOutput};
pub use crate::core::pass::GenerationPass;
pub use crate::core::series::{Series, SeriesFilter};
pub use crate::schema::code_block::Location;
pub use crate::schema::model::StoryModel;
