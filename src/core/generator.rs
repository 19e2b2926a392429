//! The top-level generator: dictionary plus naming rules in, one script per location out.
//!
//! Each script is produced by its own `GenerationPass`, so names never leak
//! between scripts or between generators.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::dictionary::{DictionaryError, LanguageDictionary};
use crate::core::error::CodegenError;
use crate::core::namifier::{NamingRules, DEFAULT_MAX_ATTEMPTS};
use crate::core::pass::GenerationPass;
use crate::schema::code_block::Location;
use crate::schema::model::{ModelError, StoryModel};

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("generation error: {0}")]
    Codegen(#[from] CodegenError),
    #[error("dictionary error: {0}")]
    Dictionary(#[from] DictionaryError),
    #[error("model error: {0}")]
    Model(#[from] ModelError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no slot named '{0}' in the story model")]
    UnknownSlot(String),
}

/// Generated source for one script location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    pub location: Location,
    pub code: String,
}

/// Built via `CodeGenerator::builder()`.
#[derive(Debug)]
pub struct CodeGenerator {
    dictionary: LanguageDictionary,
    naming: NamingRules,
}

/// Builder for constructing a `CodeGenerator`.
pub struct CodeGeneratorBuilder {
    dictionary_files: Vec<PathBuf>,
    dictionaries_dir: Option<PathBuf>,
    max_name_attempts: usize,
    naming_pattern: Option<String>,
    /// Directly provided dictionary (for testing without files).
    dictionary: Option<LanguageDictionary>,
}

impl CodeGenerator {
    pub fn builder() -> CodeGeneratorBuilder {
        CodeGeneratorBuilder {
            dictionary_files: Vec::new(),
            dictionaries_dir: None,
            max_name_attempts: DEFAULT_MAX_ATTEMPTS,
            naming_pattern: None,
            dictionary: None,
        }
    }

    pub fn dictionary(&self) -> &LanguageDictionary {
        &self.dictionary
    }

    /// Start a fresh pass with its own naming table.
    pub fn begin_pass<'a>(&'a self, model: &'a StoryModel, location: Location) -> GenerationPass<'a> {
        tracing::debug!(%location, dictionary = %self.dictionary.name, "beginning generation pass");
        GenerationPass::new(model, &self.dictionary, location, &self.naming)
    }

    /// Resolve a named dictionary format against the model root.
    pub fn resolve_format(
        &self,
        model: &StoryModel,
        location: Location,
        format_id: &str,
    ) -> Result<String, GeneratorError> {
        let pass = self.begin_pass(model, location);
        let format = self.dictionary.format(format_id)?;
        Ok(pass.resolve(format)?)
    }

    /// Generate the script for one location using its slot's file format.
    pub fn generate_script(&self, model: &StoryModel, location: Location) -> Result<ScriptOutput, GeneratorError> {
        let slot = model
            .slot(&location.slot)
            .ok_or_else(|| GeneratorError::UnknownSlot(location.slot.clone()))?;
        let code = self.resolve_format(model, location.clone(), &slot.format)?;
        tracing::debug!(%location, bytes = code.len(), "generated script");
        Ok(ScriptOutput { location, code })
    }

    /// Generate one script per distinct cause location, in story order.
    pub fn generate(&self, model: &StoryModel) -> Result<Vec<ScriptOutput>, GeneratorError> {
        let locations = model.script_locations();
        tracing::info!(scripts = locations.len(), dictionary = %self.dictionary.name, "generating scripts");
        locations
            .into_iter()
            .map(|location| self.generate_script(model, location))
            .collect()
    }
}

impl CodeGeneratorBuilder {
    /// Load a dictionary file. Later files override earlier ones.
    pub fn dictionary_file(mut self, path: impl AsRef<Path>) -> Self {
        self.dictionary_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Load every `.ron` dictionary in a directory, in file name order.
    pub fn dictionaries_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.dictionaries_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Provide a dictionary directly (for testing without files).
    pub fn with_dictionary(mut self, dictionary: LanguageDictionary) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    pub fn max_name_attempts(mut self, attempts: usize) -> Self {
        self.max_name_attempts = attempts;
        self
    }

    /// Override the dictionary's naming pattern.
    pub fn naming_pattern(mut self, pattern: &str) -> Self {
        self.naming_pattern = Some(pattern.to_string());
        self
    }

    pub fn build(self) -> Result<CodeGenerator, GeneratorError> {
        let mut dictionary = self.dictionary.unwrap_or_default();

        if let Some(ref dir) = self.dictionaries_dir {
            load_ron_files_from_dir(dir, |path| {
                dictionary.merge(LanguageDictionary::load_from_ron(path)?);
                Ok(())
            })?;
        }

        // Explicit files override the directory
        for path in &self.dictionary_files {
            dictionary.merge(LanguageDictionary::load_from_ron(path)?);
        }

        let naming = NamingRules {
            max_attempts: self.max_name_attempts,
            pattern: self.naming_pattern,
        };
        if let Some(pattern) = &naming.pattern {
            dictionary.naming_pattern = Some(pattern.clone());
        }
        dictionary.validate()?;

        Ok(CodeGenerator { dictionary, naming })
    }
}

/// Load all .ron files from a directory, calling `loader` for each.
fn load_ron_files_from_dir<F>(dir: &Path, mut loader: F) -> Result<(), GeneratorError>
where
    F: FnMut(&Path) -> Result<(), GeneratorError>,
{
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|s| s.to_str()) == Some("ron") {
            paths.push(path);
        }
    }
    paths.sort();
    for path in &paths {
        tracing::debug!(path = %path.display(), "loading dictionary");
        loader(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fragment::Fragment;
    use crate::core::series::Series;
    use crate::schema::binding::{Binding, Resource};
    use crate::schema::code_block::CodeBlock;
    use crate::schema::component::{ComponentKind, KnowIt, ScriptIt, ScriptRole};
    use crate::schema::model::Slot;

    fn build_test_dictionary() -> LanguageDictionary {
        let mut dictionary = LanguageDictionary::new("Test");
        dictionary.formats.insert(
            "file".to_string(),
            vec![Series::new(
                "causes",
                "",
                vec![Fragment::Line(vec![
                    Fragment::literal("on "),
                    Fragment::reference("slot"),
                    Fragment::literal(": "),
                    Fragment::reference("code"),
                ])],
            )
            .into()],
        );
        dictionary
    }

    fn build_test_model() -> StoryModel {
        let mut model = StoryModel::new("Start");
        model.set_slot("onOpen", Slot::new("file"));
        for door in ["door_01", "door_02"] {
            let cause = model
                .add_child(model.root, "Opens", ComponentKind::ScriptIt(ScriptIt::new(ScriptRole::Cause)))
                .unwrap();
            let block = model
                .add_code_block(
                    cause,
                    CodeBlock::new("onOpen")
                        .subject("Door")
                        .code(vec![Fragment::literal("open("), Fragment::reference("subject"), Fragment::literal(")")]),
                )
                .unwrap();
            let knowit = model.add_parameter(block, "Door", KnowIt::typed(&["door"])).unwrap();
            model
                .set_binding(knowit, Binding::Resource(Resource::new(door, door, &["door"])))
                .unwrap();
        }
        model
    }

    #[test]
    fn generate_one_script_per_location() {
        let generator = CodeGenerator::builder()
            .with_dictionary(build_test_dictionary())
            .build()
            .unwrap();
        let scripts = generator.generate(&build_test_model()).unwrap();
        assert_eq!(scripts.len(), 2);
        assert_eq!(scripts[0].location, Location::new("onOpen", Some("door_01")));
        assert_eq!(scripts[0].code, "on onOpen: open(door_01)\n");
        assert_eq!(scripts[1].code, "on onOpen: open(door_02)\n");
    }

    #[test]
    fn unknown_slot_is_reported() {
        let generator = CodeGenerator::builder()
            .with_dictionary(build_test_dictionary())
            .build()
            .unwrap();
        let err = generator
            .generate_script(&build_test_model(), Location::new("onClose", None))
            .unwrap_err();
        assert!(matches!(err, GeneratorError::UnknownSlot(slot) if slot == "onClose"));
    }

    #[test]
    fn builder_naming_pattern_is_validated() {
        let result = CodeGenerator::builder()
            .with_dictionary(build_test_dictionary())
            .naming_pattern("([")
            .build();
        assert!(matches!(result, Err(GeneratorError::Dictionary(DictionaryError::InvalidPattern { .. }))));
    }

    #[test]
    fn missing_dictionary_dir_is_io_error() {
        let result = CodeGenerator::builder()
            .dictionaries_dir("/nonexistent/dictionaries")
            .build();
        assert!(matches!(result, Err(GeneratorError::Io(_))));
    }
}
