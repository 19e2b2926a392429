//! One generation pass: the inputs plus the naming state it exclusively owns.

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;

use super::context::Context;
use super::dictionary::LanguageDictionary;
use super::error::CodegenError;
use super::fragment::Fragment;
use super::legal::{LegalPattern, DEFAULT_NAMING_PATTERN};
use super::namifier::{AliasKey, Identity, Namifier, NamingRules};
use super::resolve::resolve;
use crate::schema::code_block::Location;
use crate::schema::model::StoryModel;

/// State shared by every context of a pass. Created per pass and dropped with
/// it; nothing here is reused across passes.
pub struct GenerationPass<'a> {
    model: &'a StoryModel,
    dictionary: &'a LanguageDictionary,
    location: Location,
    naming_pattern: String,
    namifier: RefCell<Namifier>,
    patterns: RefCell<FxHashMap<String, LegalPattern>>,
}

impl fmt::Debug for GenerationPass<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationPass")
            .field("dictionary", &self.dictionary.name)
            .field("location", &self.location)
            .field("naming_pattern", &self.naming_pattern)
            .field("names", &self.namifier.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<'a> GenerationPass<'a> {
    pub fn new(
        model: &'a StoryModel,
        dictionary: &'a LanguageDictionary,
        location: Location,
        rules: &NamingRules,
    ) -> Self {
        let naming_pattern = rules
            .pattern
            .clone()
            .or_else(|| dictionary.naming_pattern.clone())
            .unwrap_or_else(|| DEFAULT_NAMING_PATTERN.to_string());
        Self {
            model,
            dictionary,
            location,
            naming_pattern,
            namifier: RefCell::new(Namifier::new(
                dictionary.reserved_words.iter().cloned(),
                rules.max_attempts,
            )),
            patterns: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn model(&self) -> &'a StoryModel {
        self.model
    }

    pub fn dictionary(&self) -> &'a LanguageDictionary {
        self.dictionary
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// A context wrapping the model's root story point.
    pub fn root_context(&self) -> Result<Context<'_>, CodegenError> {
        Context::root(self)
    }

    /// Resolve `fragments` against the root context.
    pub fn resolve(&self, fragments: &[Fragment]) -> Result<String, CodegenError> {
        let root = self.root_context()?;
        resolve(fragments, &root)
    }

    /// Compiled legality pattern, defaulting to the pass naming pattern.
    pub fn legal_pattern(&self, source: Option<&str>) -> Result<LegalPattern, CodegenError> {
        let source = source.unwrap_or(self.naming_pattern.as_str());
        if let Some(pattern) = self.patterns.borrow().get(source) {
            return Ok(pattern.clone());
        }
        let pattern = LegalPattern::new(source).map_err(|e| CodegenError::InvalidLegalityPattern {
            pattern: source.to_string(),
            fragment: String::new(),
            reason: e.to_string(),
        })?;
        self.patterns
            .borrow_mut()
            .insert(source.to_string(), pattern.clone());
        Ok(pattern)
    }

    pub(crate) fn name(
        &self,
        identity: Identity,
        display_text: &str,
        alias: Option<&AliasKey>,
        legal: Option<&str>,
    ) -> Result<String, CodegenError> {
        if let Some(name) = self.name_of(identity) {
            return Ok(name);
        }
        let pattern = self.legal_pattern(legal)?;
        self.namifier
            .borrow_mut()
            .unique_name(identity, display_text, alias, &pattern)
    }

    /// The name already assigned to `identity` in this pass, if any.
    pub fn name_of(&self, identity: Identity) -> Option<String> {
        self.namifier.borrow().name_of(identity).map(str::to_string)
    }

    /// Names assigned so far, sorted by name.
    pub fn assigned_names(&self) -> Vec<(Identity, String)> {
        let namifier = self.namifier.borrow();
        let mut names: Vec<(Identity, String)> = namifier
            .assignments()
            .map(|(identity, name)| (identity, name.to_string()))
            .collect();
        names.sort_by(|a, b| a.1.cmp(&b.1));
        names
    }
}
