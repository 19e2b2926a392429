//! Language dictionaries: per-target code templates and naming grammar.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

use super::error::CodegenError;
use super::fragment::{Condition, DataKey, Fragment, ScopeKey};
use super::legal::LegalPattern;
use super::series::{FilterBy, SeriesSource};

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("template parse error: {0}")]
    TemplateParse(String),
    #[error("invalid pattern '{pattern}' in {location}: {reason}")]
    InvalidPattern {
        pattern: String,
        location: String,
        reason: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// The three ways a function can appear in code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeContextSet {
    #[serde(default)]
    pub declaration: Vec<Fragment>,
    #[serde(default)]
    pub definition: Vec<Fragment>,
    #[serde(default)]
    pub call: Vec<Fragment>,
}

impl CodeContextSet {
    fn overlay(&mut self, other: CodeContextSet) {
        if !other.declaration.is_empty() {
            self.declaration = other.declaration;
        }
        if !other.definition.is_empty() {
            self.definition = other.definition;
        }
        if !other.call.is_empty() {
            self.call = other.call;
        }
    }
}

/// How values of one game type are written in the target language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub code_symbol: String,
    /// Sequence to the text inserted in front of it.
    #[serde(default)]
    pub escapes: HashMap<String, String>,
    /// Per-character pattern; other characters are stripped from values.
    #[serde(default)]
    pub legal_values: Option<String>,
    /// Template for `formattedValue`, resolved against the binding.
    #[serde(default)]
    pub format: Vec<Fragment>,
}

impl TypeInfo {
    pub fn new(code_symbol: &str) -> Self {
        Self {
            code_symbol: code_symbol.to_string(),
            ..Self::default()
        }
    }

    pub fn escape(mut self, sequence: &str, prefix: &str) -> Self {
        self.escapes.insert(sequence.to_string(), prefix.to_string());
        self
    }
}

fn default_indent() -> String {
    "    ".to_string()
}

fn default_newline() -> String {
    "\n".to_string()
}

/// Everything the engine knows about one target language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageDictionary {
    pub name: String,
    #[serde(default = "default_indent")]
    pub indent: String,
    #[serde(default = "default_newline")]
    pub newline: String,
    #[serde(default)]
    pub naming_pattern: Option<String>,
    #[serde(default)]
    pub reserved_words: Vec<String>,
    #[serde(default)]
    pub types: HashMap<String, TypeInfo>,
    #[serde(default)]
    pub function: CodeContextSet,
    #[serde(default)]
    pub formats: HashMap<String, Vec<Fragment>>,
    /// Type whose format renders a conversation's opening line.
    #[serde(default)]
    pub dialogue_type: Option<String>,
    /// Type whose format renders every other dialogue line.
    #[serde(default)]
    pub dialogue_line_type: Option<String>,
}

impl Default for LanguageDictionary {
    fn default() -> Self {
        Self {
            name: String::new(),
            indent: default_indent(),
            newline: default_newline(),
            naming_pattern: None,
            reserved_words: Vec::new(),
            types: HashMap::new(),
            function: CodeContextSet::default(),
            formats: HashMap::new(),
            dialogue_type: None,
            dialogue_line_type: None,
        }
    }
}

impl LanguageDictionary {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Load a dictionary from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<LanguageDictionary, DictionaryError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a dictionary from a RON string and check its patterns.
    pub fn parse_ron(input: &str) -> Result<LanguageDictionary, DictionaryError> {
        let dictionary: LanguageDictionary = ron::from_str(input)?;
        dictionary.validate()?;
        Ok(dictionary)
    }

    /// Merge another dictionary into this one. Entries from `other` override
    /// entries in `self` with the same key; reserved words accumulate.
    pub fn merge(&mut self, other: LanguageDictionary) {
        if !other.name.is_empty() {
            self.name = other.name;
        }
        if other.indent != default_indent() {
            self.indent = other.indent;
        }
        if other.newline != default_newline() {
            self.newline = other.newline;
        }
        if other.naming_pattern.is_some() {
            self.naming_pattern = other.naming_pattern;
        }
        for word in other.reserved_words {
            if !self.reserved_words.contains(&word) {
                self.reserved_words.push(word);
            }
        }
        self.types.extend(other.types);
        self.function.overlay(other.function);
        self.formats.extend(other.formats);
        if other.dialogue_type.is_some() {
            self.dialogue_type = other.dialogue_type;
        }
        if other.dialogue_line_type.is_some() {
            self.dialogue_line_type = other.dialogue_line_type;
        }
    }

    /// Check that every pattern in the dictionary compiles.
    pub fn validate(&self) -> Result<(), DictionaryError> {
        let check = |pattern: &str, location: String| {
            LegalPattern::new(pattern)
                .map(|_| ())
                .map_err(|e| DictionaryError::InvalidPattern {
                    pattern: pattern.to_string(),
                    location,
                    reason: e.to_string(),
                })
        };
        if let Some(pattern) = &self.naming_pattern {
            check(pattern, "naming_pattern".to_string())?;
        }
        for (name, info) in &self.types {
            if let Some(pattern) = &info.legal_values {
                check(pattern, format!("type '{name}'"))?;
            }
        }
        Ok(())
    }

    pub fn format(&self, id: &str) -> Result<&[Fragment], CodegenError> {
        self.formats
            .get(id)
            .map(Vec::as_slice)
            .ok_or_else(|| CodegenError::unknown_format(id))
    }

    pub fn type_info(&self, type_name: &str) -> Option<&TypeInfo> {
        self.types.get(type_name)
    }

    /// Statically check every template against the reference, scope and
    /// series vocabulary.
    pub fn lint(&self) -> Vec<LintIssue> {
        let mut issues = Vec::new();
        if let Err(e) = self.validate() {
            issues.push(LintIssue {
                location: "dictionary".to_string(),
                message: e.to_string(),
            });
        }

        let mut ids: Vec<&String> = self.formats.keys().collect();
        ids.sort();
        for id in ids {
            self.lint_fragments(&self.formats[id], &format!("format '{id}'"), &mut issues);
        }
        let mut type_names: Vec<&String> = self.types.keys().collect();
        type_names.sort();
        for name in type_names {
            self.lint_fragments(&self.types[name].format, &format!("type '{name}'"), &mut issues);
        }
        self.lint_fragments(&self.function.declaration, "function declaration", &mut issues);
        self.lint_fragments(&self.function.definition, "function definition", &mut issues);
        self.lint_fragments(&self.function.call, "function call", &mut issues);
        issues
    }

    fn lint_fragments(&self, fragments: &[Fragment], location: &str, issues: &mut Vec<LintIssue>) {
        let mut report = |message: String| {
            issues.push(LintIssue {
                location: location.to_string(),
                message,
            })
        };
        let mut nested: Vec<&[Fragment]> = Vec::new();
        for fragment in fragments {
            match fragment {
                Fragment::Literal(_) => {}
                Fragment::Reference { data, legal } => {
                    if DataKey::parse(data).is_none() {
                        report(format!("unknown reference '{data}'"));
                    }
                    if let Some(pattern) = legal {
                        if let Err(e) = LegalPattern::new(pattern) {
                            report(format!("invalid legality pattern '{pattern}': {e}"));
                        }
                    }
                }
                Fragment::Scope { data, name_ref, body } => {
                    match ScopeKey::parse(data) {
                        None => report(format!("unknown scope '{data}'")),
                        Some(key) if key.takes_name() && name_ref.is_none() => {
                            report(format!("scope '{data}' needs a name"))
                        }
                        Some(_) => {}
                    }
                    nested.push(body);
                }
                Fragment::Series(series) => {
                    if SeriesSource::parse(&series.source).is_none() {
                        report(format!("unknown series source '{}'", series.source));
                    }
                    if series.filter.by != FilterBy::None {
                        if let Err(e) = LegalPattern::new(&series.filter.pattern) {
                            report(format!("invalid filter pattern '{}': {e}", series.filter.pattern));
                        }
                    }
                    nested.push(&series.body);
                }
                Fragment::Line(body) | Fragment::Indent(body) => nested.push(body),
                Fragment::Format { id, .. } => {
                    if !self.formats.contains_key(id) {
                        report(format!("unknown format '{id}'"));
                    }
                }
                Fragment::Conditional { condition, body } => {
                    if Condition::parse(condition).is_none() {
                        report(format!("unknown condition '{condition}'"));
                    }
                    nested.push(body);
                }
            }
        }
        for body in nested {
            self.lint_fragments(body, location, issues);
        }
    }
}

/// A problem found by [`LanguageDictionary::lint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintIssue {
    pub location: String,
    pub message: String,
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}
