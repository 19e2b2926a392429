//! Per-pass assignment of unique, legal identifiers.

use rustc_hash::{FxHashMap, FxHashSet};

use super::error::CodegenError;
use super::legal::{radix36, LegalPattern};
use crate::schema::code_block::CodeBlockId;
use crate::schema::component::{ComponentId, ComponentKind};
use crate::schema::dialogue::DialogueLineId;
use crate::schema::model::StoryModel;

/// Word named from when an object has no display text.
pub const DEFAULT_NAME: &str = "unnamed";

/// Collision suffixes tried before giving up on a name.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10_000;

/// Naming configuration for a generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingRules {
    pub max_attempts: usize,
    /// Overrides the dictionary's naming pattern when set.
    pub pattern: Option<String>,
}

impl Default for NamingRules {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            pattern: None,
        }
    }
}

/// Something that can be named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity {
    Component(ComponentId),
    CodeBlock(CodeBlockId),
    DialogueLine(DialogueLineId),
}

/// Distinct identities that must share a single name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AliasKey {
    /// An implicit variable of library code; every copy of that code uses
    /// the same variable.
    Implicit { source: String, name: String },
    /// A role variable of a collaborative task, shared by both parties.
    Role { task: ComponentId, role: String },
}

impl AliasKey {
    /// The alias a component is named under, if any.
    pub fn for_component(model: &StoryModel, id: ComponentId) -> Option<AliasKey> {
        let component = model.get(id)?;
        component.as_knowit()?;

        let implicit_source = model.code_blocks.values().find_map(|block| {
            if block.implicits.contains(&id) {
                block.source.clone()
            } else {
                None
            }
        });
        if let Some(source) = implicit_source {
            return Some(AliasKey::Implicit {
                source,
                name: component.display_text.clone(),
            });
        }

        let task = model.enclosing(id, |c| {
            matches!(&c.kind, ComponentKind::Task(task) if task.roles.is_some())
        })?;
        let ComponentKind::Task(details) = &task.kind else {
            return None;
        };
        let roles = details.roles.as_ref()?;
        [&roles.initiator, &roles.responder]
            .into_iter()
            .find(|role| role.eq_ignore_ascii_case(&component.display_text))
            .map(|role| AliasKey::Role {
                task: task.id,
                role: role.to_ascii_lowercase(),
            })
    }
}

/// Maps identities to names. A name, once assigned, never changes for the
/// lifetime of the namifier.
#[derive(Debug)]
pub struct Namifier {
    names: FxHashMap<Identity, String>,
    taken: FxHashSet<String>,
    aliases: FxHashMap<AliasKey, String>,
    reserved: FxHashSet<String>,
    max_attempts: usize,
}

impl Namifier {
    pub fn new<I>(reserved: I, max_attempts: usize) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            names: FxHashMap::default(),
            taken: FxHashSet::default(),
            aliases: FxHashMap::default(),
            reserved: reserved.into_iter().collect(),
            max_attempts,
        }
    }

    /// The name assigned to `identity`, if it has been named.
    pub fn name_of(&self, identity: Identity) -> Option<&str> {
        self.names.get(&identity).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Every assignment made so far.
    pub fn assignments(&self) -> impl Iterator<Item = (Identity, &str)> {
        self.names.iter().map(|(identity, name)| (*identity, name.as_str()))
    }

    /// Return the name for `identity`, assigning one on first request.
    pub fn unique_name(
        &mut self,
        identity: Identity,
        display_text: &str,
        alias: Option<&AliasKey>,
        legal: &LegalPattern,
    ) -> Result<String, CodegenError> {
        if let Some(name) = self.name_of(identity) {
            return Ok(name.to_string());
        }
        if let Some(name) = alias.and_then(|key| self.aliases.get(key)).cloned() {
            self.names.insert(identity, name.clone());
            return Ok(name);
        }

        let name = self.build_name(display_text, legal)?;
        tracing::trace!(?identity, %name, "assigned name");
        self.taken.insert(name.clone());
        self.names.insert(identity, name.clone());
        if let Some(key) = alias {
            self.aliases.insert(key.clone(), name.clone());
        }
        Ok(name)
    }

    fn is_available(&self, name: &str, legal: &LegalPattern) -> bool {
        !name.is_empty()
            && legal.matches(name)
            && !self.taken.contains(name)
            && !self.reserved.contains(name)
    }

    fn build_name(&self, display_text: &str, legal: &LegalPattern) -> Result<String, CodegenError> {
        let legalise = |text: &str| legal.strip_leading(&legal.strip(text));

        let mut base = legalise(display_text.trim());
        if base.is_empty() {
            base = legalise(DEFAULT_NAME);
        }
        if base.is_empty() {
            return Err(CodegenError::NameSpaceExhausted {
                base: display_text.to_string(),
                attempts: 0,
                fragment: String::new(),
                context: String::new(),
            });
        }

        let mut candidate = base.clone();
        let mut counter = 0;
        while !self.is_available(&candidate, legal) {
            if counter >= self.max_attempts {
                return Err(CodegenError::NameSpaceExhausted {
                    base,
                    attempts: counter,
                    fragment: String::new(),
                    context: String::new(),
                });
            }
            candidate = legalise(&format!("{base}_{}", radix36(counter)));
            counter += 1;
        }
        Ok(candidate)
    }
}
