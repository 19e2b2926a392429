//! Series fragments: collection labels, uniquing and filtering.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::context::Element;
use super::error::CodegenError;
use super::fragment::Fragment;
use super::legal::LegalPattern;
use crate::schema::binding::Binding;
use crate::schema::dialogue::DialogueLineId;
use crate::schema::model::StoryModel;

/// A repeated sub-template over a named collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub source: String,
    #[serde(default)]
    pub separator: String,
    pub body: Vec<Fragment>,
    #[serde(default)]
    pub filter: SeriesFilter,
    /// Drop value-equal duplicates before filtering.
    #[serde(default)]
    pub unique: bool,
}

impl Series {
    pub fn new(source: &str, separator: &str, body: Vec<Fragment>) -> Self {
        Self {
            source: source.to_string(),
            separator: separator.to_string(),
            body,
            filter: SeriesFilter::default(),
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn filtered(mut self, filter: SeriesFilter) -> Self {
        self.filter = filter;
        self
    }
}

impl From<Series> for Fragment {
    fn from(series: Series) -> Self {
        Fragment::Series(series)
    }
}

/// What a series filter compares against its pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterBy {
    #[default]
    None,
    /// Display text of the element.
    Name,
    /// Slot keyword of any of the element's code blocks.
    Slot,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesFilter {
    #[serde(default)]
    pub by: FilterBy,
    #[serde(default)]
    pub pattern: String,
}

impl SeriesFilter {
    pub fn by_name(pattern: &str) -> Self {
        Self {
            by: FilterBy::Name,
            pattern: pattern.to_string(),
        }
    }

    pub fn by_slot(pattern: &str) -> Self {
        Self {
            by: FilterBy::Slot,
            pattern: pattern.to_string(),
        }
    }

    /// Keep elements with at least one comparison string fully matching the
    /// pattern. Plain text elements are compared directly.
    pub fn apply(
        &self,
        model: &StoryModel,
        elements: Vec<Element>,
        fragment: &str,
    ) -> Result<Vec<Element>, CodegenError> {
        if self.by == FilterBy::None {
            return Ok(elements);
        }
        let pattern = LegalPattern::new(&self.pattern).map_err(|e| CodegenError::InvalidFilterPattern {
            pattern: self.pattern.clone(),
            fragment: fragment.to_string(),
            reason: e.to_string(),
        })?;

        let before = elements.len();
        let mut kept = Vec::with_capacity(before);
        for element in elements {
            let keys = comparison_strings(model, &element, self.by)?;
            if keys.iter().any(|key| pattern.matches(key)) {
                kept.push(element);
            }
        }
        tracing::trace!(fragment, before, after = kept.len(), "series filtered");
        Ok(kept)
    }
}

fn comparison_strings(
    model: &StoryModel,
    element: &Element,
    by: FilterBy,
) -> Result<Vec<String>, CodegenError> {
    let dangling = || CodegenError::dangling(element);
    let keys = match element {
        Element::Text(text) => vec![text.clone()],
        Element::Component(id) | Element::Binding(id) => {
            let component = model.get(*id).ok_or_else(dangling)?;
            match (by, element) {
                (FilterBy::Slot, Element::Binding(_)) => Vec::new(),
                (FilterBy::Slot, _) => match component.as_script() {
                    Some(script) => script
                        .code_blocks
                        .iter()
                        .filter_map(|b| model.code_block(*b))
                        .map(|b| b.slot.clone())
                        .collect(),
                    None => Vec::new(),
                },
                _ => vec![component.display_text.clone()],
            }
        }
        Element::DialogueLine(id) => {
            let line = model.dialogue_line(*id).ok_or_else(dangling)?;
            match by {
                FilterBy::Slot => Vec::new(),
                FilterBy::Name | FilterBy::None => vec![line.text.clone()],
            }
        }
        Element::CodeBlock(id) => {
            let block = model.code_block(*id).ok_or_else(dangling)?;
            match by {
                FilterBy::Slot => vec![block.slot.clone()],
                FilterBy::Name | FilterBy::None => block
                    .owner
                    .and_then(|owner| model.get(owner))
                    .map(|owner| vec![owner.display_text.clone()])
                    .unwrap_or_default(),
            }
        }
    };
    Ok(keys)
}

/// What two elements must share to count as the same value. Distinct
/// components with the same kind, text and binding compare equal.
#[derive(Debug, PartialEq, Eq, Hash)]
enum ValueKey {
    Text(String),
    Component {
        kind: &'static str,
        text: String,
        binding: Option<Binding>,
    },
    Binding(Binding),
    CodeBlock {
        source: Option<String>,
        slot: String,
        subject: Option<String>,
        types: Vec<String>,
        parameters: Vec<String>,
    },
    /// A line's value is its unique id.
    DialogueLine(DialogueLineId),
    /// Ids that do not resolve only equal themselves.
    Unresolved(Element),
}

impl ValueKey {
    fn of(model: &StoryModel, element: &Element) -> Self {
        let unresolved = || Self::Unresolved(element.clone());
        match element {
            Element::Text(text) => Self::Text(text.clone()),
            Element::Component(id) => match model.get(*id) {
                Some(component) => Self::Component {
                    kind: component.kind.name(),
                    text: component.display_text.clone(),
                    binding: component.as_knowit().map(|knowit| knowit.binding.clone()),
                },
                None => unresolved(),
            },
            Element::Binding(id) => match model.get(*id).and_then(|c| c.as_knowit()) {
                Some(knowit) => Self::Binding(knowit.binding.clone()),
                None => unresolved(),
            },
            Element::CodeBlock(id) => match model.code_block(*id) {
                Some(block) => Self::CodeBlock {
                    source: block.source.clone(),
                    slot: block.slot.clone(),
                    subject: block.subject.clone(),
                    types: block.types.clone(),
                    parameters: block
                        .parameters
                        .iter()
                        .filter_map(|p| model.get(*p))
                        .map(|p| p.display_text.clone())
                        .collect(),
                },
                None => unresolved(),
            },
            Element::DialogueLine(id) => match model.dialogue_line(*id) {
                Some(_) => Self::DialogueLine(*id),
                None => unresolved(),
            },
        }
    }
}

/// Drop value-equal duplicates, keeping first occurrences in order.
pub fn uniquify(model: &StoryModel, elements: Vec<Element>) -> Vec<Element> {
    let mut seen = FxHashSet::default();
    elements
        .into_iter()
        .filter(|element| seen.insert(ValueKey::of(model, element)))
        .collect()
}

/// The fixed vocabulary of collections a series can walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesSource {
    Includes,
    CodeBlocks,
    ScriptIts,
    Causes,
    Effects,
    Parameters,
    ParametersWithSlot,
    SlotParameters,
    Variables,
    Implicits,
    Children,
    Arguments,
    StoryPoints,
    OrderedStoryPoints,
    ParentNodes,
    ChildrenNodes,
    IdenticalCauses,
    ChildLines,
    OrderedDialogueLines,
}

impl SeriesSource {
    /// Case-insensitive lookup.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_lowercase();
        let source = match label.as_str() {
            "includes" => Self::Includes,
            "codeblocks" => Self::CodeBlocks,
            "scriptits" => Self::ScriptIts,
            "causes" => Self::Causes,
            "effects" => Self::Effects,
            "parameters" => Self::Parameters,
            "parameterswithslot" => Self::ParametersWithSlot,
            "slotparameters" => Self::SlotParameters,
            "variables" => Self::Variables,
            "implicits" => Self::Implicits,
            "children" => Self::Children,
            "arguments" => Self::Arguments,
            "storypoints" => Self::StoryPoints,
            "orderedstorypoints" => Self::OrderedStoryPoints,
            "parentnodes" => Self::ParentNodes,
            "childrennodes" => Self::ChildrenNodes,
            "identicalcauses" => Self::IdenticalCauses,
            "childlines" => Self::ChildLines,
            "ordereddialoguelines" => Self::OrderedDialogueLines,
            _ => return None,
        };
        Some(source)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Includes => "includes",
            Self::CodeBlocks => "codeBlocks",
            Self::ScriptIts => "scriptIts",
            Self::Causes => "causes",
            Self::Effects => "effects",
            Self::Parameters => "parameters",
            Self::ParametersWithSlot => "parametersWithSlot",
            Self::SlotParameters => "slotParameters",
            Self::Variables => "variables",
            Self::Implicits => "implicits",
            Self::Children => "children",
            Self::Arguments => "arguments",
            Self::StoryPoints => "storyPoints",
            Self::OrderedStoryPoints => "orderedStoryPoints",
            Self::ParentNodes => "parentNodes",
            Self::ChildrenNodes => "childrenNodes",
            Self::IdenticalCauses => "identicalCauses",
            Self::ChildLines => "childLines",
            Self::OrderedDialogueLines => "orderedDialogueLines",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::code_block::CodeBlock;
    use crate::schema::binding::Resource;
    use crate::schema::component::{ComponentId, ComponentKind, KnowIt, ScriptIt, ScriptRole};

    fn texts(values: &[&str]) -> Vec<Element> {
        values.iter().map(|v| Element::Text(v.to_string())).collect()
    }

    #[test]
    fn uniquify_keeps_first_occurrence_order() {
        let model = StoryModel::new("Start");
        let out = uniquify(&model, texts(&["A", "A", "B", "A"]));
        assert_eq!(out, texts(&["A", "B"]));
    }

    #[test]
    fn uniquify_compares_components_by_value() {
        let mut model = StoryModel::new("Start");
        let door = Binding::Resource(Resource::new("Door", "door_01", &["door"]));
        let knowit = |binding: &Binding| ComponentKind::KnowIt(KnowIt::typed(&["door"]).with_binding(binding.clone()));
        let first = model.add_child(model.root, "Door", knowit(&door)).unwrap();
        let copy = model.add_child(model.root, "Door", knowit(&door)).unwrap();
        let other = Binding::Resource(Resource::new("Gate", "gate_01", &["door"]));
        let rebound = model.add_child(model.root, "Door", knowit(&other)).unwrap();
        let note = model.add_child(model.root, "Door", ComponentKind::Note).unwrap();

        let elements = vec![
            Element::Component(first),
            Element::Component(copy),
            Element::Component(rebound),
            Element::Component(note),
            Element::Binding(copy),
            Element::Binding(first),
        ];
        let out = uniquify(&model, elements);
        assert_eq!(
            out,
            vec![
                Element::Component(first),
                Element::Component(rebound),
                Element::Component(note),
                Element::Binding(copy),
            ]
        );
    }

    #[test]
    fn uniquify_keeps_distinct_dangling_ids() {
        let model = StoryModel::new("Start");
        let elements = vec![
            Element::Component(ComponentId(40)),
            Element::Component(ComponentId(41)),
            Element::Component(ComponentId(40)),
        ];
        let out = uniquify(&model, elements);
        assert_eq!(out, vec![Element::Component(ComponentId(40)), Element::Component(ComponentId(41))]);
    }

    #[test]
    fn no_filter_keeps_everything() {
        let model = StoryModel::new("Start");
        let out = SeriesFilter::default().apply(&model, texts(&["x", "y"]), "test").unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn text_elements_tested_directly() {
        let model = StoryModel::new("Start");
        let filter = SeriesFilter::by_name("std.*");
        let out = filter
            .apply(&model, texts(&["stdio.h", "math.h", "stdlib.h"]), "test")
            .unwrap();
        assert_eq!(out, texts(&["stdio.h", "stdlib.h"]));
    }

    #[test]
    fn filter_requires_full_match() {
        let model = StoryModel::new("Start");
        let out = SeriesFilter::by_name("std")
            .apply(&model, texts(&["stdio.h"]), "test")
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn slot_filter_checks_code_blocks() {
        let mut model = StoryModel::new("Start");
        let opens = model
            .add_child(model.root, "Opens", ComponentKind::ScriptIt(ScriptIt::new(ScriptRole::Cause)))
            .unwrap();
        model.add_code_block(opens, CodeBlock::new("onOpen")).unwrap();
        let closes = model
            .add_child(model.root, "Closes", ComponentKind::ScriptIt(ScriptIt::new(ScriptRole::Cause)))
            .unwrap();
        let close_block = model.add_code_block(closes, CodeBlock::new("onClose")).unwrap();
        let note = model.add_child(model.root, "Note", ComponentKind::Note).unwrap();

        let elements = vec![
            Element::Component(opens),
            Element::Component(closes),
            Element::Component(note),
            Element::CodeBlock(close_block),
        ];
        let out = SeriesFilter::by_slot("onClose").apply(&model, elements, "test").unwrap();
        assert_eq!(out, vec![Element::Component(closes), Element::CodeBlock(close_block)]);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let model = StoryModel::new("Start");
        let err = SeriesFilter::by_name("([")
            .apply(&model, texts(&["x"]), "series 'includes'")
            .unwrap_err();
        match err {
            CodegenError::InvalidFilterPattern { pattern, fragment, .. } => {
                assert_eq!(pattern, "([");
                assert_eq!(fragment, "series 'includes'");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn sources_parse_case_insensitively() {
        assert_eq!(SeriesSource::parse("Parameters"), Some(SeriesSource::Parameters));
        assert_eq!(SeriesSource::parse("orderedStoryPoints"), Some(SeriesSource::OrderedStoryPoints));
        assert_eq!(SeriesSource::parse("INCLUDES"), Some(SeriesSource::Includes));
        assert_eq!(SeriesSource::parse("whatever"), None);
        assert_eq!(
            SeriesSource::parse(SeriesSource::IdenticalCauses.label()),
            Some(SeriesSource::IdenticalCauses)
        );
    }

    #[test]
    fn series_from_ron() {
        let fragment: Fragment = ron::from_str(
            r#"Series((
                source: "parameters",
                separator: ", ",
                body: [Reference(data: "name")],
                filter: (by: Name, pattern: "t.*"),
                unique: true,
            ))"#,
        )
        .unwrap();
        match fragment {
            Fragment::Series(series) => {
                assert!(series.unique);
                assert_eq!(series.filter, SeriesFilter::by_name("t.*"));
            }
            other => panic!("unexpected fragment {other:?}"),
        }
    }
}
