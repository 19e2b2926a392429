//! The story model arena and its traversals.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use thiserror::Error;

use super::binding::Binding;
use super::code_block::{CodeBlock, CodeBlockId, Location};
use super::component::{ComponentId, ComponentKind, KnowIt, ScriptRole, StoryComponent, StoryPoint};
use super::dialogue::{DialogueLine, DialogueLineId, Speaker};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("component not found: {0}")]
    UnknownComponent(ComponentId),
    #[error("code block not found: {0}")]
    UnknownCodeBlock(CodeBlockId),
    #[error("dialogue line not found: {0}")]
    UnknownDialogueLine(DialogueLineId),
    #[error("component {0} cannot hold children")]
    NotAContainer(ComponentId),
    #[error("component {0} is not a {1}")]
    WrongKind(ComponentId, &'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// A library slot: the game event a cause hooks into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    /// Dictionary format that renders a whole script for this slot.
    pub format: String,
    /// KnowIts the game engine provides to code in this slot.
    #[serde(default)]
    pub parameters: Vec<ComponentId>,
    /// Target-language condition guarding the slot, if any.
    #[serde(default)]
    pub condition: Option<String>,
}

impl Slot {
    pub fn new(format: &str) -> Self {
        Self {
            format: format.to_string(),
            parameters: Vec::new(),
            condition: None,
        }
    }
}

/// The authored story: an arena of components and code blocks rooted at a
/// story point, plus the slot table of the translator library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryModel {
    pub root: ComponentId,
    #[serde(default)]
    pub components: FxHashMap<ComponentId, StoryComponent>,
    #[serde(default)]
    pub code_blocks: FxHashMap<CodeBlockId, CodeBlock>,
    #[serde(default)]
    pub slots: FxHashMap<String, Slot>,
    /// Conversation trees, keyed by line.
    #[serde(default)]
    pub dialogue_lines: FxHashMap<DialogueLineId, DialogueLine>,
}

impl StoryModel {
    /// Create a model holding only a root story point.
    pub fn new(root_text: &str) -> Self {
        let root = ComponentId(0);
        let mut components = FxHashMap::default();
        components.insert(
            root,
            StoryComponent {
                id: root,
                display_text: root_text.to_string(),
                owner: None,
                kind: ComponentKind::StoryPoint(StoryPoint::default()),
            },
        );
        Self {
            root,
            components,
            code_blocks: FxHashMap::default(),
            slots: FxHashMap::default(),
            dialogue_lines: FxHashMap::default(),
        }
    }

    /// Load a story model from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<StoryModel, ModelError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a story model from a RON string. Identities are taken from the
    /// table keys and owner links are rebuilt from the child lists.
    pub fn parse_ron(input: &str) -> Result<StoryModel, ModelError> {
        let mut model: StoryModel = ron::from_str(input)?;
        model.rebuild_owners();
        model.component(model.root)?;
        Ok(model)
    }

    pub fn get(&self, id: ComponentId) -> Option<&StoryComponent> {
        self.components.get(&id)
    }

    pub fn component(&self, id: ComponentId) -> Result<&StoryComponent, ModelError> {
        self.components.get(&id).ok_or(ModelError::UnknownComponent(id))
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Result<&mut StoryComponent, ModelError> {
        self.components.get_mut(&id).ok_or(ModelError::UnknownComponent(id))
    }

    pub fn code_block(&self, id: CodeBlockId) -> Option<&CodeBlock> {
        self.code_blocks.get(&id)
    }

    pub fn dialogue_line(&self, id: DialogueLineId) -> Option<&DialogueLine> {
        self.dialogue_lines.get(&id)
    }

    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.get(name)
    }

    pub fn set_slot(&mut self, name: &str, slot: Slot) {
        self.slots.insert(name.to_string(), slot);
    }

    fn next_component_id(&self) -> ComponentId {
        ComponentId(self.components.keys().map(|id| id.0 + 1).max().unwrap_or(0))
    }

    fn next_code_block_id(&self) -> CodeBlockId {
        CodeBlockId(self.code_blocks.keys().map(|id| id.0 + 1).max().unwrap_or(0))
    }

    fn next_dialogue_line_id(&self) -> DialogueLineId {
        DialogueLineId(self.dialogue_lines.keys().map(|id| id.0 + 1).max().unwrap_or(0))
    }

    fn insert(&mut self, owner: Option<ComponentId>, text: &str, kind: ComponentKind) -> ComponentId {
        let id = self.next_component_id();
        self.components.insert(
            id,
            StoryComponent {
                id,
                display_text: text.to_string(),
                owner,
                kind,
            },
        );
        id
    }

    /// Add a component with no owner, such as a slot parameter.
    pub fn add_detached(&mut self, text: &str, kind: ComponentKind) -> ComponentId {
        self.insert(None, text, kind)
    }

    pub fn add_story_point(&mut self, text: &str, fan_in: u32) -> ComponentId {
        let point = StoryPoint {
            fan_in,
            ..StoryPoint::default()
        };
        self.insert(None, text, ComponentKind::StoryPoint(point))
    }

    /// Append a new component to `parent`'s child list.
    pub fn add_child(
        &mut self,
        parent: ComponentId,
        text: &str,
        kind: ComponentKind,
    ) -> Result<ComponentId, ModelError> {
        if self.component_mut(parent)?.children_mut().is_none() {
            return Err(ModelError::NotAContainer(parent));
        }
        let id = self.insert(Some(parent), text, kind);
        if let Some(children) = self.component_mut(parent)?.children_mut() {
            children.push(id);
        }
        Ok(id)
    }

    /// Add a component owned by `owner` without listing it as a child
    /// (branch containers, conditions).
    pub fn add_owned(
        &mut self,
        owner: ComponentId,
        text: &str,
        kind: ComponentKind,
    ) -> Result<ComponentId, ModelError> {
        self.component(owner)?;
        Ok(self.insert(Some(owner), text, kind))
    }

    /// Start a new conversation with a line spoken by `speaker`.
    pub fn add_dialogue_root(&mut self, text: &str, speaker: Speaker) -> DialogueLineId {
        let id = self.next_dialogue_line_id();
        let mut line = DialogueLine::new(text, speaker);
        line.id = id;
        self.dialogue_lines.insert(id, line);
        id
    }

    /// Append a reply to `parent`, spoken by the other party.
    pub fn add_dialogue_reply(&mut self, parent: DialogueLineId, text: &str) -> Result<DialogueLineId, ModelError> {
        let speaker = self
            .dialogue_line(parent)
            .map(|line| line.speaker.other())
            .ok_or(ModelError::UnknownDialogueLine(parent))?;
        let id = self.next_dialogue_line_id();
        let mut line = DialogueLine::new(text, speaker);
        line.id = id;
        line.parent = Some(parent);
        self.dialogue_lines.insert(id, line);
        if let Some(parent_line) = self.dialogue_lines.get_mut(&parent) {
            parent_line.children.push(id);
        }
        Ok(id)
    }

    /// `id` followed by every line below it, in pre-order.
    pub fn ordered_dialogue_lines(&self, id: DialogueLineId) -> Vec<DialogueLineId> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(line) = self.dialogue_line(next) else {
                continue;
            };
            if !seen.insert(next) {
                continue;
            }
            out.push(next);
            stack.extend(line.children.iter().rev());
        }
        out
    }

    /// Make `to` a successor of `from`. Both must be story points or tasks.
    pub fn link(&mut self, from: ComponentId, to: ComponentId) -> Result<(), ModelError> {
        self.component(to)?;
        match &mut self.component_mut(from)?.kind {
            ComponentKind::StoryPoint(point) => point.successors.push(to),
            ComponentKind::Task(task) => task.successors.push(to),
            _ => return Err(ModelError::WrongKind(from, "story point or task")),
        }
        Ok(())
    }

    /// Attach a code block to a ScriptIt. The first block attached becomes
    /// the script's main code block.
    pub fn add_code_block(
        &mut self,
        script: ComponentId,
        mut block: CodeBlock,
    ) -> Result<CodeBlockId, ModelError> {
        let id = self.next_code_block_id();
        match &mut self.component_mut(script)?.kind {
            ComponentKind::ScriptIt(script_it) => script_it.code_blocks.push(id),
            _ => return Err(ModelError::WrongKind(script, "script")),
        }
        block.id = id;
        block.owner = Some(script);
        self.code_blocks.insert(id, block);
        Ok(id)
    }

    pub fn add_parameter(
        &mut self,
        block: CodeBlockId,
        text: &str,
        knowit: KnowIt,
    ) -> Result<ComponentId, ModelError> {
        let owner = self.block_owner(block)?;
        let id = self.insert(owner, text, ComponentKind::KnowIt(knowit));
        if let Some(code_block) = self.code_blocks.get_mut(&block) {
            code_block.parameters.push(id);
        }
        Ok(id)
    }

    pub fn add_implicit(
        &mut self,
        block: CodeBlockId,
        text: &str,
        knowit: KnowIt,
    ) -> Result<ComponentId, ModelError> {
        let owner = self.block_owner(block)?;
        let id = self.insert(owner, text, ComponentKind::KnowIt(knowit));
        if let Some(code_block) = self.code_blocks.get_mut(&block) {
            code_block.implicits.push(id);
        }
        Ok(id)
    }

    fn block_owner(&self, block: CodeBlockId) -> Result<Option<ComponentId>, ModelError> {
        self.code_blocks
            .get(&block)
            .map(|b| b.owner)
            .ok_or(ModelError::UnknownCodeBlock(block))
    }

    pub fn set_binding(&mut self, knowit: ComponentId, binding: Binding) -> Result<(), ModelError> {
        match &mut self.component_mut(knowit)?.kind {
            ComponentKind::KnowIt(k) => {
                k.binding = binding;
                Ok(())
            }
            _ => Err(ModelError::WrongKind(knowit, "knowit")),
        }
    }

    /// Recompute owner links and identities from the structure.
    pub fn rebuild_owners(&mut self) {
        for (id, component) in self.components.iter_mut() {
            component.id = *id;
        }
        for (id, block) in self.code_blocks.iter_mut() {
            block.id = *id;
        }
        let mut line_parents: Vec<(DialogueLineId, DialogueLineId)> = Vec::new();
        for (id, line) in self.dialogue_lines.iter_mut() {
            line.id = *id;
            line.parent = None;
            line_parents.extend(line.children.iter().map(|child| (*child, *id)));
        }
        for (child, parent) in line_parents {
            if let Some(line) = self.dialogue_lines.get_mut(&child) {
                line.parent = Some(parent);
            }
        }

        let mut component_owners: Vec<(ComponentId, ComponentId)> = Vec::new();
        let mut block_owners: Vec<(CodeBlockId, ComponentId)> = Vec::new();
        for component in self.components.values() {
            for child in component.child_ids() {
                component_owners.push((child, component.id));
            }
            match &component.kind {
                ComponentKind::ScriptIt(script) => {
                    for block in &script.code_blocks {
                        block_owners.push((*block, component.id));
                    }
                }
                ComponentKind::AskIt(ask) => {
                    if let Some(condition) = ask.condition {
                        component_owners.push((condition, component.id));
                    }
                }
                _ => {}
            }
        }
        for (block, owner) in block_owners {
            if let Some(code_block) = self.code_blocks.get_mut(&block) {
                code_block.owner = Some(owner);
                for variable in code_block.parameters.iter().chain(&code_block.implicits) {
                    component_owners.push((*variable, owner));
                }
            }
        }
        for (child, owner) in component_owners {
            if let Some(component) = self.components.get_mut(&child) {
                component.owner = Some(owner);
            }
        }
    }

    /// All structural descendants of `id` in pre-order, excluding `id`.
    pub fn descendants(&self, id: ComponentId) -> Vec<ComponentId> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        seen.insert(id);
        self.collect_descendants(id, &mut seen, &mut out);
        out
    }

    fn collect_descendants(
        &self,
        id: ComponentId,
        seen: &mut FxHashSet<ComponentId>,
        out: &mut Vec<ComponentId>,
    ) {
        let Some(component) = self.get(id) else {
            return;
        };
        for child in component.child_ids() {
            if seen.insert(child) {
                out.push(child);
                self.collect_descendants(child, seen, out);
            }
        }
    }

    /// Every story point reachable from the root, depth first.
    pub fn story_points(&self) -> Vec<ComponentId> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            out.push(id);
            if let Some(ComponentKind::StoryPoint(point)) = self.get(id).map(|c| &c.kind) {
                for successor in point.successors.iter().rev() {
                    stack.push(*successor);
                }
            }
        }
        out
    }

    /// Story points ordered breadth first from the root, so every point
    /// appears after at least one of its parents.
    pub fn ordered_story_points(&self) -> Vec<ComponentId> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::from([self.root]);
        seen.insert(self.root);
        while let Some(id) = queue.pop_front() {
            out.push(id);
            if let Some(ComponentKind::StoryPoint(point)) = self.get(id).map(|c| &c.kind) {
                for successor in &point.successors {
                    if seen.insert(*successor) {
                        queue.push_back(*successor);
                    }
                }
            }
        }
        out
    }

    /// Story points listing `id` as a successor.
    pub fn parents_of(&self, id: ComponentId) -> Vec<ComponentId> {
        self.story_points()
            .into_iter()
            .filter(|point| {
                matches!(
                    self.get(*point).map(|c| &c.kind),
                    Some(ComponentKind::StoryPoint(p)) if p.successors.contains(&id)
                )
            })
            .collect()
    }

    /// Every component below every reachable story point, in story order.
    pub fn all_components(&self) -> Vec<ComponentId> {
        self.story_points()
            .into_iter()
            .flat_map(|point| self.descendants(point))
            .collect()
    }

    /// A script's parameters: the union of its code blocks' parameters.
    pub fn parameters_of(&self, component: &StoryComponent) -> Vec<ComponentId> {
        let mut out = Vec::new();
        if let Some(script) = component.as_script() {
            for block in script.code_blocks.iter().filter_map(|b| self.code_block(*b)) {
                for parameter in &block.parameters {
                    if !out.contains(parameter) {
                        out.push(*parameter);
                    }
                }
            }
        }
        out
    }

    /// The parameter a code block names as its subject.
    pub fn subject_of(&self, block: &CodeBlock) -> Option<ComponentId> {
        let subject = block.subject.as_deref()?;
        let owner_parameters = block
            .owner
            .and_then(|owner| self.get(owner))
            .map(|owner| self.parameters_of(owner))
            .unwrap_or_default();
        block
            .parameters
            .iter()
            .chain(owner_parameters.iter())
            .copied()
            .find(|id| {
                self.get(*id)
                    .is_some_and(|c| c.display_text.eq_ignore_ascii_case(subject))
            })
    }

    /// Text identifying what a binding points at, used to compare locations.
    pub fn binding_text(&self, binding: &Binding) -> Option<String> {
        match binding {
            Binding::Unbound => None,
            Binding::Resource(resource) => Some(resource.code_text.clone()),
            Binding::Reference(id)
            | Binding::Function(id)
            | Binding::StoryPoint(id)
            | Binding::Uninitialized(id) => self.get(*id).map(|c| c.display_text.clone()),
            Binding::Dialogue(id) => self.dialogue_line(*id).map(|line| line.text.clone()),
        }
    }

    pub fn location_of(&self, block: &CodeBlock) -> Location {
        let subject = self
            .subject_of(block)
            .and_then(|id| self.get(id))
            .and_then(|c| c.as_knowit())
            .and_then(|k| self.binding_text(&k.binding));
        Location {
            slot: block.slot.clone(),
            subject,
        }
    }

    /// Whether a block contributes code at `location`. Blocks without a slot
    /// belong everywhere.
    pub fn applies_at(&self, block: &CodeBlock, location: &Location) -> bool {
        block.slot.is_empty() || self.location_of(block) == *location
    }

    /// Distinct locations of every cause's main code block, in story order.
    pub fn script_locations(&self) -> Vec<Location> {
        let mut out: Vec<Location> = Vec::new();
        for id in self.all_components() {
            let Some(component) = self.get(id) else {
                continue;
            };
            let Some(script) = component.as_script() else {
                continue;
            };
            if script.role != ScriptRole::Cause {
                continue;
            }
            if let Some(block) = script.main_code_block().and_then(|b| self.code_block(b)) {
                let location = self.location_of(block);
                if !out.contains(&location) {
                    out.push(location);
                }
            }
        }
        out
    }

    /// Walk the owner chain from `id` (inclusive) to the first component
    /// satisfying `predicate`.
    pub fn enclosing<F>(&self, id: ComponentId, predicate: F) -> Option<&StoryComponent>
    where
        F: Fn(&StoryComponent) -> bool,
    {
        let mut seen = FxHashSet::default();
        let mut current = self.get(id);
        while let Some(component) = current {
            if predicate(component) {
                return Some(component);
            }
            if !seen.insert(component.id) {
                return None;
            }
            current = component.owner.and_then(|owner| self.get(owner));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::binding::Resource;
    use crate::schema::component::{Container, ScriptIt};

    fn door_model() -> (StoryModel, ComponentId, CodeBlockId) {
        let mut model = StoryModel::new("Start");
        let cause = model
            .add_child(model.root, "When Door Opens", ComponentKind::ScriptIt(ScriptIt::new(ScriptRole::Cause)))
            .unwrap();
        let block = model
            .add_code_block(cause, CodeBlock::new("onOpen").subject("Door").source("door_opens"))
            .unwrap();
        let door = model
            .add_parameter(block, "Door", KnowIt::typed(&["door"]))
            .unwrap();
        model.set_binding(door, Binding::Resource(Resource::new("Front Door", "door_01", &["door"]))).unwrap();
        (model, cause, block)
    }

    #[test]
    fn add_child_sets_owner_and_order() {
        let mut model = StoryModel::new("Start");
        let a = model.add_child(model.root, "A", ComponentKind::Note).unwrap();
        let b = model.add_child(model.root, "B", ComponentKind::Note).unwrap();
        assert_eq!(model.get(a).unwrap().owner, Some(model.root));
        assert_eq!(model.get(model.root).unwrap().child_ids(), vec![a, b]);
    }

    #[test]
    fn add_child_rejects_leaves() {
        let mut model = StoryModel::new("Start");
        let note = model.add_child(model.root, "A", ComponentKind::Note).unwrap();
        let err = model.add_child(note, "B", ComponentKind::Note).unwrap_err();
        assert!(matches!(err, ModelError::NotAContainer(id) if id == note));
    }

    #[test]
    fn code_block_location_uses_subject_binding() {
        let (model, _, block) = door_model();
        let location = model.location_of(model.code_block(block).unwrap());
        assert_eq!(location, Location::new("onOpen", Some("door_01")));
        assert_eq!(model.script_locations(), vec![location.clone()]);

        let slotless = CodeBlock::new("");
        assert!(model.applies_at(&slotless, &location));
        assert!(!model.applies_at(model.code_block(block).unwrap(), &Location::new("onOpen", None)));
    }

    #[test]
    fn parameters_belong_to_the_script() {
        let (model, cause, block) = door_model();
        let parameters = model.parameters_of(model.get(cause).unwrap());
        assert_eq!(parameters.len(), 1);
        assert_eq!(model.get(parameters[0]).unwrap().owner, Some(cause));
        assert_eq!(model.code_block(block).unwrap().owner, Some(cause));
    }

    #[test]
    fn story_point_traversal_orders() {
        let mut model = StoryModel::new("Start");
        let a = model.add_story_point("A", 1);
        let b = model.add_story_point("B", 1);
        let c = model.add_story_point("C", 2);
        model.link(model.root, a).unwrap();
        model.link(model.root, b).unwrap();
        model.link(a, c).unwrap();
        model.link(b, c).unwrap();

        assert_eq!(model.story_points(), vec![model.root, a, c, b]);
        assert_eq!(model.ordered_story_points(), vec![model.root, a, b, c]);
        assert_eq!(model.parents_of(c), vec![a, b]);
    }

    #[test]
    fn descendants_are_preorder() {
        let mut model = StoryModel::new("Start");
        let outer = model
            .add_child(model.root, "Outer", ComponentKind::Container(Container::default()))
            .unwrap();
        let inner = model.add_child(outer, "Inner", ComponentKind::Note).unwrap();
        let after = model.add_child(model.root, "After", ComponentKind::Note).unwrap();
        assert_eq!(model.descendants(model.root), vec![outer, inner, after]);
        assert_eq!(model.all_components(), vec![outer, inner, after]);
    }

    #[test]
    fn enclosing_walks_owner_chain() {
        let (model, cause, block) = door_model();
        let door = model.code_block(block).unwrap().parameters[0];
        let found = model.enclosing(door, |c| c.is_cause()).unwrap();
        assert_eq!(found.id, cause);
        assert!(model.enclosing(door, |c| c.display_text == "nowhere").is_none());
    }

    #[test]
    fn parse_ron_rebuilds_owners() {
        let input = r#"(
            root: 0,
            components: {
                0: (display_text: "Start", kind: StoryPoint((children: [1]))),
                1: (display_text: "Open It", kind: ScriptIt((role: Effect, code_blocks: [0]))),
                2: (display_text: "Door", kind: KnowIt((types: ["door"]))),
            },
            code_blocks: {
                0: (slot: "onUse", parameters: [2]),
            },
        )"#;
        let model = StoryModel::parse_ron(input).unwrap();
        assert_eq!(model.get(ComponentId(1)).unwrap().owner, Some(ComponentId(0)));
        assert_eq!(model.get(ComponentId(2)).unwrap().owner, Some(ComponentId(1)));
        assert_eq!(model.code_block(CodeBlockId(0)).unwrap().owner, Some(ComponentId(1)));
        assert_eq!(model.get(ComponentId(2)).unwrap().id, ComponentId(2));
    }

    #[test]
    fn dialogue_replies_alternate_speakers() {
        let mut model = StoryModel::new("Start");
        let greeting = model.add_dialogue_root("Well met.", Speaker::Npc);
        let ask = model.add_dialogue_reply(greeting, "Who are you?").unwrap();
        let answer = model.add_dialogue_reply(ask, "A friend.").unwrap();
        let leave = model.add_dialogue_reply(greeting, "Farewell.").unwrap();

        assert_eq!(model.dialogue_line(ask).unwrap().speaker, Speaker::Player);
        assert_eq!(model.dialogue_line(answer).unwrap().speaker, Speaker::Npc);
        assert_eq!(model.dialogue_line(leave).unwrap().parent, Some(greeting));
        assert_eq!(model.ordered_dialogue_lines(greeting), vec![greeting, ask, answer, leave]);
        assert!(matches!(
            model.add_dialogue_reply(DialogueLineId(40), "?"),
            Err(ModelError::UnknownDialogueLine(DialogueLineId(40)))
        ));
    }

    #[test]
    fn parse_ron_rebuilds_dialogue_parents() {
        let input = r#"(
            root: 0,
            components: {
                0: (display_text: "Start", kind: StoryPoint((children: []))),
            },
            dialogue_lines: {
                0: (text: "Hello", speaker: Npc, children: [1]),
                1: (text: "Hi", speaker: Player, enabled: false),
            },
        )"#;
        let model = StoryModel::parse_ron(input).unwrap();
        let reply = model.dialogue_line(DialogueLineId(1)).unwrap();
        assert_eq!(reply.parent, Some(DialogueLineId(0)));
        assert_eq!(reply.id, DialogueLineId(1));
        assert!(!reply.enabled);
        assert!(model.dialogue_line(DialogueLineId(0)).unwrap().is_root());
    }

    #[test]
    fn parse_ron_requires_root() {
        let err = StoryModel::parse_ron("(root: 5)").unwrap_err();
        assert!(matches!(err, ModelError::UnknownComponent(ComponentId(5))));
    }
}
