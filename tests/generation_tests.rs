//! Generation integration tests: fragments resolved end to end against
//! story models.

use pretty_assertions::assert_eq;
use std::path::Path;
use story_codegen::core::context::Element;
use story_codegen::core::dictionary::{LanguageDictionary, TypeInfo};
use story_codegen::core::error::CodegenError;
use story_codegen::core::factory::create_context;
use story_codegen::core::fragment::Fragment;
use story_codegen::core::generator::CodeGenerator;
use story_codegen::core::resolve::resolve;
use story_codegen::core::series::{Series, SeriesFilter};
use story_codegen::schema::binding::{Binding, Resource};
use story_codegen::schema::code_block::{CodeBlock, Location};
use story_codegen::schema::component::{
    AskIt, Behaviour, ComponentId, ComponentKind, KnowIt, ScriptIt, ScriptRole, Task,
};
use story_codegen::schema::dialogue::Speaker;
use story_codegen::schema::model::StoryModel;

fn fixture_generator() -> CodeGenerator {
    CodeGenerator::builder()
        .dictionary_file("tests/fixtures/test_dictionary.ron")
        .build()
        .unwrap()
}

fn fixture_model() -> StoryModel {
    StoryModel::load_from_ron(Path::new("tests/fixtures/test_story.ron")).unwrap()
}

fn generator_with(dictionary: LanguageDictionary) -> CodeGenerator {
    CodeGenerator::builder().with_dictionary(dictionary).build().unwrap()
}

/// Resolve `fragments` against the context of component `id` in a fresh pass.
fn resolve_on(
    generator: &CodeGenerator,
    model: &StoryModel,
    id: ComponentId,
    fragments: &[Fragment],
) -> Result<String, CodegenError> {
    let pass = generator.begin_pass(model, Location::new("", None));
    let root = pass.root_context()?;
    let ctx = create_context(&root, &Element::Component(id))?;
    resolve(fragments, &ctx)
}

fn effect_with_parameters(model: &mut StoryModel, name: &str, parameters: &[&str]) -> ComponentId {
    let effect = model
        .add_child(model.root, name, ComponentKind::ScriptIt(ScriptIt::new(ScriptRole::Effect)))
        .unwrap();
    let block = model.add_code_block(effect, CodeBlock::new("")).unwrap();
    for parameter in parameters {
        model.add_parameter(block, parameter, KnowIt::typed(&["actor"])).unwrap();
    }
    effect
}

fn call_template() -> Vec<Fragment> {
    vec![
        Fragment::literal("call "),
        Fragment::reference("name"),
        Fragment::literal("("),
        Series::new("parameters", ", ", vec![Fragment::reference("name")]).into(),
        Fragment::literal(")"),
    ]
}

#[test]
fn fixture_story_generates_expected_script() {
    let generator = fixture_generator();
    let model = fixture_model();

    let scripts = generator.generate(&model).unwrap();
    assert_eq!(scripts.len(), 1);
    assert_eq!(scripts[0].location, Location::new("onOpen", Some("front_door")));
    assert_eq!(
        scripts[0].code,
        "require \"doors\"\n\
         require \"speech\"\n\
         function WhenDoorOpens(Door)\n\
         \x20 say(\"Say \\\"hi\\\"!\")\n\
         end\n"
    );
}

#[test]
fn generation_is_deterministic_across_passes() {
    let generator = fixture_generator();
    let model = fixture_model();
    let first = generator.generate(&model).unwrap();
    let second = generator.generate(&model).unwrap();
    assert_eq!(first, second);
}

#[test]
fn call_attack_with_parameters() {
    let mut model = StoryModel::new("Start");
    let attack = effect_with_parameters(&mut model, "Attack", &["target", "weapon"]);
    let generator = generator_with(LanguageDictionary::new("Test"));

    let out = resolve_on(&generator, &model, attack, &call_template()).unwrap();
    assert_eq!(out, "call Attack(target, weapon)");
}

#[test]
fn unknown_accessor_never_resolves_to_empty() {
    let mut model = StoryModel::new("Start");
    let attack = effect_with_parameters(&mut model, "Attack", &[]);
    let generator = generator_with(LanguageDictionary::new("Test"));

    let err = resolve_on(&generator, &model, attack, &[Fragment::reference("nonexistent")]).unwrap_err();
    assert!(matches!(err, CodegenError::UnknownAccessor { ref accessor, .. } if accessor == "nonexistent"));

    // In the vocabulary, but not meaningful for a script.
    let err = resolve_on(&generator, &model, attack, &[Fragment::reference("fanIn")]).unwrap_err();
    assert!(matches!(err, CodegenError::UnknownAccessor { ref accessor, .. } if accessor == "fanIn"));
}

#[test]
fn empty_series_resolves_to_empty_string() {
    let mut model = StoryModel::new("Start");
    let idle = effect_with_parameters(&mut model, "Idle", &[]);
    let generator = generator_with(LanguageDictionary::new("Test"));

    let out = resolve_on(&generator, &model, idle, &call_template()).unwrap();
    assert_eq!(out, "call Idle()");
}

#[test]
fn unique_series_keeps_first_occurrences() {
    let mut model = StoryModel::new("Start");
    let effect = model
        .add_child(model.root, "Load", ComponentKind::ScriptIt(ScriptIt::new(ScriptRole::Effect)))
        .unwrap();
    model
        .add_code_block(effect, CodeBlock::new("").includes(&["A", "A", "B"]))
        .unwrap();
    let generator = generator_with(LanguageDictionary::new("Test"));

    let body = vec![Fragment::reference("value")];
    let plain = vec![Series::new("includes", ",", body.clone()).into()];
    let unique = vec![Series::new("includes", ",", body.clone()).unique().into()];
    let filtered = vec![Series::new("includes", ",", body)
        .unique()
        .filtered(SeriesFilter::by_name("B"))
        .into()];

    assert_eq!(resolve_on(&generator, &model, effect, &plain).unwrap(), "A,A,B");
    assert_eq!(resolve_on(&generator, &model, effect, &unique).unwrap(), "A,B");
    assert_eq!(resolve_on(&generator, &model, effect, &filtered).unwrap(), "B");
}

#[test]
fn unique_series_drops_value_equal_components() {
    let mut model = StoryModel::new("Start");
    let door = Binding::Resource(Resource::new("Door", "door_01", &["door"]));
    for _ in 0..2 {
        model
            .add_child(model.root, "Door", ComponentKind::KnowIt(KnowIt::typed(&["door"]).with_binding(door.clone())))
            .unwrap();
    }
    model
        .add_child(model.root, "Lever", ComponentKind::KnowIt(KnowIt::typed(&["lever"])))
        .unwrap();
    let generator = generator_with(LanguageDictionary::new("Test"));

    let body = vec![Fragment::reference("name")];
    let plain = vec![Series::new("children", ",", body.clone()).into()];
    let unique = vec![Series::new("children", ",", body).unique().into()];

    let pass = generator.begin_pass(&model, Location::new("", None));
    assert_eq!(pass.resolve(&plain).unwrap(), "Door,Door_0,Lever");
    let pass = generator.begin_pass(&model, Location::new("", None));
    assert_eq!(pass.resolve(&unique).unwrap(), "Door,Lever");
}

#[test]
fn exhausted_names_report_context_and_fragment() {
    let mut model = StoryModel::new("Start");
    model.add_child(model.root, "door", ComponentKind::Note).unwrap();
    model.add_child(model.root, "door", ComponentKind::Note).unwrap();
    let generator = CodeGenerator::builder()
        .with_dictionary(LanguageDictionary::new("Test"))
        .naming_pattern("[a-z]+")
        .max_name_attempts(5)
        .build()
        .unwrap();

    let pass = generator.begin_pass(&model, Location::new("", None));
    let fragments = vec![Series::new("children", ",", vec![Fragment::reference("name")]).into()];
    let err = pass.resolve(&fragments).unwrap_err();
    match err {
        CodegenError::NameSpaceExhausted {
            base,
            attempts,
            fragment,
            context,
        } => {
            assert_eq!(base, "door");
            assert_eq!(attempts, 5);
            assert_eq!(fragment, "reference 'name'");
            assert_eq!(context, "note context for 'door'");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn resource_values_are_escaped_once_per_occurrence() {
    let mut model = StoryModel::new("Start");
    let effect = effect_with_parameters(&mut model, "Speak", &[]);
    let line = model
        .add_child(effect, "Line", ComponentKind::KnowIt(KnowIt::typed(&["text"])))
        .unwrap();
    model
        .set_binding(line, Binding::Resource(Resource::new("Line", "He said \"hi\" #1", &["text"])))
        .unwrap();

    let mut dictionary = LanguageDictionary::new("Test");
    let mut text = TypeInfo::new("string").escape("\"", "\\");
    text.legal_values = Some("[a-zA-Z0-9 \"]".to_string());
    dictionary.types.insert("text".to_string(), text);
    let generator = generator_with(dictionary);

    let out = resolve_on(&generator, &model, line, &[Fragment::reference("value")]).unwrap();
    assert_eq!(out, "He said \\\"hi\\\" 1");
    assert_eq!(out.matches("\\\"").count(), 2);
}

#[test]
fn function_binding_renders_call_template() {
    let mut model = StoryModel::new("Start");
    let attack = effect_with_parameters(&mut model, "Attack", &["target", "weapon"]);
    let report = effect_with_parameters(&mut model, "Report", &["Outcome"]);
    let outcome = model.parameters_of(model.get(report).unwrap())[0];
    model.set_binding(outcome, Binding::Function(attack)).unwrap();

    let mut dictionary = LanguageDictionary::new("Test");
    dictionary.function.call = vec![
        Fragment::reference("name"),
        Fragment::literal("("),
        Series::new("parameters", ", ", vec![Fragment::reference("name")]).into(),
        Fragment::literal(")"),
    ];
    let generator = generator_with(dictionary);

    let out = resolve_on(&generator, &model, outcome, &[Fragment::reference("value")]).unwrap();
    assert_eq!(out, "Attack(target, weapon)");
}

#[test]
fn function_binding_without_call_template_fails() {
    let mut model = StoryModel::new("Start");
    let attack = effect_with_parameters(&mut model, "Attack", &[]);
    let report = effect_with_parameters(&mut model, "Report", &["Outcome"]);
    let outcome = model.parameters_of(model.get(report).unwrap())[0];
    model.set_binding(outcome, Binding::Function(attack)).unwrap();
    let generator = generator_with(LanguageDictionary::new("Test"));

    let err = resolve_on(&generator, &model, outcome, &[Fragment::reference("value")]).unwrap_err();
    assert!(matches!(err, CodegenError::UnknownFormat { .. }));
}

#[test]
fn reference_binding_resolves_to_target_name() {
    let mut model = StoryModel::new("Start");
    let effect = effect_with_parameters(&mut model, "Follow", &["Leader", "Copy"]);
    let parameters = model.parameters_of(model.get(effect).unwrap());
    model.set_binding(parameters[1], Binding::Reference(parameters[0])).unwrap();
    let generator = generator_with(LanguageDictionary::new("Test"));

    let fragments = vec![Fragment::reference("name"), Fragment::literal("="), Fragment::reference("value")];
    let out = resolve_on(&generator, &model, parameters[1], &fragments).unwrap();
    assert_eq!(out, "Copy=Leader");
}

#[test]
fn missing_bindings_fail_loudly() {
    let mut model = StoryModel::new("Start");
    let effect = effect_with_parameters(&mut model, "Wave", &["Target"]);
    let target = model.parameters_of(model.get(effect).unwrap())[0];
    let ask = model
        .add_child(model.root, "Is It Open", ComponentKind::AskIt(AskIt::default()))
        .unwrap();
    let generator = generator_with(LanguageDictionary::new("Test"));

    let err = resolve_on(&generator, &model, target, &[Fragment::reference("value")]).unwrap_err();
    assert!(matches!(err, CodegenError::MissingRequiredBinding { ref fragment, .. } if fragment == "reference 'value'"));
    assert!(err.to_string().ends_with("(in reference 'value')"), "{err}");

    let err = resolve_on(&generator, &model, ask, &[Fragment::reference("condition")]).unwrap_err();
    assert!(matches!(err, CodegenError::MissingRequiredBinding { ref what, .. } if what == "condition"));

    let body = vec![Fragment::reference("name")];
    let err = resolve_on(&generator, &model, ask, &[Fragment::scope("ifChild", body)]).unwrap_err();
    assert!(matches!(err, CodegenError::MissingRequiredBinding { .. }));
}

#[test]
fn ask_it_condition_and_branches() {
    let mut model = StoryModel::new("Start");
    let ask = model
        .add_child(model.root, "Is It Open", ComponentKind::AskIt(AskIt::default()))
        .unwrap();
    let condition = model
        .add_owned(ask, "Door Open", ComponentKind::KnowIt(KnowIt::typed(&["boolean"])))
        .unwrap();
    let yes = model
        .add_owned(ask, "Yes", ComponentKind::Container(Default::default()))
        .unwrap();
    if let ComponentKind::AskIt(details) = &mut model.component_mut(ask).unwrap().kind {
        details.condition = Some(condition);
        details.if_child = Some(yes);
    }
    let generator = generator_with(LanguageDictionary::new("Test"));

    let fragments = vec![
        Fragment::literal("if "),
        Fragment::reference("condition"),
        Fragment::literal(" then "),
        Fragment::scope("ifChild", vec![Fragment::reference("name")]),
    ];
    let out = resolve_on(&generator, &model, ask, &fragments).unwrap();
    assert_eq!(out, "if DoorOpen then Yes");
}

#[test]
fn reserved_words_are_never_emitted() {
    let mut model = StoryModel::new("Start");
    let end = effect_with_parameters(&mut model, "end", &["function"]);
    let mut dictionary = LanguageDictionary::new("Test");
    dictionary.reserved_words = vec!["end".to_string(), "function".to_string()];
    let generator = generator_with(dictionary);

    let out = resolve_on(&generator, &model, end, &call_template()).unwrap();
    assert_eq!(out, "call end_0(function_0)");
}

#[test]
fn implicit_variables_share_a_name_across_copies() {
    let mut model = StoryModel::new("Start");
    let mut implicits = Vec::new();
    for _ in 0..2 {
        let cause = model
            .add_child(model.root, "When Door Opens", ComponentKind::ScriptIt(ScriptIt::new(ScriptRole::Cause)))
            .unwrap();
        let block = model
            .add_code_block(cause, CodeBlock::new("onOpen").source("door_opens"))
            .unwrap();
        implicits.push(model.add_implicit(block, "Opener", KnowIt::typed(&["creature"])).unwrap());
    }
    let plain = model
        .add_child(model.root, "Opener", ComponentKind::KnowIt(KnowIt::typed(&["creature"])))
        .unwrap();
    let generator = generator_with(LanguageDictionary::new("Test"));

    let pass = generator.begin_pass(&model, Location::new("onOpen", None));
    let root = pass.root_context().unwrap();
    let names: Vec<String> = implicits
        .iter()
        .chain(std::iter::once(&plain))
        .map(|id| create_context(&root, &Element::Component(*id)).unwrap().name(None).unwrap())
        .collect();
    assert_eq!(names, vec!["Opener", "Opener", "Opener_0"]);
}

#[test]
fn owner_scope_walks_the_context_chain() {
    let mut model = StoryModel::new("Start");
    let attack = effect_with_parameters(&mut model, "Attack", &["target"]);
    let generator = generator_with(LanguageDictionary::new("Test"));

    let fragments = vec![Series::new(
        "parameters",
        "",
        vec![Fragment::scope("owner", vec![Fragment::reference("note")])],
    )
    .into()];
    assert_eq!(resolve_on(&generator, &model, attack, &fragments).unwrap(), "Attack");

    let pass = generator.begin_pass(&model, Location::new("", None));
    let root = pass.root_context().unwrap();
    let err = resolve(&[Fragment::scope("owner", vec![])], &root).unwrap_err();
    assert!(matches!(err, CodegenError::NoOwner { .. }));
}

#[test]
fn story_point_series_at_file_level() {
    let mut model = StoryModel::new("Start");
    let left = model.add_story_point("Left Path", 1);
    let right = model.add_story_point("Right Path", 1);
    let end = model.add_story_point("Ending", 2);
    model.link(model.root, left).unwrap();
    model.link(model.root, right).unwrap();
    model.link(left, end).unwrap();
    model.link(right, end).unwrap();
    let generator = generator_with(LanguageDictionary::new("Test"));

    let pass = generator.begin_pass(&model, Location::new("", None));
    let fragments = vec![Series::new(
        "orderedStoryPoints",
        " ",
        vec![Fragment::reference("name"), Fragment::literal(":"), Fragment::reference("fanIn")],
    )
    .into()];
    assert_eq!(pass.resolve(&fragments).unwrap(), "Start:1 LeftPath:1 RightPath:1 Ending:2");
}

fn task(chance: u32) -> ComponentKind {
    ComponentKind::Task(Task {
        chance,
        ..Task::default()
    })
}

/// A greeting task branching into three weighted reactions; waving leads on
/// to leaving.
fn reaction_model() -> (StoryModel, [ComponentId; 4]) {
    let mut model = StoryModel::new("Start");
    let behaviour = model
        .add_child(model.root, "Greet Player", ComponentKind::Behaviour(Behaviour::default()))
        .unwrap();
    let greet = model.add_child(behaviour, "Greet", task(100)).unwrap();
    let wave = model.add_child(behaviour, "Wave", task(30)).unwrap();
    let bow = model.add_child(behaviour, "Bow", task(50)).unwrap();
    let leave = model.add_child(behaviour, "Leave", task(20)).unwrap();
    for successor in [wave, bow, leave] {
        model.link(greet, successor).unwrap();
    }
    model.link(wave, leave).unwrap();
    (model, [greet, wave, bow, leave])
}

#[test]
fn task_probabilities_partition_successors() {
    let (model, [greet, wave, bow, leave]) = reaction_model();
    let generator = generator_with(LanguageDictionary::new("Test"));

    let range = vec![
        Fragment::reference("uniqueId"),
        Fragment::literal("="),
        Fragment::reference("taskProbabilityLowerBound"),
        Fragment::literal("-"),
        Fragment::reference("taskProbabilityUpperBound"),
        Fragment::conditional("isLastTask", vec![Fragment::literal("!")]),
    ];
    let fragments = vec![
        Fragment::reference("probabilityCount"),
        Fragment::literal(":"),
        Series::new("childrenNodes", ",", range).into(),
    ];
    let out = resolve_on(&generator, &model, greet, &fragments).unwrap();
    assert_eq!(
        out,
        format!("100:task{}=0-30,task{}=30-80!,task{}=80-100!", wave.0, bow.0, leave.0)
    );
}

#[test]
fn task_bounds_need_an_enclosing_task_series() {
    let (model, [_, wave, ..]) = reaction_model();
    let generator = generator_with(LanguageDictionary::new("Test"));

    let err = resolve_on(&generator, &model, wave, &[Fragment::reference("taskProbabilityLowerBound")]).unwrap_err();
    assert!(matches!(err, CodegenError::MissingRequiredBinding { ref what, .. } if what == "enclosing task series"));
    let out = resolve_on(&generator, &model, wave, &[Fragment::reference("probabilityCount")]).unwrap();
    assert_eq!(out, "20");
}

#[test]
fn conditionals_test_the_context() {
    let (model, [greet, wave, _, leave]) = reaction_model();
    let generator = generator_with(LanguageDictionary::new("Test"));

    let branching = vec![
        Fragment::conditional("hasMultipleChildren", vec![Fragment::literal("random")]),
        Fragment::conditional("!hasMultipleChildren", vec![Fragment::literal("fixed")]),
    ];
    assert_eq!(resolve_on(&generator, &model, greet, &branching).unwrap(), "random");
    assert_eq!(resolve_on(&generator, &model, wave, &branching).unwrap(), "fixed");

    let indented = vec![Fragment::Indent(vec![Fragment::conditional(
        "!ISLASTTASK",
        vec![Fragment::literal("next()")],
    )])];
    assert_eq!(resolve_on(&generator, &model, wave, &indented).unwrap(), "    next()");
    assert_eq!(resolve_on(&generator, &model, leave, &indented).unwrap(), "");
}

#[test]
fn unknown_conditions_are_errors() {
    let (model, [greet, ..]) = reaction_model();
    let generator = generator_with(LanguageDictionary::new("Test"));

    let fragments = vec![Fragment::conditional("isFirstTask", vec![Fragment::literal("x")])];
    let err = resolve_on(&generator, &model, greet, &fragments).unwrap_err();
    assert!(matches!(err, CodegenError::UnknownAccessor { ref accessor, ref fragment, .. }
        if accessor == "isFirstTask" && fragment == "conditional 'isFirstTask'"));

    let mut model = StoryModel::new("Start");
    let note = model.add_child(model.root, "Remember", ComponentKind::Note).unwrap();
    let fragments = vec![Fragment::conditional("isLastTask", vec![Fragment::literal("x")])];
    let err = resolve_on(&generator, &model, note, &fragments).unwrap_err();
    assert!(matches!(err, CodegenError::UnknownAccessor { ref accessor, .. } if accessor == "isLastTask"));
}

#[test]
fn dialogue_lines_render_through_their_types() {
    let mut model = StoryModel::new("Start");
    let greeting = model.add_dialogue_root("Well met.", Speaker::Npc);
    let ask = model.add_dialogue_reply(greeting, "Who are you?").unwrap();
    let farewell = model.add_dialogue_reply(greeting, "Farewell.").unwrap();
    if let Some(line) = model.dialogue_lines.get_mut(&farewell) {
        line.enabled = false;
    }
    let hail = model
        .add_child(
            model.root,
            "Hail",
            ComponentKind::KnowIt(KnowIt::typed(&["sound"]).with_binding(Binding::Resource(Resource::new(
                "Hail",
                "hail.ogg",
                &["sound"],
            )))),
        )
        .unwrap();
    if let Some(line) = model.dialogue_lines.get_mut(&greeting) {
        line.audio = Some(hail);
    }
    let talk = model
        .add_child(
            model.root,
            "Talk",
            ComponentKind::KnowIt(KnowIt::typed(&["dialogue"]).with_binding(Binding::Dialogue(greeting))),
        )
        .unwrap();

    let mut dictionary = LanguageDictionary::new("Test");
    dictionary.dialogue_type = Some("conversation".to_string());
    dictionary.dialogue_line_type = Some("line".to_string());
    dictionary.types.insert(
        "conversation".to_string(),
        TypeInfo {
            format: vec![Fragment::literal("conv("), Fragment::reference("value"), Fragment::literal(")")],
            ..TypeInfo::new("Conversation")
        },
    );
    dictionary.types.insert(
        "line".to_string(),
        TypeInfo {
            format: vec![Fragment::literal("line("), Fragment::reference("uniqueId"), Fragment::literal(")")],
            ..TypeInfo::new("Line")
        },
    );
    let generator = generator_with(dictionary);

    let line = vec![
        Fragment::reference("formattedValue"),
        Fragment::literal(":"),
        Fragment::reference("speaker"),
        Fragment::literal(":"),
        Fragment::reference("enabled"),
        Fragment::literal(":"),
        Fragment::reference("text"),
    ];
    let fragments = vec![Fragment::scope(
        "dialogue",
        vec![Series::new("orderedDialogueLines", ";", line).into()],
    )];
    let out = resolve_on(&generator, &model, talk, &fragments).unwrap();
    assert_eq!(
        out,
        format!(
            "conv({}):2:true:Well met.;line({}):1:true:Who are you?;line({}):1:false:Farewell.",
            greeting.0, ask.0, farewell.0
        )
    );

    assert_eq!(
        resolve_on(&generator, &model, talk, &[Fragment::reference("value")]).unwrap(),
        greeting.0.to_string()
    );

    let replies = vec![Fragment::scope(
        "dialogue",
        vec![
            Fragment::conditional("hasMultipleChildren", vec![Fragment::literal("menu ")]),
            Series::new("childLines", ",", vec![Fragment::reference("index")]).into(),
            Fragment::literal(" "),
            Fragment::scope("audio", vec![Fragment::reference("value")]),
        ],
    )];
    assert_eq!(resolve_on(&generator, &model, talk, &replies).unwrap(), "menu 0,1 hail.ogg");
}

#[test]
fn dialogue_scope_needs_a_dialogue_binding() {
    let mut model = StoryModel::new("Start");
    let plain = model
        .add_child(model.root, "Plain", ComponentKind::KnowIt(KnowIt::typed(&["text"])))
        .unwrap();
    let generator = generator_with(LanguageDictionary::new("Test"));

    let err = resolve_on(&generator, &model, plain, &[Fragment::scope("dialogue", vec![])]).unwrap_err();
    assert!(matches!(err, CodegenError::MissingRequiredBinding { ref what, .. } if what == "dialogue binding"));
}
