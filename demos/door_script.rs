//! Door Script example: builds a small story in code and generates a
//! Lua-flavoured script for it.
//!
//! A guard opens the front door, a greeting is spoken, and if the alarm
//! is armed the guard raises it.
//!
//! Run with: cargo run --example door_script

use story_codegen::core::dictionary::{CodeContextSet, LanguageDictionary, TypeInfo};
use story_codegen::core::fragment::{FormatTarget, Fragment};
use story_codegen::core::generator::CodeGenerator;
use story_codegen::core::series::Series;
use story_codegen::schema::binding::{Binding, Resource};
use story_codegen::schema::code_block::CodeBlock;
use story_codegen::schema::component::{AskIt, ComponentKind, Container, KnowIt, ScriptIt, ScriptRole};
use story_codegen::schema::model::{Slot, StoryModel};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let generator = CodeGenerator::builder()
        .with_dictionary(lua_dictionary())
        .build()
        .expect("Failed to build generator");

    let model = door_story().expect("Failed to build story");

    for script in generator.generate(&model).expect("Generation failed") {
        println!("-- {} --", script.location);
        println!("{}", script.code);
    }
}

fn inline(text: &str) -> Vec<Fragment> {
    Fragment::parse_inline(text).expect("Invalid inline template")
}

fn line(text: &str) -> Fragment {
    Fragment::Line(inline(text))
}

fn lua_dictionary() -> LanguageDictionary {
    let mut dictionary = LanguageDictionary::new("Lua");
    dictionary.indent = "  ".to_string();
    dictionary.naming_pattern = Some("[a-zA-Z_][a-zA-Z0-9_]*".to_string());
    dictionary.reserved_words = ["and", "else", "end", "function", "if", "local", "not", "then"]
        .iter()
        .map(|w| w.to_string())
        .collect();

    dictionary.types.insert("door".to_string(), TypeInfo::new("Door"));
    dictionary.types.insert("creature".to_string(), TypeInfo::new("Creature"));
    dictionary.types.insert("boolean".to_string(), TypeInfo::new("boolean"));
    let mut text = TypeInfo::new("string").escape("\"", "\\").escape("\\", "\\");
    text.format = inline("\"{value}\"");
    dictionary.types.insert("text".to_string(), text);

    dictionary.function = CodeContextSet {
        declaration: Vec::new(),
        definition: Vec::new(),
        call: vec![
            Fragment::reference("name"),
            Fragment::literal("("),
            Series::new("parameters", ", ", vec![Fragment::reference("name")]).into(),
            Fragment::literal(")"),
        ],
    };

    let mut file: Vec<Fragment> = vec![Series::new("includes", "", vec![line("require \"{value}\"")])
        .unique()
        .into()];
    file.push(Series::new("causes", "", vec![Fragment::format("cause")]).into());
    dictionary.formats.insert("file".to_string(), file);

    let mut header = inline("function {name}(");
    header.push(Series::new("parameters", ", ", vec![Fragment::reference("name")]).into());
    header.push(Fragment::literal(")"));
    dictionary.formats.insert(
        "cause".to_string(),
        vec![
            Fragment::Line(header),
            Fragment::Indent(vec![Fragment::format("children")]),
            line("end"),
        ],
    );
    dictionary.formats.insert(
        "children".to_string(),
        vec![Series::new(
            "children",
            "",
            vec![
                Fragment::Format {
                    id: "effect".to_string(),
                    only_for: Some(FormatTarget::Effect),
                },
                Fragment::Format {
                    id: "askit".to_string(),
                    only_for: Some(FormatTarget::AskIt),
                },
            ],
        )
        .into()],
    );
    dictionary
        .formats
        .insert("effect".to_string(), vec![line("{code}")]);
    dictionary.formats.insert(
        "askit".to_string(),
        vec![
            line("if {condition} then"),
            Fragment::Indent(vec![Fragment::scope("ifChild", vec![Fragment::format("children")])]),
            line("end"),
        ],
    );
    dictionary
}

fn door_story() -> Result<StoryModel, story_codegen::schema::model::ModelError> {
    let mut model = StoryModel::new("Start");
    model.set_slot("onOpen", Slot::new("file"));

    let cause = model.add_child(
        model.root,
        "When Guard Opens Door",
        ComponentKind::ScriptIt(ScriptIt::new(ScriptRole::Cause)),
    )?;
    let block = model.add_code_block(
        cause,
        CodeBlock::new("onOpen")
            .subject("Door")
            .source("door_opens")
            .includes(&["doors"]),
    )?;
    let door = model.add_parameter(block, "Door", KnowIt::typed(&["door"]))?;
    model.set_binding(door, Binding::Resource(Resource::new("Front Door", "front_door", &["door"])))?;
    model.add_implicit(block, "Opener", KnowIt::typed(&["creature"]))?;

    let speak = model.add_child(cause, "Speak", ComponentKind::ScriptIt(ScriptIt::new(ScriptRole::Effect)))?;
    let mut say = inline("say(");
    say.push(Fragment::named_scope("argument", "Message", vec![Fragment::reference("formattedValue")]));
    say.push(Fragment::literal(")"));
    let speak_block = model.add_code_block(speak, CodeBlock::new("").includes(&["speech"]).code(say))?;
    let message = model.add_parameter(speak_block, "Message", KnowIt::typed(&["text"]))?;
    model.set_binding(
        message,
        Binding::Resource(Resource::new("Greeting", "Who goes \"there\"?", &["text"])),
    )?;

    let ask = model.add_child(cause, "Alarm Armed?", ComponentKind::AskIt(AskIt::default()))?;
    let armed = model.add_owned(ask, "Alarm Armed", ComponentKind::KnowIt(KnowIt::typed(&["boolean"])))?;
    let yes = model.add_owned(ask, "Armed", ComponentKind::Container(Container::default()))?;
    if let ComponentKind::AskIt(details) = &mut model.component_mut(ask)?.kind {
        details.condition = Some(armed);
        details.if_child = Some(yes);
    }

    let raise = model.add_child(yes, "Raise Alarm", ComponentKind::ScriptIt(ScriptIt::new(ScriptRole::Effect)))?;
    model.add_code_block(raise, CodeBlock::new("").includes(&["alarms"]).code(inline("alarm.raise()")))?;

    Ok(model)
}
