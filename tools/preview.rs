//! Preview: generate every script of a story model and print it.
//!
//! Usage: preview --model <story.ron> --dictionary <path> [--slot <slot> [--subject <text>]] [--names]
//!
//! `--dictionary` accepts a single file or a directory of `.ron` files.
//! With `--slot`, only the script for that location is generated.
//! `--names` lists every name assigned while generating each script.
//! Set `RUST_LOG=story_codegen=debug` to trace passes.

use std::path::Path;
use std::process;
use story_codegen::core::generator::{CodeGenerator, GeneratorError, ScriptOutput};
use story_codegen::schema::code_block::Location;
use story_codegen::schema::model::StoryModel;
use tracing_subscriber::EnvFilter;

struct Options {
    model: String,
    dictionary: String,
    slot: Option<String>,
    subject: Option<String>,
    names: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let options = parse_args(&args);

    let model = match StoryModel::load_from_ron(Path::new(&options.model)) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("ERROR: Failed to load model '{}': {}", options.model, e);
            process::exit(1);
        }
    };

    let builder = CodeGenerator::builder();
    let builder = if Path::new(&options.dictionary).is_dir() {
        builder.dictionaries_dir(&options.dictionary)
    } else {
        builder.dictionary_file(&options.dictionary)
    };
    let generator = match builder.build() {
        Ok(generator) => generator,
        Err(e) => {
            eprintln!("ERROR: Failed to load dictionary '{}': {}", options.dictionary, e);
            process::exit(1);
        }
    };

    let locations = match &options.slot {
        Some(slot) => vec![Location::new(slot, options.subject.as_deref())],
        None => model.script_locations(),
    };

    println!("Generating {} script(s) with '{}'", locations.len(), generator.dictionary().name);

    let mut failures = 0;
    for location in locations {
        match generate(&generator, &model, location.clone(), options.names) {
            Ok(output) => print_script(&output),
            Err(e) => {
                eprintln!("ERROR: {}: {}", location, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        process::exit(1);
    }
}

fn generate(
    generator: &CodeGenerator,
    model: &StoryModel,
    location: Location,
    names: bool,
) -> Result<ScriptOutput, GeneratorError> {
    let output = generator.generate_script(model, location.clone())?;
    if names {
        // A fresh pass reproduces the same assignments.
        let slot = model
            .slot(&location.slot)
            .ok_or_else(|| GeneratorError::UnknownSlot(location.slot.clone()))?;
        let pass = generator.begin_pass(model, location);
        pass.resolve(generator.dictionary().format(&slot.format)?)?;
        println!("\n--- names ---");
        for (identity, name) in pass.assigned_names() {
            println!("  {:<24} {:?}", name, identity);
        }
    }
    Ok(output)
}

fn print_script(output: &ScriptOutput) {
    println!("\n=== {} ===", output.location);
    println!("{}", output.code);
}

fn parse_args(args: &[String]) -> Options {
    let mut model = None;
    let mut dictionary = None;
    let mut slot = None;
    let mut subject = None;
    let mut names = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--model" if i + 1 < args.len() => {
                i += 1;
                model = Some(args[i].clone());
            }
            "--dictionary" if i + 1 < args.len() => {
                i += 1;
                dictionary = Some(args[i].clone());
            }
            "--slot" if i + 1 < args.len() => {
                i += 1;
                slot = Some(args[i].clone());
            }
            "--subject" if i + 1 < args.len() => {
                i += 1;
                subject = Some(args[i].clone());
            }
            "--names" => names = true,
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    match (model, dictionary) {
        (Some(model), Some(dictionary)) => Options {
            model,
            dictionary,
            slot,
            subject,
            names,
        },
        _ => {
            eprintln!("Both --model and --dictionary are required");
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    println!("Usage: preview --model <story.ron> --dictionary <path> [--slot <slot> [--subject <text>]] [--names]");
}
