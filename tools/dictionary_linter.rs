//! Dictionary Linter: checks language dictionaries against the fragment
//! vocabulary.
//!
//! Usage: dictionary_linter <dictionary.ron | dictionary_dir> [--merged]
//!
//! By default every file is linted on its own. With `--merged`, the files
//! are layered in name order and the result is linted once, so formats may
//! reference formats defined in other files.

use std::path::{Path, PathBuf};
use std::process;
use story_codegen::core::dictionary::LanguageDictionary;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: dictionary_linter <dictionary.ron | dictionary_dir> [--merged]");
        process::exit(0);
    }

    let target = Path::new(&args[1]);
    let mut merged = false;
    for arg in &args[2..] {
        match arg.as_str() {
            "--merged" => merged = true,
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
    }

    let files = if target.is_file() {
        vec![target.to_path_buf()]
    } else if target.is_dir() {
        collect_ron_files(target)
    } else {
        eprintln!("ERROR: Path '{}' does not exist", target.display());
        process::exit(1);
    };

    let mut loaded = Vec::new();
    let mut load_errors = 0;
    for path in &files {
        match LanguageDictionary::load_from_ron(path) {
            Ok(dictionary) => {
                println!("  Loaded: {}", path.display());
                loaded.push((path.display().to_string(), dictionary));
            }
            Err(e) => {
                eprintln!("  ERROR loading {}: {}", path.display(), e);
                load_errors += 1;
            }
        }
    }

    if merged {
        let mut combined = LanguageDictionary::default();
        for (_, dictionary) in loaded.drain(..) {
            combined.merge(dictionary);
        }
        loaded.push(("merged dictionary".to_string(), combined));
    }

    println!("\n=== Dictionary Lint Report ===\n");

    let mut issue_count = 0;
    for (label, dictionary) in &loaded {
        let issues = dictionary.lint();
        if issues.is_empty() {
            println!("{}: ok ({} formats, {} types)", label, dictionary.formats.len(), dictionary.types.len());
        }
        for issue in &issues {
            println!("ERROR: {}: {}", label, issue);
        }
        issue_count += issues.len();
    }

    println!(
        "\nSummary: {} files, {} load errors, {} issues",
        files.len(),
        load_errors,
        issue_count
    );

    if load_errors == 0 && issue_count == 0 {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn collect_ron_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_ron_files(&path));
            } else if path.extension().and_then(|s| s.to_str()) == Some("ron") {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}
