/// Grammar Linter — checks a grammar for broken references and dead ends.
///
/// Usage: grammar_linter <grammar_file_or_dir> [--origin <symbol>] [--settings <path>]
use grammar_engine::core::lint::lint;
use grammar_engine::{ExpansionSettings, RawGrammar};
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: grammar_linter <grammar_file_or_dir> [--origin <symbol>] [--settings <path>]");
        process::exit(0);
    }

    let grammar_path = Path::new(&args[1]);
    let mut origin = "origin".to_string();
    let mut settings_path = None;

    let mut i = 2;
    while i < args.len() {
        if args[i] == "--origin" && i + 1 < args.len() {
            i += 1;
            origin = args[i].clone();
        } else if args[i] == "--settings" && i + 1 < args.len() {
            i += 1;
            settings_path = Some(args[i].clone());
        }
        i += 1;
    }

    let mut raw = RawGrammar::new();
    if grammar_path.is_file() {
        match load_file(grammar_path) {
            Some(Ok(loaded)) => raw.merge(loaded),
            Some(Err(e)) => {
                eprintln!("ERROR: Failed to load grammar file: {}", e);
                process::exit(1);
            }
            None => {
                eprintln!("ERROR: '{}' is not a .json or .ron file", args[1]);
                process::exit(1);
            }
        }
    } else if grammar_path.is_dir() {
        load_grammars_recursive(grammar_path, &mut raw);
    } else {
        eprintln!("ERROR: Path '{}' does not exist", args[1]);
        process::exit(1);
    }

    let settings = match settings_path {
        Some(path) => match ExpansionSettings::load_from_ron(Path::new(&path)) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("ERROR: Failed to load settings: {}", e);
                process::exit(1);
            }
        },
        None => ExpansionSettings::default(),
    };

    println!("Loaded {} symbols", raw.symbols.len());

    let report = lint(&raw, &origin, &settings);

    println!("\n=== Grammar Lint Report ===\n");

    if report.is_clean() {
        println!("All checks passed!");
    }

    for warning in &report.warnings {
        println!("WARNING: {}", warning);
    }

    for error in &report.errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        report.errors.len(),
        report.warnings.len()
    );

    if !report.errors.is_empty() {
        process::exit(1);
    }
}

fn load_file(path: &Path) -> Option<Result<RawGrammar, grammar_engine::GrammarError>> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => Some(RawGrammar::load_from_json(path)),
        Some("ron") => Some(RawGrammar::load_from_ron(path)),
        _ => None,
    }
}

fn load_grammars_recursive(dir: &Path, raw: &mut RawGrammar) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            load_grammars_recursive(&path, raw);
            continue;
        }
        // Expansion settings live next to the grammars.
        if path.file_name().and_then(|s| s.to_str()) == Some("settings.ron") {
            continue;
        }
        match load_file(&path) {
            Some(Ok(loaded)) => {
                println!("  Loaded: {}", path.display());
                raw.merge(loaded);
            }
            Some(Err(e)) => eprintln!("  ERROR loading {}: {}", path.display(), e),
            None => {}
        }
    }
}
