/// Preview — interactive shell for trying out a grammar.
///
/// Usage: preview --grammar <path> [--settings <path>] [--seed <n>]
///
/// Commands:
///   expand <rule>      — expand a rule and print the text and any errors
///   tree <rule>        — expand a rule and print the node tree
///   bulk <n> [rule]    — expand a rule n times with variety stats
///   seed <n>           — reseed and reset the grammar
///   symbols            — list declared symbols
///   clear              — drop all pushed rules
///   help               — list commands
///   quit               — exit
use grammar_engine::{ExpansionNode, ExpansionSettings, Grammar, RawGrammar};
use rustc_hash::FxHashSet;
use std::io::{self, BufRead, Write};
use std::path::Path;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut grammar_path = None;
    let mut settings_path = None;
    let mut seed: u64 = 42;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--grammar" if i + 1 < args.len() => {
                i += 1;
                grammar_path = Some(args[i].clone());
            }
            "--settings" if i + 1 < args.len() => {
                i += 1;
                settings_path = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let Some(grammar_path) = grammar_path else {
        eprintln!("ERROR: --grammar is required");
        print_usage();
        std::process::exit(1);
    };

    let raw = match load_grammar(Path::new(&grammar_path)) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("ERROR: Failed to load grammar: {}", e);
            std::process::exit(1);
        }
    };
    let settings = match settings_path {
        Some(path) => match ExpansionSettings::load_from_ron(Path::new(&path)) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("ERROR: Failed to load settings: {}", e);
                std::process::exit(1);
            }
        },
        None => ExpansionSettings::default(),
    };

    println!("Loaded {} symbols", raw.symbols.len());
    println!("Seed: {}", seed);
    println!("Type 'help' for commands.\n");

    let mut current_seed = seed;
    let mut grammar = match build_grammar(&raw, &settings, current_seed) {
        Some(grammar) => grammar,
        None => std::process::exit(1),
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match cmd.to_lowercase().as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "expand" | "e" => {
                if rest.is_empty() {
                    println!("Usage: expand <rule>");
                    continue;
                }
                match grammar.expand(rest, false) {
                    Ok(root) => {
                        println!("\n{}\n", root.finished_text());
                        for message in root.error_messages() {
                            println!("  ! {}", message);
                        }
                    }
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "tree" => {
                if rest.is_empty() {
                    println!("Usage: tree <rule>");
                    continue;
                }
                match grammar.expand(rest, false) {
                    Ok(root) => print_tree(&root),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "seed" => {
                if rest.is_empty() {
                    println!("Current seed: {}", current_seed);
                    continue;
                }
                match rest.parse::<u64>() {
                    Ok(s) => {
                        if let Some(fresh) = build_grammar(&raw, &settings, s) {
                            current_seed = s;
                            grammar = fresh;
                            println!("Seed set to {}", current_seed);
                        }
                    }
                    Err(_) => println!("Invalid seed: {}", rest),
                }
            }
            "bulk" => {
                let (count, rule) = rest.split_once(' ').unwrap_or((rest, "#origin#"));
                let count: usize = match count.parse() {
                    Ok(n) if n > 0 => n,
                    _ => {
                        println!("Usage: bulk <n> [rule]");
                        continue;
                    }
                };
                bulk(&raw, &settings, current_seed, count, rule.trim());
            }
            "symbols" => {
                for name in grammar.symbol_names() {
                    let rules = grammar.symbol(name).map_or(0, |s| s.active_rules().len());
                    println!("  {} ({} rules)", name, rules);
                }
            }
            "clear" => {
                grammar.clear_state();
                println!("Pushed rules cleared.");
            }
            _ => println!("Unknown command '{}'. Type 'help' for commands.", cmd),
        }
    }
}

fn print_usage() {
    println!("Usage: preview --grammar <path> [--settings <path>] [--seed <n>]");
}

fn print_help() {
    println!("Commands:");
    println!("  expand <rule>      expand a rule and print the text and any errors");
    println!("  tree <rule>        expand a rule and print the node tree");
    println!("  bulk <n> [rule]    expand a rule n times (default #origin#)");
    println!("  seed <n>           reseed and reset the grammar");
    println!("  symbols            list declared symbols");
    println!("  clear              drop all pushed rules");
    println!("  help               show this list");
    println!("  quit               exit");
}

fn load_grammar(path: &Path) -> Result<RawGrammar, grammar_engine::GrammarError> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("ron") => RawGrammar::load_from_ron(path),
        _ => RawGrammar::load_from_json(path),
    }
}

fn build_grammar(raw: &RawGrammar, settings: &ExpansionSettings, seed: u64) -> Option<Grammar> {
    let result = Grammar::builder()
        .definition(raw.clone())
        .settings(settings.clone())
        .seed(seed)
        .build();
    match result {
        Ok(grammar) => Some(grammar),
        Err(e) => {
            println!("ERROR: {}", e);
            None
        }
    }
}

fn print_tree(root: &ExpansionNode) {
    fn walk(node: &ExpansionNode) {
        let indent = "  ".repeat(node.depth());
        println!("{}{} => {:?}", indent, node, node.finished_text());
        for child in node.children() {
            walk(child);
        }
    }
    println!();
    walk(root);
    for message in root.error_messages() {
        println!("  ! {}", message);
    }
    println!();
}

fn bulk(raw: &RawGrammar, settings: &ExpansionSettings, seed: u64, count: usize, rule: &str) {
    // Fresh grammar so bulk runs are reproducible for a given seed.
    let Some(mut grammar) = build_grammar(raw, settings, seed) else {
        return;
    };

    let mut passages = Vec::new();
    let mut errors = 0;
    let mut diagnostics = 0;
    for _ in 0..count {
        match grammar.expand(rule, false) {
            Ok(root) => {
                diagnostics += root.errors().len();
                passages.push(root.into_finished_text());
            }
            Err(_) => errors += 1,
        }
    }

    println!(
        "\n=== Bulk Generation: {} passages ({} errors, {} diagnostics) ===\n",
        passages.len(),
        errors,
        diagnostics
    );

    let distinct: FxHashSet<&str> = passages.iter().map(String::as_str).collect();
    let avg_len = if passages.is_empty() {
        0.0
    } else {
        passages.iter().map(|p| p.split_whitespace().count()).sum::<usize>() as f64
            / passages.len() as f64
    };
    println!("Distinct passages: {}/{}", distinct.len(), passages.len());
    println!("Average length: {:.1} words\n", avg_len);

    for (i, passage) in passages.iter().take(10).enumerate() {
        println!("{:>3}. {}", i + 1, passage);
    }
    if passages.len() > 10 {
        println!("  ... {} more", passages.len() - 10);
    }
    println!();
}
