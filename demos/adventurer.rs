/// Adventurer example — rolls a handful of character introductions.
///
/// The grammar pushes a generated name and home town before expanding the
/// introduction, so every mention of the hero agrees. The engine ships no
/// modifiers; the few this grammar uses are defined below.
///
/// Run with: cargo run --example adventurer [seed]
use grammar_engine::{modifier, Grammar, Modifier};

fn capitalize() -> Modifier {
    modifier(|s, _| {
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    })
}

fn capitalize_all() -> Modifier {
    let capitalize = capitalize();
    modifier(move |s, _| {
        s.split(' ')
            .map(|word| capitalize(word, &[]))
            .collect::<Vec<_>>()
            .join(" ")
    })
}

fn article() -> Modifier {
    modifier(|s, _| {
        let starts_with_vowel = s
            .chars()
            .next()
            .map_or(false, |c| "aeiouAEIOU".contains(c));
        if starts_with_vowel {
            format!("an {}", s)
        } else {
            format!("a {}", s)
        }
    })
}

fn main() {
    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(1974);

    let mut grammar = Grammar::builder()
        .json_file("grammar_data/character_sheet.json")
        .settings_file("grammar_data/settings.ron")
        .seed(seed)
        .modifiers([
            ("capitalize", capitalize()),
            ("capitalizeAll", capitalize_all()),
            ("a", article()),
        ])
        .build()
        .expect("Failed to build grammar");

    println!("=== Adventurers (seed {}) ===\n", seed);

    for i in 1..=5 {
        let root = grammar
            .expand("#origin#", false)
            .expect("Failed to expand origin");
        println!("{}. {}", i, root.finished_text());
        for message in root.error_messages() {
            println!("   ! {}", message);
        }
    }

    // The tree is kept, so the choices behind a line can be inspected.
    let root = grammar
        .expand("#object# near the #location#", false)
        .expect("Failed to expand rule");
    println!("\n{}", root.finished_text());
    for child in root.children() {
        if let Some(rule) = child.child_rule() {
            println!("  {} -> {:?}", child, rule);
        }
    }
}
