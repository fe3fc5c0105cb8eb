use grammar_engine::core::parser::{parse, SectionKind};
use grammar_engine::{
    modifier, Diagnostic, ExpansionSettings, Grammar, GrammarError, Modifier, RandomSource,
    RawGrammar,
};

fn capitalize() -> Modifier {
    modifier(|s, _| {
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    })
}

fn adventurer(rng: RandomSource) -> Grammar {
    Grammar::builder()
        .json_file("tests/fixtures/adventurer.json")
        .random_source(rng)
        .modifier("capitalize", capitalize())
        .build()
        .unwrap()
}

#[test]
fn fixed_zero_draw_picks_first_rule() {
    let raw: RawGrammar = [("origin", vec!["a", "b"])].into_iter().collect();
    let mut grammar = Grammar::new(&raw).unwrap();
    grammar.set_random_source(RandomSource::fixed(0.0));

    for _ in 0..5 {
        let root = grammar.expand("#origin#", false).unwrap();
        assert_eq!(root.finished_text(), "a");
        assert!(root.errors().is_empty());
    }
}

#[test]
fn fixture_expands_deterministically() {
    let mut grammar = adventurer(RandomSource::fixed(0.0));
    let text = grammar.flatten("#origin#").unwrap();
    assert_eq!(
        text,
        "Arjun set out travelling from the city of holy lights. \
         Everyone said arjun would never find the holy grail, but arjun did."
    );
}

#[test]
fn pushed_hero_is_consistent_within_story() {
    let mut grammar = adventurer(RandomSource::from_seed(2024));
    for _ in 0..20 {
        let root = grammar.expand("#origin#", false).unwrap();
        assert!(root.errors().is_empty(), "{:?}", root.error_messages());

        let text = root.finished_text();
        let hero = text.split(' ').next().unwrap().to_lowercase();
        assert!(text.contains(&format!("said {} would", hero)), "{}", text);
        assert!(text.ends_with(&format!("but {} did.", hero)), "{}", text);
    }
    // Every push made during the stories has been undone.
    assert_eq!(grammar.symbol("hero").unwrap().override_depth(), 0);
    assert_eq!(grammar.symbol("quest").unwrap().override_depth(), 0);
}

#[test]
fn weighted_base_follows_weights() {
    // The first location draws once more for its adjective.
    let mut grammar = adventurer(RandomSource::sequence(vec![0.0, 0.0, 0.5, 0.9]));
    assert_eq!(grammar.flatten("#location#").unwrap(), "city of holy lights");
    // 0.5 of total weight 5 lands in the second bucket.
    assert_eq!(grammar.flatten("#location#").unwrap(), "old mill");
    assert_eq!(grammar.flatten("#location#").unwrap(), "northern wastes");
}

#[test]
fn missing_symbol_reports_once() {
    let mut grammar = Grammar::new(&RawGrammar::new()).unwrap();
    let root = grammar.expand("before #missing# after", false).unwrap();
    assert!(root.finished_text().contains("((missing))"));
    assert_eq!(root.errors(), &[Diagnostic::MissingSymbol("missing".into())]);
    assert_eq!(root.error_messages(), vec!["No symbol for 'missing'".to_string()]);
}

#[test]
fn missing_modifier_keeps_earlier_text() {
    let raw: RawGrammar = [("origin", "quiet words")].into_iter().collect();
    let mut grammar = Grammar::builder()
        .definition(raw)
        .modifier("capitalize", capitalize())
        .build()
        .unwrap();

    let root = grammar.expand("#origin.capitalize.upperFoo#", false).unwrap();
    assert_eq!(root.finished_text(), "Quiet words((.upperFoo))");
    assert_eq!(root.errors().len(), 1);
    assert_eq!(root.error_messages(), vec!["Missing modifier upperFoo".to_string()]);
}

#[test]
fn unbalanced_brackets_keep_parsed_sections() {
    let close = parse("a] b");
    assert!(close.errors.contains(&Diagnostic::TooManyClose));
    assert_eq!(close.sections.len(), 1);
    assert_eq!(close.sections[0].raw, "a] b");

    let open = parse("[a b");
    assert!(open.errors.contains(&Diagnostic::TooManyOpen));
    assert_eq!(open.sections[0].kind, SectionKind::Plain);

    let mut grammar = Grammar::new(&RawGrammar::new()).unwrap();
    let root = grammar.expand("a] b", false).unwrap();
    assert_eq!(root.finished_text(), "a] b");
    assert_eq!(root.errors(), &[Diagnostic::TooManyClose]);
}

#[test]
fn escaped_hashes_yield_plain_text() {
    let result = parse("Hello \\#name\\#");
    assert_eq!(result.sections.len(), 1);
    assert_eq!(result.sections[0].kind, SectionKind::Plain);
    assert_eq!(result.sections[0].unescaped(), "Hello #name#");
    assert!(result.sections.iter().all(|s| s.kind != SectionKind::Tag));
}

#[test]
fn allow_escape_chars_setting_controls_flatten() {
    let mut grammar = Grammar::new(&RawGrammar::new()).unwrap();
    assert_eq!(grammar.flatten("\\[not an action\\]").unwrap(), "[not an action]");

    grammar.set_settings(ExpansionSettings {
        allow_escape_chars: true,
        ..ExpansionSettings::default()
    });
    assert_eq!(grammar.flatten("\\[not an action\\]").unwrap(), "\\[not an action\\]");
}

#[test]
fn fallback_grammars_fill_gaps() {
    let weather = Grammar::builder()
        .ron_file("tests/fixtures/weather.ron")
        .random_source(RandomSource::fixed(0.0))
        .build()
        .unwrap();
    let mut grammar = adventurer(RandomSource::fixed(0.0));
    grammar.add_subgrammar(weather);

    let root = grammar
        .expand("#name.capitalize# woke to #weather#.", false)
        .unwrap();
    assert_eq!(root.finished_text(), "Arjun woke to clear and cold.");
    assert!(root.errors().is_empty());
}

#[test]
fn custom_push_separator() {
    let mut grammar = Grammar::builder()
        .settings(ExpansionSettings {
            push_separator: '|',
            ..ExpansionSettings::default()
        })
        .random_source(RandomSource::fixed(0.99))
        .build()
        .unwrap();
    assert_eq!(grammar.flatten("#[x:a,b|c]x#").unwrap(), "c");
}

#[test]
fn evaluate_action_sets_up_symbols() {
    let raw: RawGrammar = [
        ("setup", "[hero:Mia][pet:owl]"),
        ("origin", "[#setup#]#hero# and the #pet#"),
    ]
    .into_iter()
    .collect();
    let mut grammar = Grammar::builder()
        .definition(raw)
        .random_source(RandomSource::fixed(0.0))
        .build()
        .unwrap();
    assert_eq!(grammar.flatten("#origin#").unwrap(), "Mia and the owl");
}

#[test]
fn ambiguous_tag_is_fatal() {
    let mut grammar = Grammar::new(&RawGrammar::new()).unwrap();
    let err = grammar.expand("#one[x:y]two#", false).unwrap_err();
    assert!(matches!(err, GrammarError::AmbiguousTag(ref tag) if tag == "one[x:y]two"));
    assert_eq!(err.to_string(), "multiple main sections in tag 'one[x:y]two'");
}

#[test]
fn node_tree_is_inspectable() {
    let mut grammar = adventurer(RandomSource::fixed(0.0));
    let root = grammar.expand("#object# at the #location#", false).unwrap();

    assert_eq!(root.to_string(), "Node('#object# at the #location#' unparsed d:0)");
    let object = &root.children()[0];
    assert_eq!(object.symbol(), Some("object"));
    assert_eq!(object.child_rule(), Some("#adjective# #objectName#"));
    assert_eq!(object.finished_text(), "holy grail");
    assert_eq!(object.children()[0].to_string(), "Node('adjective' tag d:2)");
    assert!(root.children().iter().all(|c| c.is_expanded()));
}
