use grammar_engine::{Diagnostic, Grammar, GrammarError, RandomSource, RawGrammar};

fn grammar(raw: RawGrammar) -> Grammar {
    Grammar::builder()
        .definition(raw)
        .random_source(RandomSource::fixed(0.0))
        .build()
        .unwrap()
}

#[test]
fn push_on_failed_tag_is_still_popped() {
    let mut g = grammar(RawGrammar::new());
    let root = g.expand("#[x:foo]bar#", false).unwrap();

    assert_eq!(root.finished_text(), "((bar))");
    assert_eq!(root.errors(), &[Diagnostic::MissingSymbol("bar".into())]);
    let x = g.symbol("x").unwrap();
    assert_eq!(x.override_depth(), 0);
    assert!(x.base().is_empty());
}

#[test]
fn nested_pushes_unwind_in_order() {
    let mut g = grammar(
        [
            ("name", "base"),
            ("inner", "#name#"),
            ("outer", "#name#/#[name:two]inner#/#name#"),
        ]
        .into_iter()
        .collect(),
    );
    assert_eq!(g.flatten("#[name:one]outer#|#name#").unwrap(), "one/two/one|base");
    assert_eq!(g.symbol("name").unwrap().override_depth(), 0);
}

#[test]
fn several_pushes_in_one_tag_all_pop() {
    let mut g = grammar([("pair", "#a#+#b#")].into_iter().collect());
    let root = g.expand("#[a:1][b:2][a:3]pair#", false).unwrap();
    assert_eq!(root.finished_text(), "3+2");
    assert_eq!(g.symbol("a").unwrap().override_depth(), 0);
    assert_eq!(g.symbol("b").unwrap().override_depth(), 0);
}

#[test]
fn bare_action_persists_until_popped() {
    let mut g = grammar([("hero", "nobody")].into_iter().collect());
    assert_eq!(g.flatten("[hero:Izzi]#hero#").unwrap(), "Izzi");
    assert_eq!(g.flatten("#hero#").unwrap(), "Izzi");

    let root = g.expand("[hero:POP]#hero#", false).unwrap();
    assert_eq!(root.finished_text(), "nobody");
    assert!(root.errors().is_empty());
}

#[test]
fn extra_pop_is_recorded_not_fatal() {
    let mut g = grammar([("hero", "nobody")].into_iter().collect());
    let root = g.expand("[hero:POP]#hero#", false).unwrap();
    assert_eq!(root.finished_text(), "nobody");
    assert_eq!(root.errors(), &[Diagnostic::PopWithoutPush("hero".into())]);
}

#[test]
fn ambiguous_tag_deep_inside_restores_outer_pushes() {
    let mut g = grammar(
        [
            ("story", "#[villain:Vex]chapter#"),
            ("chapter", "#oops[x:1]again#"),
        ]
        .into_iter()
        .collect(),
    );
    let err = g.expand("#[hero:Mia]story#", false).unwrap_err();
    assert!(matches!(err, GrammarError::AmbiguousTag(_)));
    assert_eq!(g.symbol("hero").unwrap().override_depth(), 0);
    assert_eq!(g.symbol("villain").unwrap().override_depth(), 0);
}

#[test]
fn clear_state_resets_overrides_and_keeps_base() {
    let mut g = grammar(
        [("hero", vec!["Arjun", "Mia"]), ("origin", vec!["[hero:Izzi]#hero#"])]
            .into_iter()
            .collect(),
    );
    let before = g.to_json().unwrap();

    assert_eq!(g.flatten("#origin#").unwrap(), "Izzi");
    assert_eq!(g.symbol("hero").unwrap().override_depth(), 1);

    g.clear_state();
    assert_eq!(g.symbol("hero").unwrap().override_depth(), 0);
    assert_eq!(g.symbol("hero").unwrap().base(), &["Arjun".to_string(), "Mia".to_string()]);
    assert_eq!(g.to_json().unwrap(), before);
    assert_eq!(g.flatten("#hero#").unwrap(), "Arjun");
}

#[test]
fn depth_cap_from_settings_file() {
    let mut g = Grammar::builder()
        .definition([("echo", "#echo#")].into_iter().collect())
        .settings_file("tests/fixtures/settings.ron")
        .random_source(RandomSource::fixed(0.0))
        .build()
        .unwrap();

    let root = g.expand("#echo#", false).unwrap();
    assert_eq!(root.finished_text(), "((echo))");
    assert_eq!(
        root.errors(),
        &[Diagnostic::DepthExceeded {
            symbol: "echo".into(),
            depth: 64
        }]
    );
}

#[test]
fn recursion_suppression_leaves_children_pending() {
    let mut g = grammar([("animal", "cat")].into_iter().collect());
    let mut root = g.create_root("the #animal# sat [mood:calm]");
    root.expand(&mut g, true).unwrap();

    assert_eq!(root.children().len(), 4);
    for child in root.children() {
        assert!(!child.is_expanded());
        assert_eq!(child.finished_text(), "");
        assert!(child.children().is_empty());
    }
    // Nothing ran, so the action never pushed.
    assert!(g.symbol("mood").is_none());
}

#[test]
fn popped_push_uncovers_fallback_symbol() {
    let mut g = grammar([("story", "#hero# rides")].into_iter().collect());
    g.add_subgrammar(grammar([("hero", "Fallback")].into_iter().collect()));

    assert_eq!(g.flatten("#hero#").unwrap(), "Fallback");
    assert_eq!(g.flatten("#[hero:Mia]story#").unwrap(), "Mia rides");

    let root = g.expand("#hero#", false).unwrap();
    assert_eq!(root.finished_text(), "Fallback");
    assert!(root.errors().is_empty());
    assert_eq!(g.symbol("hero").unwrap().override_depth(), 0);
}

#[test]
fn popped_push_leaves_visible_placeholder() {
    let mut g = grammar(RawGrammar::new());
    g.expand("#[x:foo]bar#", false).unwrap();
    assert_eq!(g.symbol("x").unwrap().override_depth(), 0);

    let root = g.expand("a #x# b", false).unwrap();
    assert_eq!(root.finished_text(), "a ((x)) b");
    assert_eq!(root.errors(), &[Diagnostic::MissingSymbol("x".into())]);
}
