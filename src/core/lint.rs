//! Static checks over a grammar definition, without expanding anything.

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::core::action::{ActionKind, NodeAction};
use crate::core::grammar::Diagnostic;
use crate::core::parser::{parse, parse_tag, split_alternatives, Section, SectionKind};
use crate::core::settings::ExpansionSettings;
use crate::schema::definition::RawGrammar;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LintError {
    #[error("Rule '{symbol}' does not scan cleanly: {diagnostic}")]
    Syntax { symbol: String, diagnostic: Diagnostic },
    #[error("Rule '{symbol}' has a tag with multiple main sections: '{tag}'")]
    AmbiguousTag { symbol: String, tag: String },
    #[error("Rule '{symbol}' references non-existent symbol '{reference}'")]
    MissingReference { symbol: String, reference: String },
    #[error("Symbol '{0}' has no non-recursive rule (infinite recursion)")]
    NoExit(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LintWarning {
    #[error("Symbol '{0}' has only one rule")]
    SingleRule(String),
    #[error("Symbol '{0}' is never referenced")]
    Unreferenced(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintReport {
    pub errors: Vec<LintError>,
    pub warnings: Vec<LintWarning>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// What one rule refers to.
#[derive(Debug, Default)]
struct RuleRefs {
    tags: Vec<String>,
    pushes: Vec<String>,
    diagnostics: Vec<Diagnostic>,
    ambiguous: Vec<String>,
}

/// Check every rule of `raw`. `origin` is exempt from the unreferenced
/// warning. Push alternatives are split as `settings` would split them.
pub fn lint(raw: &RawGrammar, origin: &str, settings: &ExpansionSettings) -> LintReport {
    let separator = settings.push_separator;
    let mut report = LintReport::default();

    let scanned: Vec<(&str, Vec<RuleRefs>)> = raw
        .symbols
        .iter()
        .map(|(name, definition)| {
            let refs = definition
                .rules()
                .iter()
                .map(|rule| {
                    let mut refs = RuleRefs::default();
                    scan(rule, separator, &mut refs);
                    refs
                })
                .collect();
            (name.as_str(), refs)
        })
        .collect();

    let pushed: FxHashSet<&str> = scanned
        .iter()
        .flat_map(|(_, rules)| rules.iter())
        .flat_map(|refs| refs.pushes.iter().map(String::as_str))
        .collect();
    let referenced: FxHashSet<&str> = scanned
        .iter()
        .flat_map(|(_, rules)| rules.iter())
        .flat_map(|refs| refs.tags.iter().map(String::as_str))
        .collect();

    for (name, rules) in &scanned {
        for refs in rules {
            report
                .errors
                .extend(refs.diagnostics.iter().map(|diagnostic| LintError::Syntax {
                    symbol: name.to_string(),
                    diagnostic: diagnostic.clone(),
                }));
            report
                .errors
                .extend(refs.ambiguous.iter().map(|tag| LintError::AmbiguousTag {
                    symbol: name.to_string(),
                    tag: tag.clone(),
                }));
            for reference in &refs.tags {
                let known = raw.symbols.contains_key(reference.as_str())
                    || pushed.contains(reference.as_str());
                if !known {
                    report.errors.push(LintError::MissingReference {
                        symbol: name.to_string(),
                        reference: reference.clone(),
                    });
                }
            }
        }

        let no_exit = !rules.is_empty()
            && rules
                .iter()
                .all(|refs| refs.tags.iter().any(|tag| tag == name));
        if no_exit {
            report.errors.push(LintError::NoExit(name.to_string()));
        }

        if rules.len() == 1 {
            report.warnings.push(LintWarning::SingleRule(name.to_string()));
        }
        if *name != origin && !referenced.contains(name) {
            report.warnings.push(LintWarning::Unreferenced(name.to_string()));
        }
    }

    report
}

fn scan(rule: &str, separator: char, refs: &mut RuleRefs) {
    let result = parse(rule);
    refs.diagnostics.extend(result.errors);
    for section in &result.sections {
        scan_section(section, separator, refs);
    }
}

fn scan_section(section: &Section, separator: char, refs: &mut RuleRefs) {
    match section.kind {
        SectionKind::Tag => match parse_tag(&section.raw) {
            Ok(Some(tag)) => {
                refs.diagnostics.extend(tag.errors);
                refs.tags.push(tag.symbol);
                for preaction in &tag.preactions {
                    scan_section(preaction, separator, refs);
                }
            }
            // Action-only tag: its actions never run, but their text is
            // still worth checking.
            Ok(None) => scan(&section.raw, separator, refs),
            Err(_) => refs.ambiguous.push(section.raw.clone()),
        },
        SectionKind::Action => {
            let action = NodeAction::from_section(section, separator);
            match action.kind() {
                ActionKind::Push { rules } => {
                    refs.pushes.push(action.target().to_string());
                    for alternative in split_alternatives(rules, separator) {
                        scan(&alternative, separator, refs);
                    }
                }
                ActionKind::Pop => {}
                ActionKind::Evaluate => scan(action.target(), separator, refs),
            }
        }
        SectionKind::Plain | SectionKind::Unparsed => {}
    }
}
