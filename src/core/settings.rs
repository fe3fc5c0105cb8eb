//! Expansion settings and the grammar builder.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::grammar::{Grammar, GrammarError};
use crate::core::modifier::{Modifier, ModifierRegistry};
use crate::core::random::RandomSource;
use crate::schema::definition::RawGrammar;

/// Tunables for expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionSettings {
    /// Deepest node that may still select a rule. `None` disables the cap,
    /// letting self-referential grammars recurse until the stack runs out.
    pub max_depth: Option<usize>,
    /// Keep escape markers in the text returned by [`Grammar::flatten`].
    pub allow_escape_chars: bool,
    /// Separates alternatives in `[target:a,b,c]`.
    pub push_separator: char,
}

impl Default for ExpansionSettings {
    fn default() -> Self {
        Self {
            max_depth: Some(128),
            allow_escape_chars: false,
            push_separator: ',',
        }
    }
}

impl ExpansionSettings {
    pub fn load_from_ron(path: &Path) -> Result<ExpansionSettings, GrammarError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<ExpansionSettings, GrammarError> {
        Ok(ron::from_str(input)?)
    }
}

/// Builder for a [`Grammar`]. Built via `Grammar::builder()`.
///
/// Definition files are loaded in the order given and merged, later
/// symbols overriding earlier ones; a directly supplied definition is
/// merged last.
pub struct GrammarBuilder {
    json_files: Vec<PathBuf>,
    ron_files: Vec<PathBuf>,
    settings_path: Option<PathBuf>,
    seed: Option<u64>,
    max_depth: Option<Option<usize>>,
    /// Directly provided definition (for use without files).
    definition: Option<RawGrammar>,
    /// Directly provided settings; take precedence over `settings_path`.
    settings: Option<ExpansionSettings>,
    random_source: Option<RandomSource>,
    modifiers: ModifierRegistry,
    subgrammars: Vec<Grammar>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self {
            json_files: Vec::new(),
            ron_files: Vec::new(),
            settings_path: None,
            seed: None,
            max_depth: None,
            definition: None,
            settings: None,
            random_source: None,
            modifiers: ModifierRegistry::new(),
            subgrammars: Vec::new(),
        }
    }

    pub fn json_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.json_files.push(path.into());
        self
    }

    pub fn ron_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ron_files.push(path.into());
        self
    }

    pub fn settings_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    pub fn definition(mut self, raw: RawGrammar) -> Self {
        self.definition = Some(raw);
        self
    }

    pub fn settings(mut self, settings: ExpansionSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Override the depth cap from the settings.
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Seed a `StdRng`. Ignored when a random source is given.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn random_source(mut self, rng: RandomSource) -> Self {
        self.random_source = Some(rng);
        self
    }

    pub fn modifier(mut self, name: impl Into<String>, modifier: Modifier) -> Self {
        self.modifiers.insert(name, modifier);
        self
    }

    pub fn modifiers<K, I>(mut self, modifiers: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Modifier)>,
    {
        self.modifiers.extend(modifiers);
        self
    }

    /// Add a fallback grammar, consulted after those added before it.
    pub fn subgrammar(mut self, grammar: Grammar) -> Self {
        self.subgrammars.push(grammar);
        self
    }

    pub fn build(self) -> Result<Grammar, GrammarError> {
        let mut raw = RawGrammar::new();
        for path in &self.json_files {
            raw.merge(RawGrammar::load_from_json(path)?);
        }
        for path in &self.ron_files {
            raw.merge(RawGrammar::load_from_ron(path)?);
        }
        if let Some(definition) = self.definition {
            raw.merge(definition);
        }

        let mut settings = match (self.settings, &self.settings_path) {
            (Some(settings), _) => settings,
            (None, Some(path)) => ExpansionSettings::load_from_ron(path)?,
            (None, None) => ExpansionSettings::default(),
        };
        if let Some(max_depth) = self.max_depth {
            settings.max_depth = max_depth;
        }

        let rng = match (self.random_source, self.seed) {
            (Some(rng), _) => rng,
            (None, Some(seed)) => RandomSource::from_seed(seed),
            (None, None) => RandomSource::from_entropy(),
        };

        tracing::debug!(
            symbols = raw.symbols.len(),
            modifiers = self.modifiers.len(),
            subgrammars = self.subgrammars.len(),
            "building grammar"
        );
        Grammar::from_parts(&raw, self.modifiers, self.subgrammars, rng, settings)
    }
}

impl Default for GrammarBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::modifier::modifier;

    #[test]
    fn default_settings() {
        let settings = ExpansionSettings::default();
        assert_eq!(settings.max_depth, Some(128));
        assert!(!settings.allow_escape_chars);
        assert_eq!(settings.push_separator, ',');
    }

    #[test]
    fn partial_ron_settings_fill_defaults() {
        let settings = ExpansionSettings::parse_ron("(max_depth: Some(12))").unwrap();
        assert_eq!(settings.max_depth, Some(12));
        assert_eq!(settings.push_separator, ',');
    }

    #[test]
    fn builder_with_definition_and_seed() {
        let mut grammar = Grammar::builder()
            .definition([("origin", vec!["a", "b", "c"])].into_iter().collect())
            .seed(42)
            .build()
            .unwrap();
        let first = grammar.flatten("#origin#").unwrap();
        assert!(["a", "b", "c"].contains(&first.as_str()));
    }

    #[test]
    fn same_seed_same_output() {
        let build = || {
            Grammar::builder()
                .definition(
                    [
                        ("origin", vec!["#a# #a# #a# #a#"]),
                        ("a", vec!["1", "2", "3", "4", "5"]),
                    ]
                    .into_iter()
                    .collect(),
                )
                .seed(7)
                .build()
                .unwrap()
        };
        assert_eq!(
            build().flatten("#origin#").unwrap(),
            build().flatten("#origin#").unwrap()
        );
    }

    #[test]
    fn builder_registers_modifiers_and_max_depth() {
        let grammar = Grammar::builder()
            .modifier("upper", modifier(|s, _| s.to_uppercase()))
            .max_depth(None)
            .build()
            .unwrap();
        assert!(grammar.modifiers().contains("upper"));
        assert_eq!(grammar.settings().max_depth, None);
    }

    #[test]
    fn builder_loads_fixture_files() {
        let grammar = Grammar::builder()
            .json_file("tests/fixtures/adventurer.json")
            .ron_file("tests/fixtures/weather.ron")
            .settings_file("tests/fixtures/settings.ron")
            .build()
            .unwrap();
        assert!(grammar.symbol("origin").is_some());
        assert!(grammar.symbol("weather").is_some());
        assert_eq!(grammar.settings().max_depth, Some(64));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = Grammar::builder().json_file("tests/fixtures/nope.json").build();
        assert!(matches!(result, Err(GrammarError::Io(_))));
    }
}
