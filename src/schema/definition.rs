//! Grammar definition documents — the raw symbol → rules mapping.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::grammar::GrammarError;

/// The rules declared for one symbol.
///
/// Accepts a single rule string, a list of rules, or a list with a
/// parallel list of selection weights:
///
/// ```json
/// { "origin": "#greeting#, #name#!",
///   "greeting": ["Hello", "Hi"],
///   "name": { "rules": ["Ada", "Grace"], "weights": [3, 1] } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SymbolDefinition {
    Single(String),
    Many(Vec<String>),
    Weighted { rules: Vec<String>, weights: Vec<f64> },
}

impl SymbolDefinition {
    /// The candidate rules, a single rule coerced to a one-element list.
    pub fn rules(&self) -> Vec<String> {
        match self {
            Self::Single(rule) => vec![rule.clone()],
            Self::Many(rules) | Self::Weighted { rules, .. } => rules.clone(),
        }
    }

    pub fn weights(&self) -> Option<&[f64]> {
        match self {
            Self::Weighted { weights, .. } => Some(weights),
            _ => None,
        }
    }

    /// Shape check for weighted definitions.
    pub fn validate(&self, symbol: &str) -> Result<(), GrammarError> {
        let Self::Weighted { rules, weights } = self else {
            return Ok(());
        };
        let invalid = |reason: String| GrammarError::InvalidWeights {
            symbol: symbol.to_string(),
            reason,
        };

        if rules.len() != weights.len() {
            return Err(invalid(format!(
                "{} rules but {} weights",
                rules.len(),
                weights.len()
            )));
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(invalid(format!("weight {} is not a finite non-negative number", w)));
        }
        let total: f64 = weights.iter().sum();
        if !total.is_finite() {
            return Err(invalid(format!("weights sum to {}", total)));
        }
        if !rules.is_empty() && total <= 0.0 {
            return Err(invalid("weights sum to zero".to_string()));
        }
        Ok(())
    }
}

impl From<&str> for SymbolDefinition {
    fn from(rule: &str) -> Self {
        Self::Single(rule.to_string())
    }
}

impl From<Vec<&str>> for SymbolDefinition {
    fn from(rules: Vec<&str>) -> Self {
        Self::Many(rules.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for SymbolDefinition {
    fn from(rules: Vec<String>) -> Self {
        Self::Many(rules)
    }
}

/// A grammar document: symbol names in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawGrammar {
    pub symbols: IndexMap<String, SymbolDefinition>,
}

impl RawGrammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, definition: impl Into<SymbolDefinition>) -> Self {
        self.symbols.insert(name.into(), definition.into());
        self
    }

    /// Parse a grammar from a JSON string.
    pub fn parse_json(input: &str) -> Result<RawGrammar, GrammarError> {
        let raw: RawGrammar = serde_json::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Load a grammar from a JSON file.
    pub fn load_from_json(path: &Path) -> Result<RawGrammar, GrammarError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_json(&contents)
    }

    /// Parse a grammar from a RON string.
    pub fn parse_ron(input: &str) -> Result<RawGrammar, GrammarError> {
        let raw: RawGrammar = ron::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Load a grammar from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<RawGrammar, GrammarError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn validate(&self) -> Result<(), GrammarError> {
        for (name, definition) in &self.symbols {
            definition.validate(name)?;
        }
        Ok(())
    }

    /// Merge another document into this one. Symbols from `other`
    /// override symbols in `self` with the same name.
    pub fn merge(&mut self, other: RawGrammar) {
        self.symbols.extend(other.symbols);
    }

    pub fn to_json(&self) -> Result<String, GrammarError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl<K, D> FromIterator<(K, D)> for RawGrammar
where
    K: Into<String>,
    D: Into<SymbolDefinition>,
{
    fn from_iter<I: IntoIterator<Item = (K, D)>>(iter: I) -> Self {
        Self {
            symbols: iter
                .into_iter()
                .map(|(k, d)| (k.into(), d.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_all_definition_shapes() {
        let raw = RawGrammar::parse_json(
            r##"{
                "origin": "#greeting#",
                "greeting": ["Hello", "Hi"],
                "name": { "rules": ["Ada", "Grace"], "weights": [3, 1] }
            }"##,
        )
        .unwrap();

        assert_eq!(raw.symbols["origin"], SymbolDefinition::Single("#greeting#".into()));
        assert_eq!(raw.symbols["greeting"].rules(), vec!["Hello", "Hi"]);
        assert_eq!(raw.symbols["name"].weights(), Some(&[3.0, 1.0][..]));
    }

    #[test]
    fn declaration_order_is_kept() {
        let raw = RawGrammar::parse_json(r#"{"z": "1", "a": "2", "m": "3"}"#).unwrap();
        let names: Vec<&str> = raw.symbols.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn mismatched_weights_rejected() {
        let err = RawGrammar::parse_json(r#"{"x": {"rules": ["a", "b"], "weights": [1]}}"#)
            .unwrap_err();
        assert!(matches!(err, GrammarError::InvalidWeights { ref symbol, .. } if symbol == "x"));
    }

    #[test]
    fn negative_and_zero_weights_rejected() {
        assert!(RawGrammar::parse_json(r#"{"x": {"rules": ["a"], "weights": [-1]}}"#).is_err());
        assert!(RawGrammar::parse_json(r#"{"x": {"rules": ["a"], "weights": [0]}}"#).is_err());
    }

    #[test]
    fn overflowing_weight_total_rejected() {
        let err = RawGrammar::parse_json(r#"{"x": {"rules": ["a", "b"], "weights": [1e308, 1e308]}}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            GrammarError::InvalidWeights { ref reason, .. } if reason == "weights sum to inf"
        ));
        assert!(RawGrammar::parse_json(r#"{"x": {"rules": ["a", "b"], "weights": [1e308, 1]}}"#).is_ok());
    }

    #[test]
    fn wrong_shape_rejected() {
        assert!(matches!(
            RawGrammar::parse_json(r#"{"x": 5}"#),
            Err(GrammarError::Json(_))
        ));
    }

    #[test]
    fn parse_ron_grammar() {
        let raw = RawGrammar::parse_ron(
            r##"{
                "origin": "#animal#",
                "animal": ["cat", "dog"],
            }"##,
        )
        .unwrap();
        assert_eq!(raw.symbols.len(), 2);
        assert_eq!(raw.symbols["animal"].rules(), vec!["cat", "dog"]);
    }

    #[test]
    fn merge_precedence() {
        let mut base: RawGrammar = [("shared", "base"), ("base_only", "b")].into_iter().collect();
        let other: RawGrammar = [("shared", "override")].into_iter().collect();
        base.merge(other);

        assert_eq!(base.symbols["shared"].rules(), vec!["override"]);
        assert!(base.symbols.contains_key("base_only"));
    }

    #[test]
    fn load_fixture_grammar() {
        let path = std::path::PathBuf::from("tests/fixtures/adventurer.json");
        let raw = RawGrammar::load_from_json(&path).unwrap();
        assert!(raw.symbols.contains_key("origin"));
        assert!(raw.symbols.contains_key("hero"));
    }
}
