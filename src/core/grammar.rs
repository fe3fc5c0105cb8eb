//! Symbol table — rule stores, modifiers, fallback grammars and expansion.

use indexmap::IndexMap;
use thiserror::Error;

use crate::core::modifier::{Modifier, ModifierRegistry};
use crate::core::node::ExpansionNode;
use crate::core::random::RandomSource;
use crate::core::settings::{ExpansionSettings, GrammarBuilder};
use crate::core::symbol::Symbol;
use crate::schema::definition::RawGrammar;

/// Errors that stop an expansion or a load.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("multiple main sections in tag '{0}'")]
    AmbiguousTag(String),
    #[error("invalid weights for symbol '{symbol}': {reason}")]
    InvalidWeights { symbol: String, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Problems recorded during parsing or expansion. Expansion carries on
/// past all of these, substituting visible placeholders where needed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("{0}: empty tag")]
    EmptyTag(usize),
    #[error("{0}: empty action")]
    EmptyAction(usize),
    #[error("Unclosed tag")]
    UnclosedTag,
    #[error("Too many [")]
    TooManyOpen,
    #[error("Too many ]")]
    TooManyClose,
    #[error("No symbol for '{0}'")]
    MissingSymbol(String),
    #[error("Symbol '{0}' has no rules to select")]
    EmptySymbol(String),
    #[error("Missing modifier {0}")]
    MissingModifier(String),
    #[error("Can't pop: no pushed rules for '{0}'")]
    PopWithoutPush(String),
    #[error("Expansion of '{symbol}' exceeded max depth {depth}")]
    DepthExceeded { symbol: String, depth: usize },
    #[error("Empty input for node")]
    EmptyInput,
}

/// A loaded grammar: symbols with their scoped rule state, a modifier
/// registry, and fallback grammars consulted for undeclared symbols.
///
/// Expansion borrows the grammar mutably, so one grammar serves one
/// expansion at a time. Use separate grammars for concurrent work.
#[derive(Debug)]
pub struct Grammar {
    symbols: IndexMap<String, Symbol>,
    modifiers: ModifierRegistry,
    subgrammars: Vec<Grammar>,
    rng: RandomSource,
    settings: ExpansionSettings,
}

impl Grammar {
    /// Grammar with default settings and an entropy-seeded random source.
    pub fn new(raw: &RawGrammar) -> Result<Grammar, GrammarError> {
        Self::from_parts(
            raw,
            ModifierRegistry::new(),
            Vec::new(),
            RandomSource::default(),
            ExpansionSettings::default(),
        )
    }

    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::new()
    }

    pub(crate) fn from_parts(
        raw: &RawGrammar,
        modifiers: ModifierRegistry,
        subgrammars: Vec<Grammar>,
        rng: RandomSource,
        settings: ExpansionSettings,
    ) -> Result<Grammar, GrammarError> {
        let mut grammar = Grammar {
            symbols: IndexMap::new(),
            modifiers,
            subgrammars: Vec::new(),
            rng,
            settings,
        };
        grammar.load_from_raw(raw)?;
        grammar.subgrammars = subgrammars;
        Ok(grammar)
    }

    /// Replace every symbol with those declared in `raw`. Fallback
    /// grammars are dropped as well.
    pub fn load_from_raw(&mut self, raw: &RawGrammar) -> Result<(), GrammarError> {
        raw.validate()?;
        self.symbols = raw
            .symbols
            .iter()
            .map(|(name, definition)| (name.clone(), Symbol::from_definition(name, definition)))
            .collect();
        self.subgrammars.clear();
        tracing::debug!(symbols = self.symbols.len(), "grammar loaded");
        Ok(())
    }

    /// Drop all pushed overrides so the grammar can be reused.
    pub fn clear_state(&mut self) {
        for symbol in self.symbols.values_mut() {
            symbol.clear_state();
        }
    }

    pub fn add_modifier(&mut self, name: impl Into<String>, modifier: Modifier) {
        self.modifiers.insert(name, modifier);
    }

    /// Merge named modifiers into the registry; same-named entries are replaced.
    pub fn add_modifiers<K, I>(&mut self, modifiers: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Modifier)>,
    {
        self.modifiers.extend(modifiers);
    }

    pub fn modifiers(&self) -> &ModifierRegistry {
        &self.modifiers
    }

    /// Append a fallback grammar. Fallbacks are consulted in the order added.
    pub fn add_subgrammar(&mut self, grammar: Grammar) {
        self.subgrammars.push(grammar);
    }

    pub fn subgrammars(&self) -> &[Grammar] {
        &self.subgrammars
    }

    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn symbol_names(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(String::as_str)
    }

    pub fn settings(&self) -> &ExpansionSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: ExpansionSettings) {
        self.settings = settings;
    }

    pub fn set_random_source(&mut self, rng: RandomSource) {
        self.rng = rng;
    }

    /// Push `rules` over `name`, creating the symbol if it does not exist.
    /// A symbol created by an action is marked dynamic and keeps an empty
    /// base; otherwise `rules` become its base.
    pub fn push_rules(&mut self, name: &str, rules: Vec<String>, dynamic_source: bool) {
        match self.symbols.get_mut(name) {
            Some(symbol) => symbol.push_rules(rules),
            None if dynamic_source => {
                self.symbols
                    .insert(name.to_string(), Symbol::dynamic(name, rules));
            }
            None => {
                self.symbols
                    .insert(name.to_string(), Symbol::new(name, rules));
            }
        }
        tracing::trace!(
            symbol = name,
            overrides = self.symbols.get(name).map_or(0, Symbol::override_depth),
            "pushed rules"
        );
    }

    pub fn pop_rules(&mut self, name: &str, errors: &mut Vec<Diagnostic>) {
        let popped = self
            .symbols
            .get_mut(name)
            .map_or(false, Symbol::pop_rules);
        if popped {
            tracing::trace!(symbol = name, "popped rules");
        } else {
            tracing::debug!(symbol = name, "pop without a matching push");
            errors.push(Diagnostic::PopWithoutPush(name.to_string()));
        }
    }

    /// Select a rule for `name`.
    ///
    /// Local symbols come first, then fallback grammars in order. A store
    /// with no active rules (such as one left behind by a popped push) is
    /// skipped. When nothing is found an error is recorded and the
    /// placeholder `((name))` is returned.
    pub fn select_rule(
        &mut self,
        name: &str,
        node: &ExpansionNode,
        errors: &mut Vec<Diagnostic>,
    ) -> Option<String> {
        let has_rules = |symbol: &&Symbol| !symbol.active_rules().is_empty();
        let local = self.symbols.get(name);
        let symbol = local.filter(has_rules).or_else(|| {
            self.subgrammars
                .iter()
                .find_map(|g| g.symbols.get(name).filter(has_rules))
        });

        let Some(symbol) = symbol else {
            tracing::debug!(symbol = name, depth = node.depth(), "no symbol");
            // A declared but empty symbol is reported as such; a store that
            // only ever held pushed rules counts as missing.
            let diagnostic = match local {
                Some(symbol) if !symbol.is_dynamic() => {
                    Diagnostic::EmptySymbol(name.to_string())
                }
                _ => Diagnostic::MissingSymbol(name.to_string()),
            };
            errors.push(diagnostic);
            return Some(format!("(({}))", name));
        };

        let selected = symbol.select_rule(&mut self.rng).map(str::to_string);
        tracing::trace!(
            symbol = name,
            depth = node.depth(),
            candidates = symbol.active_rules().len(),
            rule = ?selected,
            "selected rule"
        );
        if selected.is_none() {
            errors.push(Diagnostic::EmptySymbol(name.to_string()));
        }
        selected
    }

    /// An unexpanded root node for `rule`.
    pub fn create_root(&self, rule: &str) -> ExpansionNode {
        ExpansionNode::root(rule)
    }

    /// Fully expand `rule`. Unless `allow_escape_chars` is set, escape
    /// markers are stripped from the root's finished text.
    pub fn expand(
        &mut self,
        rule: &str,
        allow_escape_chars: bool,
    ) -> Result<ExpansionNode, GrammarError> {
        let mut root = self.create_root(rule);
        root.expand(self, false)?;
        if !allow_escape_chars {
            root.clear_escape_chars();
        }
        if !root.errors().is_empty() {
            tracing::debug!(errors = root.errors().len(), rule, "expansion finished with errors");
        }
        Ok(root)
    }

    /// Expand `rule` and return only the finished text.
    pub fn flatten(&mut self, rule: &str) -> Result<String, GrammarError> {
        let allow_escape_chars = self.settings.allow_escape_chars;
        let root = self.expand(rule, allow_escape_chars)?;
        Ok(root.into_finished_text())
    }

    /// The declared (non-dynamic) symbols' base rules as a document.
    pub fn to_raw(&self) -> RawGrammar {
        RawGrammar {
            symbols: self
                .symbols
                .iter()
                .filter(|(_, symbol)| !symbol.is_dynamic())
                .map(|(name, symbol)| (name.clone(), symbol.to_definition()))
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, GrammarError> {
        self.to_raw().to_json()
    }
}
