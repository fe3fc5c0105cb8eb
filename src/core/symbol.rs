//! Rule store for a single symbol: base rules, pushed overrides, selection.

use crate::core::random::RandomSource;
use crate::schema::definition::SymbolDefinition;

/// The candidate rules for one symbol.
///
/// `base` comes from the grammar definition and never changes during an
/// expansion. Pushed overrides shadow it until popped.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    name: String,
    base: Vec<String>,
    weights: Option<Vec<f64>>,
    override_stack: Vec<Vec<String>>,
    is_dynamic: bool,
}

impl Symbol {
    pub fn new(name: impl Into<String>, base: Vec<String>) -> Self {
        Self {
            name: name.into(),
            base,
            weights: None,
            override_stack: Vec::new(),
            is_dynamic: false,
        }
    }

    /// Build from a (validated) definition.
    pub fn from_definition(name: impl Into<String>, definition: &SymbolDefinition) -> Self {
        let mut symbol = Self::new(name, definition.rules());
        symbol.weights = definition.weights().map(<[f64]>::to_vec);
        symbol
    }

    /// A store created by a push on an undeclared name. Its `base` is empty.
    pub fn dynamic(name: impl Into<String>, rules: Vec<String>) -> Self {
        let mut symbol = Self::new(name, Vec::new());
        symbol.is_dynamic = true;
        symbol.override_stack.push(rules);
        symbol
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> &[String] {
        &self.base
    }

    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    pub fn is_dynamic(&self) -> bool {
        self.is_dynamic
    }

    /// Number of pushed overrides currently shadowing `base`.
    pub fn override_depth(&self) -> usize {
        self.override_stack.len()
    }

    /// The rules selection currently draws from.
    pub fn active_rules(&self) -> &[String] {
        self.override_stack.last().unwrap_or(&self.base)
    }

    /// Draw one rule, consuming exactly one value from `rng`.
    ///
    /// Weights only apply to `base`; overrides are drawn uniformly. Returns
    /// `None` when there is nothing to choose from.
    pub fn select_rule(&self, rng: &mut RandomSource) -> Option<&str> {
        if let Some(top) = self.override_stack.last() {
            return select_uniform(top, rng);
        }
        match &self.weights {
            Some(weights) => select_weighted(&self.base, weights, rng),
            None => select_uniform(&self.base, rng),
        }
    }

    pub fn push_rules(&mut self, rules: Vec<String>) {
        self.override_stack.push(rules);
    }

    /// Remove the most recent override. Returns `false` when there was none.
    pub fn pop_rules(&mut self) -> bool {
        self.override_stack.pop().is_some()
    }

    pub fn clear_state(&mut self) {
        self.override_stack.clear();
    }

    /// The persistable form of this symbol: `base` only.
    pub fn to_definition(&self) -> SymbolDefinition {
        match &self.weights {
            Some(weights) => SymbolDefinition::Weighted {
                rules: self.base.clone(),
                weights: weights.clone(),
            },
            None => SymbolDefinition::Many(self.base.clone()),
        }
    }
}

fn select_uniform<'a>(rules: &'a [String], rng: &mut RandomSource) -> Option<&'a str> {
    if rules.is_empty() {
        return None;
    }
    Some(rules[rng.index(rules.len())].as_str())
}

fn select_weighted<'a>(
    rules: &'a [String],
    weights: &[f64],
    rng: &mut RandomSource,
) -> Option<&'a str> {
    if rules.is_empty() {
        return None;
    }
    let total: f64 = weights.iter().sum();
    let target = rng.next_f64() * total;

    let mut cumulative = 0.0;
    for (rule, weight) in rules.iter().zip(weights) {
        cumulative += weight;
        if target < cumulative {
            return Some(rule.as_str());
        }
    }
    // Rounding can leave target at the very top; take the last weighted rule.
    rules
        .iter()
        .zip(weights)
        .rev()
        .find(|(_, w)| **w > 0.0)
        .map(|(r, _)| r.as_str())
}
