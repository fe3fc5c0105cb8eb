//! Scoped actions — `[target:rules]` pushes, `[target:POP]` pops and bare
//! `[rule]` evaluations.

use crate::core::grammar::{Diagnostic, Grammar, GrammarError};
use crate::core::node::ExpansionNode;
use crate::core::parser::{split_alternatives, Section, SectionKind};

/// Rule text that pops instead of pushing.
const POP: &str = "POP";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// Expand each alternative of `rules`, then push the results.
    Push { rules: String },
    Pop,
    /// Expand the target text as a rule for its side effects.
    Evaluate,
}

/// A parsed action against one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAction {
    target: String,
    kind: ActionKind,
    separator: char,
}

impl NodeAction {
    /// Parse action text (the inside of `[...]`). Everything after the
    /// first `:` is the rule source.
    pub fn parse(raw: &str, separator: char) -> Self {
        let (target, kind) = match raw.split_once(':') {
            None => (raw, ActionKind::Evaluate),
            Some((target, POP)) => (target, ActionKind::Pop),
            Some((target, rules)) => (
                target,
                ActionKind::Push {
                    rules: rules.to_string(),
                },
            ),
        };
        Self {
            target: target.to_string(),
            kind,
            separator,
        }
    }

    pub fn from_section(section: &Section, separator: char) -> Self {
        Self::parse(&section.raw, separator)
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    pub fn is_push(&self) -> bool {
        matches!(self.kind, ActionKind::Push { .. })
    }

    /// The pop matching a push. Other kinds have nothing to undo.
    pub fn create_undo(&self) -> Option<NodeAction> {
        self.is_push().then(|| NodeAction {
            target: self.target.clone(),
            kind: ActionKind::Pop,
            separator: self.separator,
        })
    }

    /// Apply the action to `grammar`. `depth` is the depth of the node the
    /// action belongs to; rules expanded here sit one level below it.
    pub fn activate(
        &self,
        grammar: &mut Grammar,
        depth: usize,
        errors: &mut Vec<Diagnostic>,
    ) -> Result<(), GrammarError> {
        match &self.kind {
            ActionKind::Push { rules } => {
                let mut finished = Vec::new();
                for alternative in split_alternatives(rules, self.separator) {
                    finished.push(expand_nested(alternative, grammar, depth, errors)?);
                }
                tracing::debug!(symbol = %self.target, rules = ?finished, "push");
                grammar.push_rules(&self.target, finished, true);
            }
            ActionKind::Pop => {
                tracing::debug!(symbol = %self.target, "pop");
                grammar.pop_rules(&self.target, errors);
            }
            ActionKind::Evaluate => {
                expand_nested(self.target.clone(), grammar, depth, errors)?;
            }
        }
        Ok(())
    }
}

fn expand_nested(
    rule: String,
    grammar: &mut Grammar,
    depth: usize,
    errors: &mut Vec<Diagnostic>,
) -> Result<String, GrammarError> {
    let mut node = ExpansionNode::new(rule, SectionKind::Unparsed, depth + 1, 0);
    node.expand(grammar, false)?;
    errors.extend_from_slice(node.errors());
    Ok(node.into_finished_text())
}
