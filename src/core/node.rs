//! Expansion tree — each node resolves one section of rule text to
//! finished text exactly once.

use crate::core::action::NodeAction;
use crate::core::grammar::{Diagnostic, Grammar, GrammarError};
use crate::core::parser::{self, ModifierSpec, ParseResult, ParsedTag, SectionKind};

/// One node of an expansion tree.
///
/// Nodes own their children. The grammar is passed into [`expand`] rather
/// than stored, so the tree can outlive the borrow.
///
/// [`expand`]: ExpansionNode::expand
#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionNode {
    raw: String,
    kind: SectionKind,
    depth: usize,
    child_index: usize,
    expanded: bool,
    finished_text: String,
    children: Vec<ExpansionNode>,
    errors: Vec<Diagnostic>,
    symbol: Option<String>,
    modifiers: Vec<String>,
    child_rule: Option<String>,
}

impl ExpansionNode {
    pub fn new(raw: impl Into<String>, kind: SectionKind, depth: usize, child_index: usize) -> Self {
        Self {
            raw: raw.into(),
            kind,
            depth,
            child_index,
            expanded: false,
            finished_text: String::new(),
            children: Vec::new(),
            errors: Vec::new(),
            symbol: None,
            modifiers: Vec::new(),
            child_rule: None,
        }
    }

    /// An unparsed root at depth 0.
    pub fn root(rule: impl Into<String>) -> Self {
        let mut node = Self::new(rule, SectionKind::Unparsed, 0, 0);
        if node.raw.is_empty() {
            node.errors.push(Diagnostic::EmptyInput);
        }
        node
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn child_index(&self) -> usize {
        self.child_index
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn finished_text(&self) -> &str {
        &self.finished_text
    }

    pub fn into_finished_text(self) -> String {
        self.finished_text
    }

    pub fn children(&self) -> &[ExpansionNode] {
        &self.children
    }

    /// Diagnostics from this node and every expanded descendant.
    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// The symbol a tag node resolved, once expanded.
    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn modifiers(&self) -> &[String] {
        &self.modifiers
    }

    /// The rule text this node's children were parsed from.
    pub fn child_rule(&self) -> Option<&str> {
        self.child_rule.as_deref()
    }

    /// Expand this node. A second call is a no-op.
    ///
    /// With `prevent_recursion`, children are created but left unexpanded.
    /// Only an ambiguous tag aborts; everything else is recorded in
    /// [`errors`](Self::errors).
    pub fn expand(
        &mut self,
        grammar: &mut Grammar,
        prevent_recursion: bool,
    ) -> Result<(), GrammarError> {
        if self.expanded {
            return Ok(());
        }
        self.expanded = true;

        match self.kind {
            SectionKind::Unparsed => {
                let rule = self.raw.clone();
                self.expand_children(&rule, grammar, prevent_recursion)
            }
            SectionKind::Plain => {
                self.finished_text = self.raw.clone();
                Ok(())
            }
            SectionKind::Tag => self.expand_tag(grammar, prevent_recursion),
            SectionKind::Action => {
                let action = NodeAction::parse(&self.raw, grammar.settings().push_separator);
                action.activate(grammar, self.depth, &mut self.errors)?;
                self.finished_text.clear();
                Ok(())
            }
        }
    }

    fn expand_children(
        &mut self,
        rule: &str,
        grammar: &mut Grammar,
        prevent_recursion: bool,
    ) -> Result<(), GrammarError> {
        self.children.clear();
        self.finished_text.clear();
        self.child_rule = Some(rule.to_string());

        let ParseResult { sections, errors } = parser::parse(rule);
        self.errors.extend(errors);

        for (index, section) in sections.into_iter().enumerate() {
            let mut child = ExpansionNode::new(section.raw, section.kind, self.depth + 1, index);
            if !prevent_recursion {
                child.expand(grammar, prevent_recursion)?;
                self.errors.extend_from_slice(&child.errors);
            }
            self.finished_text.push_str(&child.finished_text);
            self.children.push(child);
        }
        Ok(())
    }

    fn expand_tag(
        &mut self,
        grammar: &mut Grammar,
        prevent_recursion: bool,
    ) -> Result<(), GrammarError> {
        let Some(ParsedTag {
            symbol,
            modifiers,
            preactions,
            errors,
            ..
        }) = parser::parse_tag(&self.raw)?
        else {
            return Ok(());
        };
        self.errors.extend(errors);
        self.symbol = Some(symbol.clone());
        self.modifiers = modifiers;

        let separator = grammar.settings().push_separator;
        let preactions: Vec<NodeAction> = preactions
            .iter()
            .map(|section| NodeAction::from_section(section, separator))
            .collect();

        // Undo only what was actually applied, so a failure part-way
        // through the pre-actions still leaves the stacks balanced.
        let mut postactions = Vec::new();
        let mut outcome = Ok(());
        for action in &preactions {
            if let Err(err) = action.activate(grammar, self.depth, &mut self.errors) {
                outcome = Err(err);
                break;
            }
            postactions.extend(action.create_undo());
        }

        if outcome.is_ok() {
            outcome = self.resolve_symbol(&symbol, grammar, prevent_recursion);
        }

        for action in &postactions {
            let undone = action.activate(grammar, self.depth, &mut self.errors);
            if outcome.is_ok() {
                outcome = undone;
            }
        }
        outcome
    }

    fn resolve_symbol(
        &mut self,
        symbol: &str,
        grammar: &mut Grammar,
        prevent_recursion: bool,
    ) -> Result<(), GrammarError> {
        if let Some(max_depth) = grammar.settings().max_depth {
            if self.depth > max_depth {
                tracing::warn!(symbol, depth = self.depth, "expansion depth cap reached");
                self.errors.push(Diagnostic::DepthExceeded {
                    symbol: symbol.to_string(),
                    depth: max_depth,
                });
                self.finished_text = format!("(({}))", symbol);
                return Ok(());
            }
        }

        let mut errors = Vec::new();
        let selected = grammar.select_rule(symbol, self, &mut errors);
        self.errors.append(&mut errors);

        if let Some(rule) = selected {
            self.expand_children(&rule, grammar, prevent_recursion)?;
        }
        self.apply_modifiers(grammar);
        Ok(())
    }

    fn apply_modifiers(&mut self, grammar: &Grammar) {
        for spec in self.modifiers.iter().map(|m| ModifierSpec::parse(m)) {
            match grammar.modifiers().get(&spec.name) {
                Some(modifier) => {
                    let text = modifier(&self.finished_text, &spec.params);
                    self.finished_text = text;
                }
                None => {
                    tracing::debug!(modifier = %spec.name, "missing modifier");
                    self.finished_text.push_str(&format!("((.{}))", spec.name));
                    self.errors.push(Diagnostic::MissingModifier(spec.name));
                }
            }
        }
    }

    /// Strip escape markers from the finished text.
    pub fn clear_escape_chars(&mut self) {
        self.finished_text = parser::strip_escapes(&self.finished_text);
    }
}

impl std::fmt::Display for ExpansionNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Node('{}' {} d:{})", self.raw, self.kind, self.depth)
    }
}
