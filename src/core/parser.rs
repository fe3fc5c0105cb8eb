//! Rule micro-syntax — section scanning, tag decomposition, modifier specs.
//!
//! A rule is plain text interleaved with `#tag#` references and `[action]`
//! blocks. Scanning never fails: malformed input yields whatever sections
//! could be formed plus a list of [`Diagnostic`]s.

use serde::{Deserialize, Serialize};

use crate::core::grammar::{Diagnostic, GrammarError};

/// What a section of rule text stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    /// Raw rule text that still has to be scanned (expansion roots).
    Unparsed,
    /// Literal text, emitted as-is.
    Plain,
    /// `#symbol.mod#` reference.
    Tag,
    /// `[target:rules]`, `[target:POP]` or `[rule]` block.
    Action,
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unparsed => "unparsed",
            Self::Plain => "plain",
            Self::Tag => "tag",
            Self::Action => "action",
        };
        f.write_str(name)
    }
}

/// One scanned piece of a rule. `raw` excludes the delimiters and keeps
/// escape markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub raw: String,
}

impl Section {
    pub fn new(kind: SectionKind, raw: impl Into<String>) -> Self {
        Self {
            kind,
            raw: raw.into(),
        }
    }

    /// The section text with escape markers removed.
    pub fn unescaped(&self) -> String {
        strip_escapes(&self.raw)
    }

    /// Re-wrap the raw text in the delimiters it was scanned from.
    pub fn to_source(&self) -> String {
        match self.kind {
            SectionKind::Tag => format!("#{}#", self.raw),
            SectionKind::Action => format!("[{}]", self.raw),
            SectionKind::Plain | SectionKind::Unparsed => self.raw.clone(),
        }
    }
}

/// Sections of a rule together with the syntax problems found on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseResult {
    pub sections: Vec<Section>,
    pub errors: Vec<Diagnostic>,
}

/// Scan a rule into plain, tag and action sections.
///
/// - `[` at depth 0 outside a tag opens an action; `]` back to depth 0
///   closes it. Brackets inside a tag only track depth.
/// - `#` at depth 0 closes the pending section and toggles tag mode.
/// - `\` makes the next character literal.
///
/// Empty tags and actions are reported but still emitted. Empty plain
/// sections are dropped.
pub fn parse(rule: &str) -> ParseResult {
    let mut depth: i32 = 0;
    let mut in_tag = false;
    let mut escaped = false;
    let mut start = 0;
    let mut result = ParseResult::default();

    for (i, c) in rule.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '[' => {
                if depth == 0 && !in_tag {
                    if start < i {
                        result.push(rule, start, i, SectionKind::Plain);
                    }
                    start = i + 1;
                }
                depth += 1;
            }
            ']' => {
                depth -= 1;
                if depth == 0 && !in_tag {
                    result.push(rule, start, i, SectionKind::Action);
                    start = i + 1;
                }
            }
            '#' if depth == 0 => {
                if in_tag {
                    result.push(rule, start, i, SectionKind::Tag);
                } else if start < i {
                    result.push(rule, start, i, SectionKind::Plain);
                }
                start = i + 1;
                in_tag = !in_tag;
            }
            '\\' => escaped = true,
            _ => {}
        }
    }

    if start < rule.len() {
        result.push(rule, start, rule.len(), SectionKind::Plain);
    }

    if in_tag {
        result.errors.push(Diagnostic::UnclosedTag);
    }
    if depth > 0 {
        result.errors.push(Diagnostic::TooManyOpen);
    }
    if depth < 0 {
        result.errors.push(Diagnostic::TooManyClose);
    }

    result
        .sections
        .retain(|s| !(s.kind == SectionKind::Plain && s.raw.is_empty()));
    result
}

impl ParseResult {
    fn push(&mut self, rule: &str, start: usize, end: usize, kind: SectionKind) {
        if end <= start {
            match kind {
                SectionKind::Tag => self.errors.push(Diagnostic::EmptyTag(start)),
                SectionKind::Action => self.errors.push(Diagnostic::EmptyAction(start)),
                _ => {}
            }
        }
        let raw = rule.get(start..end).unwrap_or_default();
        self.sections.push(Section::new(kind, raw));
    }
}

/// The decomposed inside of a `#...#` tag.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTag {
    pub symbol: String,
    pub modifiers: Vec<String>,
    /// Action (and nested tag) sections run before the symbol is selected.
    pub preactions: Vec<Section>,
    /// Always empty here; undo actions are derived from `preactions`.
    pub postactions: Vec<Section>,
    /// Syntax problems found inside the tag text.
    pub errors: Vec<Diagnostic>,
}

/// Split tag text such as `[hero:#name#]story.capitalize` into its symbol,
/// modifiers and pre-actions.
///
/// Returns `Ok(None)` when the tag has no plain section to expand, and an
/// error when it has more than one, since the symbol is then ambiguous.
pub fn parse_tag(tag: &str) -> Result<Option<ParsedTag>, GrammarError> {
    let ParseResult { sections, errors } = parse(tag);

    let mut main: Option<String> = None;
    let mut preactions = Vec::new();
    for section in sections {
        if section.kind == SectionKind::Plain {
            if main.is_some() {
                return Err(GrammarError::AmbiguousTag(tag.to_string()));
            }
            main = Some(section.raw);
        } else {
            preactions.push(section);
        }
    }

    let Some(main) = main else {
        return Ok(None);
    };

    let mut components = main.split('.').map(str::to_string);
    let symbol = components.next().unwrap_or_default();
    Ok(Some(ParsedTag {
        symbol,
        modifiers: components.collect(),
        preactions,
        postactions: Vec::new(),
        errors,
    }))
}

/// A modifier reference such as `replace(a,b)`.
///
/// Parameters are split on every comma; commas that belong to nested tag
/// syntax or are escaped are not protected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifierSpec {
    pub name: String,
    pub params: Vec<String>,
}

impl ModifierSpec {
    pub fn parse(spec: &str) -> Self {
        let parsed = spec.find('(').filter(|&open| open > 0).and_then(|open| {
            let rest = &spec[open + 1..];
            let close = rest.find(')')?;
            let inner = &rest[..close];
            if inner.is_empty() {
                return None;
            }
            Some(ModifierSpec {
                name: spec[..open].to_string(),
                params: inner.split(',').map(str::to_string).collect(),
            })
        });

        parsed.unwrap_or_else(|| ModifierSpec {
            name: spec.to_string(),
            params: Vec::new(),
        })
    }
}

/// Remove escape markers: `\\` becomes `\`, any other single `\` is dropped.
pub fn strip_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if chars.peek() == Some(&'\\') {
                chars.next();
                out.push('\\');
            }
            continue;
        }
        out.push(c);
    }
    out
}

/// Split push text into alternatives on `separator`, ignoring escaped
/// separators and those nested inside `#...#` or `[...]`.
pub fn split_alternatives(text: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_tag = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '[' => depth += 1,
            ']' => depth -= 1,
            '#' if depth == 0 => in_tag = !in_tag,
            c if c == separator && depth == 0 && !in_tag => {
                parts.push(text[start..i].to_string());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(text[start..].to_string());
    parts
}
