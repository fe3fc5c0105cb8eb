//! Grammar Engine — generative-grammar text expansion.
//!
//! Expands a starting rule into finished text by recursively resolving
//! `#symbol#` references against a grammar, making weighted-random choices
//! at each branching point, applying named text modifiers, and scoping
//! `[target:rules]` pushes so every push is undone exactly once.

pub mod core;
pub mod schema;

pub use crate::core::grammar::{Diagnostic, Grammar, GrammarError};
pub use crate::core::modifier::{modifier, Modifier};
pub use crate::core::node::ExpansionNode;
pub use crate::core::random::RandomSource;
pub use crate::core::settings::{ExpansionSettings, GrammarBuilder};
pub use crate::schema::definition::{RawGrammar, SymbolDefinition};
