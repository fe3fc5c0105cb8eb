//! Expansion runtime: parsing, rule stores, scoped actions and the tree walker.

pub mod action;
pub mod grammar;
pub mod lint;
pub mod modifier;
pub mod node;
pub mod parser;
pub mod random;
pub mod settings;
pub mod symbol;
