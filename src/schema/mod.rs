//! Input document types.

pub mod definition;
