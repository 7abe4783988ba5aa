//! Lexical analysis module for the checker.
//!
//! This module contains the lexer that converts source code into the stream
//! of symbols consumed by the statement dispatcher. It handles:
//!
//! - Tokenization of source code using regex patterns
//! - Recognition of keywords, identifiers, variables, literals and operators
//! - Annotation delimiters (`/*.` and `.*/`)
//! - Symbol position tracking for diagnostics
//! - Comments, whitespace and open/close tags

pub mod lexer;
pub mod symbols;

#[cfg(test)]
mod tests;
