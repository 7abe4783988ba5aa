//! Statement dispatch and semantic analysis.
//!
//! - `analyzer` holds the session: cursor, scope and the analysis passes
//! - `lookups` maps symbol kinds to statement and expression handlers
//! - `stmt` and `decl` are the statement handlers, `expr` the expression
//!   evaluator and `annotations` the `/*. .*/` comment parser
//! - `globals` is the table of classes, functions and constants

pub mod analyzer;
pub mod annotations;
pub mod decl;
pub mod expr;
pub mod globals;
pub mod lookups;
pub mod stmt;

#[cfg(test)]
mod tests;
