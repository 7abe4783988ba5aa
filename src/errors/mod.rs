//! Error types and error handling for the checker.
//!
//! This module defines the error types used throughout the analysis:
//!
//! - Diagnostic errors with source position information
//! - Specific variants for parse errors and semantic errors
//! - Severities and helpful suggestions for reporting
//! - Descriptor errors returned by the type compiler and `verify`

pub mod errors;

#[cfg(test)]
mod tests;
