//! Type descriptors, matchers and signatures.
//!
//! - `compiler` turns descriptor strings into cached matchers
//! - `matcher` checks runtime values and static assignability
//! - `signature` describes function and method contracts
//! - `verify` checks a runtime value against a descriptor

pub mod compiler;
pub mod matcher;
pub mod signature;
pub mod verify;

#[cfg(test)]
mod tests;
