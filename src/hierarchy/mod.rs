//! Class and interface hierarchy.
//!
//! `class_graph` stores class nodes in an arena addressed by [`ClassId`],
//! `resolver` computes the constants, properties and methods a class
//! inherits.
//!
//! [`ClassId`]: class_graph::ClassId

pub mod class_graph;
pub mod resolver;

#[cfg(test)]
mod tests;
