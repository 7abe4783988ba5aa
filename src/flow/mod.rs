//! Control-flow statuses and the algebra that composes them across nested
//! statements.

pub mod algebra;
pub mod status;

#[cfg(test)]
mod tests;
