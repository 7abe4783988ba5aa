#![allow(clippy::module_inception)]

use std::rc::Rc;

pub mod analyzer;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod flow;
pub mod hierarchy;
pub mod lexer;
pub mod types;

extern crate regex;

/// Byte offset into a file, and the file's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position(pub u32, pub Rc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Rc::new(String::from("<null>")))
    }
}

#[derive(Debug, Clone)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}
