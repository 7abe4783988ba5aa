//! Type descriptor compilation.
//!
//! Descriptors are strings such as `int`, `string[int]`, `MyClass[][string]`
//! or the legacy prefix form `array[int]string`. Index tags are peeled from
//! right to left, so the leftmost tag is the outermost container:
//! `T[int][string]` is an int-keyed container of string-keyed containers of
//! `T`. Every literal descriptor gets its own cache slot.

use std::{collections::HashMap, rc::Rc};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use crate::{errors::errors::DescriptorError, hierarchy::class_graph::ClassGraph};

use super::matcher::{insert_index_tag, KeyKind, TypeMatcher};

lazy_static! {
    static ref MODERN: Regex =
        Regex::new(r"^([A-Za-z_\\][A-Za-z0-9_\\]*)((?:\[(?:int|string)?\])*)$").unwrap();
    static ref LEGACY: Regex =
        Regex::new(r"^(?i:array)(?:((?:\[(?:int|string)?\])+)\s*(\S.*)?)?$").unwrap();
    static ref INDEX_TAG: Regex = Regex::new(r"\[(int|string)?\]").unwrap();
}

fn invalid(descriptor: &str, reason: &str) -> DescriptorError {
    DescriptorError::InvalidDescriptor {
        descriptor: descriptor.to_string(),
        reason: reason.to_string(),
    }
}

fn scalar(name: &str) -> Option<TypeMatcher> {
    let matcher = match name.to_ascii_lowercase().as_str() {
        "mixed" => TypeMatcher::Mixed,
        "null" => TypeMatcher::Null,
        "boolean" | "bool" => TypeMatcher::Boolean,
        "int" | "integer" => TypeMatcher::Int,
        "float" | "double" | "real" => TypeMatcher::Float,
        "string" => TypeMatcher::String,
        "resource" => TypeMatcher::Resource,
        "object" => TypeMatcher::Object,
        _ => return None,
    };
    Some(matcher)
}

fn key_kinds(tags: &str) -> Vec<KeyKind> {
    INDEX_TAG
        .captures_iter(tags)
        .map(|captures| match captures.get(1).map(|m| m.as_str()) {
            Some("int") => KeyKind::Int,
            Some(_) => KeyKind::String,
            None => KeyKind::Either,
        })
        .collect()
}

/// Rewrites the legacy `array[idx]...T` form into `T[idx]...`. Bare `array`
/// is `mixed[]` and an omitted element type is `mixed`.
pub fn normalize_legacy(descriptor: &str) -> Option<String> {
    let captures = LEGACY.captures(descriptor)?;
    let tags = captures.get(1).map_or("", |m| m.as_str());
    let element = match captures.get(2).map(|m| m.as_str()) {
        Some(element) => normalize_legacy(element).unwrap_or_else(|| element.to_string()),
        None => String::from("mixed"),
    };

    let tags = if tags.is_empty() { "[]" } else { tags };
    Some(insert_index_tag(&element, tags))
}

/// Compiles descriptors into shared matchers, one per distinct literal.
#[derive(Debug, Default)]
pub struct TypeCompiler {
    cache: HashMap<String, Rc<TypeMatcher>>,
}

impl TypeCompiler {
    pub fn new() -> Self {
        TypeCompiler::default()
    }

    /// Returns the cached matcher for `descriptor`, compiling it on first use.
    /// Class names are resolved through `classes`; failures are not cached.
    pub fn compile(&mut self, descriptor: &str, classes: &ClassGraph) -> Result<Rc<TypeMatcher>, DescriptorError> {
        if let Some(matcher) = self.cache.get(descriptor) {
            return Ok(matcher.clone());
        }

        trace!(descriptor, "compiling type descriptor");

        let text = descriptor.trim();
        let matcher = match normalize_legacy(text) {
            Some(normalized) => self.compile_modern(&normalized, classes),
            None => self.compile_modern(text, classes),
        }
        .map_err(|reason| invalid(descriptor, &reason))?;

        self.cache.insert(descriptor.to_string(), matcher.clone());
        Ok(matcher)
    }

    fn compile_modern(&mut self, text: &str, classes: &ClassGraph) -> Result<Rc<TypeMatcher>, String> {
        let captures = MODERN
            .captures(text)
            .ok_or_else(|| String::from("does not match the descriptor grammar"))?;
        let base = captures.get(1).map_or("", |m| m.as_str());
        let tags = key_kinds(captures.get(2).map_or("", |m| m.as_str()));

        let mut matcher = match self.cache.get(base) {
            Some(matcher) => matcher.clone(),
            None => {
                let matcher = Rc::new(self.compile_name(base, classes)?);
                self.cache.insert(base.to_string(), matcher.clone());
                matcher
            }
        };

        // Peel right to left, sharing each inner descriptor's cache slot.
        for index in (0..tags.len()).rev() {
            let inner = tags[index..]
                .iter()
                .fold(base.to_string(), |descriptor, key| format!("{}{}", descriptor, key.tag()));
            matcher = self
                .cache
                .entry(inner)
                .or_insert_with(|| Rc::new(TypeMatcher::container(tags[index], matcher)))
                .clone();
        }

        Ok(matcher)
    }

    fn compile_name(&self, name: &str, classes: &ClassGraph) -> Result<TypeMatcher, String> {
        if let Some(matcher) = scalar(name) {
            return Ok(matcher);
        }

        match classes.resolve(name) {
            Some(id) => Ok(TypeMatcher::Class {
                id,
                name: classes.name(id).to_string(),
            }),
            None => Err(format!("unknown class `{}`", name)),
        }
    }

    pub fn is_cached(&self, descriptor: &str) -> bool {
        self.cache.contains_key(descriptor)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
