//! Type matchers: the compiled form of type descriptors.
//!
//! A matcher can check a runtime [`Value`] (`check`) and decide whether a
//! statically known type can be assigned to it (`accepts`). Scalar matchers
//! are unit variants; containers hold their element matcher behind an `Rc`
//! so compiled subtrees are shared.

use std::{fmt::Display, rc::Rc};

use indexmap::IndexMap;

use crate::hierarchy::class_graph::{ClassGraph, ClassId};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayKey {
    Int(i64),
    String(String),
}

impl From<i64> for ArrayKey {
    fn from(value: i64) -> Self {
        ArrayKey::Int(value)
    }
}

impl From<&str> for ArrayKey {
    fn from(value: &str) -> Self {
        ArrayKey::String(value.to_string())
    }
}

/// A runtime value of the analyzed language.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// A resource handle, identified by its resource type.
    Resource(String),
    /// An ordered map, the language's only container.
    Array(IndexMap<ArrayKey, Value>),
    /// An instance, identified by the name of its class.
    Object(String),
}

impl Value {
    /// Builds an array from explicit key/value pairs.
    pub fn array<K: Into<ArrayKey>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Array(entries.into_iter().map(|(key, value)| (key.into(), value)).collect())
    }

    /// Builds an array with implicit keys `0..n`.
    pub fn list(values: impl IntoIterator<Item = Value>) -> Self {
        Value::array(values.into_iter().enumerate().map(|(index, value)| (index as i64, value)))
    }

    pub fn object(class: &str) -> Self {
        Value::Object(class.to_string())
    }
}

/// Which keys a container matcher admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Int,
    String,
    Either,
}

impl KeyKind {
    pub fn tag(&self) -> &'static str {
        match self {
            KeyKind::Int => "[int]",
            KeyKind::String => "[string]",
            KeyKind::Either => "[]",
        }
    }

    fn admits(&self, key: &ArrayKey) -> bool {
        matches!(
            (self, key),
            (KeyKind::Either, _) | (KeyKind::Int, ArrayKey::Int(_)) | (KeyKind::String, ArrayKey::String(_))
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeMatcher {
    Mixed,
    Null,
    Boolean,
    Int,
    Float,
    String,
    Resource,
    Object,
    Class { id: ClassId, name: String },
    ContainerIntKeyed(Rc<TypeMatcher>),
    ContainerStringKeyed(Rc<TypeMatcher>),
    ContainerEitherKeyed(Rc<TypeMatcher>),
}

impl TypeMatcher {
    pub fn container(key: KeyKind, element: Rc<TypeMatcher>) -> Self {
        match key {
            KeyKind::Int => TypeMatcher::ContainerIntKeyed(element),
            KeyKind::String => TypeMatcher::ContainerStringKeyed(element),
            KeyKind::Either => TypeMatcher::ContainerEitherKeyed(element),
        }
    }

    /// The key kind and element matcher of a container, `None` otherwise.
    pub fn as_container(&self) -> Option<(KeyKind, &Rc<TypeMatcher>)> {
        match self {
            TypeMatcher::ContainerIntKeyed(element) => Some((KeyKind::Int, element)),
            TypeMatcher::ContainerStringKeyed(element) => Some((KeyKind::String, element)),
            TypeMatcher::ContainerEitherKeyed(element) => Some((KeyKind::Either, element)),
            _ => None,
        }
    }

    pub fn class_id(&self) -> Option<ClassId> {
        match self {
            TypeMatcher::Class { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Reference-like shapes admit `null` implicitly.
    pub fn is_nullable(&self) -> bool {
        !matches!(self, TypeMatcher::Boolean | TypeMatcher::Int | TypeMatcher::Float)
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self, TypeMatcher::Mixed)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeMatcher::Int | TypeMatcher::Float)
    }

    /// Structurally verifies a runtime value.
    pub fn check(&self, value: &Value, classes: &ClassGraph) -> bool {
        if let Value::Null = value {
            return self.is_nullable();
        }

        match self {
            TypeMatcher::Mixed => true,
            TypeMatcher::Null => false,
            TypeMatcher::Boolean => matches!(value, Value::Boolean(_)),
            TypeMatcher::Int => matches!(value, Value::Int(_)),
            TypeMatcher::Float => matches!(value, Value::Float(_)),
            TypeMatcher::String => matches!(value, Value::String(_)),
            TypeMatcher::Resource => matches!(value, Value::Resource(_)),
            TypeMatcher::Object => matches!(value, Value::Object(_)),
            TypeMatcher::Class { id, .. } => match value {
                Value::Object(class) => classes
                    .resolve(class)
                    .is_some_and(|actual| classes.is_subclass_of(actual, *id)),
                _ => false,
            },
            TypeMatcher::ContainerIntKeyed(_)
            | TypeMatcher::ContainerStringKeyed(_)
            | TypeMatcher::ContainerEitherKeyed(_) => {
                let Value::Array(entries) = value else {
                    return false;
                };
                let Some((key_kind, element)) = self.as_container() else {
                    return false;
                };
                entries
                    .iter()
                    .all(|(key, value)| key_kind.admits(key) && element.check(value, classes))
            }
        }
    }

    /// Whether a value statically known to be of type `source` may be stored
    /// where this type is expected. A `mixed` source is only accepted when
    /// `strict_mixed` is off.
    pub fn accepts(&self, source: &TypeMatcher, classes: &ClassGraph, strict_mixed: bool) -> bool {
        if self.is_mixed() {
            return true;
        }

        match source {
            TypeMatcher::Mixed => !strict_mixed,
            TypeMatcher::Null => self.is_nullable(),
            TypeMatcher::Class { id: source_id, .. } => match self {
                TypeMatcher::Object => true,
                TypeMatcher::Class { id, .. } => classes.is_subclass_of(*source_id, *id),
                _ => false,
            },
            TypeMatcher::ContainerIntKeyed(_)
            | TypeMatcher::ContainerStringKeyed(_)
            | TypeMatcher::ContainerEitherKeyed(_) => {
                let (Some((target_key, target_element)), Some((source_key, source_element))) =
                    (self.as_container(), source.as_container())
                else {
                    return false;
                };
                let keys_compatible =
                    target_key == KeyKind::Either || source_key == KeyKind::Either || target_key == source_key;
                keys_compatible && target_element.accepts(source_element, classes, strict_mixed)
            }
            scalar => self == scalar,
        }
    }
}

/// Splits a descriptor into its base name and its index tags.
pub fn split_index_tags(descriptor: &str) -> (&str, &str) {
    match descriptor.find('[') {
        Some(index) => descriptor.split_at(index),
        None => (descriptor, ""),
    }
}

/// Adds `tag` as the new outermost index of `descriptor`.
pub fn insert_index_tag(descriptor: &str, tag: &str) -> String {
    let (base, tags) = split_index_tags(descriptor);
    format!("{}{}{}", base, tag, tags)
}

impl Display for TypeMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeMatcher::Mixed => write!(f, "mixed"),
            TypeMatcher::Null => write!(f, "null"),
            TypeMatcher::Boolean => write!(f, "boolean"),
            TypeMatcher::Int => write!(f, "int"),
            TypeMatcher::Float => write!(f, "float"),
            TypeMatcher::String => write!(f, "string"),
            TypeMatcher::Resource => write!(f, "resource"),
            TypeMatcher::Object => write!(f, "object"),
            TypeMatcher::Class { name, .. } => write!(f, "{}", name),
            container => {
                let Some((key, element)) = container.as_container() else {
                    return Ok(());
                };
                write!(f, "{}", insert_index_tag(&element.to_string(), key.tag()))
            }
        }
    }
}
