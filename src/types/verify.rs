use crate::{errors::errors::DescriptorError, hierarchy::class_graph::ClassGraph};

use super::{
    compiler::TypeCompiler,
    matcher::{insert_index_tag, ArrayKey, KeyKind, Value},
};

/// Compiles `descriptor` and checks `value` against it, handing the value
/// back on success.
pub fn verify(
    compiler: &mut TypeCompiler,
    classes: &ClassGraph,
    descriptor: &str,
    value: Value,
) -> Result<Value, DescriptorError> {
    let matcher = compiler.compile(descriptor, classes)?;
    if matcher.check(&value, classes) {
        return Ok(value);
    }

    Err(DescriptorError::VerificationFailure {
        expected: matcher.to_string(),
        actual_guess: guess_descriptor(&value),
    })
}

/// Best-effort descriptor for the runtime shape of `value`.
pub fn guess_descriptor(value: &Value) -> String {
    match value {
        Value::Null => String::from("null"),
        Value::Boolean(_) => String::from("boolean"),
        Value::Int(_) => String::from("int"),
        Value::Float(_) => String::from("float"),
        Value::String(_) => String::from("string"),
        Value::Resource(_) => String::from("resource"),
        Value::Object(class) => class.clone(),
        Value::Array(entries) => {
            if entries.is_empty() {
                return String::from("mixed[]");
            }

            let key = if entries.keys().all(|key| matches!(key, ArrayKey::Int(_))) {
                KeyKind::Int
            } else if entries.keys().all(|key| matches!(key, ArrayKey::String(_))) {
                KeyKind::String
            } else {
                KeyKind::Either
            };

            let mut guesses = entries.values().map(guess_descriptor);
            let first = guesses.next().unwrap_or_else(|| String::from("mixed"));
            let element = if guesses.all(|guess| guess == first) {
                first
            } else {
                String::from("mixed")
            };

            insert_index_tag(&element, key.tag())
        }
    }
}
