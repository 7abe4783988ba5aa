//! Unit tests for descriptor compilation, matchers and verification.

use std::rc::Rc;

use crate::{
    errors::errors::DescriptorError,
    hierarchy::class_graph::{ClassGraph, ClassKind, ClassNode},
    types::{
        compiler::{normalize_legacy, TypeCompiler},
        matcher::{KeyKind, TypeMatcher, Value},
        verify::{guess_descriptor, verify},
    },
    Position,
};

fn graph() -> ClassGraph {
    let mut graph = ClassGraph::new();
    let shape = graph.add(ClassNode::stub("Shape", ClassKind::Interface, Position::null()));
    let base = graph.add(ClassNode::stub("Base", ClassKind::Class, Position::null()));
    let derived = graph.add(ClassNode::stub("Derived", ClassKind::Class, Position::null()));
    graph.get_mut(base).implemented.push(shape);
    graph.get_mut(derived).extended = Some(base);
    graph.add(ClassNode::stub("MyClass", ClassKind::Class, Position::null()));
    graph
}

#[test]
fn test_compile_scalars_and_aliases() {
    let classes = graph();
    let mut compiler = TypeCompiler::new();

    assert_eq!(*compiler.compile("int", &classes).unwrap(), TypeMatcher::Int);
    assert_eq!(*compiler.compile("integer", &classes).unwrap(), TypeMatcher::Int);
    assert_eq!(*compiler.compile("bool", &classes).unwrap(), TypeMatcher::Boolean);
    assert_eq!(*compiler.compile("double", &classes).unwrap(), TypeMatcher::Float);
    assert_eq!(*compiler.compile("real", &classes).unwrap(), TypeMatcher::Float);
    assert_eq!(*compiler.compile("mixed", &classes).unwrap(), TypeMatcher::Mixed);
}

#[test]
fn test_compile_is_idempotent() {
    let classes = graph();
    let mut compiler = TypeCompiler::new();

    let first = compiler.compile("string[int]", &classes).unwrap();
    let second = compiler.compile("string[int]", &classes).unwrap();

    assert!(Rc::ptr_eq(&first, &second));
}

#[test]
fn test_inner_descriptors_share_matchers() {
    let classes = graph();
    let mut compiler = TypeCompiler::new();

    let outer = compiler.compile("int[int][string]", &classes).unwrap();
    let inner = compiler.compile("int[string]", &classes).unwrap();

    let Some((KeyKind::Int, element)) = outer.as_container() else {
        panic!("expected an int-keyed container, got {}", outer);
    };
    assert!(Rc::ptr_eq(element, &inner));
}

#[test]
fn test_suffix_order_is_outermost_first() {
    let classes = graph();
    let mut compiler = TypeCompiler::new();

    let matcher = compiler.compile("MyClass[int][string]", &classes).unwrap();
    let (outer_key, element) = matcher.as_container().unwrap();
    let (inner_key, base) = element.as_container().unwrap();

    assert_eq!(outer_key, KeyKind::Int);
    assert_eq!(inner_key, KeyKind::String);
    assert_eq!(base.to_string(), "MyClass");
}

#[test]
fn test_display_round_trips() {
    let classes = graph();
    let mut compiler = TypeCompiler::new();

    for descriptor in ["int", "string[]", "Derived[int][string]", "mixed[string][][int]"] {
        let matcher = compiler.compile(descriptor, &classes).unwrap();
        let rendered = matcher.to_string();
        assert_eq!(rendered, descriptor);

        let mut fresh = TypeCompiler::new();
        let recompiled = fresh.compile(&rendered, &classes).unwrap();
        assert_eq!(*recompiled, *matcher);
    }
}

#[test]
fn test_legacy_forms() {
    assert_eq!(normalize_legacy("array").as_deref(), Some("mixed[]"));
    assert_eq!(normalize_legacy("array[int]string").as_deref(), Some("string[int]"));
    assert_eq!(normalize_legacy("array[int][string]").as_deref(), Some("mixed[int][string]"));
    assert_eq!(normalize_legacy("array[]array[int]int").as_deref(), Some("int[][int]"));
    assert_eq!(normalize_legacy("int[]"), None);

    let classes = graph();
    let mut compiler = TypeCompiler::new();
    let legacy = compiler.compile("array[int]string", &classes).unwrap();
    let modern = compiler.compile("string[int]", &classes).unwrap();

    assert_eq!(*legacy, *modern);
    assert!(compiler.is_cached("array[int]string"));
    assert!(compiler.is_cached("string[int]"));
}

#[test]
fn test_invalid_descriptors_are_not_cached() {
    let classes = graph();
    let mut compiler = TypeCompiler::new();

    for descriptor in ["int[", "int[float]", "", "Unknown", "int string"] {
        let error = compiler.compile(descriptor, &classes).unwrap_err();
        assert!(matches!(error, DescriptorError::InvalidDescriptor { .. }));
        assert!(!compiler.is_cached(descriptor));
    }
}

#[test]
fn test_class_names_are_case_insensitive() {
    let classes = graph();
    let mut compiler = TypeCompiler::new();

    let matcher = compiler.compile("\\myclass", &classes).unwrap();
    assert_eq!(matcher.to_string(), "MyClass");
}

#[test]
fn test_container_key_discrimination() {
    let classes = graph();
    let mut compiler = TypeCompiler::new();
    let matcher = compiler.compile("int[int]", &classes).unwrap();

    assert!(matcher.check(&Value::array([(0_i64, Value::Int(1)), (1_i64, Value::Int(2))]), &classes));
    assert!(!matcher.check(&Value::array([("a", Value::Int(1))]), &classes));
    assert!(matcher.check(&Value::list([]), &classes));
    assert!(!matcher.check(&Value::list([Value::String("x".to_string())]), &classes));

    let either = compiler.compile("int[]", &classes).unwrap();
    assert!(either.check(&Value::array([("a", Value::Int(1))]), &classes));
}

#[test]
fn test_nullability() {
    let classes = graph();
    let mut compiler = TypeCompiler::new();

    assert!(compiler.compile("MyClass", &classes).unwrap().check(&Value::Null, &classes));
    assert!(compiler.compile("string", &classes).unwrap().check(&Value::Null, &classes));
    assert!(compiler.compile("int[]", &classes).unwrap().check(&Value::Null, &classes));
    assert!(!compiler.compile("int", &classes).unwrap().check(&Value::Null, &classes));
    assert!(!compiler.compile("float", &classes).unwrap().check(&Value::Null, &classes));
    assert!(!compiler.compile("boolean", &classes).unwrap().check(&Value::Null, &classes));
}

#[test]
fn test_class_check_follows_hierarchy() {
    let classes = graph();
    let mut compiler = TypeCompiler::new();
    let shape = compiler.compile("Shape", &classes).unwrap();
    let derived = compiler.compile("Derived", &classes).unwrap();

    assert!(shape.check(&Value::object("Derived"), &classes));
    assert!(!derived.check(&Value::object("Base"), &classes));
    assert!(!shape.check(&Value::object("MyClass"), &classes));
    assert!(!shape.check(&Value::Int(1), &classes));
}

#[test]
fn test_static_assignability() {
    let classes = graph();
    let mut compiler = TypeCompiler::new();
    let mut compile = |descriptor: &str| compiler.compile(descriptor, &classes).unwrap();

    let int = compile("int");
    let float = compile("float");
    let mixed = compile("mixed");
    let null = compile("null");
    let shape = compile("Shape");
    let derived = compile("Derived");
    let object = compile("object");
    let ints = compile("int[int]");
    let strings_by_name = compile("int[string]");
    let any_keys = compile("int[]");

    assert!(mixed.accepts(&int, &classes, true));
    assert!(int.accepts(&mixed, &classes, false));
    assert!(!int.accepts(&mixed, &classes, true));
    assert!(!int.accepts(&float, &classes, false));
    assert!(!int.accepts(&null, &classes, false));
    assert!(shape.accepts(&null, &classes, false));
    assert!(shape.accepts(&derived, &classes, false));
    assert!(!derived.accepts(&shape, &classes, false));
    assert!(object.accepts(&derived, &classes, false));
    assert!(!ints.accepts(&strings_by_name, &classes, false));
    assert!(ints.accepts(&any_keys, &classes, false));
    assert!(any_keys.accepts(&strings_by_name, &classes, false));
}

#[test]
fn test_guess_descriptor() {
    assert_eq!(guess_descriptor(&Value::Int(3)), "int");
    assert_eq!(guess_descriptor(&Value::list([])), "mixed[]");
    assert_eq!(
        guess_descriptor(&Value::list([Value::Int(1), Value::Int(2)])),
        "int[int]"
    );
    assert_eq!(
        guess_descriptor(&Value::array([("a", Value::Int(1)), ("b", Value::String("x".to_string()))])),
        "mixed[string]"
    );
    assert_eq!(
        guess_descriptor(&Value::list([Value::array([("k", Value::Float(1.5))])])),
        "float[int][string]"
    );
}

#[test]
fn test_verify() {
    let classes = graph();
    let mut compiler = TypeCompiler::new();

    let value = Value::list([Value::Int(1)]);
    assert_eq!(verify(&mut compiler, &classes, "int[int]", value.clone()), Ok(value));

    let error = verify(&mut compiler, &classes, "int[int]", Value::list([Value::String("x".to_string())]));
    assert_eq!(
        error,
        Err(DescriptorError::VerificationFailure {
            expected: "int[int]".to_string(),
            actual_guess: "string[int]".to_string(),
        })
    );

    let error = verify(&mut compiler, &classes, "nope[", Value::Null).unwrap_err();
    assert!(matches!(error, DescriptorError::InvalidDescriptor { .. }));
}
