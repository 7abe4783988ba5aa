//! Unit tests for the class graph and the inherited-member resolver.

use std::rc::Rc;

use crate::{
    hierarchy::{
        class_graph::{ClassGraph, ClassId, ClassKind, ClassNode, Constant, Method, Property, Visibility},
        resolver::{
            find_constructor, find_method, find_property, inherited_constants, inherited_members, inherited_methods,
            inherited_properties, unimplemented_abstract_methods,
        },
    },
    types::{matcher::TypeMatcher, signature::Signature},
    Position,
};

fn class(graph: &mut ClassGraph, name: &str) -> ClassId {
    let id = graph.add(ClassNode::stub(name, ClassKind::Class, Position::null()));
    graph.get_mut(id).is_declared = true;
    id
}

fn interface(graph: &mut ClassGraph, name: &str) -> ClassId {
    let id = graph.add(ClassNode::stub(name, ClassKind::Interface, Position::null()));
    graph.get_mut(id).is_declared = true;
    id
}

fn method(graph: &mut ClassGraph, owner: ClassId, name: &str, visibility: Visibility, is_abstract: bool) {
    graph.get_mut(owner).methods.push(Method {
        name: name.to_string(),
        visibility,
        owner,
        is_abstract,
        is_static: false,
        is_final: false,
        signature: Signature::default(),
        position: Position::null(),
    });
}

fn constant(graph: &mut ClassGraph, owner: ClassId, name: &str, visibility: Visibility) {
    graph.get_mut(owner).constants.push(Constant {
        name: name.to_string(),
        visibility,
        owner,
        ty: Rc::new(TypeMatcher::Int),
        position: Position::null(),
    });
}

fn property(graph: &mut ClassGraph, owner: ClassId, name: &str, visibility: Visibility) {
    graph.get_mut(owner).properties.push(Property {
        name: name.to_string(),
        visibility,
        owner,
        ty: Rc::new(TypeMatcher::String),
        is_static: false,
        position: Position::null(),
    });
}

fn names<M: crate::hierarchy::class_graph::Member>(members: &[&M]) -> Vec<String> {
    members.iter().map(|member| member.name().to_string()).collect()
}

#[test]
fn test_implementation_establishes_interface_method() {
    let mut graph = ClassGraph::new();
    let i = interface(&mut graph, "I");
    method(&mut graph, i, "m", Visibility::Public, true);
    let c = class(&mut graph, "C");
    graph.get_mut(c).implemented.push(i);
    method(&mut graph, c, "m", Visibility::Public, false);
    let d = class(&mut graph, "D");
    graph.get_mut(d).extended = Some(c);

    let inherited = inherited_methods(&graph, d);

    assert_eq!(inherited.len(), 1);
    assert_eq!(inherited[0].owner, c);
    assert!(!inherited[0].is_abstract);
    assert!(unimplemented_abstract_methods(&graph, d).is_empty());
}

#[test]
fn test_own_methods_are_not_inherited() {
    let mut graph = ClassGraph::new();
    let base = class(&mut graph, "Base");
    method(&mut graph, base, "run", Visibility::Public, false);
    method(&mut graph, base, "stop", Visibility::Protected, false);
    let child = class(&mut graph, "Child");
    graph.get_mut(child).extended = Some(base);
    method(&mut graph, child, "RUN", Visibility::Public, false);

    let inherited = inherited_methods(&graph, child);

    assert_eq!(names(&inherited), vec!["stop"]);
}

#[test]
fn test_private_members_and_constructors_do_not_fold() {
    let mut graph = ClassGraph::new();
    let base = class(&mut graph, "Base");
    method(&mut graph, base, "__construct", Visibility::Public, false);
    method(&mut graph, base, "secret", Visibility::Private, false);
    method(&mut graph, base, "open", Visibility::Public, false);
    constant(&mut graph, base, "HIDDEN", Visibility::Private);
    property(&mut graph, base, "hidden", Visibility::Private);
    property(&mut graph, base, "shared", Visibility::Protected);
    let child = class(&mut graph, "Child");
    graph.get_mut(child).extended = Some(base);

    assert_eq!(names(&inherited_methods(&graph, child)), vec!["open"]);
    assert!(inherited_constants(&graph, child).is_empty());
    assert_eq!(names(&inherited_properties(&graph, child)), vec!["shared"]);
    assert_eq!(find_constructor(&graph, child).map(|m| m.owner), Some(base));
}

#[test]
fn test_duplicate_abstracts_are_kept() {
    let mut graph = ClassGraph::new();
    let first = interface(&mut graph, "First");
    method(&mut graph, first, "m", Visibility::Public, true);
    let second = interface(&mut graph, "Second");
    method(&mut graph, second, "m", Visibility::Public, true);
    let both = class(&mut graph, "Both");
    graph.get_mut(both).is_abstract = true;
    graph.get_mut(both).implemented.extend([first, second]);

    let inherited = inherited_methods(&graph, both);

    assert_eq!(inherited.len(), 2);
    assert!(inherited.iter().all(|method| method.is_abstract));
}

#[test]
fn test_extended_chain_wins_over_interfaces() {
    let mut graph = ClassGraph::new();
    let contract = interface(&mut graph, "Contract");
    method(&mut graph, contract, "handle", Visibility::Public, true);
    let base = class(&mut graph, "Base");
    method(&mut graph, base, "handle", Visibility::Public, false);
    let child = class(&mut graph, "Child");
    graph.get_mut(child).extended = Some(base);
    graph.get_mut(child).implemented.push(contract);

    let inherited = inherited_methods(&graph, child);

    assert_eq!(inherited.len(), 1);
    assert_eq!(inherited[0].owner, base);
    assert!(unimplemented_abstract_methods(&graph, child).is_empty());
    assert_eq!(find_method(&graph, child, "HANDLE").map(|m| m.owner), Some(base));
}

#[test]
fn test_unimplemented_abstract_methods() {
    let mut graph = ClassGraph::new();
    let contract = interface(&mut graph, "Contract");
    method(&mut graph, contract, "a", Visibility::Public, true);
    method(&mut graph, contract, "b", Visibility::Public, true);
    let partial = class(&mut graph, "Partial");
    graph.get_mut(partial).implemented.push(contract);
    method(&mut graph, partial, "a", Visibility::Public, false);

    let missing = unimplemented_abstract_methods(&graph, partial);

    assert_eq!(names(&missing), vec!["b"]);
}

#[test]
fn test_results_are_sorted_case_insensitively() {
    let mut graph = ClassGraph::new();
    let base = class(&mut graph, "Base");
    for name in ["zeta", "Alpha", "beta"] {
        method(&mut graph, base, name, Visibility::Public, false);
        constant(&mut graph, base, &name.to_uppercase(), Visibility::Public);
    }
    let child = class(&mut graph, "Child");
    graph.get_mut(child).extended = Some(base);

    let members = inherited_members(&graph, child);

    assert_eq!(names(&members.methods), vec!["Alpha", "beta", "zeta"]);
    assert_eq!(names(&members.constants), vec!["ALPHA", "BETA", "ZETA"]);
}

#[test]
fn test_own_constants_shadow_parent_constants() {
    let mut graph = ClassGraph::new();
    let base = class(&mut graph, "Base");
    constant(&mut graph, base, "LIMIT", Visibility::Public);
    constant(&mut graph, base, "OTHER", Visibility::Public);
    let child = class(&mut graph, "Child");
    graph.get_mut(child).extended = Some(base);
    constant(&mut graph, child, "LIMIT", Visibility::Public);

    assert_eq!(names(&inherited_constants(&graph, child)), vec!["OTHER"]);
}

#[test]
fn test_cycles_terminate() {
    let mut graph = ClassGraph::new();
    let a = class(&mut graph, "A");
    let b = class(&mut graph, "B");
    graph.get_mut(a).extended = Some(b);
    graph.get_mut(b).extended = Some(a);
    method(&mut graph, a, "m", Visibility::Public, false);
    property(&mut graph, b, "p", Visibility::Public);

    assert!(graph.has_cycle(a));
    assert_eq!(names(&inherited_methods(&graph, b)), vec!["m"]);
    assert!(find_property(&graph, a, "p").is_some());
    assert!(find_constructor(&graph, a).is_none());
}

#[test]
fn test_subclass_and_unchecked() {
    let mut graph = ClassGraph::new();
    let throwable = interface(&mut graph, "Throwable");
    let error = class(&mut graph, "Error");
    graph.get_mut(error).implemented.push(throwable);
    graph.get_mut(error).is_unchecked = true;
    let type_error = class(&mut graph, "TypeError");
    graph.get_mut(type_error).extended = Some(error);
    let exception = class(&mut graph, "Exception");
    graph.get_mut(exception).implemented.push(throwable);

    assert!(graph.is_subclass_of(type_error, throwable));
    assert!(graph.is_subclass_of(type_error, type_error));
    assert!(!graph.is_subclass_of(throwable, type_error));
    assert!(graph.is_unchecked(type_error));
    assert!(!graph.is_unchecked(exception));
    assert!(!graph.has_cycle(type_error));
    assert_eq!(graph.resolve("\\typeerror"), Some(type_error));
}
