//! Inherited-member resolution.
//!
//! Precedence is the same for every member kind: the class itself first,
//! then the `extended` chain, then each implemented interface in declaration
//! order. Private members and constructors never fold into a subclass.
//! Every recursive step returns a fresh collection that its caller merges.

use std::{cmp::Ordering, collections::HashSet};

use tracing::trace;

use super::class_graph::{ClassGraph, ClassId, ClassNode, Constant, Member, Method, Property, Visibility};

/// The members a class inherits, each list sorted by name.
#[derive(Debug)]
pub struct InheritedMembers<'g> {
    pub constants: Vec<&'g Constant>,
    pub properties: Vec<&'g Property>,
    pub methods: Vec<&'g Method>,
}

fn is_inheritable<M: Member>(member: &M) -> bool {
    member.visibility() != Visibility::Private
}

fn by_name<M: Member>(a: &&M, b: &&M) -> Ordering {
    a.name()
        .to_lowercase()
        .cmp(&b.name().to_lowercase())
        .then_with(|| a.name().cmp(b.name()))
}

/// Members of `class` and its ancestors in precedence order, one per name.
fn gather<'g, M: Member>(
    graph: &'g ClassGraph,
    class: ClassId,
    members: fn(&ClassNode) -> &[M],
    visited: &mut HashSet<ClassId>,
) -> Vec<&'g M> {
    let node = graph.get(class);
    let mut result: Vec<&'g M> = members(node).iter().filter(|m| is_inheritable(*m)).collect();

    for parent in node.parents() {
        if !visited.insert(parent) {
            continue;
        }
        for member in gather(graph, parent, members, visited) {
            if !result.iter().any(|known| known.has_name(member.name())) {
                result.push(member);
            }
        }
    }

    result
}

fn inherited<'g, M: Member>(
    graph: &'g ClassGraph,
    class: ClassId,
    members: fn(&ClassNode) -> &[M],
) -> Vec<&'g M> {
    let mut visited = HashSet::from([class]);
    let mut result: Vec<&'g M> = gather(graph, class, members, &mut visited)
        .into_iter()
        .filter(|member| member.owner() != class)
        .collect();
    result.sort_by(by_name);
    result
}

pub fn inherited_constants(graph: &ClassGraph, class: ClassId) -> Vec<&Constant> {
    inherited(graph, class, |node| node.constants.as_slice())
}

pub fn inherited_properties(graph: &ClassGraph, class: ClassId) -> Vec<&Property> {
    inherited(graph, class, |node| node.properties.as_slice())
}

#[derive(Default)]
struct MethodSets<'g> {
    established: Vec<&'g Method>,
    abstracts: Vec<&'g Method>,
}

impl<'g> MethodSets<'g> {
    fn is_established(&self, name: &str) -> bool {
        self.established.iter().any(|method| method.has_name(name))
    }

    fn add(&mut self, method: &'g Method) {
        if self.is_established(&method.name) {
            return;
        }
        if method.is_abstract {
            self.abstracts.push(method);
        } else {
            self.established.push(method);
        }
    }

    fn merge(&mut self, other: MethodSets<'g>) {
        for method in other.established {
            self.add(method);
        }
        for method in other.abstracts {
            self.add(method);
        }
    }
}

fn is_foldable(method: &Method) -> bool {
    is_inheritable(method) && !method.is_constructor()
}

fn gather_methods<'g>(graph: &'g ClassGraph, class: ClassId, visited: &mut HashSet<ClassId>) -> MethodSets<'g> {
    let node = graph.get(class);
    let mut sets = MethodSets::default();

    for method in node.methods.iter().filter(|method| is_foldable(method)) {
        sets.add(method);
    }

    for parent in node.parents() {
        if visited.insert(parent) {
            let parent_sets = gather_methods(graph, parent, visited);
            sets.merge(parent_sets);
        }
    }

    sets
}

/// Methods inherited by `class`: concrete (established) methods not
/// overridden by the class, followed by abstract requirements that no
/// concrete method satisfied when they were met. Abstract duplicates from
/// several interfaces are kept.
pub fn inherited_methods(graph: &ClassGraph, class: ClassId) -> Vec<&Method> {
    let node = graph.get(class);
    let mut visited = HashSet::from([class]);

    // Own methods, abstract or not, block every inherited method of the same
    // name and are dropped again once the walk is over.
    let mut sets = MethodSets {
        established: node.methods.iter().filter(|method| is_foldable(method)).collect(),
        abstracts: vec![],
    };

    for parent in node.parents() {
        if visited.insert(parent) {
            let parent_sets = gather_methods(graph, parent, &mut visited);
            sets.merge(parent_sets);
        }
    }

    let mut result: Vec<&Method> = sets
        .established
        .into_iter()
        .filter(|method| method.owner != class)
        .chain(sets.abstracts)
        .collect();
    result.sort_by(by_name);

    trace!(class = %node.name, count = result.len(), "resolved inherited methods");
    result
}

pub fn inherited_members(graph: &ClassGraph, class: ClassId) -> InheritedMembers<'_> {
    InheritedMembers {
        constants: inherited_constants(graph, class),
        properties: inherited_properties(graph, class),
        methods: inherited_methods(graph, class),
    }
}

/// Finds a method visible on `class`, own declarations first. Concrete
/// implementations win over abstract ones.
pub fn find_method<'g>(graph: &'g ClassGraph, class: ClassId, name: &str) -> Option<&'g Method> {
    if let Some(method) = graph.get(class).own_method(name) {
        return Some(method);
    }

    let inherited = inherited_methods(graph, class);
    inherited
        .iter()
        .find(|method| method.has_name(name) && !method.is_abstract)
        .or_else(|| inherited.iter().find(|method| method.has_name(name)))
        .copied()
}

pub fn find_property<'g>(graph: &'g ClassGraph, class: ClassId, name: &str) -> Option<&'g Property> {
    graph
        .get(class)
        .own_property(name)
        .or_else(|| inherited_properties(graph, class).into_iter().find(|property| property.has_name(name)))
}

pub fn find_constant<'g>(graph: &'g ClassGraph, class: ClassId, name: &str) -> Option<&'g Constant> {
    graph
        .get(class)
        .own_constant(name)
        .or_else(|| inherited_constants(graph, class).into_iter().find(|constant| constant.has_name(name)))
}

/// The constructor used by `new`: the class's own, else the nearest one
/// along the extended chain.
pub fn find_constructor(graph: &ClassGraph, class: ClassId) -> Option<&Method> {
    let mut visited = HashSet::new();
    let mut current = Some(class);

    while let Some(id) = current {
        if !visited.insert(id) {
            break;
        }
        let node = graph.get(id);
        if let Some(constructor) = node.constructor() {
            return Some(constructor);
        }
        current = node.extended;
    }

    None
}

/// Abstract methods a concrete class inherits without implementing, one
/// per name.
pub fn unimplemented_abstract_methods(graph: &ClassGraph, class: ClassId) -> Vec<&Method> {
    let node = graph.get(class);
    if !node.is_instantiable() {
        return vec![];
    }

    let inherited = inherited_methods(graph, class);
    let is_implemented = |name: &str| {
        node.methods.iter().any(|method| method.has_name(name) && !method.is_abstract)
            || inherited.iter().any(|method| method.has_name(name) && !method.is_abstract)
    };

    let mut missing: Vec<&Method> = vec![];
    for method in inherited.iter().filter(|method| method.is_abstract) {
        if !is_implemented(&method.name) && !missing.iter().any(|known| known.has_name(&method.name)) {
            missing.push(*method);
        }
    }
    missing
}
