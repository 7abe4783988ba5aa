use std::{collections::{HashMap, HashSet}, fmt::Display, rc::Rc};

use crate::{types::{matcher::TypeMatcher, signature::Signature}, Position};

/// Index of a class node inside a [`ClassGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Protected => write!(f, "protected"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// Common view over constants, properties and methods.
pub trait Member {
    fn name(&self) -> &str;
    fn visibility(&self) -> Visibility;
    /// The class that declares this member. Never an ownership edge.
    fn owner(&self) -> ClassId;

    fn has_name(&self, name: &str) -> bool {
        self.name() == name
    }
}

#[derive(Debug, Clone)]
pub struct Constant {
    pub name: String,
    pub visibility: Visibility,
    pub owner: ClassId,
    pub ty: Rc<TypeMatcher>,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct Property {
    pub name: String,
    pub visibility: Visibility,
    pub owner: ClassId,
    pub ty: Rc<TypeMatcher>,
    pub is_static: bool,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub visibility: Visibility,
    pub owner: ClassId,
    pub is_abstract: bool,
    pub is_static: bool,
    pub is_final: bool,
    pub signature: Signature,
    pub position: Position,
}

impl Method {
    pub fn is_constructor(&self) -> bool {
        self.name.eq_ignore_ascii_case("__construct")
    }
}

impl Member for Constant {
    fn name(&self) -> &str {
        &self.name
    }
    fn visibility(&self) -> Visibility {
        self.visibility
    }
    fn owner(&self) -> ClassId {
        self.owner
    }
}

impl Member for Property {
    fn name(&self) -> &str {
        &self.name
    }
    fn visibility(&self) -> Visibility {
        self.visibility
    }
    fn owner(&self) -> ClassId {
        self.owner
    }
}

impl Member for Method {
    fn name(&self) -> &str {
        &self.name
    }
    fn visibility(&self) -> Visibility {
        self.visibility
    }
    fn owner(&self) -> ClassId {
        self.owner
    }
    // Method names are case-insensitive.
    fn has_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
}

/// A declared class or interface with its members and inheritance links.
#[derive(Debug, Clone)]
pub struct ClassNode {
    pub name: String,
    pub kind: ClassKind,
    pub is_abstract: bool,
    pub is_final: bool,
    /// Exceptions of this class (and its subclasses) need no `throws` entry.
    pub is_unchecked: bool,
    /// False while the node is only a forward stub.
    pub is_declared: bool,
    pub extended: Option<ClassId>,
    pub implemented: Vec<ClassId>,
    pub constants: Vec<Constant>,
    pub properties: Vec<Property>,
    pub methods: Vec<Method>,
    pub position: Position,
}

impl ClassNode {
    pub fn stub(name: &str, kind: ClassKind, position: Position) -> Self {
        ClassNode {
            name: name.trim_start_matches('\\').to_string(),
            kind,
            is_abstract: false,
            is_final: false,
            is_unchecked: false,
            is_declared: false,
            extended: None,
            implemented: vec![],
            constants: vec![],
            properties: vec![],
            methods: vec![],
            position,
        }
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    pub fn is_instantiable(&self) -> bool {
        !self.is_abstract && !self.is_interface()
    }

    pub fn constructor(&self) -> Option<&Method> {
        self.methods.iter().find(|method| method.is_constructor())
    }

    pub fn own_method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|method| method.has_name(name))
    }

    pub fn own_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|property| property.has_name(name))
    }

    pub fn own_constant(&self, name: &str) -> Option<&Constant> {
        self.constants.iter().find(|constant| constant.has_name(name))
    }

    /// Direct supertypes: the extended class first, then interfaces in
    /// declaration order.
    pub fn parents(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.extended.iter().copied().chain(self.implemented.iter().copied())
    }
}

/// Arena of class nodes. Links between classes are [`ClassId`]s.
#[derive(Debug, Default, Clone)]
pub struct ClassGraph {
    nodes: Vec<ClassNode>,
    lookup: HashMap<String, ClassId>,
}

fn normalize(name: &str) -> String {
    name.trim_start_matches('\\').to_ascii_lowercase()
}

impl ClassGraph {
    pub fn new() -> Self {
        ClassGraph::default()
    }

    /// Adds a node, or returns the id already registered under its name.
    pub fn add(&mut self, node: ClassNode) -> ClassId {
        let key = normalize(&node.name);
        if let Some(id) = self.lookup.get(&key) {
            return *id;
        }

        let id = ClassId(self.nodes.len());
        self.nodes.push(node);
        self.lookup.insert(key, id);
        id
    }

    pub fn get(&self, id: ClassId) -> &ClassNode {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: ClassId) -> &mut ClassNode {
        &mut self.nodes[id.0]
    }

    /// Looks a class up by name; names are case-insensitive and may carry a
    /// leading namespace separator.
    pub fn resolve(&self, name: &str) -> Option<ClassId> {
        self.lookup.get(&normalize(name)).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = ClassId> {
        (0..self.nodes.len()).map(ClassId)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn name(&self, id: ClassId) -> &str {
        &self.get(id).name
    }

    /// Whether `class` is `ancestor` or derives from it through extension or
    /// implementation.
    pub fn is_subclass_of(&self, class: ClassId, ancestor: ClassId) -> bool {
        let mut visited = HashSet::new();
        let mut pending = vec![class];

        while let Some(current) = pending.pop() {
            if current == ancestor {
                return true;
            }
            if visited.insert(current) {
                pending.extend(self.get(current).parents());
            }
        }

        false
    }

    /// Unchecked-ness is inherited from any ancestor.
    pub fn is_unchecked(&self, class: ClassId) -> bool {
        let mut visited = HashSet::new();
        let mut pending = vec![class];

        while let Some(current) = pending.pop() {
            if !visited.insert(current) {
                continue;
            }
            let node = self.get(current);
            if node.is_unchecked {
                return true;
            }
            pending.extend(node.parents());
        }

        false
    }

    /// Whether following the parent links from `class` leads back to it.
    pub fn has_cycle(&self, class: ClassId) -> bool {
        let mut visited = HashSet::new();
        let mut pending: Vec<ClassId> = self.get(class).parents().collect();

        while let Some(current) = pending.pop() {
            if current == class {
                return true;
            }
            if visited.insert(current) {
                pending.extend(self.get(current).parents());
            }
        }

        false
    }
}
