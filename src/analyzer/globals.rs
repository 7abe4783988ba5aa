use std::{collections::HashMap, rc::Rc};

use tracing::debug;

use crate::{
    errors::errors::DescriptorError,
    hierarchy::class_graph::{ClassGraph, ClassId, ClassKind, ClassNode, Method, Visibility},
    types::{
        compiler::TypeCompiler,
        matcher::TypeMatcher,
        signature::{Parameter, Signature},
    },
    Position,
};

/// Name lookups the analysis needs from the world outside one statement.
pub trait SymbolTable {
    fn resolve_class(&self, name: &str) -> Option<ClassId>;
    fn resolve_function(&self, name: &str) -> Option<&Signature>;
}

#[derive(Debug, Clone)]
pub struct FunctionEntry {
    pub name: String,
    pub signature: Signature,
    pub position: Position,
}

/// The session's classes, functions and constants.
#[derive(Debug, Default)]
pub struct Globals {
    pub classes: ClassGraph,
    functions: HashMap<String, FunctionEntry>,
    constants: HashMap<String, Rc<TypeMatcher>>,
}

impl SymbolTable for Globals {
    fn resolve_class(&self, name: &str) -> Option<ClassId> {
        self.classes.resolve(name)
    }

    fn resolve_function(&self, name: &str) -> Option<&Signature> {
        self.function(name).map(|entry| &entry.signature)
    }
}

fn function_key(name: &str) -> String {
    name.trim_start_matches('\\').to_ascii_lowercase()
}

impl Globals {
    pub fn new() -> Self {
        Globals::default()
    }

    /// Globals seeded with the builtin exception classes and functions.
    pub fn with_builtins(compiler: &mut TypeCompiler) -> Result<Self, DescriptorError> {
        let mut globals = Globals::new();
        globals.add_builtin_classes(compiler)?;
        globals.add_builtin_functions(compiler)?;
        debug!(
            classes = globals.classes.len(),
            functions = globals.functions.len(),
            "seeded builtins"
        );
        Ok(globals)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionEntry> {
        self.functions.get(&function_key(name))
    }

    /// Registers a function. Returns false, keeping the existing entry, when
    /// the name is taken.
    pub fn declare_function(&mut self, entry: FunctionEntry) -> bool {
        let key = function_key(&entry.name);
        if self.functions.contains_key(&key) {
            return false;
        }
        self.functions.insert(key, entry);
        true
    }

    pub fn constant(&self, name: &str) -> Option<&Rc<TypeMatcher>> {
        self.constants.get(name.trim_start_matches('\\'))
    }

    /// Returns false when the constant already exists.
    pub fn declare_constant(&mut self, name: &str, ty: Rc<TypeMatcher>) -> bool {
        if self.constants.contains_key(name) {
            return false;
        }
        self.constants.insert(name.to_string(), ty);
        true
    }

    fn add_builtin_classes(&mut self, compiler: &mut TypeCompiler) -> Result<(), DescriptorError> {
        // (name, kind, parent, interfaces, unchecked)
        let classes: [(&str, ClassKind, Option<&str>, &[&str], bool); 8] = [
            ("Throwable", ClassKind::Interface, None, &[], false),
            ("Exception", ClassKind::Class, None, &["Throwable"], false),
            ("ErrorException", ClassKind::Class, Some("Exception"), &[], false),
            ("RuntimeException", ClassKind::Class, Some("Exception"), &[], false),
            ("LogicException", ClassKind::Class, Some("Exception"), &[], false),
            ("InvalidArgumentException", ClassKind::Class, Some("LogicException"), &[], false),
            ("Error", ClassKind::Class, None, &["Throwable"], true),
            ("TypeError", ClassKind::Class, Some("Error"), &[], false),
        ];

        for (name, kind, parent, interfaces, unchecked) in classes {
            let mut node = ClassNode::stub(name, kind, builtin_position());
            node.is_declared = true;
            node.is_unchecked = unchecked;
            node.extended = parent.and_then(|parent| self.classes.resolve(parent));
            node.implemented = interfaces.iter().filter_map(|i| self.classes.resolve(i)).collect();
            self.classes.add(node);
        }

        let string = compiler.compile("string", &self.classes)?;
        let int = compiler.compile("int", &self.classes)?;
        for name in ["Throwable", "Exception", "Error"] {
            let Some(owner) = self.classes.resolve(name) else {
                continue;
            };
            let is_abstract = self.classes.get(owner).is_interface();
            let mut methods = vec![
                builtin_method(owner, "getMessage", is_abstract, Signature {
                    return_type: Some(string.clone()),
                    ..Signature::default()
                }),
                builtin_method(owner, "getCode", is_abstract, Signature {
                    return_type: Some(int.clone()),
                    ..Signature::default()
                }),
            ];
            if !is_abstract {
                methods.push(builtin_method(owner, "__construct", false, Signature {
                    params: vec![
                        builtin_param("message", string.clone(), true),
                        builtin_param("code", int.clone(), true),
                    ],
                    return_type: None,
                    ..Signature::default()
                }));
            }
            self.classes.get_mut(owner).methods = methods;
        }

        Ok(())
    }

    fn add_builtin_functions(&mut self, compiler: &mut TypeCompiler) -> Result<(), DescriptorError> {
        // (name, [(type, parameter, optional)], return type, variadic)
        let functions: [(&str, &[(&str, &str, bool)], &str, bool); 11] = [
            ("strlen", &[("string", "string", false)], "int", false),
            ("count", &[("mixed[]", "value", false)], "int", false),
            ("is_int", &[("mixed", "value", false)], "boolean", false),
            ("is_string", &[("mixed", "value", false)], "boolean", false),
            ("is_null", &[("mixed", "value", false)], "boolean", false),
            ("isset", &[("mixed", "var", false), ("mixed", "vars", true)], "boolean", true),
            ("intval", &[("mixed", "value", false), ("int", "base", true)], "int", false),
            ("printf", &[("string", "format", false), ("mixed", "values", true)], "int", true),
            ("sprintf", &[("string", "format", false), ("mixed", "values", true)], "string", true),
            ("implode", &[("string", "separator", false), ("mixed[]", "pieces", false)], "string", false),
            ("array_keys", &[("mixed[]", "array", false)], "mixed[int]", false),
        ];

        for (name, params, return_type, is_variadic) in functions {
            let mut signature = Signature {
                return_type: Some(compiler.compile(return_type, &self.classes)?),
                is_variadic,
                ..Signature::default()
            };
            for (ty, param, optional) in params {
                signature
                    .params
                    .push(builtin_param(param, compiler.compile(ty, &self.classes)?, *optional));
            }

            self.functions.insert(
                function_key(name),
                FunctionEntry {
                    name: name.to_string(),
                    signature,
                    position: builtin_position(),
                },
            );
        }

        Ok(())
    }
}

pub fn builtin_position() -> Position {
    Position(0, Rc::new(String::from("<builtin>")))
}

fn builtin_param(name: &str, ty: Rc<TypeMatcher>, has_default: bool) -> Parameter {
    Parameter {
        name: name.to_string(),
        ty,
        has_default,
        by_reference: false,
    }
}

fn builtin_method(owner: ClassId, name: &str, is_abstract: bool, signature: Signature) -> Method {
    Method {
        name: name.to_string(),
        visibility: Visibility::Public,
        owner,
        is_abstract,
        is_static: false,
        is_final: false,
        signature,
        position: builtin_position(),
    }
}
