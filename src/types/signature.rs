use std::{fmt::Display, rc::Rc};

use crate::hierarchy::class_graph::ClassId;

use super::matcher::TypeMatcher;

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub ty: Rc<TypeMatcher>,
    pub has_default: bool,
    pub by_reference: bool,
}

/// The checked contract of a function or method.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    pub params: Vec<Parameter>,
    /// `None` means `void`.
    pub return_type: Option<Rc<TypeMatcher>>,
    pub throws: Vec<ClassId>,
    /// Accepts any number of trailing arguments of the last parameter's type.
    pub is_variadic: bool,
}

impl Signature {
    pub fn required_params(&self) -> usize {
        self.params.iter().filter(|param| !param.has_default).count()
    }

    /// Upper bound on the argument count, `None` when variadic.
    pub fn max_params(&self) -> Option<usize> {
        if self.is_variadic {
            None
        } else {
            Some(self.params.len())
        }
    }

    /// The parameter an argument at `index` is matched against.
    pub fn param_for(&self, index: usize) -> Option<&Parameter> {
        match self.params.get(index) {
            Some(param) => Some(param),
            None if self.is_variadic => self.params.last(),
            None => None,
        }
    }

    pub fn is_void(&self) -> bool {
        self.return_type.is_none()
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params = self
            .params
            .iter()
            .map(|param| format!("{} ${}", param.ty, param.name))
            .collect::<Vec<String>>()
            .join(", ");
        match &self.return_type {
            Some(ty) => write!(f, "({}): {}", params, ty),
            None => write!(f, "({}): void", params),
        }
    }
}
