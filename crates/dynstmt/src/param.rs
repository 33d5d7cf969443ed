//! Named, typed binding slots.

use crate::types::GenericType;

/// A named binding slot. The token is `:<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: GenericType,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: impl Into<GenericType>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// Insertion-ordered parameters, unique by name.
#[derive(Debug, Clone, Default)]
pub struct ParamList {
    params: Vec<Parameter>,
}

impl ParamList {
    /// Create a new empty parameter list.
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add `name`, or overwrite its type if it is already present.
    pub fn upsert(&mut self, name: &str, ty: GenericType) {
        match self.params.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.ty = ty,
            None => self.params.push(Parameter::new(name, ty)),
        }
    }

    /// Remove `name`. Returns whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.params.len();
        self.params.retain(|p| p.name != name);
        self.params.len() != before
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.params.iter()
    }

    /// Get the current parameter count.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl<'a> IntoIterator for &'a ParamList {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}
