//! The model collaborator.
//!
//! A statement reads field descriptors and current values from a [`Model`] and
//! writes generated UUIDs back into it. Any record type can take part by
//! implementing the trait; [`DynamicModel`] is a ready-made ordered map.

use crate::error::{StmtError, StmtResult};
use crate::types::GenericType;
use crate::value::Value;

/// Name and declared type of one model field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub ty: GenericType,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: impl Into<GenericType>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// A table-backed record with named, typed fields.
pub trait Model {
    /// Every data field, in column order.
    fn fields(&self) -> Vec<FieldDescriptor>;

    /// Current value of `name`, `None` if the model has no such field.
    fn get(&self, name: &str) -> Option<Value>;

    /// Overwrite the value of `name`.
    fn set(&mut self, name: &str, value: Value) -> StmtResult<()>;

    /// Descriptor for `name`.
    fn field(&self, name: &str) -> Option<FieldDescriptor> {
        self.fields().into_iter().find(|f| f.name == name)
    }

    /// Whether `name` currently holds a non-null value.
    fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_null())
    }

    /// Data fields, optionally limited to those that are set.
    fn data_fields(&self, require_set: bool) -> Vec<FieldDescriptor> {
        self.fields()
            .into_iter()
            .filter(|f| !require_set || self.is_set(&f.name))
            .collect()
    }
}

/// An ordered, in-memory model.
///
/// # Example
/// ```ignore
/// let mut event = DynamicModel::new()
///     .declare("id", "UUID")
///     .declare_value("name", "STRING", "launch")
///     .declare("created", "NOW");
/// ```
#[derive(Debug, Clone, Default)]
pub struct DynamicModel {
    fields: Vec<(FieldDescriptor, Value)>,
}

impl DynamicModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field with no value.
    pub fn declare(self, name: impl Into<String>, ty: impl Into<GenericType>) -> Self {
        self.declare_value(name, ty, Value::Null)
    }

    /// Declare a field with an initial value.
    pub fn declare_value(
        mut self,
        name: impl Into<String>,
        ty: impl Into<GenericType>,
        value: impl Into<Value>,
    ) -> Self {
        let desc = FieldDescriptor::new(name, ty);
        let value = value.into();
        match self.fields.iter_mut().find(|(f, _)| f.name == desc.name) {
            Some(slot) => *slot = (desc, value),
            None => self.fields.push((desc, value)),
        }
        self
    }

    /// Set a declared field's value, builder style.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> StmtResult<Self> {
        self.set(name, value.into())?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Model for DynamicModel {
    fn fields(&self) -> Vec<FieldDescriptor> {
        self.fields.iter().map(|(f, _)| f.clone()).collect()
    }

    fn get(&self, name: &str) -> Option<Value> {
        self.fields
            .iter()
            .find(|(f, _)| f.name == name)
            .map(|(_, v)| v.clone())
    }

    fn set(&mut self, name: &str, value: Value) -> StmtResult<()> {
        match self.fields.iter_mut().find(|(f, _)| f.name == name) {
            Some((_, slot)) => {
                *slot = value;
                Ok(())
            }
            None => Err(StmtError::UnknownField(name.to_string())),
        }
    }
}
