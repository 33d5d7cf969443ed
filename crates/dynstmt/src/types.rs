//! Generic type vocabulary.
//!
//! Callers declare parameter and rule types with short, case-insensitive names
//! (`"STRING"`, `"int"`, `"d"`, ...). [`GenericType::normalize`] folds those
//! aliases onto one canonical variant, and [`GenericType::native_bind_type`]
//! tells the binder which driver-level type carries the value.
//!
//! Three variants are *special*: [`GenericType::Now`] and [`GenericType::Null`]
//! are written into the SQL text as literals, and [`GenericType::Uuid`] is
//! generated by the engine at bind time.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Canonical generic type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum GenericType {
    #[default]
    String,
    Boolean,
    Integer,
    Decimal,
    /// Server-side current timestamp literal.
    Now,
    /// Literal SQL NULL.
    Null,
    /// Engine-generated version 4 UUID, written back to the model.
    Uuid,
    /// Anything else, uppercased. Has no native bind type.
    Other(String),
}

/// Driver-level bind type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    Str,
    Bool,
    Int,
}

/// How unknown generic types are treated at bind time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeMode {
    /// Bind the value in its natural native form and log a warning.
    #[default]
    Lenient,
    /// Reject the bind with [`crate::StmtError::UnknownGenericType`].
    Strict,
}

impl GenericType {
    /// Uppercase `s` and fold it onto a canonical type.
    pub fn normalize(s: &str) -> Self {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "STRING" | "STR" | "S" => Self::String,
            "BOOLEAN" | "BOOL" | "B" => Self::Boolean,
            "INTEGER" | "INT" | "I" => Self::Integer,
            "DECIMAL" | "DEC" | "D" | "FLOAT" | "F" => Self::Decimal,
            "NOW" => Self::Now,
            "NULL" => Self::Null,
            "UUID" => Self::Uuid,
            _ => Self::Other(upper),
        }
    }

    /// True for NOW, NULL and UUID.
    pub fn is_special(&self) -> bool {
        matches!(self, Self::Now | Self::Null | Self::Uuid)
    }

    /// Native bind type, or `None` for special and unknown types.
    ///
    /// Decimals bind as strings so the database parses the exact digits.
    pub fn native_bind_type(&self) -> Option<NativeType> {
        match self {
            Self::String | Self::Decimal => Some(NativeType::Str),
            Self::Boolean => Some(NativeType::Bool),
            Self::Integer => Some(NativeType::Int),
            Self::Now | Self::Null | Self::Uuid | Self::Other(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "STRING",
            Self::Boolean => "BOOLEAN",
            Self::Integer => "INTEGER",
            Self::Decimal => "DECIMAL",
            Self::Now => "NOW",
            Self::Null => "NULL",
            Self::Uuid => "UUID",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for GenericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenericType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::normalize(s))
    }
}

impl From<&str> for GenericType {
    fn from(s: &str) -> Self {
        Self::normalize(s)
    }
}

impl From<String> for GenericType {
    fn from(s: String) -> Self {
        Self::normalize(&s)
    }
}
