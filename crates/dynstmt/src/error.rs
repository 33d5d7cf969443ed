//! Error types for dynstmt

use thiserror::Error;

/// Result type alias for dynstmt operations
pub type StmtResult<T> = Result<T, StmtError>;

/// Error types for statement building, binding and execution
#[derive(Debug, Error)]
pub enum StmtError {
    /// Verb is not one of SELECT, UPDATE, INSERT, DELETE
    #[error("sql statement can't operate with verb [{0}]")]
    InvalidVerb(String),

    /// A list value was paired with a special type (NOW, NULL, UUID)
    #[error("list value for '{name}' does not support special type [{ty}]")]
    SpecialTypeArrayConflict { name: String, ty: String },

    /// Shared connection looked up before `connect()`
    #[error("No connection found. connect() must run first")]
    ConnectionNotInitialized,

    /// Shared connection initialized twice
    #[error("Connection already initialized")]
    AlreadyConnected,

    /// Unrecognized generic type (strict mode only)
    #[error("Unknown generic type [{0}]")]
    UnknownGenericType(String),

    /// Conjunction other than AND / OR / empty
    #[error("Invalid conjunction [{0}], expected AND, OR or empty")]
    InvalidConjunction(String),

    /// A where rule that cannot be rendered
    #[error("Invalid where rule on '{field}': {message}")]
    InvalidRule { field: String, message: String },

    /// Parameter name that cannot be used as a bind token
    #[error("Invalid parameter name '{0}', expected [A-Za-z_][A-Za-z0-9_]*")]
    InvalidParameterName(String),

    /// Model has no field with this name
    #[error("Unknown model field '{0}'")]
    UnknownField(String),

    /// Value could not be converted to the declared type
    #[error("Cannot bind {value} as {ty} for token {token}")]
    Coercion {
        token: String,
        ty: String,
        value: String,
    },

    /// Operation not allowed in the statement's current phase
    #[error("Invalid statement state: {0}")]
    InvalidState(String),

    /// Statement has nothing to write
    #[error("Empty statement: {0}")]
    EmptyStatement(String),

    /// Placeholder in prepared SQL with no bound value
    #[error("No value bound for token {0}")]
    UnboundToken(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[cfg(feature = "mysql")]
    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl StmtError {
    /// Create a special-type/list conflict error
    pub fn special_list(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self::SpecialTypeArrayConflict {
            name: name.into(),
            ty: ty.into(),
        }
    }

    /// Create an invalid rule error
    pub fn invalid_rule(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRule {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a coercion error
    pub fn coercion(
        token: impl Into<String>,
        ty: impl Into<String>,
        value: impl std::fmt::Debug,
    ) -> Self {
        Self::Coercion {
            token: token.into(),
            ty: ty.into(),
            value: format!("{value:?}"),
        }
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Check if this is a special-type/list conflict
    pub fn is_special_list_conflict(&self) -> bool {
        matches!(self, Self::SpecialTypeArrayConflict { .. })
    }

    /// Check if this is an invalid verb error
    pub fn is_invalid_verb(&self) -> bool {
        matches!(self, Self::InvalidVerb(_))
    }

    /// Check if the shared connection was missing
    pub fn is_not_connected(&self) -> bool {
        matches!(self, Self::ConnectionNotInitialized)
    }
}
