//! A single WHERE predicate and its bind tokens.

use crate::error::{StmtError, StmtResult};
use crate::token::rule_token;
use crate::types::GenericType;
use crate::value::Value;
use std::fmt;

/// Conjunction joining a predicate to whatever precedes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conjunction {
    And,
    Or,
    /// No leading conjunction (first predicate of a clause or group).
    #[default]
    None,
}

impl Conjunction {
    /// Parse `AND`, `OR` or an empty string, ignoring case and surrounding space.
    pub fn parse(s: &str) -> StmtResult<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            Ok(Self::None)
        } else if trimmed.eq_ignore_ascii_case("AND") {
            Ok(Self::And)
        } else if trimmed.eq_ignore_ascii_case("OR") {
            Ok(Self::Or)
        } else {
            Err(StmtError::InvalidConjunction(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::None => "",
        }
    }

    /// The conjunction to use where one is required.
    pub(crate) fn or_and(self) -> Self {
        match self {
            Self::None => Self::And,
            other => other,
        }
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One predicate: `field operator value`, typed, with generated tokens.
///
/// A scalar value gets one token; a list value gets one token per element.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereRule {
    verb: Conjunction,
    field: String,
    operator: String,
    value: Value,
    ty: GenericType,
    tokens: Vec<String>,
}

impl WhereRule {
    /// Build a rule, normalizing verb, operator and type.
    ///
    /// # Example
    /// ```ignore
    /// let rule = WhereRule::new("or", "id", "in", vec!["a", "b"], "s")?;
    /// assert_eq!(rule.tokens().len(), 2);
    /// ```
    pub fn new(
        verb: &str,
        field: impl Into<String>,
        operator: &str,
        value: impl Into<Value>,
        ty: impl Into<GenericType>,
    ) -> StmtResult<Self> {
        let value = value.into();
        let tokens = match &value {
            Value::List(items) => (0..items.len()).map(|i| rule_token(Some(i))).collect(),
            _ => vec![rule_token(None)],
        };
        Ok(Self {
            verb: Conjunction::parse(verb)?,
            field: field.into(),
            operator: operator.trim().to_ascii_uppercase(),
            value,
            ty: ty.into(),
            tokens,
        })
    }

    pub fn verb(&self) -> Conjunction {
        self.verb
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn ty(&self) -> &GenericType {
        &self.ty
    }

    /// All tokens: one for a scalar, one per element for a list.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// The token of a scalar rule.
    pub fn token(&self) -> Option<&str> {
        match self.value {
            Value::List(_) => None,
            _ => self.tokens.first().map(String::as_str),
        }
    }

    pub fn is_list(&self) -> bool {
        self.value.is_list()
    }
}
