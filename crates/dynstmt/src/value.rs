//! Model values and driver bind values.
//!
//! [`Value`] is what a model field or where rule holds. [`NativeValue`] is what
//! a [`crate::PreparedStatement`] receives after coercion through the declared
//! [`GenericType`].

use crate::error::{StmtError, StmtResult};
use crate::types::{GenericType, TypeMode};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::fmt;
use std::str::FromStr;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A scalar or list value held by a model field or where rule.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Timestamp(NaiveDateTime),
    List(Vec<Value>),
}

/// A value in the form the driver binds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// `Null` or an empty list.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::List(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Text form of a scalar, `None` for `Null` and lists.
    fn to_text(&self) -> Option<String> {
        match self {
            Self::Null | Self::List(_) => None,
            Self::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Decimal(d) => Some(d.to_string()),
            Self::Text(s) => Some(s.clone()),
            Self::Timestamp(ts) => Some(ts.format(TIMESTAMP_FORMAT).to_string()),
        }
    }

    fn natural(&self, token: &str, ty: &GenericType) -> StmtResult<NativeValue> {
        match self {
            Self::Null => Ok(NativeValue::Null),
            Self::Bool(b) => Ok(NativeValue::Bool(*b)),
            Self::Int(i) => Ok(NativeValue::Int(*i)),
            Self::List(_) => Err(StmtError::coercion(token, ty.as_str(), self)),
            other => Ok(NativeValue::Text(other.to_text().unwrap_or_default())),
        }
    }

    /// Convert to the native value bound for `ty`.
    ///
    /// Lists never coerce directly; the binder expands them element by element.
    pub fn coerce(&self, token: &str, ty: &GenericType, mode: TypeMode) -> StmtResult<NativeValue> {
        if self.is_null() {
            return Ok(NativeValue::Null);
        }
        if self.is_list() {
            return Err(StmtError::coercion(token, ty.as_str(), self));
        }
        let fail = || StmtError::coercion(token, ty.as_str(), self);

        match ty {
            GenericType::Boolean => {
                let b = match self {
                    Self::Bool(b) => *b,
                    Self::Int(i) => *i != 0,
                    Self::Float(f) => *f != 0.0,
                    Self::Decimal(d) => !d.is_zero(),
                    Self::Text(s) => {
                        let s = s.trim();
                        !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
                    }
                    _ => return Err(fail()),
                };
                Ok(NativeValue::Bool(b))
            }
            GenericType::Integer => {
                let i = match self {
                    Self::Int(i) => *i,
                    Self::Bool(b) => i64::from(*b),
                    Self::Float(f) => f.trunc().to_i64().ok_or_else(fail)?,
                    Self::Decimal(d) => d.trunc().to_i64().ok_or_else(fail)?,
                    Self::Text(s) => s.trim().parse::<i64>().map_err(|_| fail())?,
                    _ => return Err(fail()),
                };
                Ok(NativeValue::Int(i))
            }
            GenericType::Decimal => {
                let d = match self {
                    Self::Decimal(d) => *d,
                    Self::Int(i) => Decimal::from(*i),
                    Self::Bool(b) => Decimal::from(i64::from(*b)),
                    Self::Float(f) => Decimal::try_from(*f).map_err(|_| fail())?,
                    Self::Text(s) => Decimal::from_str(s.trim()).map_err(|_| fail())?,
                    _ => return Err(fail()),
                };
                Ok(NativeValue::Text(d.to_string()))
            }
            GenericType::String | GenericType::Uuid => {
                Ok(NativeValue::Text(self.to_text().ok_or_else(fail)?))
            }
            // Substituted into the SQL text, never bound.
            GenericType::Now | GenericType::Null => Err(fail()),
            GenericType::Other(name) => match mode {
                TypeMode::Strict => Err(StmtError::UnknownGenericType(name.clone())),
                TypeMode::Lenient => {
                    tracing::warn!(token, ty = %name, "unknown generic type, binding without native type");
                    self.natural(token, ty)
                }
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            other => f.write_str(&other.to_text().unwrap_or_default()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Decimal(d) => serializer.serialize_str(&d.to_string()),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Timestamp(ts) => serializer.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string()),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

// ==================== Conversions ====================

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Self::Int(i64::from(v))
            }
        })*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Self::Text(v.clone())
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Self::Text(v.hyphenated().to_string())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::Timestamp(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Text(v.format("%Y-%m-%d").to_string())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(v: DateTime<Tz>) -> Self {
        Self::Timestamp(v.naive_utc())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Value {
    fn from(v: &[T]) -> Self {
        Self::List(v.iter().cloned().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coerce(v: impl Into<Value>, ty: &str) -> StmtResult<NativeValue> {
        v.into()
            .coerce(":x", &GenericType::normalize(ty), TypeMode::Lenient)
    }

    #[test]
    fn boolean_coercion() {
        assert_eq!(coerce(true, "B").unwrap(), NativeValue::Bool(true));
        assert_eq!(coerce(0, "BOOL").unwrap(), NativeValue::Bool(false));
        assert_eq!(coerce("1", "BOOLEAN").unwrap(), NativeValue::Bool(true));
        assert_eq!(coerce("0", "BOOLEAN").unwrap(), NativeValue::Bool(false));
        assert_eq!(coerce("", "BOOLEAN").unwrap(), NativeValue::Bool(false));
        assert_eq!(coerce("False", "BOOLEAN").unwrap(), NativeValue::Bool(false));
    }

    #[test]
    fn integer_coercion() {
        assert_eq!(coerce(42, "INT").unwrap(), NativeValue::Int(42));
        assert_eq!(coerce(" 17 ", "I").unwrap(), NativeValue::Int(17));
        assert_eq!(coerce(3.9, "INTEGER").unwrap(), NativeValue::Int(3));
        assert_eq!(coerce(true, "INTEGER").unwrap(), NativeValue::Int(1));
        assert!(coerce("abc", "INT").is_err());
    }

    #[test]
    fn decimal_binds_exact_text() {
        let d = Decimal::from_str("10.50").unwrap();
        assert_eq!(coerce(d, "DECIMAL").unwrap(), NativeValue::Text("10.50".into()));
        assert_eq!(coerce("0.1", "F").unwrap(), NativeValue::Text("0.1".into()));
        assert_eq!(coerce(5, "DEC").unwrap(), NativeValue::Text("5".into()));
        assert!(coerce("ten", "DECIMAL").is_err());
    }

    #[test]
    fn string_coercion() {
        assert_eq!(coerce("a", "S").unwrap(), NativeValue::Text("a".into()));
        assert_eq!(coerce(7, "STRING").unwrap(), NativeValue::Text("7".into()));
        let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(
            coerce(ts, "STRING").unwrap(),
            NativeValue::Text("2024-03-01 08:30:00".into())
        );
    }

    #[test]
    fn null_always_binds_null() {
        assert_eq!(coerce(Value::Null, "INT").unwrap(), NativeValue::Null);
        assert_eq!(coerce(None::<i32>, "S").unwrap(), NativeValue::Null);
    }

    #[test]
    fn lists_do_not_coerce() {
        assert!(coerce(vec![1, 2], "INT").is_err());
    }

    #[test]
    fn unknown_type_lenient_and_strict() {
        assert_eq!(coerce(5, "ISO8601").unwrap(), NativeValue::Int(5));
        assert_eq!(
            coerce("2024-01-01", "ISO8601").unwrap(),
            NativeValue::Text("2024-01-01".into())
        );

        let err = Value::from(5)
            .coerce(":x", &GenericType::normalize("ISO8601"), TypeMode::Strict)
            .unwrap_err();
        assert!(matches!(err, StmtError::UnknownGenericType(ref t) if t == "ISO8601"));
    }

    #[test]
    fn serializes_to_json() {
        let v = Value::from(vec![Value::from(1), Value::Null, Value::from("x")]);
        assert_eq!(serde_json::to_string(&v).unwrap(), r#"[1,null,"x"]"#);
    }
}
