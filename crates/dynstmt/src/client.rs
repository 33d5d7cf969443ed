//! Driver traits a [`crate::Statement`] executes through.

use crate::error::StmtResult;
use crate::row::Record;
use crate::types::TypeMode;
use crate::value::NativeValue;
use std::future::Future;

/// A database handle that can prepare named-token SQL.
///
/// Statements borrow the connection and never own it, so one handle can serve
/// any number of statements. Implementations decide how (or whether) calls
/// from several statements are serialized.
pub trait Connection: Send + Sync {
    /// Prepared statement type produced by [`Connection::prepare`].
    type Prepared: PreparedStatement;

    /// Prepare `sql`, which may contain `:name` tokens.
    fn prepare(&self, sql: &str) -> impl Future<Output = StmtResult<Self::Prepared>> + Send;

    /// How unknown generic types are bound.
    ///
    /// The default is [`TypeMode::Lenient`].
    fn type_mode(&self) -> TypeMode {
        TypeMode::Lenient
    }
}

/// A statement prepared by a [`Connection`], ready for binding.
pub trait PreparedStatement: Send {
    /// Bind `value` to `token` (`:name`). Binding a token twice keeps the last value.
    fn bind_value(&mut self, token: &str, value: NativeValue) -> StmtResult<()>;

    /// Run the statement and return the number of affected rows.
    fn execute(self) -> impl Future<Output = StmtResult<u64>> + Send;

    /// Run the statement and materialize every row.
    fn fetch_all(self) -> impl Future<Output = StmtResult<Vec<Record>>> + Send;
}

impl<C: Connection> Connection for &C {
    type Prepared = C::Prepared;

    fn prepare(&self, sql: &str) -> impl Future<Output = StmtResult<Self::Prepared>> + Send {
        (**self).prepare(sql)
    }

    fn type_mode(&self) -> TypeMode {
        (**self).type_mode()
    }
}

impl<C: Connection> Connection for std::sync::Arc<C> {
    type Prepared = C::Prepared;

    fn prepare(&self, sql: &str) -> impl Future<Output = StmtResult<Self::Prepared>> + Send {
        (**self).prepare(sql)
    }

    fn type_mode(&self) -> TypeMode {
        (**self).type_mode()
    }
}
