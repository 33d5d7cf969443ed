//! # dynstmt
//!
//! Dynamic, parameterized SQL statements for single-table models.
//!
//! ## Features
//!
//! - **Model driven**: SELECT / INSERT / UPDATE / DELETE are assembled from a
//!   [`Model`]'s fields and current values
//! - **Always bound**: values travel as named `:tokens`; identifiers are
//!   backtick-quoted
//! - **Generic types**: a short case-insensitive vocabulary (`S`, `INT`,
//!   `DECIMAL`, ...) plus the special `NOW`, `NULL` and `UUID`
//! - **Composable WHERE**: automatic per-parameter predicates, a
//!   [`WhereBuilder`] with groups and compounds, or raw text
//! - **Driver seam**: statements run through any [`Connection`]; a `sqlx`
//!   MySQL adapter ships behind the default `mysql` feature
//!
//! ## Example
//!
//! ```ignore
//! use dynstmt::{ConnectionConfig, DynamicModel, Model, Statement, WhereBuilder};
//!
//! let conn = dynstmt::mysql::connect(&ConnectionConfig::from_env()?).await?;
//!
//! // INSERT with a generated id and a server timestamp
//! let mut event = DynamicModel::new()
//!     .declare("id", "UUID")
//!     .declare_value("name", "STRING", "launch")
//!     .declare("created", "NOW");
//! let mut insert = Statement::new(conn, "INSERT", "events", &mut event)?;
//! insert.add_parameters_auto(false)?;
//! insert.execute().await?;
//!
//! // SELECT with a custom WHERE
//! let mut w = WhereBuilder::new();
//! w.add_rule("", "created", "BETWEEN", vec!["2024-01-01", "2024-12-31"], "STRING")?;
//! let mut select = Statement::new(conn, "SELECT", "events", &mut event)?;
//! select.use_custom_where(w)?;
//! let rows = select.execute().await?.into_rows();
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod ident;
pub mod model;
pub mod param;
pub mod row;
pub mod shared;
pub mod statement;
pub mod token;
pub mod types;
pub mod value;
pub mod where_builder;
pub mod where_rule;

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(test)]
mod testing;

pub use client::{Connection, PreparedStatement};
pub use config::ConnectionConfig;
pub use error::{StmtError, StmtResult};
pub use ident::escape_identifier;
pub use model::{DynamicModel, FieldDescriptor, Model};
pub use param::{ParamList, Parameter};
pub use row::Record;
pub use shared::SharedConnection;
pub use statement::{Executed, SqlVerb, Statement};
pub use token::{format_token, new_uuid, translate_special_token};
pub use types::{GenericType, NativeType, TypeMode};
pub use value::{NativeValue, Value};
pub use where_builder::{RuleGroup, WhereBuilder};
pub use where_rule::{Conjunction, WhereRule};

#[cfg(feature = "mysql")]
pub use mysql::MySqlConnection;
