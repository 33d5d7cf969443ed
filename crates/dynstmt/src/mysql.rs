//! MySQL driver adapter on `sqlx`.
//!
//! Statements are written with `:name` tokens. MySQL only understands
//! positional `?` markers, so [`MySqlConnection::prepare`] rewrites every token
//! outside quoted text into `?` and remembers the token order; values are
//! bound by name and handed to `sqlx` in that order.

use crate::client::{Connection, PreparedStatement};
use crate::config::ConnectionConfig;
use crate::error::{StmtError, StmtResult};
use crate::row::Record;
use crate::shared::SharedConnection;
use crate::token::format_token;
use crate::types::TypeMode;
use crate::value::{NativeValue, Value};
use rust_decimal::Decimal;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlPoolOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, MySql, MySqlPool, Row as _, ValueRef};
use std::collections::HashMap;

/// A pooled MySQL connection.
#[derive(Debug, Clone)]
pub struct MySqlConnection {
    pool: MySqlPool,
    type_mode: TypeMode,
}

impl MySqlConnection {
    /// Open a pool from `config`.
    pub async fn connect(config: &ConnectionConfig) -> StmtResult<Self> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password)
            .charset(&config.charset);

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StmtError::Connection(e.to_string()))?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "connected to mysql"
        );
        Ok(Self {
            pool,
            type_mode: config.type_mode,
        })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self {
            pool,
            type_mode: TypeMode::default(),
        }
    }

    pub fn with_type_mode(mut self, mode: TypeMode) -> Self {
        self.type_mode = mode;
        self
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

impl Connection for MySqlConnection {
    type Prepared = MySqlStatement;

    async fn prepare(&self, sql: &str) -> StmtResult<MySqlStatement> {
        let (positional, order) = to_positional(sql);
        tracing::trace!(target: "dynstmt.sql", sql = %positional, tokens = order.len(), "prepared");
        Ok(MySqlStatement {
            pool: self.pool.clone(),
            sql: positional,
            order,
            values: HashMap::new(),
        })
    }

    fn type_mode(&self) -> TypeMode {
        self.type_mode
    }
}

/// A statement with its `:name` tokens rewritten to `?`.
#[derive(Debug)]
pub struct MySqlStatement {
    pool: MySqlPool,
    sql: String,
    order: Vec<String>,
    values: HashMap<String, NativeValue>,
}

impl MySqlStatement {
    /// The positional SQL sent to the server.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    fn query(&self) -> StmtResult<Query<'_, MySql, MySqlArguments>> {
        let mut query = sqlx::query(&self.sql);
        for token in &self.order {
            let value = self
                .values
                .get(token)
                .ok_or_else(|| StmtError::UnboundToken(token.clone()))?;
            query = bind_native(query, value);
        }
        Ok(query)
    }
}

impl PreparedStatement for MySqlStatement {
    fn bind_value(&mut self, token: &str, value: NativeValue) -> StmtResult<()> {
        let token = format_token(token);
        if !self.order.contains(&token) {
            tracing::debug!(token = %token, "bound token does not appear in the statement");
        }
        self.values.insert(token, value);
        Ok(())
    }

    async fn execute(self) -> StmtResult<u64> {
        let result = self.query()?.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn fetch_all(self) -> StmtResult<Vec<Record>> {
        let rows = self.query()?.fetch_all(&self.pool).await?;
        rows.iter().map(convert_row).collect()
    }
}

fn bind_native<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &'q NativeValue,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        NativeValue::Null => query.bind(None::<String>),
        NativeValue::Bool(b) => query.bind(*b),
        NativeValue::Int(i) => query.bind(*i),
        NativeValue::Text(s) => query.bind(s.as_str()),
    }
}

fn convert_row(row: &MySqlRow) -> StmtResult<Record> {
    let mut record = Record::new();
    for column in row.columns() {
        let i = column.ordinal();
        let name = column.name();

        let raw = row.try_get_raw(i)?;
        if raw.is_null() {
            record.push(name, Value::Null);
            continue;
        }

        let value = if let Ok(v) = row.try_get::<bool, _>(i) {
            Value::Bool(v)
        } else if let Ok(v) = row.try_get::<i64, _>(i) {
            Value::Int(v)
        } else if let Ok(v) = row.try_get::<u64, _>(i) {
            i64::try_from(v).map_or_else(|_| Value::Text(v.to_string()), Value::Int)
        } else if let Ok(v) = row.try_get::<f64, _>(i) {
            Value::Float(v)
        } else if let Ok(v) = row.try_get::<Decimal, _>(i) {
            Value::Decimal(v)
        } else if let Ok(v) = row.try_get::<chrono::NaiveDateTime, _>(i) {
            Value::Timestamp(v)
        } else if let Ok(v) = row.try_get::<chrono::DateTime<chrono::Utc>, _>(i) {
            Value::from(v)
        } else if let Ok(v) = row.try_get::<chrono::NaiveDate, _>(i) {
            Value::from(v)
        } else if let Ok(v) = row.try_get::<String, _>(i) {
            Value::Text(v)
        } else if let Ok(v) = row.try_get::<Vec<u8>, _>(i) {
            // binary collations come back as blobs
            match String::from_utf8(v) {
                Ok(s) => Value::Text(s),
                Err(e) => return Err(StmtError::decode(name, format!("non-utf8 bytes: {e}"))),
            }
        } else {
            return Err(StmtError::decode(
                name,
                format!("unsupported column type {}", column.type_info()),
            ));
        };
        record.push(name, value);
    }
    Ok(record)
}

/// Rewrite `:name` tokens outside quotes into `?`.
///
/// Returns the rewritten SQL and the tokens (with their `:`) in order.
fn to_positional(sql: &str) -> (String, Vec<String>) {
    let mut out = String::with_capacity(sql.len());
    let mut order = Vec::new();
    let mut quote: Option<char> = None;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' && q != '`' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                out.push(c);
            }
            ':' if chars.peek().is_some_and(|n| *n == '_' || n.is_ascii_alphabetic()) => {
                let mut token = String::from(":");
                while let Some(&n) = chars.peek() {
                    if n == '_' || n.is_ascii_alphanumeric() {
                        token.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push('?');
                order.push(token);
            }
            _ => out.push(c),
        }
    }

    (out, order)
}

static CONNECTION: SharedConnection<MySqlConnection> = SharedConnection::new();

/// Open the process-wide connection. Runs once; a second call is
/// [`StmtError::AlreadyConnected`].
pub async fn connect(config: &ConnectionConfig) -> StmtResult<&'static MySqlConnection> {
    if CONNECTION.is_connected() {
        return Err(StmtError::AlreadyConnected);
    }
    CONNECTION.install(MySqlConnection::connect(config).await?)
}

/// The process-wide connection, or [`StmtError::ConnectionNotInitialized`].
pub fn connection() -> StmtResult<&'static MySqlConnection> {
    CONNECTION.get()
}
