//! Single-table SELECT / INSERT / UPDATE / DELETE statements.
//!
//! A [`Statement`] collects parameters against a [`Model`], assembles the SQL
//! text with `:name` tokens, binds the model's current values and executes
//! through a borrowed [`Connection`].
//!
//! # Example
//! ```ignore
//! let mut event = DynamicModel::new()
//!     .declare("id", "UUID")
//!     .declare_value("name", "STRING", "launch")
//!     .declare("created", "NOW");
//!
//! let mut stmt = Statement::new(&conn, "INSERT", "events", &mut event)?;
//! stmt.add_parameters_auto(false)?;
//! stmt.execute().await?;
//!
//! // the generated id was written back
//! println!("{}", event.get("id").unwrap_or_default());
//! ```

use crate::client::{Connection, PreparedStatement};
use crate::error::{StmtError, StmtResult};
use crate::ident::{escape_identifier, write_identifier};
use crate::model::Model;
use crate::param::{ParamList, Parameter};
use crate::row::Record;
use crate::token::{
    NOW_LITERAL, NULL_LITERAL, element_token, format_token, is_valid_token_name, new_uuid,
    replace_token, translate_special_token,
};
use crate::types::{GenericType, TypeMode};
use crate::value::{NativeValue, Value};
use crate::where_builder::WhereBuilder;
use crate::where_rule::WhereRule;
use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

/// SQL verb of a [`Statement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlVerb {
    Select,
    Update,
    Insert,
    Delete,
}

impl SqlVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Update => "UPDATE",
            Self::Insert => "INSERT",
            Self::Delete => "DELETE",
        }
    }

    /// Whether the verb writes ordinary parameters.
    fn writes(&self) -> bool {
        matches!(self, Self::Update | Self::Insert)
    }
}

impl FromStr for SqlVerb {
    type Err = StmtError;

    fn from_str(s: &str) -> StmtResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SELECT" => Ok(Self::Select),
            "UPDATE" => Ok(Self::Update),
            "INSERT" => Ok(Self::Insert),
            "DELETE" => Ok(Self::Delete),
            _ => Err(StmtError::InvalidVerb(s.to_string())),
        }
    }
}

impl fmt::Display for SqlVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the WHERE clause comes from.
#[derive(Debug, Clone)]
enum WhereMode {
    /// One predicate per where parameter, from the model's current values.
    Auto(ParamList),
    /// A [`WhereBuilder`]'s text and rules.
    Custom { sql: String, rules: Vec<WhereRule> },
    /// Caller-supplied text, bound with nothing.
    Raw(String),
}

#[derive(Debug, Clone)]
enum Phase {
    Configuring,
    Built(String),
}

/// One token/value pair handed to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Bind {
    pub(crate) token: String,
    pub(crate) value: NativeValue,
}

impl Bind {
    fn new(token: String, value: NativeValue) -> Self {
        Self { token, value }
    }
}

/// Outcome of [`Statement::execute`].
#[derive(Debug, Clone, PartialEq)]
pub enum Executed {
    /// Rows returned by a SELECT.
    Rows(Vec<Record>),
    /// Rows affected by an INSERT, UPDATE or DELETE.
    Affected(u64),
}

impl Executed {
    /// Rows of a SELECT, empty for other verbs.
    pub fn into_rows(self) -> Vec<Record> {
        match self {
            Self::Rows(rows) => rows,
            Self::Affected(_) => Vec::new(),
        }
    }

    /// Affected rows, or the number of rows a SELECT returned.
    pub fn rows_affected(&self) -> u64 {
        match self {
            Self::Rows(rows) => rows.len() as u64,
            Self::Affected(n) => *n,
        }
    }
}

/// A dynamic statement over one table and one model.
///
/// Configure parameters and the where mode, then [`Statement::build`] or go
/// straight to [`Statement::execute`]. Configuration is rejected once the
/// statement has been built.
pub struct Statement<'a, C: Connection, M: Model + ?Sized> {
    conn: &'a C,
    model: &'a mut M,
    verb: SqlVerb,
    table: String,
    params: ParamList,
    where_mode: WhereMode,
    type_mode: TypeMode,
    phase: Phase,
}

impl<'a, C: Connection, M: Model + ?Sized> Statement<'a, C, M> {
    /// Create a statement. `verb` must be SELECT, UPDATE, INSERT or DELETE (any case).
    pub fn new(conn: &'a C, verb: &str, table: &str, model: &'a mut M) -> StmtResult<Self> {
        let verb: SqlVerb = verb.parse()?;
        tracing::debug!(verb = %verb, table, "statement created");
        Ok(Self {
            type_mode: conn.type_mode(),
            conn,
            model,
            verb,
            table: escape_identifier(table),
            params: ParamList::new(),
            where_mode: WhereMode::Auto(ParamList::new()),
            phase: Phase::Configuring,
        })
    }

    pub fn verb(&self) -> SqlVerb {
        self.verb
    }

    /// The escaped table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn parameters(&self) -> &ParamList {
        &self.params
    }

    /// Where parameters, `None` once a custom or raw where is in use.
    pub fn where_parameters(&self) -> Option<&ParamList> {
        match &self.where_mode {
            WhereMode::Auto(params) => Some(params),
            _ => None,
        }
    }

    /// The built SQL, `None` before [`Statement::build`].
    pub fn sql(&self) -> Option<&str> {
        match &self.phase {
            Phase::Built(sql) => Some(sql),
            Phase::Configuring => None,
        }
    }

    pub fn model(&self) -> &M {
        &*self.model
    }

    /// Override the connection's [`TypeMode`] for this statement.
    pub fn type_mode(&mut self, mode: TypeMode) -> &mut Self {
        self.type_mode = mode;
        self
    }

    fn ensure_configuring(&self, op: &str) -> StmtResult<()> {
        match self.phase {
            Phase::Configuring => Ok(()),
            Phase::Built(_) => Err(StmtError::invalid_state(format!(
                "{op} after the statement was built"
            ))),
        }
    }

    /// Every name in `names` must be usable as a `:token`.
    fn check_names<'n>(names: impl IntoIterator<Item = &'n str>) -> StmtResult<()> {
        for name in names {
            if !is_valid_token_name(name) {
                return Err(StmtError::InvalidParameterName(name.to_string()));
            }
        }
        Ok(())
    }

    /// Explicit type, or the model's declared type for `name`.
    fn resolve_type(&self, name: &str, ty: Option<&str>) -> StmtResult<GenericType> {
        match ty.map(str::trim).filter(|t| !t.is_empty()) {
            Some(ty) => Ok(GenericType::normalize(ty)),
            None => self
                .model
                .field(name)
                .map(|f| f.ty)
                .ok_or_else(|| StmtError::UnknownField(name.to_string())),
        }
    }

    // ==================== Ordinary parameters ====================

    /// Add (or retype) an ordinary parameter.
    ///
    /// Without `ty` the model's declared type is used. When the model's
    /// current value is empty and the type is neither UUID nor NOW, the
    /// parameter is written as NULL. `name` must match `[A-Za-z_][A-Za-z0-9_]*`.
    pub fn add_parameter(&mut self, name: &str, ty: Option<&str>) -> StmtResult<&mut Self> {
        self.ensure_configuring("add_parameter")?;
        Self::check_names([name])?;
        let ty = self.resolve_type(name, ty)?;
        self.register_parameter(name, ty);
        Ok(self)
    }

    fn register_parameter(&mut self, name: &str, mut ty: GenericType) {
        let empty = self.model.get(name).is_none_or(|v| v.is_empty());
        if empty && !matches!(ty, GenericType::Uuid | GenericType::Now) {
            ty = GenericType::Null;
        }
        tracing::debug!(name, ty = %ty, "add_parameter");
        self.params.upsert(name, ty);
    }

    /// Add every model field as an ordinary parameter, optionally only set ones.
    pub fn add_parameters_auto(&mut self, require_set: bool) -> StmtResult<&mut Self> {
        self.ensure_configuring("add_parameters_auto")?;
        let fields = self.model.data_fields(require_set);
        Self::check_names(fields.iter().map(|f| f.name.as_str()))?;
        for field in fields {
            self.register_parameter(&field.name, field.ty);
        }
        Ok(self)
    }

    /// Drop an ordinary parameter. Returns whether it was present.
    pub fn remove_parameter(&mut self, name: &str) -> StmtResult<bool> {
        self.ensure_configuring("remove_parameter")?;
        Ok(self.params.remove(name))
    }

    // ==================== Where parameters ====================

    /// Add (or retype) a where parameter.
    ///
    /// Ignored once [`Statement::use_custom_where`] or
    /// [`Statement::use_raw_where`] is in effect.
    pub fn add_where_parameter(&mut self, name: &str, ty: Option<&str>) -> StmtResult<&mut Self> {
        self.ensure_configuring("add_where_parameter")?;
        Self::check_names([name])?;
        let ty = self.resolve_type(name, ty)?;
        self.register_where_parameter(name, ty);
        Ok(self)
    }

    fn register_where_parameter(&mut self, name: &str, ty: GenericType) {
        match &mut self.where_mode {
            WhereMode::Auto(params) => {
                tracing::debug!(name, ty = %ty, "add_where_parameter");
                params.upsert(name, ty);
            }
            _ => tracing::debug!(name, "custom where in use, where parameter ignored"),
        }
    }

    /// Add every model field as a where parameter, optionally only set ones.
    pub fn add_where_parameters_auto(&mut self, require_set: bool) -> StmtResult<&mut Self> {
        self.ensure_configuring("add_where_parameters_auto")?;
        let fields = self.model.data_fields(require_set);
        Self::check_names(fields.iter().map(|f| f.name.as_str()))?;
        for field in fields {
            self.register_where_parameter(&field.name, field.ty);
        }
        Ok(self)
    }

    /// Drop a where parameter. Returns whether it was present.
    pub fn remove_where_parameter(&mut self, name: &str) -> StmtResult<bool> {
        self.ensure_configuring("remove_where_parameter")?;
        Ok(match &mut self.where_mode {
            WhereMode::Auto(params) => params.remove(name),
            _ => false,
        })
    }

    // ==================== Where modes ====================

    /// Take the WHERE clause and its bindings from `builder`.
    ///
    /// Discards any where parameters added so far.
    pub fn use_custom_where(&mut self, builder: WhereBuilder) -> StmtResult<&mut Self> {
        self.ensure_configuring("use_custom_where")?;
        let (sql, rules) = builder.into_parts();
        tracing::debug!(rules = rules.len(), "custom where");
        self.where_mode = WhereMode::Custom { sql, rules };
        Ok(self)
    }

    /// Use `where_sql` verbatim, including its own `WHERE` keyword.
    ///
    /// Nothing is bound for it; literal values are the caller's responsibility.
    pub fn use_raw_where(&mut self, where_sql: impl Into<String>) -> StmtResult<&mut Self> {
        self.ensure_configuring("use_raw_where")?;
        let mut sql = where_sql.into();
        if !sql.is_empty() && !sql.starts_with(char::is_whitespace) {
            sql.insert(0, '\n');
        }
        tracing::debug!(sql = %sql, "raw where");
        self.where_mode = WhereMode::Raw(sql);
        Ok(self)
    }

    // ==================== Build ====================

    /// Assemble the SQL text. Calling it again returns the same text.
    pub fn build(&mut self) -> StmtResult<String> {
        if let Phase::Built(sql) = &self.phase {
            return Ok(sql.clone());
        }

        let mut body = match self.verb {
            SqlVerb::Select => self.select_sql(),
            SqlVerb::Update => self.update_sql()?,
            SqlVerb::Insert => self.insert_sql()?,
            SqlVerb::Delete => format!("DELETE FROM {}", self.table),
        };

        if self.verb.writes() {
            body = self.substitute_specials(body);
        } else if !self.params.is_empty() {
            tracing::debug!(verb = %self.verb, "ordinary parameters are not used by this verb");
        }

        let where_sql = match self.verb {
            SqlVerb::Insert => {
                if !matches!(&self.where_mode, WhereMode::Auto(p) if p.is_empty()) {
                    tracing::debug!("INSERT ignores the where clause");
                }
                String::new()
            }
            _ => self.where_sql()?,
        };

        if where_sql.is_empty() && matches!(self.verb, SqlVerb::Update | SqlVerb::Delete) {
            tracing::warn!(verb = %self.verb, table = %self.table, "statement has no WHERE clause, every row is affected");
        }

        let sql = body + &where_sql;
        tracing::debug!(target: "dynstmt.sql", verb = %self.verb, sql = %sql, "statement built");
        self.phase = Phase::Built(sql.clone());
        Ok(sql)
    }

    fn select_sql(&self) -> String {
        let fields = self.model.fields();
        let mut sql = String::from("SELECT ");
        if fields.is_empty() {
            sql.push('*');
        }
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            write_identifier(&field.name, &mut sql);
        }
        sql.push_str(" FROM ");
        sql.push_str(&self.table);
        sql
    }

    fn update_sql(&self) -> StmtResult<String> {
        if self.params.is_empty() {
            return Err(StmtError::EmptyStatement(
                "UPDATE requires at least one parameter".to_string(),
            ));
        }
        let mut sql = format!("UPDATE {} SET ", self.table);
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            write_identifier(&param.name, &mut sql);
            sql.push_str(" = ");
            sql.push_str(&format_token(&param.name));
        }
        Ok(sql)
    }

    fn insert_sql(&self) -> StmtResult<String> {
        if self.params.is_empty() {
            return Err(StmtError::EmptyStatement(
                "INSERT requires at least one parameter".to_string(),
            ));
        }
        let mut columns = String::new();
        let mut values = String::new();
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                columns.push_str(", ");
                values.push_str(", ");
            }
            write_identifier(&param.name, &mut columns);
            values.push_str(&format_token(&param.name));
        }
        Ok(format!(
            "INSERT INTO {} ( {columns} ) VALUES ( {values} )",
            self.table
        ))
    }

    /// Replace NOW / NULL parameter tokens with their literals.
    fn substitute_specials(&self, mut body: String) -> String {
        for param in &self.params {
            let literal = match param.ty {
                GenericType::Now => NOW_LITERAL,
                GenericType::Null => NULL_LITERAL,
                _ => continue,
            };
            body = replace_token(&body, &format_token(&param.name), literal);
        }
        body
    }

    fn where_sql(&self) -> StmtResult<String> {
        match &self.where_mode {
            WhereMode::Auto(params) => self.auto_where_sql(params),
            WhereMode::Custom { sql, .. } => Ok(sql.clone()),
            WhereMode::Raw(sql) => Ok(sql.clone()),
        }
    }

    /// `(field = :field)` per parameter, `(field IN (:field_0, …))` for lists, ANDed.
    fn auto_where_sql(&self, params: &ParamList) -> StmtResult<String> {
        if params.is_empty() {
            return Ok(String::new());
        }
        let mut sql = String::from("\nWHERE ");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                sql.push_str(" AND ");
            }
            let field = escape_identifier(&param.name);
            match self.model.get(&param.name).unwrap_or_default() {
                Value::List(items) => {
                    if param.ty.is_special() {
                        return Err(StmtError::special_list(&param.name, param.ty.as_str()));
                    }
                    if items.is_empty() {
                        sql.push_str("(1=0)");
                        continue;
                    }
                    let tokens: Vec<String> = (0..items.len())
                        .map(|j| element_token(&param.name, j))
                        .collect();
                    let _ = write!(sql, "({field} IN ({}))", tokens.join(", "));
                }
                _ => {
                    let rhs = match param.ty {
                        GenericType::Now | GenericType::Null => {
                            translate_special_token(&param.name, &param.ty)
                        }
                        _ => format_token(&param.name),
                    };
                    let _ = write!(sql, "({field} = {rhs})");
                }
            }
        }
        Ok(sql)
    }

    // ==================== Bind ====================

    /// Collect binds in order: ordinary parameters (UPDATE / INSERT), then
    /// where parameters or rules.
    ///
    /// UUID ordinary parameters get a fresh id, written back to the model.
    fn bind(&mut self) -> StmtResult<Vec<Bind>> {
        let mut binds = Vec::new();
        if self.verb.writes() {
            for param in &self.params {
                bind_parameter(&mut *self.model, param, true, self.type_mode, &mut binds)?;
            }
        }
        if self.verb != SqlVerb::Insert {
            match &self.where_mode {
                WhereMode::Auto(params) => {
                    // where UUIDs bind the model's current value: no generation, no write-back
                    for param in params {
                        bind_parameter(&mut *self.model, param, false, self.type_mode, &mut binds)?;
                    }
                }
                WhereMode::Custom { rules, .. } => {
                    for rule in rules {
                        bind_rule(rule, self.type_mode, &mut binds)?;
                    }
                }
                WhereMode::Raw(_) => {}
            }
        }
        tracing::trace!(binds = binds.len(), "values bound");
        Ok(binds)
    }

    // ==================== Execute ====================

    /// Build (if needed), prepare, bind and run the statement.
    ///
    /// On failure the model may already hold generated ids.
    pub async fn execute(mut self) -> StmtResult<Executed> {
        let sql = self.build()?;
        let mut prepared = self.conn.prepare(&sql).await?;
        for bind in self.bind()? {
            tracing::trace!(token = %bind.token, value = ?bind.value, "bind_value");
            prepared.bind_value(&bind.token, bind.value)?;
        }

        match self.verb {
            SqlVerb::Select => {
                let rows = prepared.fetch_all().await?;
                tracing::debug!(rows = rows.len(), "select returned rows");
                Ok(Executed::Rows(rows))
            }
            _ => {
                let affected = prepared.execute().await?;
                tracing::debug!(verb = %self.verb, affected, "statement executed");
                Ok(Executed::Affected(affected))
            }
        }
    }
}

impl<C: Connection, M: Model + ?Sized> fmt::Debug for Statement<'_, C, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("verb", &self.verb)
            .field("table", &self.table)
            .field("params", &self.params)
            .field("where_mode", &self.where_mode)
            .field("type_mode", &self.type_mode)
            .field("phase", &self.phase)
            .finish()
    }
}

/// Bind one parameter from the model's current value.
fn bind_parameter<M: Model + ?Sized>(
    model: &mut M,
    param: &Parameter,
    generate_uuid: bool,
    mode: TypeMode,
    out: &mut Vec<Bind>,
) -> StmtResult<()> {
    let name = param.name.as_str();
    let ty = &param.ty;

    // substituted into the text
    if matches!(ty, GenericType::Now | GenericType::Null) {
        return Ok(());
    }

    if generate_uuid && *ty == GenericType::Uuid {
        let id = new_uuid();
        model.set(name, Value::from(id.as_str()))?;
        tracing::debug!(name, id = %id, "generated uuid");
        out.push(Bind::new(format_token(name), NativeValue::Text(id)));
        return Ok(());
    }

    match model.get(name).unwrap_or_default() {
        Value::List(items) => {
            if ty.is_special() {
                return Err(StmtError::special_list(name, ty.as_str()));
            }
            for (i, item) in items.iter().enumerate() {
                let token = element_token(name, i);
                let value = item.coerce(&token, ty, mode)?;
                out.push(Bind::new(token, value));
            }
        }
        value => {
            let token = format_token(name);
            let value = value.coerce(&token, ty, mode)?;
            out.push(Bind::new(token, value));
        }
    }
    Ok(())
}

/// Bind one where rule from its own value.
fn bind_rule(rule: &WhereRule, mode: TypeMode, out: &mut Vec<Bind>) -> StmtResult<()> {
    let ty = rule.ty();
    match rule.value() {
        Value::List(items) => {
            if ty.is_special() {
                return Err(StmtError::special_list(rule.field(), ty.as_str()));
            }
            for (token, item) in rule.tokens().iter().zip(items) {
                out.push(Bind::new(token.clone(), item.coerce(token, ty, mode)?));
            }
        }
        value => {
            if matches!(ty, GenericType::Now | GenericType::Null) {
                return Ok(());
            }
            if let Some(token) = rule.token() {
                out.push(Bind::new(token.to_string(), value.coerce(token, ty, mode)?));
            }
        }
    }
    Ok(())
}
