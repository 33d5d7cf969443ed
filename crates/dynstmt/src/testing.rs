//! In-memory connection that records what it is asked to run.

use crate::client::{Connection, PreparedStatement};
use crate::error::StmtResult;
use crate::row::Record;
use crate::types::TypeMode;
use crate::value::NativeValue;
use std::sync::{Arc, Mutex};

/// One executed statement.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub sql: String,
    pub binds: Vec<(String, NativeValue)>,
}

impl Call {
    pub fn bound(&self, token: &str) -> Option<&NativeValue> {
        self.binds
            .iter()
            .rev()
            .find(|(t, _)| t == token)
            .map(|(_, v)| v)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingConnection {
    calls: Arc<Mutex<Vec<Call>>>,
    rows: Vec<Record>,
    affected: u64,
    mode: TypeMode,
}

impl RecordingConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, rows: Vec<Record>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_affected(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }

    pub fn strict(mut self) -> Self {
        self.mode = TypeMode::Strict;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last(&self) -> Call {
        self.calls().pop().expect("no statement executed")
    }
}

pub(crate) struct RecordingStatement {
    call: Call,
    calls: Arc<Mutex<Vec<Call>>>,
    rows: Vec<Record>,
    affected: u64,
}

impl Connection for RecordingConnection {
    type Prepared = RecordingStatement;

    async fn prepare(&self, sql: &str) -> StmtResult<RecordingStatement> {
        Ok(RecordingStatement {
            call: Call {
                sql: sql.to_string(),
                binds: Vec::new(),
            },
            calls: Arc::clone(&self.calls),
            rows: self.rows.clone(),
            affected: self.affected,
        })
    }

    fn type_mode(&self) -> TypeMode {
        self.mode
    }
}

impl PreparedStatement for RecordingStatement {
    fn bind_value(&mut self, token: &str, value: NativeValue) -> StmtResult<()> {
        self.call.binds.push((token.to_string(), value));
        Ok(())
    }

    async fn execute(self) -> StmtResult<u64> {
        self.calls.lock().unwrap().push(self.call);
        Ok(self.affected)
    }

    async fn fetch_all(self) -> StmtResult<Vec<Record>> {
        self.calls.lock().unwrap().push(self.call);
        Ok(self.rows)
    }
}
