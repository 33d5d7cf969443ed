#![allow(dead_code)]

use dynstmt::{Connection, NativeValue, PreparedStatement, Record, StmtResult, TypeMode};
use std::sync::{Arc, Mutex};

/// What the mock saw for one executed statement.
#[derive(Debug, Clone)]
pub struct Executed {
    pub sql: String,
    pub binds: Vec<(String, NativeValue)>,
}

impl Executed {
    pub fn bound(&self, token: &str) -> Option<&NativeValue> {
        self.binds.iter().find(|(t, _)| t == token).map(|(_, v)| v)
    }
}

/// Connection double: records SQL and binds, answers with canned rows.
#[derive(Debug, Clone, Default)]
pub struct MockConnection {
    log: Arc<Mutex<Vec<Executed>>>,
    rows: Vec<Record>,
    mode: TypeMode,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn returning(rows: Vec<Record>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn strict() -> Self {
        Self {
            mode: TypeMode::Strict,
            ..Self::default()
        }
    }

    pub fn log(&self) -> Vec<Executed> {
        self.log.lock().unwrap().clone()
    }

    pub fn last(&self) -> Executed {
        self.log().pop().expect("nothing executed")
    }
}

pub struct MockStatement {
    executed: Executed,
    log: Arc<Mutex<Vec<Executed>>>,
    rows: Vec<Record>,
}

impl Connection for MockConnection {
    type Prepared = MockStatement;

    async fn prepare(&self, sql: &str) -> StmtResult<MockStatement> {
        Ok(MockStatement {
            executed: Executed {
                sql: sql.to_string(),
                binds: Vec::new(),
            },
            log: Arc::clone(&self.log),
            rows: self.rows.clone(),
        })
    }

    fn type_mode(&self) -> TypeMode {
        self.mode
    }
}

impl PreparedStatement for MockStatement {
    fn bind_value(&mut self, token: &str, value: NativeValue) -> StmtResult<()> {
        self.executed.binds.push((token.to_string(), value));
        Ok(())
    }

    async fn execute(self) -> StmtResult<u64> {
        self.log.lock().unwrap().push(self.executed);
        Ok(1)
    }

    async fn fetch_all(self) -> StmtResult<Vec<Record>> {
        self.log.lock().unwrap().push(self.executed);
        Ok(self.rows)
    }
}

pub fn is_uuid_v4(s: &str) -> bool {
    let bytes = s.as_bytes();
    s.len() == 36
        && [8, 13, 18, 23].iter().all(|&i| bytes[i] == b'-')
        && bytes[14] == b'4'
        && matches!(bytes[19], b'8' | b'9' | b'a' | b'b')
        && s.chars()
            .filter(|c| *c != '-')
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}
