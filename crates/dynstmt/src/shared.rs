//! Init-once, read-many connection slot.

use crate::error::{StmtError, StmtResult};
use std::sync::OnceLock;

/// Holds one process-wide connection.
///
/// [`SharedConnection::install`] must run once before any
/// [`SharedConnection::get`]. The slot is usable in a `static`:
///
/// ```ignore
/// static DB: SharedConnection<MySqlConnection> = SharedConnection::new();
///
/// DB.install(MySqlConnection::connect(&config).await?)?;
/// let conn = DB.get()?;
/// ```
#[derive(Debug)]
pub struct SharedConnection<C> {
    slot: OnceLock<C>,
}

impl<C> SharedConnection<C> {
    pub const fn new() -> Self {
        Self {
            slot: OnceLock::new(),
        }
    }

    /// Store the connection. Fails with [`StmtError::AlreadyConnected`] on a second call.
    pub fn install(&self, conn: C) -> StmtResult<&C> {
        let mut installed = false;
        let conn = self.slot.get_or_init(|| {
            installed = true;
            conn
        });
        if installed {
            tracing::debug!("shared connection installed");
            Ok(conn)
        } else {
            Err(StmtError::AlreadyConnected)
        }
    }

    /// The installed connection, or [`StmtError::ConnectionNotInitialized`].
    pub fn get(&self) -> StmtResult<&C> {
        self.slot.get().ok_or(StmtError::ConnectionNotInitialized)
    }

    pub fn is_connected(&self) -> bool {
        self.slot.get().is_some()
    }
}

impl<C> Default for SharedConnection<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_before_install_fails() {
        let shared: SharedConnection<u32> = SharedConnection::new();
        assert!(shared.get().unwrap_err().is_not_connected());
        assert!(!shared.is_connected());
    }

    #[test]
    fn install_once() {
        let shared = SharedConnection::new();
        assert_eq!(*shared.install(1u32).unwrap(), 1);
        assert!(matches!(shared.install(2), Err(StmtError::AlreadyConnected)));
        assert_eq!(*shared.get().unwrap(), 1);
    }

    #[test]
    fn usable_as_static() {
        static SLOT: SharedConnection<&'static str> = SharedConnection::new();
        SLOT.install("db").unwrap();
        assert_eq!(*SLOT.get().unwrap(), "db");
    }
}
