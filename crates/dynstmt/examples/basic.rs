//! Insert an event, then read it back.
//!
//! Reads `DB_*` variables (a `.env` file works too):
//!
//! ```text
//! DB_HOST=127.0.0.1 DB_NAME=calendar DB_USER=app DB_PASSWORD=secret \
//!     cargo run -p dynstmt --example basic
//! ```
//!
//! Expects a table like:
//!
//! ```sql
//! CREATE TABLE events (
//!     id CHAR(36) PRIMARY KEY,
//!     name VARCHAR(255) NOT NULL,
//!     seats INT NULL,
//!     created DATETIME NOT NULL
//! );
//! ```

use dynstmt::{ConnectionConfig, DynamicModel, Model, Statement, StmtResult, WhereBuilder};

#[tokio::main]
async fn main() -> StmtResult<()> {
    dotenvy::dotenv().ok();

    let config = ConnectionConfig::from_env()?;
    let conn = dynstmt::mysql::connect(&config).await?;

    let mut event = DynamicModel::new()
        .declare("id", "UUID")
        .declare_value("name", "STRING", "launch")
        .declare_value("seats", "INT", 120)
        .declare("created", "NOW");

    let mut insert = Statement::new(conn, "INSERT", "events", &mut event)?;
    insert.add_parameters_auto(false)?;
    println!("{}", insert.build()?);
    insert.execute().await?;

    let id = event.get("id").unwrap_or_default();
    println!("inserted event {id}");

    let mut w = WhereBuilder::new();
    w.add_rule("", "seats", ">=", 100, "INT")?;
    w.add_rules_grouped(vec![
        dynstmt::WhereRule::new("AND", "name", "LIKE", "la%", "S")?,
        dynstmt::WhereRule::new("OR", "id", "=", id, "UUID")?,
    ])?;

    let mut select = Statement::new(conn, "SELECT", "events", &mut event)?;
    select.use_custom_where(w)?;
    for row in select.execute().await?.into_rows() {
        println!("{}", row.to_json()?);
    }

    Ok(())
}
