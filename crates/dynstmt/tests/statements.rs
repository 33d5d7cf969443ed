mod common;

use chrono::NaiveDate;
use common::{MockConnection, is_uuid_v4};
use dynstmt::{
    FieldDescriptor, Model, NativeValue, Record, Statement, StmtError, StmtResult, Value,
    WhereBuilder, WhereRule,
};

/// A hand-written model, the way an application record type plugs in.
#[derive(Debug, Default)]
struct Event {
    id: Option<String>,
    name: Option<String>,
    status: Option<String>,
    seats: Option<i64>,
    created: Option<String>,
}

impl Model for Event {
    fn fields(&self) -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("id", "UUID"),
            FieldDescriptor::new("name", "STRING"),
            FieldDescriptor::new("status", "S"),
            FieldDescriptor::new("seats", "INT"),
            FieldDescriptor::new("created", "NOW"),
        ]
    }

    fn get(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(self.id.clone().into()),
            "name" => Some(self.name.clone().into()),
            "status" => Some(self.status.clone().into()),
            "seats" => Some(self.seats.into()),
            "created" => Some(self.created.clone().into()),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: Value) -> StmtResult<()> {
        let text = value.as_str().map(str::to_string);
        match name {
            "id" => self.id = text,
            "name" => self.name = text,
            "status" => self.status = text,
            "seats" => self.seats = value.as_i64(),
            "created" => self.created = text,
            _ => return Err(StmtError::UnknownField(name.to_string())),
        }
        Ok(())
    }
}

fn launch() -> Event {
    Event {
        name: Some("launch".to_string()),
        status: Some("active".to_string()),
        ..Event::default()
    }
}

#[tokio::test]
async fn insert_generates_id_and_substitutes_now() {
    let conn = MockConnection::new();
    let mut event = launch();

    let mut stmt = Statement::new(&conn, "INSERT", "events", &mut event).unwrap();
    stmt.add_parameter("id", Some("UUID"))
        .unwrap()
        .add_parameter("name", Some("STRING"))
        .unwrap()
        .add_parameter("created", Some("NOW"))
        .unwrap();
    stmt.execute().await.unwrap();

    let run = conn.last();
    assert_eq!(
        run.sql,
        "INSERT INTO `events` ( `id`, `name`, `created` ) VALUES ( :id, :name, NOW() )"
    );

    let id = event.id.clone().expect("id written back");
    assert!(is_uuid_v4(&id), "{id}");
    assert_eq!(run.bound(":id"), Some(&NativeValue::Text(id)));
    assert_eq!(run.bound(":name"), Some(&NativeValue::Text("launch".into())));
    assert_eq!(run.bound(":created"), None);
    assert_eq!(run.binds.len(), 2);
}

#[tokio::test]
async fn each_insert_gets_a_fresh_id() {
    let conn = MockConnection::new();
    let mut ids = Vec::new();
    for _ in 0..2 {
        let mut event = launch();
        let mut stmt = Statement::new(&conn, "INSERT", "events", &mut event).unwrap();
        stmt.add_parameter("id", None).unwrap();
        stmt.execute().await.unwrap();
        ids.push(event.id.unwrap());
    }
    assert_ne!(ids[0], ids[1]);
}

#[tokio::test]
async fn auto_where_select() {
    let conn = MockConnection::returning(vec![
        Record::new().with("name", "launch").with("status", "active"),
    ]);
    let mut event = Event {
        status: Some("active".to_string()),
        ..Event::default()
    };

    let mut stmt = Statement::new(&conn, "SELECT", "events", &mut event).unwrap();
    stmt.add_where_parameter("status", Some("STRING")).unwrap();
    let rows = stmt.execute().await.unwrap().into_rows();

    let run = conn.last();
    assert!(run.sql.ends_with("\nWHERE (`status` = :status)"), "{}", run.sql);
    assert_eq!(
        run.bound(":status"),
        Some(&NativeValue::Text("active".into()))
    );
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&Value::from("launch")));
}

#[tokio::test]
async fn update_with_empty_fields_writes_null() {
    let conn = MockConnection::new();
    let mut event = Event {
        id: Some("0b6f6a3e-57b5-4b43-9a8e-6d7f0f1c2a11".to_string()),
        name: Some("renamed".to_string()),
        ..Event::default()
    };

    let mut stmt = Statement::new(&conn, "UPDATE", "events", &mut event).unwrap();
    stmt.add_parameter("name", None)
        .unwrap()
        .add_parameter("seats", None)
        .unwrap()
        .add_where_parameter("id", None)
        .unwrap();
    stmt.execute().await.unwrap();

    let run = conn.last();
    assert_eq!(
        run.sql,
        "UPDATE `events` SET `name` = :name, `seats` = NULL\nWHERE (`id` = :id)"
    );
    assert_eq!(
        run.binds,
        vec![
            (":name".to_string(), NativeValue::Text("renamed".into())),
            (
                ":id".to_string(),
                NativeValue::Text("0b6f6a3e-57b5-4b43-9a8e-6d7f0f1c2a11".into())
            ),
        ]
    );
}

#[tokio::test]
async fn custom_where_delete_between() {
    let conn = MockConnection::new();
    let from = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let to = NaiveDate::from_ymd_opt(2024, 6, 30)
        .unwrap()
        .and_hms_opt(23, 59, 59)
        .unwrap();

    let mut w = WhereBuilder::new();
    w.add_rule("", "ts", "BETWEEN", vec![from, to], "STRING").unwrap();
    let tokens = w.get_rules()[0].tokens().to_vec();

    let mut event = Event::default();
    let mut stmt = Statement::new(&conn, "DELETE", "events", &mut event).unwrap();
    stmt.use_custom_where(w).unwrap();
    stmt.execute().await.unwrap();

    let run = conn.last();
    assert_eq!(
        run.sql,
        format!(
            "DELETE FROM `events`\nWHERE (`ts` BETWEEN {} AND {})",
            tokens[0], tokens[1]
        )
    );
    assert_eq!(
        run.bound(&tokens[0]),
        Some(&NativeValue::Text("2024-01-01 00:00:00".into()))
    );
    assert_eq!(
        run.bound(&tokens[1]),
        Some(&NativeValue::Text("2024-06-30 23:59:59".into()))
    );

    let mut w = WhereBuilder::new();
    let err = w
        .add_rule("", "ts", "BETWEEN", vec![from, to], "UUID")
        .unwrap_err();
    assert!(err.is_special_list_conflict());
}

#[tokio::test]
async fn compound_where_binds_every_rule() {
    let conn = MockConnection::new();
    let mut w = WhereBuilder::new();
    w.add_rule("", "status", "=", "active", "S").unwrap();

    let overlaps = w
        .group_rules(vec![
            WhereRule::new("", "start", "BETWEEN", vec!["2024-01-01", "2024-01-31"], "S").unwrap(),
            WhereRule::new("OR", "end", "BETWEEN", vec!["2024-01-01", "2024-01-31"], "S").unwrap(),
        ])
        .unwrap();
    let spans = w
        .group_rules(vec![
            WhereRule::new("OR", "start", "<=", "2024-01-01", "S").unwrap(),
            WhereRule::new("AND", "end", ">=", "2024-01-31", "S").unwrap(),
        ])
        .unwrap();
    w.add_compound(vec![overlaps, spans], "AND").unwrap();

    let tokens: Vec<String> = w
        .get_rules()
        .iter()
        .flat_map(|r| r.tokens().to_vec())
        .collect();
    assert_eq!(tokens.len(), 7);

    let mut event = Event::default();
    let mut stmt = Statement::new(&conn, "SELECT", "events", &mut event).unwrap();
    stmt.use_custom_where(w).unwrap();
    stmt.execute().await.unwrap();

    let run = conn.last();
    let bound: Vec<&str> = run.binds.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(bound, tokens.iter().map(String::as_str).collect::<Vec<_>>());
    for token in &tokens {
        assert_eq!(run.sql.matches(token.as_str()).count(), 1);
    }
    assert!(run.sql.contains("\nWHERE (`status` = :t_"));
    assert!(run.sql.contains(" AND ( ( (`start` BETWEEN :t_0_"));
}

#[tokio::test]
async fn raw_where_binds_nothing() {
    let conn = MockConnection::new();
    let mut event = launch();
    let mut stmt = Statement::new(&conn, "SELECT", "events", &mut event).unwrap();
    stmt.add_where_parameter("status", None).unwrap();
    stmt.use_raw_where("WHERE (seats = 1 OR seats = 2) AND (status = 'active')")
        .unwrap();
    stmt.execute().await.unwrap();

    let run = conn.last();
    assert!(run.sql.ends_with("\nWHERE (seats = 1 OR seats = 2) AND (status = 'active')"));
    assert!(run.binds.is_empty());
}

#[tokio::test]
async fn strict_connection_rejects_unknown_types() {
    let conn = MockConnection::strict();
    let mut event = launch();
    let mut stmt = Statement::new(&conn, "SELECT", "events", &mut event).unwrap();
    stmt.add_where_parameter("status", Some("ENUM")).unwrap();
    let err = stmt.execute().await.unwrap_err();
    assert!(matches!(err, StmtError::UnknownGenericType(ref t) if t == "ENUM"));
    assert!(conn.log().is_empty());
}

#[test]
fn invalid_verb_fails_at_construction() {
    let conn = MockConnection::new();
    let mut event = launch();
    let err = Statement::new(&conn, "UPSERT", "events", &mut event).unwrap_err();
    assert!(err.is_invalid_verb());
    assert_eq!(err.to_string(), "sql statement can't operate with verb [UPSERT]");
}
