use chrono::{NaiveDate, NaiveDateTime};
use tinyorm::dialect::{Postgres, Sqlite3};
use tinyorm::{
    DialectRegistry, Engine, EngineConfig, Model, OrmError, TableDef, Value, params,
};

#[derive(Debug, Default, Clone, PartialEq, Model)]
#[orm(table = "events")]
pub struct Event {
    #[orm(constraint = "PRIMARY KEY")]
    pub id: i64,
    pub r#type: String,
    pub payload: Vec<u8>,
    pub score: f64,
    pub active: bool,
    pub note: Option<String>,
    pub at: NaiveDateTime,
    #[orm(skip)]
    pub cached: u32,
    internal: u8,
}

#[derive(Debug, Default, Model)]
pub struct Counter {
    pub hits: u64,
}

#[test]
fn only_public_unskipped_fields_are_columns() {
    let fields = Event::fields();
    let names: Vec<_> = fields.iter().map(|f| f.name).collect();
    assert_eq!(
        names,
        ["id", "type", "payload", "score", "active", "note", "at"]
    );
    assert_eq!(fields[0].constraint, "PRIMARY KEY");
    assert_eq!(fields[1].constraint, "");
    assert_eq!(Event::TYPE_NAME, "events");
    assert_eq!(Counter::TYPE_NAME, "Counter");
}

#[test]
fn sqlite_table_definition() {
    let table = TableDef::parse::<Event>(&Sqlite3).unwrap();
    assert_eq!(table.name(), "events");
    assert_eq!(table.column_names().len(), table.columns().len());
    let types: Vec<_> = table.columns().iter().map(|c| c.sql_type.as_str()).collect();
    assert_eq!(
        types,
        ["bigint", "text", "blob", "real", "bool", "text", "datetime"]
    );
    for name in table.column_names() {
        assert_eq!(&table.get_column(name).unwrap().name, name);
    }
}

#[test]
fn postgres_rejects_u64() {
    let table = TableDef::parse::<Event>(&Postgres).unwrap();
    assert_eq!(table.get_column("score").unwrap().sql_type, "double precision");
    assert_eq!(table.get_column("at").unwrap().sql_type, "timestamp");

    let err = TableDef::parse::<Counter>(&Postgres).unwrap_err();
    assert!(matches!(
        err,
        OrmError::UnsupportedType {
            dialect: "postgres",
            value: "u64"
        }
    ));
}

#[test]
fn record_values_follow_column_order() {
    let event = Event {
        id: 7,
        r#type: "click".into(),
        note: None,
        internal: 3,
        ..Default::default()
    };
    let values = event.record_values();
    assert_eq!(values.len(), Event::fields().len());
    assert_eq!(values[0], Value::I64(7));
    assert_eq!(values[1], Value::Text("click".into()));
    assert_eq!(values[5], Value::Null);
}

#[test]
fn set_column_converts_and_reports_unknown_columns() {
    let mut event = Event::default();
    event.set_column("id", Value::I64(9)).unwrap();
    event.set_column("active", Value::I64(1)).unwrap();
    event.set_column("note", Value::Text("hi".into())).unwrap();
    assert_eq!(event.id, 9);
    assert!(event.active);
    assert_eq!(event.note.as_deref(), Some("hi"));

    match event.set_column("cached", Value::I64(1)).unwrap_err() {
        OrmError::Decode { column, .. } => assert_eq!(column, "cached"),
        other => panic!("unexpected error: {other:?}"),
    }
    match event.set_column("id", Value::Text("x".into())).unwrap_err() {
        OrmError::Decode { column, .. } => assert_eq!(column, "id"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn every_field_kind_survives_sqlite() {
    let engine =
        Engine::open_sqlite(&EngineConfig::default(), &DialectRegistry::default()).unwrap();
    let mut s = engine.new_session();
    s.model::<Event>().unwrap().create_table().await.unwrap();

    let at = NaiveDate::from_ymd_opt(2024, 2, 29)
        .unwrap()
        .and_hms_micro_opt(23, 59, 58, 123_456)
        .unwrap();
    let event = Event {
        id: 1,
        r#type: "purchase".into(),
        payload: vec![0, 1, 2, 255],
        score: 9.75,
        active: true,
        note: Some("first".into()),
        at,
        cached: 42,
        internal: 1,
    };
    let blank = Event {
        id: 2,
        ..Default::default()
    };
    s.insert(&[event.clone(), blank]).await.unwrap();

    let mut found = Vec::<Event>::new();
    s.order_by("id").find(&mut found).await.unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(
        found[0],
        Event {
            cached: 0,
            internal: 0,
            ..event
        }
    );
    assert_eq!(found[1].note, None);
    assert!(!found[1].active);

    let mut one = Event::default();
    s.where_("type = ?", params!["purchase"])
        .first(&mut one)
        .await
        .unwrap();
    assert_eq!(one.id, 1);
}
