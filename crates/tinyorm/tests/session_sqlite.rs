use std::collections::HashMap;
use tinyorm::{
    DialectRegistry, Engine, EngineConfig, FieldMap, Model, OrmError, OrmResult, Session,
    SqliteConnection, Value, params,
};

#[derive(Debug, Default, Clone, PartialEq, Model)]
pub struct User {
    #[orm(column = "Name", constraint = "PRIMARY KEY")]
    pub name: String,
    #[orm(column = "Age")]
    pub age: i32,
}

fn user(name: &str, age: i32) -> User {
    User {
        name: name.to_string(),
        age,
    }
}

fn engine() -> Engine<SqliteConnection> {
    Engine::open_sqlite(&EngineConfig::default(), &DialectRegistry::default()).unwrap()
}

async fn user_session(engine: &Engine<SqliteConnection>) -> Session<SqliteConnection> {
    let mut s = engine.new_session();
    s.model::<User>().unwrap();
    s.drop_table().await.unwrap();
    s.create_table().await.unwrap();
    s
}

async fn seeded() -> (Engine<SqliteConnection>, Session<SqliteConnection>) {
    let engine = engine();
    let mut s = user_session(&engine).await;
    let inserted = s.insert(&[user("Tom", 18), user("Sam", 25)]).await.unwrap();
    assert_eq!(inserted, 2);
    (engine, s)
}

#[tokio::test]
async fn find_with_where_order_limit() {
    let engine = engine();
    let mut s = user_session(&engine).await;
    s.insert(&[user("Tom", 18)]).await.unwrap();

    let mut users = Vec::<User>::new();
    s.where_("Age > ?", params![10])
        .order_by("Age DESC")
        .limit(1)
        .find(&mut users)
        .await
        .unwrap();
    assert_eq!(users, vec![user("Tom", 18)]);
}

#[tokio::test]
async fn insert_then_find_round_trips() {
    let (_engine, mut s) = seeded().await;

    let mut found = Vec::<User>::new();
    s.where_("Name = ?", params!["Sam"])
        .find(&mut found)
        .await
        .unwrap();
    assert_eq!(found, vec![user("Sam", 25)]);

    let mut all = Vec::<User>::new();
    s.order_by("Age ASC").find(&mut all).await.unwrap();
    assert_eq!(all, vec![user("Tom", 18), user("Sam", 25)]);
}

#[tokio::test]
async fn update_then_count() {
    let (_engine, mut s) = seeded().await;

    let affected = s
        .where_("Name = ?", params!["Tom"])
        .update([("Age", 30)])
        .await
        .unwrap();
    assert_eq!(affected, 1);

    assert_eq!(s.count().await.unwrap(), 2);

    let mut tom = User::default();
    s.where_("Name = ?", params!["Tom"])
        .first(&mut tom)
        .await
        .unwrap();
    assert_eq!(tom, user("Tom", 30));

    let mut sam = User::default();
    s.where_("Name = ?", params!["Sam"])
        .first(&mut sam)
        .await
        .unwrap();
    assert_eq!(sam, user("Sam", 25));
}

#[tokio::test]
async fn update_accepts_maps_and_pairs() {
    let (_engine, mut s) = seeded().await;

    let mut fields = HashMap::new();
    fields.insert("Age", Value::from(40));
    s.where_("Name = ?", params!["Sam"])
        .update(fields)
        .await
        .unwrap();

    s.where_("Name = ?", params!["Tom"])
        .update_pairs(params!["Age", 41])
        .await
        .unwrap();

    assert_eq!(s.where_("Age > ?", params![39]).count().await.unwrap(), 2);

    let err = s.update_pairs(params!["Age"]).await.unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)));
    let err = s.update(FieldMap::new()).await.unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)));
}

#[tokio::test]
async fn where_then_count() {
    let (_engine, mut s) = seeded().await;
    assert_eq!(s.where_("Age > ?", params![100]).count().await.unwrap(), 0);
    assert_eq!(s.where_("Age > ?", params![20]).count().await.unwrap(), 1);
    assert_eq!(s.count().await.unwrap(), 2);
}

#[tokio::test]
async fn delete_with_and_without_where() {
    let (_engine, mut s) = seeded().await;
    assert_eq!(
        s.where_("Name = ?", params!["Tom"]).delete().await.unwrap(),
        1
    );
    assert_eq!(s.count().await.unwrap(), 1);
    assert_eq!(s.delete().await.unwrap(), 1);
    assert_eq!(s.count().await.unwrap(), 0);
}

#[tokio::test]
async fn first_without_match_is_not_found() {
    let (_engine, mut s) = seeded().await;
    let mut nobody = User::default();
    let err = s
        .where_("Name = ?", params!["Nobody"])
        .first(&mut nobody)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(nobody, User::default());
}

#[tokio::test]
async fn drop_table_twice_is_fine() {
    let engine = engine();
    let mut s = user_session(&engine).await;
    assert!(s.has_table().await.unwrap());
    s.drop_table().await.unwrap();
    s.drop_table().await.unwrap();
    assert!(!s.has_table().await.unwrap());
}

#[tokio::test]
async fn empty_insert_touches_nothing() {
    let engine = engine();
    let mut s = engine.new_session();
    // No table exists, so any statement would fail.
    assert_eq!(s.insert::<User>(&[]).await.unwrap(), 0);
}

#[tokio::test]
async fn duplicate_primary_key_is_a_unique_violation() {
    let (_engine, mut s) = seeded().await;
    let err = s.insert(&[user("Tom", 99)]).await.unwrap_err();
    assert!(err.is_unique_violation());

    // The failed statement does not leak into the next one.
    assert_eq!(s.count().await.unwrap(), 2);
}

#[tokio::test]
async fn operations_without_model_fail() {
    let engine = engine();
    let mut s = engine.new_session();
    s.limit(3);
    assert!(matches!(s.count().await, Err(OrmError::ModelNotSet)));
    assert!(matches!(s.delete().await, Err(OrmError::ModelNotSet)));
    assert!(matches!(
        s.update([("Age", 1)]).await,
        Err(OrmError::ModelNotSet)
    ));
    assert!(matches!(s.drop_table().await, Err(OrmError::ModelNotSet)));
    assert_eq!(s.pending_sql(), "");

    let rows = s.raw("SELECT 1", []).query_rows().await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn rollback_discards_inserts() {
    let engine = engine();
    let mut s = user_session(&engine).await;

    s.begin().await.unwrap();
    s.insert(&[user("Tom", 18), user("Sam", 25)]).await.unwrap();
    s.rollback().await.unwrap();

    assert_eq!(s.count().await.unwrap(), 0);
}

#[tokio::test]
async fn commit_keeps_inserts() {
    let engine = engine();
    let mut s = user_session(&engine).await;

    s.begin().await.unwrap();
    s.insert(&[user("Tom", 18), user("Sam", 25)]).await.unwrap();
    s.commit().await.unwrap();

    assert_eq!(s.count().await.unwrap(), 2);
}

#[tokio::test]
async fn transaction_macro_rolls_back_on_error() {
    let engine = engine();
    let mut session = user_session(&engine).await;

    let result: OrmResult<u64> = async {
        tinyorm::transaction!(&mut session, s, {
            s.insert(&[user("Tom", 18)]).await?;
            // Duplicate key aborts the unit of work.
            s.insert(&[user("Tom", 19)]).await
        })
    }
    .await;
    assert!(result.unwrap_err().is_unique_violation());
    assert!(!session.in_transaction());
    assert_eq!(session.count().await.unwrap(), 0);

    let result: OrmResult<i64> = async {
        tinyorm::transaction!(&mut session, s, {
            s.insert(&[user("Tom", 18), user("Sam", 25)]).await?;
            s.count().await
        })
    }
    .await;
    assert_eq!(result.unwrap(), 2);
    assert_eq!(session.count().await.unwrap(), 2);
}

async fn deferred_fk_session(engine: &Engine<SqliteConnection>) -> Session<SqliteConnection> {
    let mut s = engine.new_session();
    s.raw("PRAGMA foreign_keys = ON", []).exec().await.unwrap();
    s.raw("CREATE TABLE p (id integer PRIMARY KEY)", [])
        .exec()
        .await
        .unwrap();
    s.raw(
        "CREATE TABLE c (pid integer REFERENCES p(id) DEFERRABLE INITIALLY DEFERRED)",
        [],
    )
    .exec()
    .await
    .unwrap();
    s
}

#[tokio::test]
async fn refused_commit_leaves_transaction_to_caller() {
    let engine = engine();
    let mut s = deferred_fk_session(&engine).await;

    s.begin().await.unwrap();
    s.raw("INSERT INTO c (pid) VALUES (?)", params![42])
        .exec()
        .await
        .unwrap();
    let err = s.commit().await.unwrap_err();
    assert!(matches!(err, OrmError::ForeignKeyViolation(_)));
    assert!(s.in_transaction());

    s.rollback().await.unwrap();
    assert!(!s.in_transaction());

    // The shared connection is usable again from any session.
    let mut other = engine.new_session();
    other.begin().await.unwrap();
    other
        .raw("INSERT INTO p (id) VALUES (?)", params![1])
        .exec()
        .await
        .unwrap();
    other.commit().await.unwrap();
    let row = s
        .raw("SELECT count(*) FROM c", [])
        .query_row()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.try_get::<i64>(0).unwrap(), 0);
}

#[tokio::test]
async fn transaction_macro_rolls_back_refused_commit() {
    let engine = engine();
    let mut session = deferred_fk_session(&engine).await;

    let result: OrmResult<u64> = async {
        tinyorm::transaction!(&mut session, s, {
            s.raw("INSERT INTO c (pid) VALUES (?)", params![42])
                .exec()
                .await
        })
    }
    .await;
    assert!(matches!(result, Err(OrmError::ForeignKeyViolation(_))));
    assert!(!session.in_transaction());

    session.begin().await.unwrap();
    session.rollback().await.unwrap();
}

#[tokio::test]
async fn find_leaves_output_untouched_on_decode_error() {
    let engine = engine();
    let mut s = user_session(&engine).await;
    s.insert(&[user("Tom", 18)]).await.unwrap();
    s.raw("INSERT INTO User (Name, Age) VALUES (?, ?)", params!["Sam", "old"])
        .exec()
        .await
        .unwrap();

    let mut found = vec![user("Kept", 1)];
    let err = s.order_by("Name DESC").find(&mut found).await.unwrap_err();
    match err {
        OrmError::Decode { column, .. } => assert_eq!(column, "Age"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(found, vec![user("Kept", 1)]);
}

#[tokio::test]
async fn config_from_toml_opens_engine() {
    let config = EngineConfig::from_toml_str(
        r#"
        dialect = "sqlite3"
        dsn = ":memory:"

        [log]
        enabled = false
        "#,
    )
    .unwrap();
    let engine = Engine::open_sqlite(&config, &DialectRegistry::default()).unwrap();
    let mut s = user_session(&engine).await;
    assert_eq!(s.insert(&[user("Tom", 18)]).await.unwrap(), 1);
}
