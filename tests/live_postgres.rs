//! End-to-end tests against a real PostgreSQL server
//!
//! Run with `--features postgres` and `ROWGUARD_TEST_DATABASE_URL` pointing
//! at a database the tests may create tables in. Without the variable every
//! test returns early.

#![cfg(feature = "postgres")]

use rowguard::query;
use rowguard::session::PostgresSession;
use rowguard::{register_entity, ColumnAliasStrategy, Dialect, Entity, OomQuery, Session, Value};

#[derive(Entity, Default, Debug, Clone, PartialEq)]
#[table_name = "ROWGUARD_PG_TESTER"]
pub struct PgTester {
    #[primary_key]
    #[auto_increment]
    pub id: Option<i64>,
    pub name: Option<String>,
    pub value: Option<i32>,
}

fn session() -> Option<PostgresSession> {
    let _ = env_logger::builder().is_test(true).try_init();
    let url = std::env::var("ROWGUARD_TEST_DATABASE_URL").ok()?;
    let mut session = PostgresSession::connect(&url).expect("connect");
    let desc = register_entity::<PgTester>().expect("register");
    session
        .execute(&Dialect::Postgres.drop_table_sql(&desc), &[])
        .expect("drop table");
    session
        .execute(&Dialect::Postgres.create_table_sql(&desc), &[])
        .expect("create table");
    Some(session)
}

#[test]
fn test_returning_key_and_typed_nulls() {
    let Some(mut session) = session() else {
        return;
    };

    let mut entity = PgTester {
        id: None,
        name: None,
        value: Some(3),
    };
    let key = OomQuery::new(&mut session, query::insert(&entity).expect("build"))
        .insert_with_key(&mut entity)
        .expect("insert");
    assert_eq!(key, Value::BigInt(Some(1)));

    for strategy in [
        ColumnAliasStrategy::ColumnName,
        ColumnAliasStrategy::ColumnCode,
        ColumnAliasStrategy::TableReference,
    ] {
        let stmt = query::find_by_id::<PgTester>(1i64)
            .expect("build")
            .alias_columns_as(strategy);
        let found: Option<PgTester> = OomQuery::new(&mut session, stmt).find().expect("find");
        assert_eq!(found.as_ref(), Some(&entity), "strategy {strategy:?}");
    }

    let count = OomQuery::new(&mut session, query::count::<PgTester>().expect("build"))
        .execute_count()
        .expect("count");
    assert_eq!(count, 1);
}
