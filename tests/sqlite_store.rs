mod common;

use rusqlite::{params, Connection, Result};

use common::create_temp_db;
use row_stream::{
    BatchFilter, Query, Record, RowCursor, SqliteConfig, SqliteStore, Store, StoreError,
    StreamError, UserTable, Value,
};

fn ages(values: &[i64]) -> Vec<Value> {
    values.iter().map(|&a| Value::Integer(a)).collect()
}

#[test]
fn test_stream_records_across_fetch_chunks() -> Result<()> {
    let all: Vec<i64> = (0..23).map(|i| 18 + i).collect();
    let db = create_temp_db(&ages(&all))?;
    let store = SqliteStore::new(SqliteConfig::new(db.path()).with_fetch_size(5));
    let users = UserTable::new(&store, "user_data");

    let records: Vec<Record> = users
        .stream_records()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(records.len(), 23);
    assert_eq!(records[0].user_id, "u-0");
    assert_eq!(records[22].email, "user22@example.com");
    let streamed: Vec<Value> = records.into_iter().map(|r| r.age).collect();
    assert_eq!(streamed, ages(&all));
    Ok(())
}

#[test]
fn test_decimal_and_text_ages_are_integers() -> Result<()> {
    let db = create_temp_db(&[Value::Real(30.0), Value::from("41"), Value::from("unknown")])?;
    let store = SqliteStore::new(SqliteConfig::new(db.path()));
    let users = UserTable::new(&store, "user_data");

    let records: Vec<Record> = users
        .stream_records()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(records[0].age, Value::Integer(30));
    assert_eq!(records[1].age, Value::Integer(41));
    assert_eq!(records[2].age, Value::from("unknown"));
    Ok(())
}

#[test]
fn test_batches_and_filter_on_disk() -> Result<()> {
    let db = create_temp_db(&ages(&[20, 26, 25, 31, 70]))?;
    let store = SqliteStore::new(SqliteConfig::new(db.path()).with_fetch_size(2));
    let users = UserTable::new(&store, "user_data");

    let sizes: Vec<usize> = users
        .stream_batches(2)
        .unwrap()
        .map(|b| b.map(|b| b.len()))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(sizes, [2, 2, 1]);

    let mut out: Vec<u8> = Vec::new();
    let written = users
        .process_batches_with(BatchFilter::new(2), &mut out)
        .unwrap();
    assert_eq!(written, 3);
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("'age': 26"));
    assert!(!text.contains("'age': 25}"));
    Ok(())
}

#[test]
fn test_pages_follow_insertion_order() -> Result<()> {
    let db = create_temp_db(&ages(&[20, 21, 22, 23, 24, 25, 26]))?;
    let store = SqliteStore::new(SqliteConfig::new(db.path()));
    let users = UserTable::new(&store, "user_data");

    let page = users.fetch_page(3, 3).unwrap();
    let ids: Vec<&str> = page.iter().map(|r| r.user_id.as_str()).collect();
    assert_eq!(ids, ["u-3", "u-4", "u-5"]);

    let sizes: Vec<usize> = users
        .lazy_paginate(3)
        .unwrap()
        .map(|p| p.map(|p| p.len()))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(sizes, [3, 3, 1]);
    Ok(())
}

#[test]
fn test_average_age() -> Result<()> {
    let db = create_temp_db(&ages(&[20, 30, 25]))?;
    let store = SqliteStore::new(SqliteConfig::new(db.path()));
    let users = UserTable::new(&store, "user_data");

    assert_eq!(
        users.compute_average().unwrap().to_string(),
        "Average age of users: 25.00"
    );
    Ok(())
}

#[test]
fn test_empty_table() -> Result<()> {
    let db = create_temp_db(&[])?;
    let store = SqliteStore::new(SqliteConfig::new(db.path()));
    let users = UserTable::new(&store, "user_data");

    assert_eq!(users.stream_records().count(), 0);
    assert_eq!(users.lazy_paginate(4).unwrap().count(), 0);
    assert_eq!(
        users.compute_average().unwrap().to_string(),
        "No user data found."
    );
    Ok(())
}

#[test]
fn test_missing_table_is_a_query_error() -> Result<()> {
    let db = create_temp_db(&[])?;
    let store = SqliteStore::new(SqliteConfig::new(db.path()));
    let users = UserTable::new(&store, "no_such_table");

    let err = users.stream_records().next().unwrap().unwrap_err();
    assert!(matches!(err, StreamError::Store(StoreError::Query(_))));
    assert!(matches!(
        users.fetch_page(10, 0),
        Err(StreamError::Store(StoreError::Query(_)))
    ));
    Ok(())
}

#[test]
fn test_cursor_is_read_only() -> Result<()> {
    let db = create_temp_db(&ages(&[20]))?;
    let store = SqliteStore::new(SqliteConfig::new(db.path()));

    let mut cursor = store.open(&Query::select("user_data", &["name"])).unwrap();
    let row = cursor.next_row().unwrap().unwrap();
    assert_eq!(row.columns(), ["name"]);
    assert_eq!(row.get("name"), Some(&Value::from("User 0")));
    assert!(cursor.next_row().unwrap().is_none());

    // Rows written after the cursor drained are visible to a new query only.
    let conn = Connection::open(db.path())?;
    conn.execute(
        "INSERT INTO user_data (user_id, name, email, age) VALUES (?1, ?2, ?3, ?4)",
        params!["late", "Late Comer", "late@example.com", 50],
    )?;
    assert!(cursor.next_row().unwrap().is_none());
    drop(cursor);

    let users = UserTable::new(&store, "user_data");
    assert_eq!(users.stream_records().count(), 2);
    Ok(())
}

#[test]
fn test_stream_sees_rows_in_rowid_order_with_integer_keys() -> Result<()> {
    let temp_file = tempfile::NamedTempFile::new().unwrap();
    let conn = Connection::open(temp_file.path())?;
    conn.execute_batch(
        r#"
        CREATE TABLE people (
            user_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            age INTEGER
        );
        "#,
    )?;
    for (id, age) in [(10, 33), (2, 44), (7, 55)] {
        conn.execute(
            "INSERT INTO people (user_id, name, email, age) VALUES (?1, ?2, ?3, ?4)",
            params![id, format!("P{id}"), format!("p{id}@example.com"), age],
        )?;
    }

    let store = SqliteStore::new(SqliteConfig::new(temp_file.path()).with_fetch_size(1));
    let users = UserTable::new(&store, "people");
    let ids: Vec<String> = users
        .stream_records()
        .map(|r| r.map(|r| r.user_id))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(ids, ["2", "7", "10"]);
    Ok(())
}

#[test]
fn test_stream_keeps_row_at_minimum_rowid() -> Result<()> {
    let temp_file = tempfile::NamedTempFile::new().unwrap();
    let conn = Connection::open(temp_file.path())?;
    conn.execute_batch(
        r#"
        CREATE TABLE people (
            user_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            age INTEGER
        );
        "#,
    )?;
    for (id, age) in [(i64::MIN, 33), (5, 44)] {
        conn.execute(
            "INSERT INTO people (user_id, name, email, age) VALUES (?1, ?2, ?3, ?4)",
            params![id, format!("P{id}"), format!("p{id}@example.com"), age],
        )?;
    }

    for fetch_size in [1, 256] {
        let store =
            SqliteStore::new(SqliteConfig::new(temp_file.path()).with_fetch_size(fetch_size));
        let users = UserTable::new(&store, "people");

        let ids: Vec<String> = users
            .stream_records()
            .map(|r| r.map(|r| r.user_id))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(ids, [i64::MIN.to_string(), "5".to_string()]);

        let paged: usize = users
            .lazy_paginate(10)
            .unwrap()
            .map(|p| p.map(|p| p.len()))
            .sum::<Result<usize, _>>()
            .unwrap();
        assert_eq!(paged, ids.len());
    }
    Ok(())
}

#[test]
fn test_huge_page_size_on_disk() -> Result<()> {
    let db = create_temp_db(&ages(&[20, 30]))?;
    let store = SqliteStore::new(SqliteConfig::new(db.path()));
    let users = UserTable::new(&store, "user_data");

    assert_eq!(users.fetch_page(usize::MAX, 0).unwrap().len(), 2);
    assert_eq!(users.stream_batches(usize::MAX).unwrap().count(), 1);
    Ok(())
}
