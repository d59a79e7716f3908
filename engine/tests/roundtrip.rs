//! End-to-end store/load round trips against real in-memory SQLite
//! databases. Unlike a server-backed integration suite, nothing here needs
//! an external process: `rusqlite`'s `bundled` feature embeds SQLite
//! itself, so every scenario spins up its own throwaway database.

use rusqlite::Connection;

use engine::{load, store, LoadFlags, StoreFlags};

fn dump(conn: &Connection) -> Vec<u8> {
    let mut buf = Vec::new();
    store(conn, &mut buf, StoreFlags::empty(), &[]).expect("store should succeed");
    buf
}

fn restore(bytes: &[u8]) -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    let mut cursor = bytes;
    load(&conn, &mut cursor, LoadFlags::empty(), &[]).expect("load should succeed");
    conn
}

#[test]
fn empty_database_round_trips() {
    let source = Connection::open_in_memory().unwrap();
    let bytes = dump(&source);

    assert_eq!(&bytes[0..5], b"S3BD\x1A");
    assert_eq!(bytes[5], 0); // major
    assert_eq!(bytes[6], 0); // minor
    assert_eq!(bytes[7], 1); // UTF-8

    let restored = restore(&bytes);
    let table_count: i64 = restored
        .query_row("SELECT count(*) FROM sqlite_schema WHERE type = 'table'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(table_count, 0);
}

#[test]
fn integers_round_trip_across_width_boundaries() {
    let source = Connection::open_in_memory().unwrap();
    source
        .execute_batch(
            "CREATE TABLE t(x INTEGER); \
             INSERT INTO t VALUES (0), (127), (128), (-1), (9223372036854775807);",
        )
        .unwrap();

    let restored = restore(&dump(&source));
    let mut stmt = restored.prepare("SELECT x FROM t ORDER BY rowid").unwrap();
    let values: Vec<i64> = stmt.query_map([], |r| r.get(0)).unwrap().map(|r| r.unwrap()).collect();
    assert_eq!(values, vec![0, 127, 128, -1, i64::MAX]);
}

#[test]
fn text_and_blob_and_float_round_trip() {
    let source = Connection::open_in_memory().unwrap();
    source
        .execute_batch("CREATE TABLE t(s TEXT, b BLOB, f REAL, n INTEGER);")
        .unwrap();
    source
        .execute(
            "INSERT INTO t VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params!["hello world", vec![0u8, 1, 2, 255], 3.5_f64, rusqlite::types::Null],
        )
        .unwrap();

    let restored = restore(&dump(&source));
    let (s, b, f): (String, Vec<u8>, f64) = restored
        .query_row("SELECT s, b, f FROM t", [], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
        .unwrap();
    assert_eq!(s, "hello world");
    assert_eq!(b, vec![0u8, 1, 2, 255]);
    assert_eq!(f, 3.5);

    let n: rusqlite::types::Value =
        restored.query_row("SELECT n FROM t", [], |r| r.get(0)).unwrap();
    assert_eq!(n, rusqlite::types::Value::Null);
}

#[test]
fn schema_only_dump_reproduces_schema_with_no_rows() {
    let source = Connection::open_in_memory().unwrap();
    source.execute_batch("CREATE TABLE t(x INTEGER); INSERT INTO t VALUES (1), (2), (3);").unwrap();

    let mut buf = Vec::new();
    store(&source, &mut buf, StoreFlags::SCHEMA_ONLY, &[]).unwrap();

    let target = Connection::open_in_memory().unwrap();
    let mut cursor = &buf[..];
    load(&target, &mut cursor, LoadFlags::SCHEMA_ONLY, &[]).unwrap();

    let count: i64 = target.query_row("SELECT count(*) FROM t", [], |r| r.get(0)).unwrap();
    assert_eq!(count, 0);

    let sql: String = target
        .query_row("SELECT sql FROM sqlite_schema WHERE name = 't'", [], |r| r.get(0))
        .unwrap();
    assert!(sql.to_ascii_lowercase().contains("create table"));
}

#[test]
fn pragma_override_replaces_captured_value() {
    let source = Connection::open_in_memory().unwrap();
    source.execute_batch("PRAGMA page_size = 4096; CREATE TABLE t(x);").unwrap();
    // `page_size` can only be changed before any table exists, so re-derive
    // a source with the override applied directly to compare against, and
    // separately confirm the override reaches the emitted pragmas row-set.
    let mut buf = Vec::new();
    store(&source, &mut buf, StoreFlags::empty(), &["page_size=8192".to_string()]).unwrap();

    // `page_size` only takes effect on a fresh database, matching the
    // restore pipeline's PRE phase (before any table is created).
    let target = Connection::open_in_memory().unwrap();
    let mut cursor = &buf[..];
    load(&target, &mut cursor, LoadFlags::empty(), &[]).unwrap();
    let page_size: i64 = target.query_row("PRAGMA page_size", [], |r| r.get(0)).unwrap();
    assert_eq!(page_size, 8192);
}

#[test]
fn autoincrement_sequence_round_trips() {
    let source = Connection::open_in_memory().unwrap();
    source
        .execute_batch(
            "CREATE TABLE t(id INTEGER PRIMARY KEY AUTOINCREMENT, v TEXT); \
             INSERT INTO t(v) VALUES ('a'), ('b'); \
             DELETE FROM t WHERE id = 2;",
        )
        .unwrap();
    let seq_before: i64 = source
        .query_row("SELECT seq FROM sqlite_sequence WHERE name = 't'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(seq_before, 2);

    let restored = restore(&dump(&source));
    let seq_after: i64 = restored
        .query_row("SELECT seq FROM sqlite_sequence WHERE name = 't'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(seq_after, seq_before);

    let rows: Vec<(i64, String)> = restored
        .prepare("SELECT id, v FROM t ORDER BY id")
        .unwrap()
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(rows, vec![(1, "a".to_string())]);
}

#[test]
fn utf16_database_round_trips_with_byte_swapped_wire_text() {
    let source = Connection::open_in_memory().unwrap();
    // `encoding` can only be changed before any table exists.
    source.execute_batch("PRAGMA encoding = 'UTF-16le';").unwrap();
    source
        .execute_batch("CREATE TABLE t(name TEXT); INSERT INTO t VALUES ('caf\u{e9}');")
        .unwrap();

    let bytes = dump(&source);
    assert_eq!(bytes[7], 2); // UTF-16LE tag from format::encoding::TextEncoding

    let restored = restore(&bytes);
    let encoding: String = restored.query_row("PRAGMA encoding", [], |r| r.get(0)).unwrap();
    assert_eq!(encoding, "UTF-16le");

    let name: String = restored.query_row("SELECT name FROM t", [], |r| r.get(0)).unwrap();
    assert_eq!(name, "caf\u{e9}");
}

#[test]
fn virtual_table_restores_via_catalog_back_door() {
    let source = Connection::open_in_memory().unwrap();
    let created = source.execute_batch("CREATE VIRTUAL TABLE docs USING fts5(body);");
    if created.is_err() {
        // fts5 may be unavailable in a minimal SQLite build; skip rather
        // than fail a build-configuration question this test isn't about.
        return;
    }
    source.execute("INSERT INTO docs(body) VALUES ('hello world')", []).unwrap();

    let restored = restore(&dump(&source));
    let body: String = restored
        .query_row("SELECT body FROM docs WHERE docs MATCH 'hello'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(body, "hello world");
}

/// Hand-assembles a dump stream (header, empty pragmas row-set, one schema
/// row-set entry per `tables`, then one data row-set per `(name, row)` in
/// `rows`) bypassing `engine::store` entirely, so the column-count-mismatch
/// paths in `ingest_data` can be driven with widths a real `ANALYZE` output
/// would never actually produce.
fn build_raw_dump(tables: &[(&str, &str)], rows: &[(&str, Vec<format::Cell>)]) -> Vec<u8> {
    use format::{Header, RowSetWriter, Tag, TextEncoding};

    let mut buf = Vec::new();
    Header::current(TextEncoding::Utf8).write(&mut buf).unwrap();

    RowSetWriter::open(&mut buf, TextEncoding::Utf8, "pragmas", 3).unwrap().finish().unwrap();

    let mut schema = RowSetWriter::open(&mut buf, TextEncoding::Utf8, "schema", 3).unwrap();
    for (name, sql) in tables {
        schema
            .write_row(&[format::Cell::Integer(10), format::Cell::Text((*name).into()), format::Cell::Text((*sql).into())])
            .unwrap();
    }
    schema.finish().unwrap();

    for (name, row) in rows {
        let mut writer = RowSetWriter::open(&mut buf, TextEncoding::Utf8, name, row.len()).unwrap();
        writer.write_row(row).unwrap();
        writer.finish().unwrap();
    }

    buf.push(Tag::EndDump.encode());
    buf
}

#[test]
fn sqlite_stat_column_count_mismatch_is_silently_tolerated() {
    // The dump claims 4 columns for `sqlite_stat4`; a target engine without
    // STAT4 support only ever materializes `sqlite_stat1` via ANALYZE, so
    // `sqlite_stat4` doesn't exist in the target and reports 0 columns. That
    // mismatch must be discarded, not treated as corruption.
    let bytes = build_raw_dump(
        &[("t", "CREATE TABLE t(x)"), ("sqlite_stat4", "")],
        &[(
            "sqlite_stat4",
            vec![
                format::Cell::Text("t".into()),
                format::Cell::Text("idx".into()),
                format::Cell::Integer(1),
                format::Cell::Text("1 1".into()),
            ],
        )],
    );

    let target = Connection::open_in_memory().unwrap();
    let mut cursor = &bytes[..];
    load(&target, &mut cursor, LoadFlags::empty(), &[]).expect("stat4 mismatch must be tolerated");

    let count: i64 = target.query_row("SELECT count(*) FROM t", [], |r| r.get(0)).unwrap();
    assert_eq!(count, 0);
}

#[test]
fn ordinary_table_column_count_mismatch_is_corrupt() {
    // `t` has one column in the target schema but the data row-set claims 2.
    let bytes = build_raw_dump(
        &[("t", "CREATE TABLE t(x)")],
        &[("t", vec![format::Cell::Integer(1), format::Cell::Integer(2)])],
    );

    let target = Connection::open_in_memory().unwrap();
    let mut cursor = &bytes[..];
    let err = load(&target, &mut cursor, LoadFlags::empty(), &[]).unwrap_err();
    assert!(err.to_string().contains("columns"));
}

#[test]
fn corrupt_magic_is_rejected_and_target_stays_empty() {
    let source = Connection::open_in_memory().unwrap();
    source.execute_batch("CREATE TABLE t(x); INSERT INTO t VALUES (1);").unwrap();
    let mut bytes = dump(&source);
    bytes[0] ^= 0xFF;

    let target = Connection::open_in_memory().unwrap();
    let mut cursor = &bytes[..];
    let err = load(&target, &mut cursor, LoadFlags::empty(), &[]).unwrap_err();
    assert!(err.to_string().contains("magic") || err.to_string().contains("corrupt"));

    let table_count: i64 = target
        .query_row("SELECT count(*) FROM sqlite_schema WHERE type = 'table'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(table_count, 0);
}

#[test]
fn truncated_row_set_is_rejected() {
    let source = Connection::open_in_memory().unwrap();
    source.execute_batch("CREATE TABLE t(x); INSERT INTO t VALUES (1), (2), (3);").unwrap();
    let mut bytes = dump(&source);
    bytes.truncate(bytes.len() - 3);

    let target = Connection::open_in_memory().unwrap();
    let mut cursor = &bytes[..];
    assert!(load(&target, &mut cursor, LoadFlags::empty(), &[]).is_err());
}

#[test]
fn load_refuses_a_non_empty_target() {
    let source = Connection::open_in_memory().unwrap();
    let bytes = dump(&source);

    let target = Connection::open_in_memory().unwrap();
    target.execute_batch("CREATE TABLE already_here(x);").unwrap();

    let mut cursor = &bytes[..];
    let err = load(&target, &mut cursor, LoadFlags::empty(), &[]).unwrap_err();
    assert!(err.to_string().contains("empty"));
}
