//! Load pipeline: a small state machine that validates the header,
//! ingests the pragmas and schema row-sets, creates objects in the order
//! the target database requires, and ingests each table's data — all
//! inside one immediate write transaction, except the pre- and
//! post-transaction pragma phases which by definition run outside it.
//!
//! States run strictly in the order below; any failure unwinds through
//! `?` into the caller, and the RAII guards (`WriteTxnGuard`, the
//! defensive-mode restore in [`load`]) undo their setup on the way out.

use std::io::Read;

use rusqlite::config::DbConfig;
use rusqlite::Connection;

use common::err::{CResult, DumpError};
use format::{Cell, Header, RowSetReader, SqlBuilder, TextEncoding};

use crate::convert::cell_to_value;
use crate::flags::LoadFlags;
use crate::introspect::table_column_names;
use crate::pragma::{self, PragmaPhase, PragmaRecord};
use crate::schema::{self, SchemaPhase, SchemaRecord};

pub fn load(
    conn: &Connection,
    input: &mut dyn Read,
    flags: LoadFlags,
    overrides: &[String],
) -> CResult<()> {
    with_defensive_disabled(conn, || load_inner(conn, input, flags, overrides))
}

fn load_inner(
    conn: &Connection,
    input: &mut dyn Read,
    flags: LoadFlags,
    overrides: &[String],
) -> CResult<()> {
    // PREPARE
    assert_pristine(conn)?;
    conn.execute_batch("PRAGMA foreign_keys = OFF")
        .map_err(|e| DumpError::engine("disabling foreign key enforcement", e))?;

    // HEADER
    let header = Header::read(input).map_err(DumpError::from)?;
    let encoding = header.encoding;
    tracing::debug!(?encoding, "restoring dump");

    // PRAGMAS_IN
    let pragmas = pragma::apply_overrides(ingest_pragmas(input, encoding)?, overrides);
    set_database_encoding(conn, encoding)?;

    // PRAGMAS_PRE
    apply_pragma_phase(conn, &pragmas, PragmaPhase::Pre, "applying pre-transaction pragma")?;

    // BEGIN
    let txn = WriteTxnGuard::begin(conn)?;

    // PRAGMAS_IN_TXN
    apply_pragma_phase(conn, &pragmas, PragmaPhase::In, "applying in-transaction pragma")?;

    // SCHEMA_IN
    let ingest = ingest_schema(input, encoding)?;

    // SYSTEM_TABLES
    materialize_system_tables(conn, &ingest)?;

    // OBJECTS_TABLE
    create_objects(conn, &ingest.records, SchemaPhase::Table, "creating table")?;

    // DATA
    if !flags.contains(LoadFlags::SCHEMA_ONLY) {
        ingest_data(conn, input, encoding)?;
    }

    // OBJECTS_INDEX
    create_objects(conn, &ingest.records, SchemaPhase::Index, "creating index")?;

    // OBJECTS_VIRTUAL
    if ingest.want_virtuals {
        create_virtual_tables(conn, &ingest.records)?;
    }

    // OBJECTS_VIEW
    create_objects(conn, &ingest.records, SchemaPhase::View, "creating view")?;

    // OBJECTS_TRIGGER
    create_objects(conn, &ingest.records, SchemaPhase::Trigger, "creating trigger")?;

    // COMMIT
    txn.commit()?;

    // PRAGMAS_POST
    apply_pragma_phase(conn, &pragmas, PragmaPhase::Post, "applying post-transaction pragma")?;

    // FINISH: defensive-mode restore happens in the `with_defensive_disabled`
    // wrapper; there are no scratch tables to drop (they never existed as
    // real tables, only as the in-memory vectors built up above).
    tracing::info!("restore complete");
    Ok(())
}

fn with_defensive_disabled<T>(conn: &Connection, f: impl FnOnce() -> CResult<T>) -> CResult<T> {
    let prior = conn
        .db_config(DbConfig::SQLiteDbConfigDefensive)
        .map_err(|e| DumpError::engine("reading defensive mode", e))?;
    conn.set_db_config(DbConfig::SQLiteDbConfigDefensive, false)
        .map_err(|e| DumpError::engine("disabling defensive mode", e))?;

    let result = f();

    let _ = conn.set_db_config(DbConfig::SQLiteDbConfigDefensive, prior);
    result
}

fn assert_pristine(conn: &Connection) -> CResult<()> {
    let page_count: i64 = conn
        .query_row("PRAGMA page_count", [], |row| row.get(0))
        .map_err(|e| DumpError::engine("reading page_count", e))?;
    if page_count != 0 {
        return Err(DumpError::precondition(
            "restore target must be an empty (zero-page) database",
        ));
    }
    Ok(())
}

fn set_database_encoding(conn: &Connection, encoding: TextEncoding) -> CResult<()> {
    let mut sql = SqlBuilder::new();
    sql.append_str("PRAGMA encoding = ").append_literal(encoding.pragma_name());
    conn.execute_batch(sql.as_str())
        .map_err(|e| DumpError::engine("setting database text encoding", e))
}

fn apply_pragma_phase(
    conn: &Connection,
    records: &[PragmaRecord],
    phase: PragmaPhase,
    activity: &'static str,
) -> CResult<()> {
    for r in records.iter().filter(|r| r.phase == phase) {
        conn.execute_batch(&pragma::render_assignment(&r.name, &r.value))
            .map_err(|e| DumpError::engine(activity, e))?;
    }
    Ok(())
}

fn ingest_pragmas(input: &mut dyn Read, encoding: TextEncoding) -> CResult<Vec<PragmaRecord>> {
    let (mut reader, head) = RowSetReader::open(input, encoding).map_err(DumpError::from)?;
    if head.name != "pragmas" || head.ncols != 3 {
        return Err(DumpError::corrupt(format!(
            "expected a 3-column row-set named \"pragmas\", got {:?} with {} columns",
            head.name, head.ncols
        )));
    }

    let mut records = Vec::new();
    while let Some(row) = reader.next_row().map_err(DumpError::from)? {
        let [phase_cell, name_cell, value_cell]: [Cell; 3] =
            row.try_into().map_err(|_| DumpError::corrupt("pragma row has wrong arity"))?;
        let phase_code = match phase_cell {
            Cell::Integer(i) => i,
            _ => return Err(DumpError::corrupt("pragma row phase is not an integer")),
        };
        let phase = PragmaPhase::from_code(phase_code)
            .ok_or_else(|| DumpError::corrupt(format!("unrecognized pragma phase {phase_code}")))?;
        let name = match name_cell {
            Cell::Text(s) => s,
            _ => return Err(DumpError::corrupt("pragma row name is not text")),
        };
        records.push(PragmaRecord { phase, name, value: value_cell });
    }
    Ok(records)
}

/// The schema row-set's contents, split by the two side-effect flags that
/// must *not* be stored as ordinary rows: a captured
/// `sqlite_sequence` or `sqlite_stat*` table just sets a flag so
/// [`materialize_system_tables`] can recreate it by side effect instead of
/// replaying its `CREATE TABLE` (which the engine builds those tables
/// itself and won't accept a second, identical definition for).
struct SchemaIngest {
    records: Vec<SchemaRecord>,
    want_sequence: bool,
    want_stat: bool,
    want_virtuals: bool,
}

fn ingest_schema(input: &mut dyn Read, encoding: TextEncoding) -> CResult<SchemaIngest> {
    let (mut reader, head) = RowSetReader::open(input, encoding).map_err(DumpError::from)?;
    if head.name != "schema" || head.ncols != 3 {
        return Err(DumpError::corrupt(format!(
            "expected a 3-column row-set named \"schema\", got {:?} with {} columns",
            head.name, head.ncols
        )));
    }

    let mut records = Vec::new();
    let mut want_sequence = false;
    let mut want_stat = false;
    let mut want_virtuals = false;

    while let Some(row) = reader.next_row().map_err(DumpError::from)? {
        let [phase_cell, name_cell, sql_cell]: [Cell; 3] =
            row.try_into().map_err(|_| DumpError::corrupt("schema row has wrong arity"))?;
        let phase_code = match phase_cell {
            Cell::Integer(i) => i,
            _ => return Err(DumpError::corrupt("schema row phase is not an integer")),
        };
        let phase = SchemaPhase::from_code(phase_code)
            .ok_or_else(|| DumpError::corrupt(format!("unrecognized schema phase {phase_code}")))?;
        let name = match name_cell {
            Cell::Text(s) => s,
            _ => return Err(DumpError::corrupt("schema row name is not text")),
        };
        let sql = match sql_cell {
            Cell::Text(s) => s,
            _ => return Err(DumpError::corrupt("schema row sql is not text")),
        };

        if phase == SchemaPhase::VirtualTable {
            want_virtuals = true;
        }
        if phase == SchemaPhase::Table && schema::is_sqlite_sequence(&name) {
            want_sequence = true;
            continue;
        }
        if phase == SchemaPhase::Table && schema::is_sqlite_stat(&name) {
            want_stat = true;
            continue;
        }

        records.push(SchemaRecord { phase, name, sql });
    }

    Ok(SchemaIngest { records, want_sequence, want_stat, want_virtuals })
}

fn materialize_system_tables(conn: &Connection, ingest: &SchemaIngest) -> CResult<()> {
    if ingest.want_sequence {
        conn.execute_batch(
            "CREATE TABLE s3bd_seed_autoincrement(id INTEGER PRIMARY KEY AUTOINCREMENT); \
             DROP TABLE s3bd_seed_autoincrement;",
        )
        .map_err(|e| DumpError::engine("materializing sqlite_sequence", e))?;
    }
    if ingest.want_stat {
        conn.execute_batch("ANALYZE sqlite_schema")
            .map_err(|e| DumpError::engine("materializing sqlite_stat tables", e))?;
    }
    Ok(())
}

fn create_objects(
    conn: &Connection,
    records: &[SchemaRecord],
    phase: SchemaPhase,
    activity: &'static str,
) -> CResult<()> {
    for r in records.iter().filter(|r| r.phase == phase) {
        conn.execute_batch(&r.sql).map_err(|e| DumpError::engine(activity, e))?;
    }
    Ok(())
}

/// Virtual tables can't be recreated by replaying their `CREATE VIRTUAL
/// TABLE` DDL: doing so would invoke the module's constructor again and
/// collide with the shadow tables that were already restored as ordinary
/// `Table`-phase objects. Instead, write the catalog entry directly
/// through the `writable_schema` back door, which the module never sees.
fn create_virtual_tables(conn: &Connection, records: &[SchemaRecord]) -> CResult<()> {
    conn.execute_batch("PRAGMA writable_schema = ON")
        .map_err(|e| DumpError::engine("enabling writable_schema", e))?;

    let result = (|| -> CResult<()> {
        for r in records.iter().filter(|r| r.phase == SchemaPhase::VirtualTable) {
            conn.execute(
                "INSERT INTO sqlite_schema (type, name, tbl_name, rootpage, sql) VALUES ('table', ?1, ?1, 0, ?2)",
                rusqlite::params![r.name, r.sql],
            )
            .map_err(|e| DumpError::engine("inserting virtual table catalog entry", e))?;
        }
        Ok(())
    })();

    conn.execute_batch("PRAGMA writable_schema = OFF")
        .map_err(|e| DumpError::engine("disabling writable_schema", e))?;

    result
}

fn ingest_data(conn: &Connection, input: &mut dyn Read, encoding: TextEncoding) -> CResult<()> {
    loop {
        let opened = RowSetReader::open_or_end(input, encoding).map_err(DumpError::from)?;
        let (mut reader, head) = match opened {
            None => break,
            Some(x) => x,
        };

        let current_ncols = table_column_names(conn, &head.name)?.len();
        let tolerate_mismatch = schema::is_sqlite_stat(&head.name);

        if head.ncols != current_ncols {
            if tolerate_mismatch {
                tracing::debug!(table = %head.name, dump_cols = head.ncols, target_cols = current_ncols, "discarding unsupported sqlite_stat* rows");
                while reader.next_row().map_err(DumpError::from)?.is_some() {}
                continue;
            }
            return Err(DumpError::corrupt(format!(
                "table {:?} has {} columns in the dump but {} in the target database",
                head.name, head.ncols, current_ncols
            )));
        }

        if schema::is_sqlite_sequence(&head.name) {
            conn.execute("DELETE FROM sqlite_sequence", [])
                .map_err(|e| DumpError::engine("clearing sqlite_sequence", e))?;
        }

        let insert_sql = build_insert(&head.name, head.ncols);
        let mut stmt = conn
            .prepare(&insert_sql)
            .map_err(|e| DumpError::engine("preparing table insert", e))?;

        while let Some(row) = reader.next_row().map_err(DumpError::from)? {
            let values: Vec<rusqlite::types::Value> = row.iter().map(cell_to_value).collect();
            stmt.execute(rusqlite::params_from_iter(values))
                .map_err(|e| DumpError::engine("inserting table row", e))?;
        }
    }
    Ok(())
}

fn build_insert(table: &str, ncols: usize) -> String {
    let mut sql = SqlBuilder::new();
    sql.append_str("INSERT INTO ").append_ident(table).append_str(" VALUES(");
    for i in 0..ncols {
        if i > 0 {
            sql.append_str(",");
        }
        sql.append_str(&format!("?{}", i + 1));
    }
    sql.append_str(")");
    sql.finish()
}

/// Holds the restore's write transaction and rolls it back on drop unless
/// [`WriteTxnGuard::commit`] ran first — every early `?` return between
/// `BEGIN` and `COMMIT` takes this path automatically.
struct WriteTxnGuard<'c> {
    conn: &'c Connection,
    committed: bool,
}

impl<'c> WriteTxnGuard<'c> {
    fn begin(conn: &'c Connection) -> CResult<Self> {
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| DumpError::engine("beginning restore transaction", e))?;
        Ok(WriteTxnGuard { conn, committed: false })
    }

    fn commit(mut self) -> CResult<()> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| DumpError::engine("committing restore transaction", e))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for WriteTxnGuard<'_> {
    fn drop(&mut self) {
        if !self.committed {
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn build_insert_renders_positional_placeholders() {
        assert_eq!(build_insert("t", 3), "INSERT INTO \"t\" VALUES(?1,?2,?3)");
    }
}
