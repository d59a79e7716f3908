//! Store pipeline: header -> pragmas row-set -> schema row-set -> one
//! row-set per user table -> `EndDump`.
//!
//! The whole pass runs inside a read transaction that is always rolled
//! back when the function returns — a dump never needs to write anything
//! to the source database, and holding the transaction for the duration
//! keeps a concurrent writer from changing the database out from under a
//! multi-table dump.

use std::io::Write;
use std::time::Duration;

use rusqlite::Connection;

use common::err::{CResult, DumpError};
use format::{Cell, Header, RowSetWriter, Tag, TextEncoding};

use crate::convert::value_ref_to_cell;
use crate::flags::StoreFlags;
use crate::introspect::table_column_names;
use crate::pragma::{self, PragmaRecord};
use crate::schema::{self, SchemaPhase, SchemaRecord};

pub fn store(
    conn: &Connection,
    out: &mut dyn Write,
    flags: StoreFlags,
    overrides: &[String],
) -> CResult<()> {
    let _txn = ReadTxnGuard::begin(conn, flags.contains(StoreFlags::IN_TRANSACTION))?;

    let encoding = detect_encoding(conn)?;
    tracing::debug!(?encoding, "storing dump");
    Header::current(encoding).write(out).map_err(DumpError::from)?;

    let pragmas = pragma::apply_overrides(extract_pragmas(conn)?, overrides);
    tracing::debug!(count = pragmas.len(), "captured pragmas");
    emit_pragmas(out, encoding, &pragmas)?;

    let schema = extract_schema(conn)?;
    tracing::debug!(count = schema.len(), "captured schema objects");
    emit_schema(out, encoding, &schema)?;

    if !flags.contains(StoreFlags::SCHEMA_ONLY) {
        for table in ordered_table_names(&schema) {
            tracing::debug!(table = %table, "dumping table");
            dump_table(conn, out, encoding, &table)?;
        }
    } else {
        tracing::debug!("schema-only dump; skipping table data");
    }

    out.write_all(&[Tag::EndDump.encode()])
        .map_err(|e| DumpError::io("writing end-of-dump marker", e))?;
    out.flush().map_err(|e| DumpError::io("flushing dump output", e))?;

    tracing::info!("dump complete");
    Ok(())
}

/// Holds the read transaction open for the duration of a store pass and
/// rolls it back on every exit path, success included — the dump never
/// commits a write. A no-op if the caller already had one open.
struct ReadTxnGuard<'c> {
    conn: &'c Connection,
    owns_transaction: bool,
}

impl<'c> ReadTxnGuard<'c> {
    fn begin(conn: &'c Connection, already_in_transaction: bool) -> CResult<Self> {
        if !already_in_transaction {
            conn.busy_timeout(Duration::from_millis(i32::MAX as u64))
                .map_err(|e| DumpError::engine("setting busy timeout", e))?;
            conn.execute_batch("BEGIN")
                .map_err(|e| DumpError::engine("beginning read transaction", e))?;
        }
        Ok(ReadTxnGuard { conn, owns_transaction: !already_in_transaction })
    }
}

impl Drop for ReadTxnGuard<'_> {
    fn drop(&mut self) {
        if self.owns_transaction {
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}

fn detect_encoding(conn: &Connection) -> CResult<TextEncoding> {
    let name: String = conn
        .query_row("PRAGMA encoding", [], |row| row.get(0))
        .map_err(|e| DumpError::engine("reading database encoding", e))?;
    TextEncoding::from_pragma_name(&name)
        .ok_or_else(|| DumpError::internal(format!("database reports unrecognized encoding {name:?}")))
}

fn extract_pragmas(conn: &Connection) -> CResult<Vec<PragmaRecord>> {
    let mut records = Vec::new();
    for name in pragma::known_pragma_names() {
        let phase = pragma::phase_for(name).expect("known pragma name has a phase");
        let sql = format!("PRAGMA {name}");
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DumpError::engine("preparing pragma query", e))?;
        let mut rows = stmt.query([]).map_err(|e| DumpError::engine("running pragma query", e))?;
        while let Some(row) = rows.next().map_err(|e| DumpError::engine("reading pragma row", e))? {
            let value_ref = row.get_ref(0).map_err(|e| DumpError::engine("reading pragma value", e))?;
            records.push(PragmaRecord { phase, name: name.to_string(), value: value_ref_to_cell(value_ref) });
        }
    }
    Ok(records)
}

fn emit_pragmas(out: &mut dyn Write, encoding: TextEncoding, records: &[PragmaRecord]) -> CResult<()> {
    let mut writer = RowSetWriter::open(out, encoding, "pragmas", 3).map_err(DumpError::from)?;
    for r in records {
        writer
            .write_row(&[Cell::Integer(r.phase.code()), Cell::Text(r.name.clone()), r.value.clone()])
            .map_err(DumpError::from)?;
    }
    writer.finish().map_err(DumpError::from)
}

fn extract_schema(conn: &Connection) -> CResult<Vec<SchemaRecord>> {
    let mut records = Vec::new();
    let mut stmt = conn
        .prepare("SELECT type, name, sql FROM sqlite_schema WHERE sql IS NOT NULL")
        .map_err(|e| DumpError::engine("querying schema catalog", e))?;
    let mut rows = stmt.query([]).map_err(|e| DumpError::engine("querying schema catalog", e))?;

    while let Some(row) = rows.next().map_err(|e| DumpError::engine("reading schema row", e))? {
        let kind: String = row.get(0)?;
        let name: String = row.get(1)?;
        let sql: String = row.get(2)?;
        if let Some(phase) = schema::classify(&kind, Some(&sql)) {
            records.push(SchemaRecord { phase, name, sql });
        }
    }
    Ok(records)
}

fn emit_schema(out: &mut dyn Write, encoding: TextEncoding, records: &[SchemaRecord]) -> CResult<()> {
    let mut writer = RowSetWriter::open(out, encoding, "schema", 3).map_err(DumpError::from)?;
    for r in records {
        writer
            .write_row(&[Cell::Integer(r.phase.code()), Cell::Text(r.name.clone()), Cell::Text(r.sql.clone())])
            .map_err(DumpError::from)?;
    }
    writer.finish().map_err(DumpError::from)
}

/// Ordinary tables in name order, with `sqlite_sequence` forced last so
/// that restoring its rows (which replace the whole table) always
/// happens after every other table's `AUTOINCREMENT` inserts have already
/// advanced its counters. Chosen explicitly here rather than leaning on
/// a `sqlite_schema` query's incidental ordering, per the open question
/// in the source design.
fn ordered_table_names(records: &[SchemaRecord]) -> Vec<String> {
    let mut names: Vec<String> = records
        .iter()
        .filter(|r| r.phase == SchemaPhase::Table)
        .map(|r| r.name.clone())
        .collect();
    names.sort_by(|a, b| {
        schema::is_sqlite_sequence(a)
            .cmp(&schema::is_sqlite_sequence(b))
            .then_with(|| a.cmp(b))
    });
    names
}

fn dump_table(conn: &Connection, out: &mut dyn Write, encoding: TextEncoding, table: &str) -> CResult<()> {
    let columns = table_column_names(conn, table)?;
    if columns.is_empty() {
        return Err(DumpError::internal(format!("table {table:?} has no columns")));
    }

    let mut select = format::SqlBuilder::new();
    select.append_str("SELECT ");
    for (i, col) in columns.iter().enumerate() {
        if i > 0 {
            select.append_str(", ");
        }
        select.append_ident(col);
    }
    select.append_str(" FROM ").append_ident(table);

    let mut stmt = conn
        .prepare(select.as_str())
        .map_err(|e| DumpError::engine("preparing table select", e))?;
    let mut rows = stmt.query([]).map_err(|e| DumpError::engine("querying table rows", e))?;

    let mut writer = RowSetWriter::open(out, encoding, table, columns.len()).map_err(DumpError::from)?;
    while let Some(row) = rows.next().map_err(|e| DumpError::engine("reading table row", e))? {
        let mut cells = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            let value_ref = row.get_ref(i).map_err(|e| DumpError::engine("reading table cell", e))?;
            cells.push(value_ref_to_cell(value_ref));
        }
        writer.write_row(&cells).map_err(DumpError::from)?;
    }
    writer.finish().map_err(DumpError::from)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ordered_table_names_puts_sqlite_sequence_last() {
        let records = vec![
            SchemaRecord { phase: SchemaPhase::Table, name: "zebra".into(), sql: String::new() },
            SchemaRecord { phase: SchemaPhase::Table, name: "sqlite_sequence".into(), sql: String::new() },
            SchemaRecord { phase: SchemaPhase::Table, name: "apple".into(), sql: String::new() },
            SchemaRecord { phase: SchemaPhase::Index, name: "idx".into(), sql: String::new() },
        ];
        assert_eq!(ordered_table_names(&records), vec!["apple", "zebra", "sqlite_sequence"]);
    }
}
