//! Catalog introspection shared by the store and load pipelines, so
//! neither one hard-codes a table's column layout: the store side needs
//! every column's name (to build a `SELECT`), the load side only needs
//! the count (to detect a dump/target width mismatch).

use rusqlite::Connection;

use common::err::{CResult, DumpError};
use format::SqlBuilder;

/// Column names for `table`, in declared order, via `pragma table_info`.
/// Returns an empty vector if `table` does not exist in the target
/// database — callers that need "does this table exist" treat that as a
/// zero column count rather than a distinct case.
pub fn table_column_names(conn: &Connection, table: &str) -> CResult<Vec<String>> {
    let mut sql = SqlBuilder::new();
    sql.append_str("PRAGMA table_info(").append_ident(table).append_str(")");

    let mut stmt = conn
        .prepare(sql.as_str())
        .map_err(|e| DumpError::engine("preparing table_info query", e))?;
    let mut rows = stmt
        .query([])
        .map_err(|e| DumpError::engine("running table_info query", e))?;

    let mut columns = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|e| DumpError::engine("reading table_info row", e))?
    {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}
