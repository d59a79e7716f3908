//! Catalog entries captured from `sqlite_schema`, classified into the
//! phase that determines the order objects are recreated in on load:
//! ordinary tables and their data first, then indexes, then virtual
//! tables (via the `writable_schema` back door), then views, then
//! triggers — so that nothing references an object that doesn't exist
//! yet.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SchemaPhase {
    Table,
    Index,
    VirtualTable,
    View,
    Trigger,
}

impl SchemaPhase {
    pub fn code(self) -> i64 {
        match self {
            SchemaPhase::Table => 10,
            SchemaPhase::Index => 20,
            SchemaPhase::VirtualTable => 30,
            SchemaPhase::View => 40,
            SchemaPhase::Trigger => 50,
        }
    }

    pub fn from_code(code: i64) -> Option<SchemaPhase> {
        match code {
            10 => Some(SchemaPhase::Table),
            20 => Some(SchemaPhase::Index),
            30 => Some(SchemaPhase::VirtualTable),
            40 => Some(SchemaPhase::View),
            50 => Some(SchemaPhase::Trigger),
            _ => None,
        }
    }
}

/// Classifies a `sqlite_schema` row by its `type` column and, for tables,
/// by whether its `sql` names a virtual table.
pub fn classify(kind: &str, sql: Option<&str>) -> Option<SchemaPhase> {
    match kind {
        "table" => {
            let is_virtual = sql
                .map(|s| s.to_ascii_lowercase().contains("virtual table"))
                .unwrap_or(false);
            Some(if is_virtual { SchemaPhase::VirtualTable } else { SchemaPhase::Table })
        }
        "index" => Some(SchemaPhase::Index),
        "view" => Some(SchemaPhase::View),
        "trigger" => Some(SchemaPhase::Trigger),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaRecord {
    pub phase: SchemaPhase,
    pub name: String,
    pub sql: String,
}

pub fn is_sqlite_sequence(name: &str) -> bool {
    name == "sqlite_sequence"
}

pub fn is_sqlite_stat(name: &str) -> bool {
    name.starts_with("sqlite_stat")
}
