//! The fixed set of pragmas a dump captures and restores, and the three
//! points in the load pipeline at which each one must be applied: some
//! pragmas only take effect before any table exists, some only inside
//! the restore transaction, and some only after it commits.

use format::{Cell, SqlBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PragmaPhase {
    /// Applied before the restore transaction begins (changes the file
    /// format itself, so no writes can have happened yet).
    Pre,
    /// Applied inside the restore transaction.
    In,
    /// Applied after the restore transaction commits.
    Post,
}

const PRAGMA_DEFS: &[(&str, PragmaPhase)] = &[
    ("page_size", PragmaPhase::Pre),
    ("auto_vacuum", PragmaPhase::Pre),
    ("application_id", PragmaPhase::In),
    ("user_version", PragmaPhase::In),
    ("journal_mode", PragmaPhase::Post),
];

impl PragmaPhase {
    pub fn code(self) -> i64 {
        match self {
            PragmaPhase::Pre => 10,
            PragmaPhase::In => 20,
            PragmaPhase::Post => 30,
        }
    }

    pub fn from_code(code: i64) -> Option<PragmaPhase> {
        match code {
            10 => Some(PragmaPhase::Pre),
            20 => Some(PragmaPhase::In),
            30 => Some(PragmaPhase::Post),
            _ => None,
        }
    }
}

pub fn phase_for(name: &str) -> Option<PragmaPhase> {
    PRAGMA_DEFS.iter().find(|(n, _)| *n == name).map(|(_, phase)| *phase)
}

pub fn known_pragma_names() -> impl Iterator<Item = &'static str> {
    PRAGMA_DEFS.iter().map(|(name, _)| *name)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PragmaRecord {
    pub phase: PragmaPhase,
    pub name: String,
    pub value: Cell,
}

/// A caller-supplied pragma override, in `name=value` or bare `name`
/// syntax. A bare name suppresses that pragma entirely on load, even if
/// the dump recorded a value for it.
#[derive(Debug, Clone, PartialEq)]
pub enum Override {
    Set(String, Cell),
    Suppress(String),
}

pub fn parse_override(spec: &str) -> Override {
    match spec.split_once('=') {
        Some((name, value)) => Override::Set(name.to_string(), parse_literal(value)),
        None => Override::Suppress(spec.to_string()),
    }
}

fn parse_literal(value: &str) -> Cell {
    if value.eq_ignore_ascii_case("null") {
        Cell::Null
    } else if let Ok(i) = value.parse::<i64>() {
        Cell::Integer(i)
    } else if let Ok(f) = value.parse::<f64>() {
        Cell::Float(f)
    } else {
        Cell::Text(value.to_string())
    }
}

/// Applies `overrides` to `records`: a `Set` override replaces the value of
/// a matching record, a `Suppress` override drops it. An override naming a
/// pragma the dump never captured is silently ignored either way — the
/// caller cannot use an override to inject a new pragma.
pub fn apply_overrides(records: Vec<PragmaRecord>, overrides: &[String]) -> Vec<PragmaRecord> {
    let parsed: Vec<Override> = overrides.iter().map(|s| parse_override(s)).collect();

    records
        .into_iter()
        .filter(|r| !parsed.iter().any(|o| matches!(o, Override::Suppress(n) if n == &r.name)))
        .map(|mut r| {
            if let Some(Override::Set(_, value)) =
                parsed.iter().find(|o| matches!(o, Override::Set(n, _) if n == &r.name))
            {
                r.value = value.clone();
            }
            r
        })
        .collect()
}

pub fn render_assignment(name: &str, value: &Cell) -> String {
    let mut builder = SqlBuilder::new();
    builder.append_str("PRAGMA ").append_ident(name).append_str(" = ").append_cell(value);
    builder.finish()
}
