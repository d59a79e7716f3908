//! Bridges `rusqlite`'s dynamically-typed column values to [`format::Cell`].

use format::Cell;
use rusqlite::types::{Value, ValueRef};

/// Converts a borrowed column value straight off a `Row` into a `Cell`,
/// without the caller needing to clone into an owned `rusqlite::Value`
/// first.
pub fn value_ref_to_cell(value: ValueRef<'_>) -> Cell {
    match value {
        ValueRef::Null => Cell::Null,
        ValueRef::Integer(i) => Cell::Integer(i),
        ValueRef::Real(f) => Cell::Float(f),
        ValueRef::Text(t) => Cell::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Cell::Blob(b.to_vec()),
    }
}

pub fn value_to_cell(value: Value) -> Cell {
    match value {
        Value::Null => Cell::Null,
        Value::Integer(i) => Cell::Integer(i),
        Value::Real(f) => Cell::Float(f),
        Value::Text(s) => Cell::Text(s),
        Value::Blob(b) => Cell::Blob(b),
    }
}

pub fn cell_to_value(cell: &Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Integer(i) => Value::Integer(*i),
        Cell::Float(f) => Value::Real(*f),
        Cell::Text(s) => Value::Text(s.clone()),
        Cell::Blob(b) => Value::Blob(b.clone()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_every_shape() {
        for value in [
            Value::Null,
            Value::Integer(7),
            Value::Real(1.5),
            Value::Text("x".into()),
            Value::Blob(vec![1, 2, 3]),
        ] {
            let cell = value_to_cell(value.clone());
            assert_eq!(cell_to_value(&cell), value);
        }
    }

    #[test]
    fn value_ref_matches_owned_value_conversion() {
        assert_eq!(value_ref_to_cell(ValueRef::Integer(9)), value_to_cell(Value::Integer(9)));
        assert_eq!(value_ref_to_cell(ValueRef::Text(b"hi")), Cell::Text("hi".into()));
    }
}
