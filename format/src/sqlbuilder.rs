//! Small SQL text builder for statements that cannot be parameterized —
//! mainly `PRAGMA name = value`, since SQLite does not accept bound
//! parameters in pragma statements. Row inserts go through `rusqlite`
//! bound parameters instead and never touch this builder.
//!
//! The original C implementation hand-rolled an append-only growable
//! buffer (`str_t`, doubling capacity by `cap + cap>>2`); `String`'s own
//! growth strategy replaces that here, so this type is a thin wrapper
//! around quoting and literal-rendering rules only.

use crate::cell::Cell;

#[derive(Debug, Default)]
pub struct SqlBuilder {
    buf: String,
}

impl SqlBuilder {
    pub fn new() -> Self {
        SqlBuilder { buf: String::new() }
    }

    pub fn append_str(&mut self, s: &str) -> &mut Self {
        self.buf.push_str(s);
        self
    }

    /// Appends a double-quoted identifier, doubling embedded quotes.
    pub fn append_ident(&mut self, ident: &str) -> &mut Self {
        self.buf.push('"');
        for ch in ident.chars() {
            if ch == '"' {
                self.buf.push('"');
            }
            self.buf.push(ch);
        }
        self.buf.push('"');
        self
    }

    /// Appends a single-quoted string literal, doubling embedded quotes.
    pub fn append_literal(&mut self, s: &str) -> &mut Self {
        self.buf.push('\'');
        for ch in s.chars() {
            if ch == '\'' {
                self.buf.push('\'');
            }
            self.buf.push(ch);
        }
        self.buf.push('\'');
        self
    }

    pub fn append_int(&mut self, i: i64) -> &mut Self {
        self.buf.push_str(&i.to_string());
        self
    }

    pub fn append_float(&mut self, f: f64) -> &mut Self {
        self.buf.push_str(&format!("{f:?}"));
        self
    }

    pub fn append_blob(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.push_str("x'");
        self.buf.push_str(&hex::encode_upper(bytes));
        self.buf.push('\'');
        self
    }

    /// Renders a cell value the way a pragma assignment's right-hand side
    /// expects it: bare for numbers, quoted for text, `NULL` for null.
    pub fn append_cell(&mut self, cell: &Cell) -> &mut Self {
        match cell {
            Cell::Null => {
                self.buf.push_str("NULL");
                self
            }
            Cell::Integer(i) => self.append_int(*i),
            Cell::Float(f) => self.append_float(*f),
            Cell::Text(s) => self.append_literal(s),
            Cell::Blob(b) => self.append_blob(b),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn finish(self) -> String {
        self.buf
    }
}
