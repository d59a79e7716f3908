//! The five cell shapes a row can hold, and their wire encoding: one tag
//! byte, optionally followed by a varint length and/or a value payload.

use std::io::{Read, Write};

use crate::encoding::TextEncoding;
use crate::error::{FResult, FormatError};
use crate::float;
use crate::tag::Tag;
use crate::varint;

/// A single column value as it travels through the dump stream. Mirrors
/// the SQLite storage classes directly: there is no separate "numeric"
/// class to worry about, since `rusqlite::types::Value` already resolves
/// that at the column level.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Cell {
    pub fn write(&self, encoding: TextEncoding, out: &mut dyn Write) -> FResult<()> {
        match self {
            Cell::Null => write_tag(out, Tag::Null),
            Cell::Integer(i) => {
                let (width, bytes) = varint::encode_sint(*i);
                write_tag(out, Tag::Int { width })?;
                out.write_all(&bytes)?;
                Ok(())
            }
            Cell::Float(f) => {
                let (width, bytes) = float::encode_float(*f);
                write_tag(out, Tag::Float { width })?;
                out.write_all(&bytes)?;
                Ok(())
            }
            Cell::Text(s) => {
                let payload = encoding.encode(s);
                let (width, len_bytes) = varint::encode_uint(payload.len() as u64);
                write_tag(out, Tag::Text { width })?;
                out.write_all(&len_bytes)?;
                out.write_all(&payload)?;
                Ok(())
            }
            Cell::Blob(b) => {
                let (width, len_bytes) = varint::encode_uint(b.len() as u64);
                write_tag(out, Tag::Blob { width })?;
                out.write_all(&len_bytes)?;
                out.write_all(b)?;
                Ok(())
            }
        }
    }

    /// Reads a cell's payload given its already-decoded tag byte. Callers
    /// reading a row-set read the tag first (to recognize `EndRowSet` /
    /// `EndDump`) and only call this once they know it names a cell.
    pub fn read(tag: Tag, encoding: TextEncoding, input: &mut dyn Read) -> FResult<Cell> {
        match tag {
            Tag::Null => Ok(Cell::Null),
            Tag::Int { width } => {
                let buf = read_exact_vec(input, width, "integer cell")?;
                Ok(Cell::Integer(varint::decode_sint(width, &buf)?))
            }
            Tag::Float { width } => {
                let buf = read_exact_vec(input, width, "float cell")?;
                Ok(Cell::Float(float::decode_float(width, &buf)?))
            }
            Tag::Text { width } => {
                let len_buf = read_exact_vec(input, width, "text length")?;
                let len = varint::decode_uint(width, &len_buf)? as usize;
                let mut payload = vec![0u8; len];
                input.read_exact(&mut payload).map_err(|_| FormatError::Eof("text payload"))?;
                Ok(Cell::Text(encoding.decode(&payload)?))
            }
            Tag::Blob { width } => {
                let len_buf = read_exact_vec(input, width, "blob length")?;
                let len = varint::decode_uint(width, &len_buf)? as usize;
                let mut payload = vec![0u8; len];
                input.read_exact(&mut payload).map_err(|_| FormatError::Eof("blob payload"))?;
                Ok(Cell::Blob(payload))
            }
            other => Err(FormatError::Internal(format!("{other:?} does not name a cell value"))),
        }
    }
}

fn write_tag(out: &mut dyn Write, tag: Tag) -> FResult<()> {
    out.write_all(&[tag.encode()])?;
    Ok(())
}

fn read_exact_vec(input: &mut dyn Read, width: u8, what: &'static str) -> FResult<Vec<u8>> {
    let mut buf = vec![0u8; width as usize];
    input.read_exact(&mut buf).map_err(|_| FormatError::Eof(what))?;
    Ok(buf)
}
