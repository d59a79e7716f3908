//! A named, self-describing row-set: a `RowSet` header tag carrying the
//! widths of the column count and name-length fields that immediately
//! follow it, then that many cells per row until an `EndRowSet` tag closes
//! it. Both the pragmas/schema catalogs and each table's data are framed
//! this way; carrying the column count in the stream (rather than
//! requiring the reader to already know it) lets a loader compare a dump's
//! width against a live table's width before deciding whether to tolerate
//! a mismatch.

use std::io::{Read, Write};

use crate::cell::Cell;
use crate::encoding::TextEncoding;
use crate::error::{FResult, FormatError};
use crate::tag::Tag;
use crate::varint;

/// Writes the row-set header: the `(2, ccw, nsw)` tag, the `colcnt - 1`
/// payload, the name-byte-length payload, then the name bytes themselves
/// (in `encoding`'s wire form) — colcnt before name, per spec.
fn write_header(out: &mut dyn Write, encoding: TextEncoding, name: &str, ncols: usize) -> FResult<()> {
    if ncols == 0 {
        return Err(FormatError::Internal("row-set must declare at least one column".into()));
    }
    let (ccw, cc_bytes) = varint::encode_uint((ncols - 1) as u64);
    let name_bytes = encoding.encode(name);
    let (nsw, ns_bytes) = varint::encode_uint(name_bytes.len() as u64);

    out.write_all(&[Tag::RowSet { ccw, nsw }.encode()])?;
    out.write_all(&cc_bytes)?;
    out.write_all(&ns_bytes)?;
    out.write_all(&name_bytes)?;
    Ok(())
}

/// Reads the fields that follow an already-decoded `(2, ccw, nsw)` tag:
/// the colcnt payload, the name-length payload, then the name bytes,
/// decoded through `encoding`.
fn read_header_body(input: &mut dyn Read, encoding: TextEncoding, ccw: u8, nsw: u8) -> FResult<(usize, String)> {
    let mut cc_bytes = vec![0u8; ccw as usize];
    input.read_exact(&mut cc_bytes).map_err(|_| FormatError::Eof("row-set column count"))?;
    let ncols = varint::decode_uint(ccw, &cc_bytes)? as usize + 1;

    let mut ns_bytes = vec![0u8; nsw as usize];
    input.read_exact(&mut ns_bytes).map_err(|_| FormatError::Eof("row-set name length"))?;
    let name_len = varint::decode_uint(nsw, &ns_bytes)? as usize;

    let mut name_bytes = vec![0u8; name_len];
    input.read_exact(&mut name_bytes).map_err(|_| FormatError::Eof("row-set name"))?;
    let name = encoding.decode(&name_bytes)?;

    Ok((ncols, name))
}

pub struct RowSetWriter<'w> {
    out: &'w mut dyn Write,
    encoding: TextEncoding,
    ncols: usize,
    closed: bool,
}

impl<'w> RowSetWriter<'w> {
    pub fn open(
        out: &'w mut dyn Write,
        encoding: TextEncoding,
        name: &str,
        ncols: usize,
    ) -> FResult<RowSetWriter<'w>> {
        write_header(out, encoding, name, ncols)?;
        Ok(RowSetWriter { out, encoding, ncols, closed: false })
    }

    pub fn write_row(&mut self, cells: &[Cell]) -> FResult<()> {
        if cells.len() != self.ncols {
            return Err(FormatError::Internal(format!(
                "row has {} cells, row-set expects {}",
                cells.len(),
                self.ncols
            )));
        }
        for cell in cells {
            cell.write(self.encoding, self.out)?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> FResult<()> {
        self.out.write_all(&[Tag::EndRowSet.encode()])?;
        self.closed = true;
        Ok(())
    }
}

impl Drop for RowSetWriter<'_> {
    fn drop(&mut self) {
        debug_assert!(self.closed, "RowSetWriter dropped without calling finish()");
    }
}

pub struct RowSetReader<'r> {
    input: &'r mut dyn Read,
    encoding: TextEncoding,
    ncols: usize,
    finished: bool,
}

/// The name and declared column count read from a row-set header, before
/// any rows are consumed.
pub struct RowSetHead {
    pub name: String,
    pub ncols: usize,
}

impl<'r> RowSetReader<'r> {
    /// Reads the `(2, ccw, nsw)` header tag and the fields that follow it.
    pub fn open(input: &'r mut dyn Read, encoding: TextEncoding) -> FResult<(RowSetReader<'r>, RowSetHead)> {
        let mut tag_byte = [0u8; 1];
        input.read_exact(&mut tag_byte).map_err(|_| FormatError::Eof("row-set header tag"))?;
        let tag = Tag::decode(tag_byte[0])?;
        let Tag::RowSet { ccw, nsw } = tag else {
            return Err(FormatError::Internal("expected a row-set header tag".into()));
        };
        Self::open_after_header_tag(input, encoding, ccw, nsw)
    }

    /// Reads either a `(2, ccw, nsw)` row-set header (another table's data)
    /// or an `EndDump` tag (the stream is over). Used by the load pipeline,
    /// which doesn't know ahead of time how many table row-sets remain.
    pub fn open_or_end(
        input: &'r mut dyn Read,
        encoding: TextEncoding,
    ) -> FResult<Option<(RowSetReader<'r>, RowSetHead)>> {
        let mut tag_byte = [0u8; 1];
        input
            .read_exact(&mut tag_byte)
            .map_err(|_| FormatError::Eof("row-set header or end-of-dump tag"))?;
        let tag = Tag::decode(tag_byte[0])?;
        match tag {
            Tag::EndDump => Ok(None),
            Tag::RowSet { ccw, nsw } => Self::open_after_header_tag(input, encoding, ccw, nsw).map(Some),
            _ => Err(FormatError::Internal("expected a row-set header or end-of-dump tag".into())),
        }
    }

    fn open_after_header_tag(
        input: &'r mut dyn Read,
        encoding: TextEncoding,
        ccw: u8,
        nsw: u8,
    ) -> FResult<(RowSetReader<'r>, RowSetHead)> {
        let (ncols, name) = read_header_body(input, encoding, ccw, nsw)?;
        let reader = RowSetReader { input, encoding, ncols, finished: false };
        Ok((reader, RowSetHead { name, ncols }))
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Returns the next row, or `None` once `EndRowSet` (or a clean EOF at
    /// the start of a row) has been reached. A truncated stream anywhere
    /// past the first cell of a row is a hard error, not end-of-data.
    pub fn next_row(&mut self) -> FResult<Option<Vec<Cell>>> {
        if self.finished {
            return Ok(None);
        }

        let mut tag_byte = [0u8; 1];
        let n = self.input.read(&mut tag_byte)?;
        if n == 0 {
            self.finished = true;
            return Ok(None);
        }

        let tag = Tag::decode(tag_byte[0])?;
        if tag.is_end_of_set() {
            self.finished = true;
            return Ok(None);
        }

        let mut cells = Vec::with_capacity(self.ncols);
        cells.push(Cell::read(tag, self.encoding, self.input)?);
        for _ in 1..self.ncols {
            let mut tb = [0u8; 1];
            self.input.read_exact(&mut tb).map_err(|_| FormatError::Eof("row cell tag"))?;
            let t = Tag::decode(tb[0])?;
            cells.push(Cell::read(t, self.encoding, self.input)?);
        }
        Ok(Some(cells))
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
