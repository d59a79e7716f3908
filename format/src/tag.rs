//! Single-byte cell tags, packed as three base-9 digits: `tag = (a*9 + b)*9 + c`.
//!
//! Category `a` selects control markers (`0`), value cells (`1`), or a
//! row-set header (`2`); `b` and `c` carry the category's parameters —
//! a control sub-code, a cell-kind selector plus varint width, or the
//! row-set header's two packed widths. This mapping is spec §4.1.4's table
//! verbatim, so `EndDump` lands on wire byte `0x02` exactly as spec §8
//! scenario 1 requires.

use crate::error::FormatError;

const CAT_CONTROL: u8 = 0;
const CAT_VALUE: u8 = 1;
const CAT_ROWSET: u8 = 2;

const SUB_INT: u8 = 0;
const SUB_FLOAT: u8 = 1;
const SUB_TEXT: u8 = 2;
const SUB_BLOB: u8 = 3;

const CTL_NULL: u8 = 0;
const CTL_END_ROWSET: u8 = 1;
const CTL_END_DUMP: u8 = 2;

const fn base9(a: u8, b: u8, c: u8) -> u8 {
    (a * 9 + b) * 9 + c
}

fn un_base9(tag: u8) -> (u8, u8, u8) {
    let c = tag % 9;
    let rest = tag / 9;
    let b = rest % 9;
    let a = rest / 9;
    (a, b, c)
}

/// A decoded cell or frame-control tag. Width fields are varint widths
/// (`0..=8`) for the payload that follows the tag byte, as produced by
/// [`crate::varint`] or [`crate::float`]; `ccw`/`nsw` on [`Tag::RowSet`] are
/// the widths of the colcnt-minus-one and name-byte-length values that
/// immediately follow the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Null,
    EndRowSet,
    EndDump,
    Int { width: u8 },
    Float { width: u8 },
    Text { width: u8 },
    Blob { width: u8 },
    RowSet { ccw: u8, nsw: u8 },
}

impl Tag {
    pub fn encode(self) -> u8 {
        match self {
            Tag::Null => base9(CAT_CONTROL, 0, CTL_NULL),
            Tag::EndRowSet => base9(CAT_CONTROL, 0, CTL_END_ROWSET),
            Tag::EndDump => base9(CAT_CONTROL, 0, CTL_END_DUMP),
            Tag::Int { width } => base9(CAT_VALUE, SUB_INT, width),
            Tag::Float { width } => base9(CAT_VALUE, SUB_FLOAT, width),
            Tag::Text { width } => base9(CAT_VALUE, SUB_TEXT, width),
            Tag::Blob { width } => base9(CAT_VALUE, SUB_BLOB, width),
            Tag::RowSet { ccw, nsw } => base9(CAT_ROWSET, ccw, nsw),
        }
    }

    pub fn decode(byte: u8) -> Result<Tag, FormatError> {
        let (a, b, c) = un_base9(byte);
        match a {
            CAT_CONTROL if b == 0 => match c {
                CTL_NULL => Ok(Tag::Null),
                CTL_END_ROWSET => Ok(Tag::EndRowSet),
                CTL_END_DUMP => Ok(Tag::EndDump),
                _ => Err(FormatError::UnknownTag(byte)),
            },
            CAT_VALUE if c <= 8 => match b {
                SUB_INT => Ok(Tag::Int { width: c }),
                SUB_FLOAT => Ok(Tag::Float { width: c }),
                SUB_TEXT => Ok(Tag::Text { width: c }),
                SUB_BLOB => Ok(Tag::Blob { width: c }),
                _ => Err(FormatError::UnknownTag(byte)),
            },
            CAT_ROWSET if b <= 8 && c <= 8 => Ok(Tag::RowSet { ccw: b, nsw: c }),
            _ => Err(FormatError::UnknownTag(byte)),
        }
    }

    pub fn is_end_of_set(self) -> bool {
        matches!(self, Tag::EndRowSet | Tag::EndDump)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn control_tags_round_trip() {
        for tag in [Tag::Null, Tag::EndRowSet, Tag::EndDump] {
            assert_eq!(Tag::decode(tag.encode()).unwrap(), tag);
        }
    }

    #[test]
    fn end_dump_is_wire_byte_0x02() {
        assert_eq!(Tag::EndDump.encode(), 0x02);
    }

    #[test]
    fn numeric_tags_round_trip_every_width() {
        for width in 0..=8 {
            assert_eq!(Tag::decode(Tag::Int { width }.encode()).unwrap(), Tag::Int { width });
            assert_eq!(Tag::decode(Tag::Float { width }.encode()).unwrap(), Tag::Float { width });
            assert_eq!(Tag::decode(Tag::Text { width }.encode()).unwrap(), Tag::Text { width });
            assert_eq!(Tag::decode(Tag::Blob { width }.encode()).unwrap(), Tag::Blob { width });
        }
    }

    #[test]
    fn rowset_tags_round_trip_every_width_pair() {
        for ccw in 0..=8 {
            for nsw in 0..=8 {
                assert_eq!(Tag::decode(Tag::RowSet { ccw, nsw }.encode()).unwrap(), Tag::RowSet { ccw, nsw });
            }
        }
    }

    #[test]
    fn all_encoded_tags_are_distinct() {
        let mut bytes = Vec::new();
        bytes.push(Tag::Null.encode());
        bytes.push(Tag::EndRowSet.encode());
        bytes.push(Tag::EndDump.encode());
        for width in 0..=8 {
            bytes.push(Tag::Int { width }.encode());
            bytes.push(Tag::Float { width }.encode());
            bytes.push(Tag::Text { width }.encode());
            bytes.push(Tag::Blob { width }.encode());
        }
        for ccw in 0..=8 {
            for nsw in 0..=8 {
                bytes.push(Tag::RowSet { ccw, nsw }.encode());
            }
        }
        let mut sorted = bytes.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), bytes.len());
    }

    #[test]
    fn unknown_byte_is_rejected() {
        assert!(Tag::decode(255).is_err());
    }
}
