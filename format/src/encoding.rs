//! Wire-level text serialization for the three encodings SQLite databases
//! can use internally (`pragma encoding`). Unlike the original C
//! implementation, there is no SQL-preparation dispatch here: the engine
//! always binds and reads text through the single UTF-8 API and lets
//! SQLite convert internally. `TextEncoding` only decides how a `Text`
//! cell's bytes are written to, and read from, the dump stream.

use crate::error::FormatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    pub fn from_pragma_name(name: &str) -> Option<TextEncoding> {
        match name {
            "UTF-8" => Some(TextEncoding::Utf8),
            "UTF-16le" => Some(TextEncoding::Utf16Le),
            "UTF-16be" => Some(TextEncoding::Utf16Be),
            _ => None,
        }
    }

    pub fn pragma_name(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::Utf16Le => "UTF-16le",
            TextEncoding::Utf16Be => "UTF-16be",
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            TextEncoding::Utf8 => 1,
            TextEncoding::Utf16Le => 2,
            TextEncoding::Utf16Be => 3,
        }
    }

    pub fn from_tag(tag: u8) -> Result<TextEncoding, FormatError> {
        match tag {
            1 => Ok(TextEncoding::Utf8),
            2 => Ok(TextEncoding::Utf16Le),
            3 => Ok(TextEncoding::Utf16Be),
            _ => Err(FormatError::Internal(format!("unrecognized encoding tag {tag}"))),
        }
    }

    /// Renders `text` as this encoding's wire bytes.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Utf16Le => {
                let mut out = Vec::with_capacity(text.len() * 2);
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
                out
            }
            TextEncoding::Utf16Be => {
                let mut out = Vec::with_capacity(text.len() * 2);
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_be_bytes());
                }
                out
            }
        }
    }

    /// Parses this encoding's wire bytes back into a `String`.
    pub fn decode(self, bytes: &[u8]) -> Result<String, FormatError> {
        match self {
            TextEncoding::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|e| FormatError::BadText { encoding: "UTF-8", source: e }),
            TextEncoding::Utf16Le => Ok(decode_utf16_with(bytes, u16::from_le_bytes)),
            TextEncoding::Utf16Be => Ok(decode_utf16_with(bytes, u16::from_be_bytes)),
        }
    }
}

fn decode_utf16_with(bytes: &[u8], unit_from: fn([u8; 2]) -> u16) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| unit_from([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
