use thiserror::Error;

/// Errors that can arise purely from the wire format itself, independent of
/// any database engine. The `store`/`load` pipelines fold these into
/// `common::err::DumpError::Corrupt` (on read) or propagate them directly
/// (on write, which should never actually fail short of I/O).
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("{0}")]
    Internal(String),

    #[error("unrecognized tag byte {0:#04x}")]
    UnknownTag(u8),

    #[error("unexpected end of input while reading {0}")]
    Eof(&'static str),

    #[error("text payload is not valid {encoding}: {source}")]
    BadText { encoding: &'static str, source: std::string::FromUtf8Error },

    #[error("header magic does not match")]
    BadMagic,

    #[error("unsupported format version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type FResult<T> = Result<T, FormatError>;
