use thiserror::Error;

/// Every failure mode a store/load operation can surface.
///
/// Variants line up with the error kinds a single dump or restore pass can
/// hit: a short read or a failed write, bytes on the wire that don't parse,
/// the database engine rejecting a statement, a precondition the caller
/// violated (e.g. restoring into a non-empty database), or an invariant that
/// should be impossible.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("{activity}: {source}")]
    Io {
        activity: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt dump: {0}")]
    Corrupt(String),

    #[error("{activity}: {source}")]
    Engine {
        activity: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{0}")]
    Precondition(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DumpError {
    pub fn io(activity: &'static str, source: std::io::Error) -> Self {
        DumpError::Io { activity, source }
    }

    pub fn engine(activity: &'static str, source: rusqlite::Error) -> Self {
        DumpError::Engine { activity, source }
    }

    pub fn corrupt(msg: impl Into<String>) -> Self {
        DumpError::Corrupt(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        DumpError::Precondition(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        DumpError::Internal(msg.into())
    }
}

impl From<std::io::Error> for DumpError {
    fn from(source: std::io::Error) -> Self {
        DumpError::Io { activity: "I/O", source }
    }
}

impl From<rusqlite::Error> for DumpError {
    fn from(source: rusqlite::Error) -> Self {
        DumpError::Engine { activity: "sqlite", source }
    }
}

/// Every `format` crate error arises from malformed bytes on the wire
/// except its own I/O variant, which is surfaced as-is.
impl From<format::FormatError> for DumpError {
    fn from(source: format::FormatError) -> Self {
        match source {
            format::FormatError::Io(io) => DumpError::Io { activity: "dump stream I/O", source: io },
            other => DumpError::Corrupt(other.to_string()),
        }
    }
}
