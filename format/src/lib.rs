pub mod cell;
pub mod encoding;
pub mod error;
pub mod float;
pub mod header;
pub mod rowset;
pub mod sqlbuilder;
pub mod tag;
pub mod varint;

pub use cell::Cell;
pub use encoding::TextEncoding;
pub use error::{FResult, FormatError};
pub use header::Header;
pub use rowset::{RowSetReader, RowSetWriter};
pub use sqlbuilder::SqlBuilder;
pub use tag::Tag;
