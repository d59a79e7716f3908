mod dump_error;

pub use dump_error::DumpError;

pub type CResult<T> = Result<T, DumpError>;
