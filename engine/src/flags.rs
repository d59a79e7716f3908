use bitflags::bitflags;

bitflags! {
    /// Mirrors the `S3BD_STORE_*` flag set: bits a caller passes to narrow
    /// what a dump captures.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StoreFlags: u32 {
        /// Emit pragmas and schema only; skip every table's row data.
        const SCHEMA_ONLY = 0b0000_0001;
        /// The caller has already begun a transaction; don't begin one.
        const IN_TRANSACTION = 0b0000_0010;
    }
}

bitflags! {
    /// Mirrors the `S3BD_LOAD_*` flag set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LoadFlags: u32 {
        /// Apply pragmas and recreate schema only; skip every row-set's data.
        const SCHEMA_ONLY = 0b0000_0001;
    }
}
