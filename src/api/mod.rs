//! Purpose: Define the stable public Rust API boundary for dsbase.
//! Exports: Catalog, table, row, store, and error types needed by the CLI.
//! Role: Public, additive-only surface over the `core` modules.
//! Invariants: Callers reach storage only through `Catalog` and `PersistentStore`.

mod client;

pub use crate::base_paths::default_base_dir;
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::catalog::{
    AlterOp, Catalog, CreateOptions, Metadata, TableDescription, TableSchema,
};
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::family::{FamilyDoc, LastVersions, Qualifiers};
pub use crate::core::row::{Cell, CellRef, RowData, ScanData};
pub use crate::core::store::{DocPath, FsStore, MemStore, PersistentStore};
pub use crate::core::version::VersionSeries;
pub use client::{ApiResult, LocalClient};
