// Storage and data-model layer: documents, families, rows, tables, catalog.
pub mod catalog;
pub mod error;
pub mod family;
pub mod row;
pub mod store;
pub mod table;
pub mod version;
