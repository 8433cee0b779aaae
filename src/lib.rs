//! Purpose: Library crate behind the `dsbase` CLI: a sparse, versioned, column-family store.
//! Exports: `core` (store seam, data model, catalog, errors) and `api` (stable surface).
//! Role: Single-process emulation of the table -> family -> row -> qualifier -> version model.
//! Invariants: Every operation is synchronous and loads, mutates, and persists its documents.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
mod base_paths;
pub mod core;
