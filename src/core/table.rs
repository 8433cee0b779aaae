//! Purpose: Bind one table's schema to its family documents for cell-level DML.
//! Exports: `Table`, `table_dir`, `family_path`.
//! Role: Short-lived handle built by the catalog for exactly one operation.
//! Invariants: Every operation loads the documents it needs, mutates, persists, and drops them.
//! Invariants: A mutation persists only the family document it touched.
//! Invariants: No version series ever exceeds the schema's `max_versions`.
use tracing::debug;

use crate::core::catalog::TableSchema;
use crate::core::error::{Error, ErrorKind};
use crate::core::family::FamilyDoc;
use crate::core::row::{self, Cell, RowData, ScanData};
use crate::core::store::{DocPath, PersistentStore, overwrite_doc, read_doc};

pub(crate) fn table_dir(table: &str) -> DocPath {
    DocPath::new(table)
}

pub(crate) fn family_path(table: &str, family: &str) -> DocPath {
    table_dir(table).join(family)
}

pub struct Table<'a, S: PersistentStore + ?Sized> {
    name: &'a str,
    schema: &'a TableSchema,
    store: &'a mut S,
}

impl<'a, S: PersistentStore + ?Sized> Table<'a, S> {
    pub fn new(name: &'a str, schema: &'a TableSchema, store: &'a mut S) -> Self {
        Self {
            name,
            schema,
            store,
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn schema(&self) -> &TableSchema {
        self.schema
    }

    /// Writes `value` as the next version of the cell and returns that version.
    pub fn put(
        &mut self,
        row: &str,
        family: &str,
        qualifier: &str,
        value: &str,
    ) -> Result<u64, Error> {
        self.require_family(family)?;
        let mut doc = self.load_family(family)?;
        let version = doc.put(row, qualifier, value, self.schema.max_versions);
        self.persist_family(family, &doc)?;
        debug!(table = self.name, row, family, qualifier, version, "put");
        Ok(version)
    }

    /// Full row joined across every family that holds it.
    pub fn get(&self, row: &str) -> Result<RowData, Error> {
        let docs = self.load_all()?;
        row::compose_row(docs.iter().map(|(name, doc)| (name.as_str(), doc)), row)
            .ok_or_else(|| self.row_not_found(row))
    }

    /// Latest version of one cell, or the exact `version` when given.
    pub fn get_cell(
        &self,
        row: &str,
        family: &str,
        qualifier: &str,
        version: Option<u64>,
    ) -> Result<Cell, Error> {
        self.require_family(family)?;
        let doc = self.load_family(family)?;
        let series = doc
            .series(row, qualifier)
            .map_err(|err| err.with_table(self.name))?;
        let found = match version {
            Some(version) => series.get(version).map(|value| (version, value)),
            None => series.latest(),
        };
        match found {
            Some((version, value)) => Ok(Cell {
                version,
                value: value.to_string(),
            }),
            None => {
                let err = Error::new(ErrorKind::VersionNotFound)
                    .with_message(format!("no such version of {family}:{qualifier}"))
                    .with_table(self.name)
                    .with_row(row);
                Err(match version {
                    Some(version) => err.with_version(version),
                    None => err,
                })
            }
        }
    }

    /// Every row, optionally restricted to one family.
    pub fn scan(&self, family: Option<&str>) -> Result<ScanData, Error> {
        match family {
            Some(family) => {
                self.require_family(family)?;
                let doc = self.load_family(family)?;
                Ok(row::compose_scan([(family, &doc)]))
            }
            None => {
                let docs = self.load_all()?;
                Ok(row::compose_scan(
                    docs.iter().map(|(name, doc)| (name.as_str(), doc)),
                ))
            }
        }
    }

    /// Removes exactly one version of one cell.
    pub fn delete(
        &mut self,
        row: &str,
        family: &str,
        qualifier: &str,
        version: u64,
    ) -> Result<(), Error> {
        self.require_family(family)?;
        let mut doc = self.load_family(family)?;
        doc.delete_version(row, qualifier, version)
            .map_err(|err| err.with_table(self.name))?;
        self.persist_family(family, &doc)?;
        debug!(table = self.name, row, family, qualifier, version, "delete");
        Ok(())
    }

    /// Removes `row` from one family, or from every family when `family` is `None`.
    /// Returns how many family documents held the row.
    pub fn delete_all(&mut self, row: &str, family: Option<&str>) -> Result<usize, Error> {
        let targets: Vec<String> = match family {
            Some(family) => {
                self.require_family(family)?;
                vec![family.to_string()]
            }
            None => self.schema.column_families.clone(),
        };

        let mut touched = Vec::new();
        for family in &targets {
            let mut doc = self.load_family(family)?;
            if doc.delete_row(row).is_some() {
                touched.push((family, doc));
            }
        }
        if touched.is_empty() {
            return Err(self.row_not_found(row));
        }
        for (family, doc) in &touched {
            self.persist_family(family, doc)?;
        }
        debug!(table = self.name, row, families = touched.len(), "delete_all");
        Ok(touched.len())
    }

    /// Distinct row keys across all families.
    pub fn count(&self) -> Result<usize, Error> {
        let docs = self.load_all()?;
        Ok(row::distinct_rows(docs.iter().map(|(_, doc)| doc)))
    }

    fn require_family(&self, family: &str) -> Result<(), Error> {
        if self.schema.has_family(family) {
            return Ok(());
        }
        Err(Error::new(ErrorKind::UnknownFamily)
            .with_message(format!("column family {family} not found in table"))
            .with_table(self.name)
            .with_hint(format!(
                "Declared families: {}.",
                self.schema.column_families.join(", ")
            )))
    }

    fn row_not_found(&self, row: &str) -> Error {
        Error::new(ErrorKind::RowNotFound)
            .with_message("row not found in table")
            .with_table(self.name)
            .with_row(row)
    }

    fn load_family(&self, family: &str) -> Result<FamilyDoc, Error> {
        let path = family_path(self.name, family);
        read_doc(&*self.store, &path)?.ok_or_else(|| {
            Error::new(ErrorKind::Storage)
                .with_message(format!("family document {path} is missing"))
                .with_table(self.name)
        })
    }

    fn load_all(&self) -> Result<Vec<(String, FamilyDoc)>, Error> {
        self.schema
            .column_families
            .iter()
            .map(|family| Ok((family.clone(), self.load_family(family)?)))
            .collect()
    }

    fn persist_family(&mut self, family: &str, doc: &FamilyDoc) -> Result<(), Error> {
        let path = family_path(self.name, family);
        overwrite_doc(&mut *self.store, &path, doc).map_err(|err| err.with_table(self.name))
    }
}
