//! Purpose: Own table metadata and mediate every DDL and DML request.
//! Exports: `Catalog`, `Metadata`, `TableSchema`, `TableDescription`, `CreateOptions`, `AlterOp`.
//! Role: Root object of one base; validates existence/enabled state, then mutates
//!       metadata directly (DDL) or hands the call to a short-lived `Table` (DML).
//! Invariants: The catalog is the only writer of the metadata document.
//! Invariants: Every metadata mutation is followed by an explicit persist; a failed
//!             persist restores the in-memory copy to what is on disk.
//! Invariants: Physical changes happen before the metadata write that records them;
//!             physical changes are not rolled back if that write fails.
//! Invariants: Column family names are unique within a table and keep their order.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::core::error::{Error, ErrorKind};
use crate::core::family::FamilyDoc;
use crate::core::row::{Cell, RowData, ScanData};
use crate::core::store::{DocPath, PersistentStore, create_doc, overwrite_doc, read_doc};
use crate::core::table::{Table, family_path, table_dir};

pub const METADATA_DOC: &str = "metadata";
pub const CATALOG_VERSION: u32 = 1;
pub const DEFAULT_WHOAMI: &str = "admin";
const DEFAULT_SERVERS: [&str; 1] = ["Server1"];

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub column_families: Vec<String>,
    pub max_versions: u32,
    pub is_enabled: bool,
}

impl TableSchema {
    pub fn new(column_families: Vec<String>, max_versions: u32, is_enabled: bool) -> Self {
        Self {
            column_families,
            max_versions,
            is_enabled,
        }
    }

    pub fn has_family(&self, family: &str) -> bool {
        self.column_families.iter().any(|name| name == family)
    }
}

/// Persisted catalog document. `status` is carried through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub tables: BTreeMap<String, TableSchema>,
    pub version: u32,
    pub whoami: String,
    #[serde(default)]
    pub status: Value,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            tables: BTreeMap::new(),
            version: CATALOG_VERSION,
            whoami: DEFAULT_WHOAMI.to_string(),
            status: json!({
                "servers": DEFAULT_SERVERS,
                "servers_amount": DEFAULT_SERVERS.len(),
            }),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct TableDescription {
    pub name: String,
    pub column_families: Vec<String>,
    pub max_versions: u32,
    pub is_enabled: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct CreateOptions {
    pub max_versions: u32,
    pub enabled: bool,
}

impl CreateOptions {
    pub fn new(max_versions: u32) -> Self {
        Self {
            max_versions,
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self::new(1)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AlterOp {
    Add(String),
    Delete(String),
    Rename { from: String, to: String },
}

impl AlterOp {
    /// Parses `op` (`add`, `delete`, `rename`; any case) and its argument.
    /// Rename arguments use the `old:new` shape.
    pub fn parse(op: &str, value: &str) -> Result<Self, Error> {
        match op.to_ascii_lowercase().as_str() {
            "add" => Ok(Self::Add(value.to_string())),
            "delete" => Ok(Self::Delete(value.to_string())),
            "rename" => {
                let invalid = || {
                    Error::new(ErrorKind::InvalidFormat)
                        .with_message(format!("invalid rename argument: {value:?}"))
                        .with_hint("Use OLD:NEW, e.g. `info:profile`.")
                };
                let (from, to) = value.split_once(':').ok_or_else(invalid)?;
                if from.is_empty() || to.is_empty() || to.contains(':') {
                    return Err(invalid());
                }
                Ok(Self::Rename {
                    from: from.to_string(),
                    to: to.to_string(),
                })
            }
            _ => Err(Error::new(ErrorKind::Usage)
                .with_message(format!("unknown alter operation: {op}"))
                .with_hint("Use one of: add, delete, rename.")),
        }
    }
}

pub struct Catalog<S: PersistentStore> {
    store: S,
    metadata: Metadata,
}

impl<S: PersistentStore> Catalog<S> {
    /// Opens the base behind `store`, writing default metadata on first use.
    pub fn open(mut store: S) -> Result<Self, Error> {
        store.make_directory(&DocPath::root())?;
        let path = metadata_path();
        let metadata = match read_doc::<Metadata, _>(&store, &path)? {
            Some(metadata) => metadata,
            None => {
                let metadata = Metadata::default();
                create_doc(&mut store, &path, &metadata)?;
                info!("initialized catalog metadata");
                metadata
            }
        };
        Ok(Self { store, metadata })
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn status(&self) -> &Value {
        &self.metadata.status
    }

    pub fn version(&self) -> u32 {
        self.metadata.version
    }

    pub fn whoami(&self) -> &str {
        &self.metadata.whoami
    }

    pub fn list_tables(&self) -> Vec<String> {
        self.metadata.tables.keys().cloned().collect()
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.metadata.tables.contains_key(name)
    }

    pub fn create_table<I, F>(
        &mut self,
        name: &str,
        families: I,
        options: CreateOptions,
    ) -> Result<(), Error>
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        validate_name("table", name)?;
        if self.table_exists(name) {
            return Err(Error::new(ErrorKind::AlreadyExists)
                .with_message("table already exists")
                .with_table(name));
        }
        let families: Vec<String> = families.into_iter().map(Into::into).collect();
        if families.is_empty() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("a table needs at least one column family")
                .with_table(name));
        }
        for (idx, family) in families.iter().enumerate() {
            validate_name("column family", family)?;
            if families[..idx].contains(family) {
                return Err(Error::new(ErrorKind::DuplicateFamily)
                    .with_message(format!("column family {family} is listed twice"))
                    .with_table(name));
            }
        }
        if options.max_versions == 0 {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("max_versions must be at least 1")
                .with_table(name));
        }

        if let Err(err) = self.create_backing(name, &families) {
            let dir = table_dir(name);
            if let Err(cleanup) = self.store.remove_directory_recursive(&dir) {
                warn!(table = name, error = %cleanup, "failed to clean up partial table directory");
            }
            return Err(err.with_table(name));
        }

        let schema = TableSchema::new(families, options.max_versions, options.enabled);
        self.metadata.tables.insert(name.to_string(), schema);
        if let Err(err) = self.persist_metadata() {
            self.metadata.tables.remove(name);
            return Err(err.with_table(name));
        }
        info!(table = name, max_versions = options.max_versions, "created table");
        Ok(())
    }

    pub fn drop_table(&mut self, name: &str) -> Result<(), Error> {
        self.schema(name)?;
        let dir = table_dir(name);
        if self.store.directory_exists(&dir)? {
            self.store
                .remove_directory_recursive(&dir)
                .map_err(|err| err.with_table(name))?;
        } else {
            warn!(table = name, "table directory already absent");
        }
        let removed = self.metadata.tables.remove(name);
        if let Err(err) = self.persist_metadata() {
            if let Some(schema) = removed {
                self.metadata.tables.insert(name.to_string(), schema);
            }
            return Err(err.with_table(name));
        }
        info!(table = name, "dropped table");
        Ok(())
    }

    /// Drops every table independently. On failure, tables after the failing
    /// one stay in place and the error message carries the success count.
    pub fn drop_all_tables(&mut self) -> Result<usize, Error> {
        let names = self.list_tables();
        let total = names.len();
        for (dropped, name) in names.iter().enumerate() {
            if let Err(err) = self.drop_table(name) {
                return Err(Error::new(err.kind())
                    .with_message(format!(
                        "dropped {dropped} of {total} tables before failing on {name}"
                    ))
                    .with_table(name.clone())
                    .with_source(err));
            }
        }
        Ok(total)
    }

    pub fn enable_table(&mut self, name: &str) -> Result<(), Error> {
        self.update_schema(name, |schema| schema.is_enabled = true)?;
        info!(table = name, "enabled table");
        Ok(())
    }

    pub fn disable_table(&mut self, name: &str) -> Result<(), Error> {
        self.update_schema(name, |schema| schema.is_enabled = false)?;
        info!(table = name, "disabled table");
        Ok(())
    }

    pub fn is_enabled(&self, name: &str) -> Result<bool, Error> {
        Ok(self.schema(name)?.is_enabled)
    }

    pub fn describe_table(&self, name: &str) -> Result<TableDescription, Error> {
        let schema = self.schema(name)?;
        Ok(describe(name, schema))
    }

    pub fn describe_all(&self) -> Vec<TableDescription> {
        self.metadata
            .tables
            .iter()
            .map(|(name, schema)| describe(name, schema))
            .collect()
    }

    /// Changes the family set and the backing documents together.
    pub fn alter_table(&mut self, name: &str, op: AlterOp) -> Result<(), Error> {
        let schema = self.schema(name)?.clone();
        match op {
            AlterOp::Add(family) => {
                validate_name("column family", &family)?;
                if schema.has_family(&family) {
                    return Err(duplicate_family(name, &family));
                }
                let path = family_path(name, &family);
                if self.store.document_exists(&path)? {
                    warn!(
                        table = name,
                        family = %family,
                        "removing stale family document not tracked by metadata"
                    );
                    self.store.delete(&path).map_err(|err| err.with_table(name))?;
                }
                create_doc(&mut self.store, &path, &FamilyDoc::new())
                    .map_err(|err| err.with_table(name))?;
                self.update_schema(name, |schema| schema.column_families.push(family.clone()))?;
                info!(table = name, family = %family, "added column family");
            }
            AlterOp::Delete(family) => {
                if !schema.has_family(&family) {
                    return Err(family_not_found(name, &family));
                }
                self.store
                    .delete(&family_path(name, &family))
                    .map_err(|err| err.with_table(name))?;
                self.update_schema(name, |schema| {
                    schema.column_families.retain(|existing| existing != &family)
                })?;
                info!(table = name, family = %family, "deleted column family");
            }
            AlterOp::Rename { from, to } => {
                if !schema.has_family(&from) {
                    return Err(family_not_found(name, &from));
                }
                if from == to {
                    return Err(Error::new(ErrorKind::NoOp)
                        .with_message(format!("column family {from} already has that name"))
                        .with_table(name));
                }
                validate_name("column family", &to)?;
                if schema.has_family(&to) {
                    return Err(duplicate_family(name, &to));
                }
                self.store
                    .rename(&family_path(name, &from), &family_path(name, &to))
                    .map_err(|err| err.with_table(name))?;
                self.update_schema(name, |schema| {
                    for existing in schema.column_families.iter_mut() {
                        if existing == &from {
                            *existing = to.clone();
                        }
                    }
                })?;
                info!(table = name, from = %from, to = %to, "renamed column family");
            }
        }
        Ok(())
    }

    /// Disables, drops, and recreates the table with the same schema, enabled.
    /// A failure between drop and recreate leaves the table absent.
    pub fn truncate(&mut self, name: &str) -> Result<(), Error> {
        let schema = self.schema(name)?.clone();
        self.disable_table(name)?;
        self.drop_table(name)?;
        self.create_table(
            name,
            schema.column_families,
            CreateOptions::new(schema.max_versions),
        )?;
        info!(table = name, "truncated table");
        Ok(())
    }

    pub fn put(
        &mut self,
        table: &str,
        row: &str,
        family: &str,
        qualifier: &str,
        value: &str,
    ) -> Result<u64, Error> {
        self.open_table(table)?.put(row, family, qualifier, value)
    }

    pub fn get(&mut self, table: &str, row: &str) -> Result<RowData, Error> {
        self.open_table(table)?.get(row)
    }

    pub fn get_cell(
        &mut self,
        table: &str,
        row: &str,
        family: &str,
        qualifier: &str,
        version: Option<u64>,
    ) -> Result<Cell, Error> {
        self.open_table(table)?.get_cell(row, family, qualifier, version)
    }

    pub fn scan(&mut self, table: &str, family: Option<&str>) -> Result<ScanData, Error> {
        self.open_table(table)?.scan(family)
    }

    pub fn delete(
        &mut self,
        table: &str,
        row: &str,
        family: &str,
        qualifier: &str,
        version: u64,
    ) -> Result<(), Error> {
        self.open_table(table)?.delete(row, family, qualifier, version)
    }

    pub fn delete_all(
        &mut self,
        table: &str,
        row: &str,
        family: Option<&str>,
    ) -> Result<usize, Error> {
        self.open_table(table)?.delete_all(row, family)
    }

    pub fn count(&mut self, table: &str) -> Result<usize, Error> {
        self.open_table(table)?.count()
    }

    /// Existence guard for DDL and metadata reads.
    fn schema(&self, name: &str) -> Result<&TableSchema, Error> {
        self.metadata
            .tables
            .get(name)
            .ok_or_else(|| table_not_found(name))
    }

    /// Existence and enabled guard for DML; yields a handle scoped to one call.
    fn open_table(&mut self, name: &str) -> Result<Table<'_, S>, Error> {
        let (key, schema) = self
            .metadata
            .tables
            .get_key_value(name)
            .ok_or_else(|| table_not_found(name))?;
        if !schema.is_enabled {
            return Err(Error::new(ErrorKind::Disabled)
                .with_message("table is disabled")
                .with_table(name)
                .with_hint(format!("Enable it first: `dsbase enable {name}`.")));
        }
        Ok(Table::new(key.as_str(), schema, &mut self.store))
    }

    fn create_backing(&mut self, name: &str, families: &[String]) -> Result<(), Error> {
        let dir = table_dir(name);
        if self.store.directory_exists(&dir)? {
            warn!(table = name, "removing stale table directory not tracked by metadata");
            self.store.remove_directory_recursive(&dir)?;
        }
        self.store.make_directory(&dir)?;
        for family in families {
            create_doc(&mut self.store, &family_path(name, family), &FamilyDoc::new())?;
        }
        Ok(())
    }

    fn update_schema<F>(&mut self, name: &str, apply: F) -> Result<(), Error>
    where
        F: FnOnce(&mut TableSchema),
    {
        let schema = self
            .metadata
            .tables
            .get_mut(name)
            .ok_or_else(|| table_not_found(name))?;
        let previous = schema.clone();
        apply(schema);
        if let Err(err) = self.persist_metadata() {
            self.metadata.tables.insert(name.to_string(), previous);
            return Err(err.with_table(name));
        }
        Ok(())
    }

    fn persist_metadata(&mut self) -> Result<(), Error> {
        overwrite_doc(&mut self.store, &metadata_path(), &self.metadata)
    }
}

fn metadata_path() -> DocPath {
    DocPath::new(METADATA_DOC)
}

fn describe(name: &str, schema: &TableSchema) -> TableDescription {
    TableDescription {
        name: name.to_string(),
        column_families: schema.column_families.clone(),
        max_versions: schema.max_versions,
        is_enabled: schema.is_enabled,
    }
}

fn validate_name(what: &str, name: &str) -> Result<(), Error> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control);
    if bad {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("invalid {what} name: {name:?}"))
            .with_hint("Names must be non-empty and must not contain path separators."));
    }
    Ok(())
}

fn table_not_found(name: &str) -> Error {
    Error::new(ErrorKind::NotFound)
        .with_message("table not found")
        .with_table(name)
        .with_hint("Use `dsbase list` to see existing tables.")
}

fn family_not_found(table: &str, family: &str) -> Error {
    Error::new(ErrorKind::NotFound)
        .with_message(format!("column family {family} not found"))
        .with_table(table)
}

fn duplicate_family(table: &str, family: &str) -> Error {
    Error::new(ErrorKind::DuplicateFamily)
        .with_message(format!("column family {family} already exists"))
        .with_table(table)
}
