//! Purpose: Define the public API client surface for local base resolution.
//! Exports: `LocalClient` and base lifecycle operations.
//! Role: Stable boundary for the CLI; resolves base names to file-backed catalogs.
//! Invariants: Base name resolution matches the CLI's `--base` rules.
//! Invariants: Opening a base never touches tables; it only loads or seeds metadata.
#![allow(clippy::result_large_err)]

use crate::base_paths::{BaseNameResolveError, default_base_dir, resolve_named_base_path};
use crate::core::catalog::{Catalog, METADATA_DOC};
use crate::core::error::{Error, ErrorKind};
use crate::core::store::FsStore;
use std::path::{Path, PathBuf};

pub type ApiResult<T> = Result<T, Error>;

#[derive(Clone, Debug)]
pub struct LocalClient {
    base_dir: PathBuf,
}

impl LocalClient {
    pub fn new() -> Self {
        Self {
            base_dir: default_base_dir(),
        }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn base_path(&self, name: &str) -> ApiResult<PathBuf> {
        resolve_named_base_path(name, &self.base_dir).map_err(map_base_name_resolve_error)
    }

    /// Opens (or initializes) the named base.
    pub fn open_base(&self, name: &str) -> ApiResult<Catalog<FsStore>> {
        let path = self.base_path(name)?;
        Catalog::open(FsStore::new(path))
    }

    /// Names of initialized bases under the base directory, sorted.
    pub fn list_bases(&self) -> ApiResult<Vec<String>> {
        let entries = match std::fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(Error::new(ErrorKind::Storage)
                    .with_message("failed to read base directory")
                    .with_path(&self.base_dir)
                    .with_source(err));
            }
        };

        let mut bases = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| {
                Error::new(ErrorKind::Storage)
                    .with_message("failed to read base directory entry")
                    .with_path(&self.base_dir)
                    .with_source(err)
            })?;
            let path = entry.path();
            if !path.join(format!("{METADATA_DOC}.json")).is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                bases.push(name.to_string());
            }
        }
        bases.sort();
        Ok(bases)
    }
}

impl Default for LocalClient {
    fn default() -> Self {
        Self::new()
    }
}

fn map_base_name_resolve_error(err: BaseNameResolveError) -> Error {
    match err {
        BaseNameResolveError::Empty => {
            Error::new(ErrorKind::Usage).with_message("base name must not be empty")
        }
        BaseNameResolveError::ContainsPathSeparator => {
            Error::new(ErrorKind::Usage).with_message("base name must not contain path separators")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LocalClient;
    use crate::core::catalog::CreateOptions;
    use crate::core::error::ErrorKind;
    use std::path::PathBuf;

    #[test]
    fn base_name_resolves_under_dir() {
        let client = LocalClient::new().with_base_dir(".scratch/bases");
        let path = client.base_path("school").expect("path");
        assert_eq!(path, PathBuf::from(".scratch/bases/school"));
    }

    #[test]
    fn base_name_rejects_slash_and_empty() {
        let client = LocalClient::new().with_base_dir(".scratch/bases");
        let err = client.base_path("foo/bar").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
        let err = client.base_path("").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn local_client_defaults_base_dir() {
        let client = LocalClient::new();
        assert!(client.base_dir().to_string_lossy().contains(".dsbase"));
    }

    #[test]
    fn open_base_seeds_metadata_and_lists_it() {
        let temp = tempfile::tempdir().expect("tempdir");
        let client = LocalClient::new().with_base_dir(temp.path().join("bases"));
        assert!(client.list_bases().expect("list").is_empty());

        let mut catalog = client.open_base("school").expect("open");
        catalog
            .create_table("students", ["info"], CreateOptions::default())
            .expect("create");
        assert!(temp.path().join("bases/school/metadata.json").is_file());
        assert!(temp.path().join("bases/school/students/info.json").is_file());

        client.open_base("empty").expect("open");
        assert_eq!(client.list_bases().expect("list"), vec!["empty", "school"]);
    }
}
