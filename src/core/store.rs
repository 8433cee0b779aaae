//! Purpose: Document-store seam under the catalog and table handles.
//! Exports: `DocPath`, `PersistentStore`, `FsStore`, `MemStore`, typed read/write helpers.
//! Role: Treat persistence as an opaque path -> JSON document store with directories.
//! Invariants: Every failing primitive surfaces as `ErrorKind::Storage`; nothing is retried.
//! Invariants: Undecodable documents surface as `ErrorKind::Corrupt`.
//! Invariants: No caching; each call hits the backing store.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::error::{Error, ErrorKind};

const DOC_EXTENSION: &str = "json";

/// Logical, separator-free path into a store (`table/family`).
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DocPath(Vec<String>);

impl DocPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(segment: impl Into<String>) -> Self {
        Self::root().join(segment)
    }

    pub fn join(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// True when `self` equals `dir` or lives below it.
    pub fn starts_with(&self, dir: &DocPath) -> bool {
        self.0.starts_with(&dir.0)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        f.write_str(&self.0.join("/"))
    }
}

/// Path-keyed document store. Directories group documents; documents hold JSON.
pub trait PersistentStore {
    /// Whether a document or directory exists at `path`.
    fn exists(&self, path: &DocPath) -> Result<bool, Error>;
    fn directory_exists(&self, path: &DocPath) -> Result<bool, Error>;
    fn document_exists(&self, path: &DocPath) -> Result<bool, Error>;
    /// Reads a document; `Ok(None)` when nothing is stored at `path`.
    fn read(&self, path: &DocPath) -> Result<Option<Value>, Error>;
    /// Writes a new document. Returns `Ok(false)` and leaves the store untouched if one exists.
    fn create_if_absent(&mut self, path: &DocPath, doc: &Value) -> Result<bool, Error>;
    /// Replaces an existing document.
    fn overwrite(&mut self, path: &DocPath, doc: &Value) -> Result<(), Error>;
    fn delete(&mut self, path: &DocPath) -> Result<(), Error>;
    /// Moves a document; the destination must not exist.
    fn rename(&mut self, from: &DocPath, to: &DocPath) -> Result<(), Error>;
    /// Creates a directory and any missing parents. Existing directories are fine.
    fn make_directory(&mut self, path: &DocPath) -> Result<(), Error>;
    fn remove_directory_recursive(&mut self, path: &DocPath) -> Result<(), Error>;
}

pub(crate) fn read_doc<T, S>(store: &S, path: &DocPath) -> Result<Option<T>, Error>
where
    T: DeserializeOwned,
    S: PersistentStore + ?Sized,
{
    let Some(value) = store.read(path)? else {
        return Ok(None);
    };
    serde_json::from_value(value).map(Some).map_err(|err| {
        Error::new(ErrorKind::Corrupt)
            .with_message(format!("failed to decode document {path}"))
            .with_source(err)
    })
}

pub(crate) fn encode_doc<T: Serialize>(doc: &T, path: &DocPath) -> Result<Value, Error> {
    serde_json::to_value(doc).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message(format!("failed to encode document {path}"))
            .with_source(err)
    })
}

pub(crate) fn overwrite_doc<T, S>(store: &mut S, path: &DocPath, doc: &T) -> Result<(), Error>
where
    T: Serialize,
    S: PersistentStore + ?Sized,
{
    let value = encode_doc(doc, path)?;
    store.overwrite(path, &value)
}

pub(crate) fn create_doc<T, S>(store: &mut S, path: &DocPath, doc: &T) -> Result<(), Error>
where
    T: Serialize,
    S: PersistentStore + ?Sized,
{
    let value = encode_doc(doc, path)?;
    if store.create_if_absent(path, &value)? {
        Ok(())
    } else {
        Err(storage_error("document already exists", path))
    }
}

fn storage_error(message: &str, path: &DocPath) -> Error {
    Error::new(ErrorKind::Storage).with_message(format!("{message}: {path}"))
}

/// Directory-of-JSON-files store rooted at one base directory.
#[derive(Clone, Debug)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir_path(&self, path: &DocPath) -> PathBuf {
        let mut out = self.root.clone();
        for segment in path.segments() {
            out.push(segment);
        }
        out
    }

    fn doc_path(&self, path: &DocPath) -> PathBuf {
        // Family names may contain dots, so append rather than `with_extension`.
        let mut file = self.dir_path(path).into_os_string();
        file.push(".");
        file.push(DOC_EXTENSION);
        PathBuf::from(file)
    }

    fn write_file(&self, file: &Path, doc: &Value) -> Result<(), Error> {
        let bytes = serde_json::to_vec_pretty(doc).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to encode document")
                .with_path(file)
                .with_source(err)
        })?;
        std::fs::write(file, bytes).map_err(|err| io_error("failed to write document", file, err))
    }
}

fn io_error(message: &str, path: &Path, err: io::Error) -> Error {
    Error::new(ErrorKind::Storage)
        .with_message(message)
        .with_path(path)
        .with_source(err)
}

impl PersistentStore for FsStore {
    fn exists(&self, path: &DocPath) -> Result<bool, Error> {
        Ok(self.directory_exists(path)? || self.document_exists(path)?)
    }

    fn directory_exists(&self, path: &DocPath) -> Result<bool, Error> {
        let dir = self.dir_path(path);
        match std::fs::metadata(&dir) {
            Ok(meta) => Ok(meta.is_dir()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(io_error("failed to stat directory", &dir, err)),
        }
    }

    fn document_exists(&self, path: &DocPath) -> Result<bool, Error> {
        if path.is_root() {
            return Ok(false);
        }
        let file = self.doc_path(path);
        match std::fs::metadata(&file) {
            Ok(meta) => Ok(meta.is_file()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(io_error("failed to stat document", &file, err)),
        }
    }

    fn read(&self, path: &DocPath) -> Result<Option<Value>, Error> {
        let file = self.doc_path(path);
        let bytes = match std::fs::read(&file) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_error("failed to read document", &file, err)),
        };
        serde_json::from_slice(&bytes).map(Some).map_err(|err| {
            Error::new(ErrorKind::Corrupt)
                .with_message("document is not valid JSON")
                .with_path(&file)
                .with_source(err)
        })
    }

    fn create_if_absent(&mut self, path: &DocPath, doc: &Value) -> Result<bool, Error> {
        if self.document_exists(path)? {
            return Ok(false);
        }
        self.write_file(&self.doc_path(path), doc)?;
        Ok(true)
    }

    fn overwrite(&mut self, path: &DocPath, doc: &Value) -> Result<(), Error> {
        let file = self.doc_path(path);
        if !file.is_file() {
            return Err(Error::new(ErrorKind::Storage)
                .with_message("cannot overwrite a missing document")
                .with_path(&file));
        }
        self.write_file(&file, doc)
    }

    fn delete(&mut self, path: &DocPath) -> Result<(), Error> {
        let file = self.doc_path(path);
        std::fs::remove_file(&file).map_err(|err| io_error("failed to delete document", &file, err))
    }

    fn rename(&mut self, from: &DocPath, to: &DocPath) -> Result<(), Error> {
        let src = self.doc_path(from);
        let dst = self.doc_path(to);
        if !src.is_file() {
            return Err(Error::new(ErrorKind::Storage)
                .with_message("cannot rename a missing document")
                .with_path(&src));
        }
        if dst.exists() {
            return Err(Error::new(ErrorKind::Storage)
                .with_message("rename destination already exists")
                .with_path(&dst));
        }
        std::fs::rename(&src, &dst).map_err(|err| io_error("failed to rename document", &src, err))
    }

    fn make_directory(&mut self, path: &DocPath) -> Result<(), Error> {
        let dir = self.dir_path(path);
        std::fs::create_dir_all(&dir)
            .map_err(|err| io_error("failed to create directory", &dir, err))
    }

    fn remove_directory_recursive(&mut self, path: &DocPath) -> Result<(), Error> {
        let dir = self.dir_path(path);
        std::fs::remove_dir_all(&dir)
            .map_err(|err| io_error("failed to remove directory", &dir, err))
    }
}

/// In-memory store with the same contract as `FsStore`.
#[derive(Clone, Debug, Default)]
pub struct MemStore {
    docs: BTreeMap<DocPath, Value>,
    dirs: BTreeSet<DocPath>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn doc_count(&self) -> usize {
        self.docs.len()
    }

    fn dir_exists(&self, path: &DocPath) -> bool {
        path.is_root() || self.dirs.contains(path)
    }

    fn require_parent(&self, path: &DocPath) -> Result<(), Error> {
        let parent = path.parent().unwrap_or_default();
        if self.dir_exists(&parent) {
            Ok(())
        } else {
            Err(storage_error("parent directory does not exist", path))
        }
    }
}

impl PersistentStore for MemStore {
    fn exists(&self, path: &DocPath) -> Result<bool, Error> {
        Ok(self.dir_exists(path) || self.docs.contains_key(path))
    }

    fn directory_exists(&self, path: &DocPath) -> Result<bool, Error> {
        Ok(self.dir_exists(path))
    }

    fn document_exists(&self, path: &DocPath) -> Result<bool, Error> {
        Ok(self.docs.contains_key(path))
    }

    fn read(&self, path: &DocPath) -> Result<Option<Value>, Error> {
        Ok(self.docs.get(path).cloned())
    }

    fn create_if_absent(&mut self, path: &DocPath, doc: &Value) -> Result<bool, Error> {
        if self.docs.contains_key(path) {
            return Ok(false);
        }
        self.require_parent(path)?;
        self.docs.insert(path.clone(), doc.clone());
        Ok(true)
    }

    fn overwrite(&mut self, path: &DocPath, doc: &Value) -> Result<(), Error> {
        match self.docs.get_mut(path) {
            Some(slot) => {
                *slot = doc.clone();
                Ok(())
            }
            None => Err(storage_error("cannot overwrite a missing document", path)),
        }
    }

    fn delete(&mut self, path: &DocPath) -> Result<(), Error> {
        self.docs
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| storage_error("cannot delete a missing document", path))
    }

    fn rename(&mut self, from: &DocPath, to: &DocPath) -> Result<(), Error> {
        if self.docs.contains_key(to) {
            return Err(storage_error("rename destination already exists", to));
        }
        self.require_parent(to)?;
        let doc = self
            .docs
            .remove(from)
            .ok_or_else(|| storage_error("cannot rename a missing document", from))?;
        self.docs.insert(to.clone(), doc);
        Ok(())
    }

    fn make_directory(&mut self, path: &DocPath) -> Result<(), Error> {
        let mut current = DocPath::root();
        for segment in path.segments() {
            current = current.join(segment.clone());
            self.dirs.insert(current.clone());
        }
        Ok(())
    }

    fn remove_directory_recursive(&mut self, path: &DocPath) -> Result<(), Error> {
        if !self.dir_exists(path) {
            return Err(storage_error("cannot remove a missing directory", path));
        }
        // A document named like the directory is its sibling, not its child.
        self.docs.retain(|doc, _| doc == path || !doc.starts_with(path));
        self.dirs.retain(|dir| !dir.starts_with(path));
        Ok(())
    }
}
