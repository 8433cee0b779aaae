// Error taxonomy shared by the catalog, table handles, and the store adapters.
use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    NotFound,
    AlreadyExists,
    DuplicateFamily,
    UnknownFamily,
    RowNotFound,
    QualifierNotFound,
    VersionNotFound,
    Disabled,
    InvalidFormat,
    NoOp,
    Storage,
    Corrupt,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    path: Option<PathBuf>,
    table: Option<String>,
    row: Option<String>,
    version: Option<u64>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            path: None,
            table: None,
            row: None,
            version: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn path(&self) -> Option<&std::path::Path> {
        self.path.as_deref()
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn row(&self) -> Option<&str> {
        self.row.as_deref()
    }

    pub fn version(&self) -> Option<u64> {
        self.version
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_row(mut self, row: impl Into<String>) -> Self {
        self.row = Some(row.into());
        self
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// True for every "something addressed by the request is absent" kind.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::NotFound
                | ErrorKind::UnknownFamily
                | ErrorKind::RowNotFound
                | ErrorKind::QualifierNotFound
                | ErrorKind::VersionNotFound
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(table) = &self.table {
            write!(f, " (table: {table})")?;
        }
        if let Some(row) = &self.row {
            write!(f, " (row: {row})")?;
        }
        if let Some(version) = self.version {
            write!(f, " (version: {version})")?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::NotFound
        | ErrorKind::UnknownFamily
        | ErrorKind::RowNotFound
        | ErrorKind::QualifierNotFound
        | ErrorKind::VersionNotFound => 3,
        ErrorKind::AlreadyExists | ErrorKind::DuplicateFamily => 4,
        ErrorKind::Disabled => 5,
        ErrorKind::InvalidFormat => 6,
        ErrorKind::NoOp => 7,
        ErrorKind::Storage => 8,
        ErrorKind::Corrupt => 9,
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, to_exit_code};

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Internal, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::NotFound, 3),
            (ErrorKind::UnknownFamily, 3),
            (ErrorKind::RowNotFound, 3),
            (ErrorKind::QualifierNotFound, 3),
            (ErrorKind::VersionNotFound, 3),
            (ErrorKind::AlreadyExists, 4),
            (ErrorKind::DuplicateFamily, 4),
            (ErrorKind::Disabled, 5),
            (ErrorKind::InvalidFormat, 6),
            (ErrorKind::NoOp, 7),
            (ErrorKind::Storage, 8),
            (ErrorKind::Corrupt, 9),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn display_includes_context() {
        let err = Error::new(ErrorKind::VersionNotFound)
            .with_message("version not found")
            .with_table("people")
            .with_row("r1")
            .with_version(7);
        assert_eq!(
            err.to_string(),
            "VersionNotFound: version not found (table: people) (row: r1) (version: 7)"
        );
        assert!(err.is_not_found());
    }
}
