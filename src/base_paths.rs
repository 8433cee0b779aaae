//! Purpose: Shared base-directory and base-name path resolution helpers.
//! Exports: `default_base_dir` and `resolve_named_base_path`.
//! Role: Keep CLI and API-client path semantics aligned from one source.
//! Invariants: Default base directory remains `~/.dsbase/bases`.
//! Invariants: Base names must not contain path separators.

use std::path::{Path, PathBuf};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum BaseNameResolveError {
    Empty,
    ContainsPathSeparator,
}

pub fn default_base_dir() -> PathBuf {
    let home = std::env::var_os("HOME").unwrap_or_default();
    PathBuf::from(home).join(".dsbase").join("bases")
}

pub(crate) fn resolve_named_base_path(
    name: &str,
    base_dir: &Path,
) -> Result<PathBuf, BaseNameResolveError> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(BaseNameResolveError::Empty);
    }
    if name.contains('/') || name.contains(std::path::MAIN_SEPARATOR) {
        return Err(BaseNameResolveError::ContainsPathSeparator);
    }
    Ok(base_dir.join(name))
}
