//! Collision avoidance for write-class operations.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{DriveError, DriveResult};
use crate::store::Store;

/// Reject suffixes that would never change a name or would leave its folder.
pub fn check_suffix(suffix: &str) -> DriveResult<()> {
    if suffix.is_empty() {
        return Err(DriveError::config("collision suffix must not be empty"));
    }
    if suffix.contains('/') || suffix.contains(std::path::MAIN_SEPARATOR) {
        return Err(DriveError::config(format!(
            "collision suffix {suffix:?} must not contain a path separator"
        )));
    }
    Ok(())
}

/// Finds a free name by appending a suffix until nothing exists there.
#[derive(Debug, Clone)]
pub struct CollisionResolver {
    suffix: String,
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self::new(".new")
    }
}

impl CollisionResolver {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Return `path` if it is free, otherwise the first of `path.new`,
    /// `path.new.new`, ... that is.
    ///
    /// Any store error other than not-found aborts; a name that grows past
    /// the medium's limit fails instead of looping. An unusable suffix is a
    /// `Config` error.
    pub fn resolve(&self, store: &dyn Store, path: &Path) -> DriveResult<PathBuf> {
        check_suffix(&self.suffix)?;
        let mut candidate = path.to_path_buf();
        while store.exists(&candidate)? {
            let mut name: OsString = candidate.as_os_str().to_owned();
            name.push(&self.suffix);
            candidate = PathBuf::from(name);
        }
        if candidate != path {
            debug!(
                from = %path.display(),
                to = %candidate.display(),
                "renamed around existing entry"
            );
        }
        Ok(candidate)
    }
}
