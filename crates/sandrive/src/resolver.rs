//! Id ↔ backing path translation.
//!
//! Ids are root-relative, `/`-separated strings (`/`, `/sub/a.txt`). Backing
//! paths are absolute paths in the store. [`PathResolver`] is the only place
//! the two meet.

use std::path::{Component, Path, PathBuf};

use crate::error::{DriveError, DriveResult};

/// Lexically normalize a path: drop `.` and empty segments, resolve `..`
/// against what precedes it. Never touches the filesystem.
///
/// `..` may climb above any particular root; callers decide containment on
/// the result.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(p) => result.push(p.as_os_str()),
            Component::RootDir => result.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() && !result.has_root() {
                    result.push("..");
                }
            }
            Component::Normal(s) => result.push(s),
        }
    }
    result
}

/// Maps ids onto a root and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver for `root`. The root is normalized but otherwise
    /// taken as given; canonicalization is the caller's business.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: normalize(root.as_ref()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join `id` onto the root and normalize.
    ///
    /// Ids are always split on `/`, whatever the host separator. A leading
    /// `/` is root-relative, so `""`, `"/"` and `"."` all denote the root.
    /// The result may lie outside the root (`/../etc`); use
    /// [`contains`](Self::contains) or a sandbox policy before using it.
    pub fn to_backing_path(&self, id: &str) -> PathBuf {
        let mut path = self.root.clone();
        for segment in id.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    path.pop();
                }
                name => path.push(name),
            }
        }
        normalize(&path)
    }

    /// Strip the root from a backing path, producing its id.
    ///
    /// Fails with `AccessDenied` for paths outside the root.
    pub fn to_id(&self, path: &Path) -> DriveResult<String> {
        let normalized = normalize(path);
        let relative = normalized.strip_prefix(&self.root).map_err(|_| {
            DriveError::access_denied(format!(
                "{} is not under {}",
                normalized.display(),
                self.root.display()
            ))
        })?;

        let mut id = String::new();
        for component in relative.components() {
            id.push('/');
            id.push_str(&component.as_os_str().to_string_lossy());
        }
        if id.is_empty() {
            id.push('/');
        }
        Ok(id)
    }

    /// True path-prefix containment of `path` within the root.
    pub fn contains(&self, path: &Path) -> bool {
        normalize(path).starts_with(&self.root)
    }

    /// Returns true if `path` is the root itself.
    pub fn is_root(&self, path: &Path) -> bool {
        normalize(path) == self.root
    }
}
