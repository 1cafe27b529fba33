//! Folder listing: walk, filter, flatten or nest, sort.

use std::io;
use std::path::Path;

use tracing::trace;

use crate::classify::Classifier;
use crate::error::{DriveError, DriveResult};
use crate::options::ListOptions;
use crate::policy::Policy;
use crate::resolver::PathResolver;
use crate::store::Store;
use crate::types::{FsEntry, Metadata, Operation};

/// Deepest folder level a recursive listing will descend to. Guards against
/// symlink cycles on stores that follow links.
pub const MAX_DEPTH: usize = 256;

/// Build the caller-facing record for one backing path.
pub(crate) fn make_entry(
    resolver: &PathResolver,
    classifier: &dyn Classifier,
    path: &Path,
    name: &str,
    meta: &Metadata,
) -> DriveResult<FsEntry> {
    let is_dir = meta.is_dir();
    Ok(FsEntry {
        name: name.to_string(),
        id: resolver.to_id(path)?,
        size: if is_dir { 0 } else { meta.size },
        modified_at: meta.modified_secs(),
        kind: classifier.classify(name, is_dir),
        children: Vec::new(),
    })
}

/// Folders first, then case-insensitive name. Stable.
pub fn sort_entries(entries: &mut [FsEntry]) {
    entries.sort_by_cached_key(|e| (!e.kind.is_folder(), e.name.to_uppercase()));
}

/// One listing run. Borrows the drive's collaborators for its duration.
pub(crate) struct Lister<'a> {
    pub store: &'a dyn Store,
    pub resolver: &'a PathResolver,
    pub policy: &'a dyn Policy,
    pub classifier: &'a dyn Classifier,
    pub options: &'a ListOptions,
}

impl Lister<'_> {
    /// List the folder at `dir` (a backing path that has already passed
    /// policy).
    pub fn list(&self, dir: &Path) -> DriveResult<Vec<FsEntry>> {
        let mut entries = self.walk(dir, 0)?;
        // Nested levels sort themselves; flat output sorts once as a whole.
        if !self.options.nested {
            sort_entries(&mut entries);
        }
        Ok(entries)
    }

    fn walk(&self, dir: &Path, depth: usize) -> DriveResult<Vec<FsEntry>> {
        if depth > MAX_DEPTH {
            return Err(DriveError::Io(io::Error::other(format!(
                "listing deeper than {MAX_DEPTH} levels at {}",
                dir.display()
            ))));
        }

        let mut result = Vec::new();
        for child in self.store.read_dir(dir)? {
            let path = dir.join(&child.name);
            if !self.policy.comply(&path, Operation::Read) {
                trace!(path = %path.display(), "omitted by policy");
                continue;
            }

            let is_dir = child.meta.is_dir();
            if !is_dir && !self.options.admits_file(&child.name) {
                trace!(name = %child.name, "filtered");
                continue;
            }

            let mut entry = make_entry(
                self.resolver,
                self.classifier,
                &path,
                &child.name,
                &child.meta,
            )?;

            if is_dir && self.options.recurse {
                let descendants = self.walk(&path, depth + 1)?;
                if self.options.nested {
                    entry.children = descendants;
                    result.push(entry);
                } else {
                    result.push(entry);
                    result.extend(descendants);
                }
            } else {
                result.push(entry);
            }
        }

        if self.options.nested {
            sort_entries(&mut result);
        }
        trace!(dir = %dir.display(), count = result.len(), "listed");
        Ok(result)
    }
}
