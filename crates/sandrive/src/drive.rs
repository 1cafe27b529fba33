//! The drive façade.
//!
//! Every public operation resolves its id(s) to backing paths, asks the
//! policy chain, optionally renames around collisions, then calls the store
//! and maps results back to ids. The policy chain always ends with a
//! [`RootSandbox`] for the drive's root, so no operation reaches the store
//! with a path outside it.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::classify::{Classifier, ExtensionClassifier};
use crate::collision::CollisionResolver;
use crate::error::{DriveError, DriveResult};
use crate::lister::{make_entry, Lister};
use crate::options::ListOptions;
use crate::policy::{AllowAll, Combined, Policy, RootSandbox};
use crate::resolver::PathResolver;
use crate::store::{ReadSeek, Store};
use crate::types::{FsEntry, Metadata, Operation, OperationConfig};

/// A sandboxed view of a directory tree.
///
/// Cheap to clone: the store, policy chain and classifier are shared. A
/// drive's configuration never changes after construction; derive a new one
/// with [`with_operation_config`](Self::with_operation_config) instead.
#[derive(Clone)]
pub struct Drive {
    store: Arc<dyn Store>,
    resolver: PathResolver,
    policy: Arc<Combined>,
    classifier: Arc<dyn Classifier>,
    list_options: ListOptions,
    operation: OperationConfig,
}

/// Source and final target of a copy or move, after reconciliation.
struct Transfer {
    from: PathBuf,
    to: PathBuf,
    is_dir: bool,
}

impl Drive {
    /// Create a drive over `root` in `store`.
    ///
    /// `policy` is consulted first; a [`RootSandbox`] for `root` is always
    /// appended after it. The root is taken as given; use
    /// [`DriveBuilder`](crate::DriveBuilder) to validate and canonicalize it.
    pub fn new(store: Arc<dyn Store>, root: impl AsRef<Path>, policy: Arc<dyn Policy>) -> Self {
        let resolver = PathResolver::new(root);
        let policy = Combined::default()
            .with_arc(policy)
            .with(RootSandbox::new(resolver.root()));
        Self {
            store,
            resolver,
            policy: Arc::new(policy),
            classifier: Arc::new(ExtensionClassifier::new()),
            list_options: ListOptions::default(),
            operation: OperationConfig::default(),
        }
    }

    /// Drive with no policy beyond the sandbox.
    pub fn open_access(store: Arc<dyn Store>, root: impl AsRef<Path>) -> Self {
        Self::new(store, root, Arc::new(AllowAll))
    }

    /// Replace the entry classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replace the options used by [`list`](Self::list).
    pub fn with_list_options(mut self, options: ListOptions) -> Self {
        self.list_options = options;
        self
    }

    /// A new drive sharing root, store and policy, with a different
    /// operation config. `self` is unchanged.
    pub fn with_operation_config(&self, config: OperationConfig) -> Drive {
        Drive {
            operation: config,
            ..self.clone()
        }
    }

    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    pub fn operation_config(&self) -> &OperationConfig {
        &self.operation
    }

    pub fn list_options(&self) -> &ListOptions {
        &self.list_options
    }

    // ========================================================================
    // Reading
    // ========================================================================

    /// True if [`info`](Self::info) would succeed.
    pub fn exists(&self, id: &str) -> bool {
        self.info(id).is_ok()
    }

    /// Describe one entry without descending into it.
    pub fn info(&self, id: &str) -> DriveResult<FsEntry> {
        debug!(id, "info");
        let path = self.resolver.to_backing_path(id);
        self.check(&path, Operation::Read, id)?;
        let meta = self.stat(&path, id)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        make_entry(&self.resolver, self.classifier.as_ref(), &path, &name, &meta)
    }

    /// Read a whole file.
    pub fn read(&self, id: &str) -> DriveResult<Vec<u8>> {
        debug!(id, "read");
        let path = self.resolver.to_backing_path(id);
        self.check(&path, Operation::Read, id)?;
        self.store.read(&path).map_err(|e| not_found_as(e, id))
    }

    /// Open a file as a seekable stream.
    pub fn open(&self, id: &str) -> DriveResult<Box<dyn ReadSeek>> {
        debug!(id, "open");
        let path = self.resolver.to_backing_path(id);
        self.check(&path, Operation::Read, id)?;
        self.store.open(&path).map_err(|e| not_found_as(e, id))
    }

    /// List a folder with the drive's default options.
    pub fn list(&self, id: &str) -> DriveResult<Vec<FsEntry>> {
        self.list_with(id, &self.list_options)
    }

    /// List a folder with explicit options.
    pub fn list_with(&self, id: &str, options: &ListOptions) -> DriveResult<Vec<FsEntry>> {
        debug!(id, recurse = options.recurse, nested = options.nested, "list");
        let path = self.resolver.to_backing_path(id);
        self.check(&path, Operation::Read, id)?;
        Lister {
            store: self.store.as_ref(),
            resolver: &self.resolver,
            policy: self.policy.as_ref(),
            classifier: self.classifier.as_ref(),
            options,
        }
        .list(&path)
        .map_err(|e| not_found_as(e, id))
    }

    // ========================================================================
    // Writing
    // ========================================================================

    /// Delete a file or folder tree. Deleting a missing entry succeeds.
    pub fn remove(&self, id: &str) -> DriveResult<()> {
        debug!(id, "remove");
        let path = self.resolver.to_backing_path(id);
        self.check(&path, Operation::Write, id)?;
        if self.resolver.is_root(&path) {
            warn!(id, "refusing to remove drive root");
            return Err(DriveError::access_denied(format!("{id}: drive root")));
        }
        self.store.remove_all(&path)
    }

    /// Create a folder and any missing parents. Returns the id created.
    pub fn mkdir(&self, id: &str) -> DriveResult<String> {
        debug!(id, "mkdir");
        let path = self.resolver.to_backing_path(id);
        self.check(&path, Operation::Write, id)?;
        let path = self.final_target(path, id)?;
        self.store.create_dir_all(&path)?;
        self.resolver.to_id(&path)
    }

    /// Create or replace a file. Returns the id written, which differs from
    /// `id` when collision avoidance renamed it.
    pub fn write(&self, id: &str, data: &[u8]) -> DriveResult<String> {
        debug!(id, len = data.len(), "write");
        let path = self.resolver.to_backing_path(id);
        self.check(&path, Operation::Write, id)?;
        let path = self.final_target(path, id)?;
        self.store.write(&path, data)?;
        self.resolver.to_id(&path)
    }

    /// Like [`write`](Self::write), streaming from `source`. Returns the id
    /// written and the number of bytes.
    pub fn write_from(&self, id: &str, source: &mut dyn Read) -> DriveResult<(String, u64)> {
        debug!(id, "write_from");
        let path = self.resolver.to_backing_path(id);
        self.check(&path, Operation::Write, id)?;
        let path = self.final_target(path, id)?;
        let written = self.store.write_from(&path, source)?;
        Ok((self.resolver.to_id(&path)?, written))
    }

    /// Copy a file or folder tree. Returns the id of the copy.
    ///
    /// An existing folder target receives the source under its own name.
    /// Copying a folder onto a file, into itself, or onto itself is a
    /// `Conflict`.
    pub fn copy(&self, source: &str, target: &str) -> DriveResult<String> {
        debug!(source, target, "copy");
        let transfer = self.reconcile(source, target, false)?;
        if transfer.to == transfer.from {
            return Err(DriveError::conflict(format!("{source}: copy onto itself")));
        }
        if transfer.is_dir {
            self.store.copy_tree(&transfer.from, &transfer.to)?;
        } else {
            self.store.copy_file(&transfer.from, &transfer.to)?;
        }
        self.resolver.to_id(&transfer.to)
    }

    /// Move (rename) a file or folder tree. Returns the new id.
    ///
    /// Same target rules as [`copy`](Self::copy), except that moving an entry
    /// onto itself is a no-op. The drive root cannot be moved.
    pub fn move_to(&self, source: &str, target: &str) -> DriveResult<String> {
        debug!(source, target, "move");
        let transfer = self.reconcile(source, target, true)?;
        if transfer.to != transfer.from {
            self.store.rename(&transfer.from, &transfer.to)?;
        }
        self.resolver.to_id(&transfer.to)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn check(&self, path: &Path, operation: Operation, id: &str) -> DriveResult<()> {
        if self.policy.comply(path, operation) {
            return Ok(());
        }
        warn!(id, path = %path.display(), %operation, "access denied");
        Err(DriveError::access_denied(id))
    }

    fn stat(&self, path: &Path, id: &str) -> DriveResult<Metadata> {
        self.store.stat(path).map_err(|e| not_found_as(e, id))
    }

    fn stat_opt(&self, path: &Path) -> DriveResult<Option<Metadata>> {
        match self.store.stat(path) {
            Ok(meta) => Ok(Some(meta)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Apply collision avoidance (when enabled) and check the result is
    /// still writable. The renamed path can differ in policy from the one
    /// the caller asked for, e.g. `root.new` next to the root.
    fn final_target(&self, path: PathBuf, id: &str) -> DriveResult<PathBuf> {
        if !self.operation.prevent_name_collision {
            return Ok(path);
        }
        let resolved = CollisionResolver::new(&self.operation.collision_suffix)
            .resolve(self.store.as_ref(), &path)?;
        if resolved != path {
            self.check(&resolved, Operation::Write, id)?;
        }
        Ok(resolved)
    }

    /// Work out where a copy or move really lands.
    ///
    /// The source must be readable; a move also needs it writable.
    fn reconcile(&self, source: &str, target: &str, moving: bool) -> DriveResult<Transfer> {
        let from = self.resolver.to_backing_path(source);
        let mut to = self.resolver.to_backing_path(target);
        self.check(&from, Operation::Read, source)?;
        if moving {
            self.check(&from, Operation::Write, source)?;
        }
        self.check(&to, Operation::Write, target)?;
        if moving && self.resolver.is_root(&from) {
            warn!(source, "refusing to move drive root");
            return Err(DriveError::access_denied(format!("{source}: drive root")));
        }

        let source_meta = self.stat(&from, source)?;
        let is_dir = source_meta.is_dir();

        match self.stat_opt(&to)? {
            Some(meta) if meta.is_dir() => {
                let name = from.file_name().ok_or_else(|| {
                    DriveError::conflict(format!("{source}: cannot place the root inside itself"))
                })?;
                to.push(name);
            }
            Some(_) if is_dir => {
                return Err(DriveError::conflict(format!(
                    "{source}: cannot replace file {target} with a folder"
                )));
            }
            _ => {}
        }

        if to != from && to.starts_with(&from) {
            return Err(DriveError::conflict(format!(
                "{source}: cannot place a folder inside itself"
            )));
        }

        let to = self.final_target(to, target)?;
        // Retargeting may have moved us under a different policy.
        self.check(&to, Operation::Write, target)?;

        Ok(Transfer { from, to, is_dir })
    }
}

/// Store not-found errors carry host paths; report the caller's id instead.
fn not_found_as(err: DriveError, id: &str) -> DriveError {
    if err.is_not_found() {
        DriveError::not_found(id)
    } else {
        err
    }
}

impl fmt::Debug for Drive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drive")
            .field("root", &self.resolver.root())
            .field("policy", &self.policy)
            .field("list_options", &self.list_options)
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}
