//! Backing store trait.
//!
//! A store is the dumb storage medium under a drive: it knows how to stat,
//! read, write, rename and delete absolute paths and nothing else. Policy,
//! sandboxing and id translation live in [`crate::Drive`]; paths handed to a
//! store have already been resolved and checked.
//!
//! - [`LocalStore`] - local disk (the reference medium)
//! - [`MemoryStore`] - in-memory tree, for tests and ephemeral drives

mod local;
mod memory;

pub use local::LocalStore;
pub use memory::MemoryStore;

use std::io::{Read, Seek};
use std::path::Path;

use crate::error::DriveResult;
use crate::types::{DirEntry, Metadata};

/// Readable, seekable byte stream returned by [`Store::open`].
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// Storage primitives a drive is built on.
///
/// All methods block. Each call is expected to be atomic at the level the
/// medium provides (e.g. `rename` on a local filesystem); nothing more.
pub trait Store: Send + Sync {
    // ========================================================================
    // Reading
    // ========================================================================

    /// Get metadata for a path. `NotFound` if it doesn't exist.
    fn stat(&self, path: &Path) -> DriveResult<Metadata>;

    /// List the direct children of a directory, in no particular order.
    fn read_dir(&self, path: &Path) -> DriveResult<Vec<DirEntry>>;

    /// Read entire file contents.
    fn read(&self, path: &Path) -> DriveResult<Vec<u8>>;

    /// Open a file as a seekable stream.
    fn open(&self, path: &Path) -> DriveResult<Box<dyn ReadSeek>>;

    // ========================================================================
    // Writing
    // ========================================================================

    /// Create or truncate a file with the given contents, creating missing
    /// parent directories.
    fn write(&self, path: &Path, data: &[u8]) -> DriveResult<()>;

    /// Create a directory and all missing parents. Existing directories are fine.
    fn create_dir_all(&self, path: &Path) -> DriveResult<()>;

    /// Remove a file or a directory tree. A missing path is not an error.
    fn remove_all(&self, path: &Path) -> DriveResult<()>;

    /// Copy a single file, creating missing parent directories of `to`.
    fn copy_file(&self, from: &Path, to: &Path) -> DriveResult<()>;

    /// Rename a file or directory, creating missing parent directories of `to`.
    fn rename(&self, from: &Path, to: &Path) -> DriveResult<()>;

    // ========================================================================
    // Convenience methods (default implementations)
    // ========================================================================

    /// Check if a path exists. Errors other than not-found propagate.
    fn exists(&self, path: &Path) -> DriveResult<bool> {
        match self.stat(path) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Write a file from a reader. Returns the number of bytes written.
    ///
    /// The default buffers the whole source; stores that can stream override it.
    fn write_from(&self, path: &Path, source: &mut dyn Read) -> DriveResult<u64> {
        let mut data = Vec::new();
        source.read_to_end(&mut data)?;
        self.write(path, &data)?;
        Ok(data.len() as u64)
    }

    /// Recursively copy a directory tree.
    ///
    /// No rollback: a failure part way leaves whatever was already copied.
    fn copy_tree(&self, from: &Path, to: &Path) -> DriveResult<()> {
        self.create_dir_all(to)?;
        for entry in self.read_dir(from)? {
            let src = from.join(&entry.name);
            let dst = to.join(&entry.name);
            if entry.meta.is_dir() {
                self.copy_tree(&src, &dst)?;
            } else {
                self.copy_file(&src, &dst)?;
            }
        }
        Ok(())
    }
}
