//! Local filesystem store.
//!
//! Maps absolute backing paths straight onto the host filesystem. The store
//! itself does no containment checking; the drive has already resolved and
//! sandboxed every path it passes down.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use crate::error::DriveResult;
use crate::store::{ReadSeek, Store};
use crate::types::{DirEntry, FileType, Metadata};

/// Default permissions for new files (owner only).
pub const DEFAULT_FILE_MODE: u32 = 0o600;

/// Default permissions for new directories (owner only).
pub const DEFAULT_DIR_MODE: u32 = 0o700;

/// Local filesystem store.
///
/// New files and directories are created with `file_mode`/`dir_mode` on unix;
/// the modes are ignored elsewhere.
#[derive(Debug, Clone)]
pub struct LocalStore {
    file_mode: u32,
    dir_mode: u32,
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalStore {
    /// Create a store with owner-only default modes.
    pub fn new() -> Self {
        Self {
            file_mode: DEFAULT_FILE_MODE,
            dir_mode: DEFAULT_DIR_MODE,
        }
    }

    /// Set the mode for newly created files.
    pub fn with_file_mode(mut self, mode: u32) -> Self {
        self.file_mode = mode;
        self
    }

    /// Set the mode for newly created directories.
    pub fn with_dir_mode(mut self, mode: u32) -> Self {
        self.dir_mode = mode;
        self
    }

    /// Convert std::fs::Metadata to store Metadata.
    fn metadata(meta: &fs::Metadata) -> Metadata {
        let kind = if meta.is_dir() {
            FileType::Directory
        } else {
            FileType::File
        };
        Metadata {
            kind,
            size: if meta.is_dir() { 0 } else { meta.len() },
            modified: meta.modified().unwrap_or(std::time::UNIX_EPOCH),
        }
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => self.mkdir_all(parent),
            _ => Ok(()),
        }
    }

    fn mkdir_all(&self, path: &Path) -> io::Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(self.dir_mode);
        }
        builder.create(path)
    }

    fn create_file(&self, path: &Path) -> io::Result<fs::File> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(self.file_mode);
        }
        options.open(path)
    }
}

impl Store for LocalStore {
    fn stat(&self, path: &Path) -> DriveResult<Metadata> {
        let meta = fs::metadata(path)?;
        Ok(Self::metadata(&meta))
    }

    fn read_dir(&self, path: &Path) -> DriveResult<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            // Follow symlinks like `stat` does; a dangling link still lists.
            let meta = match fs::metadata(entry.path()) {
                Ok(meta) => meta,
                Err(_) => entry.metadata()?,
            };
            entries.push(DirEntry::new(
                entry.file_name().to_string_lossy().into_owned(),
                Self::metadata(&meta),
            ));
        }
        Ok(entries)
    }

    fn read(&self, path: &Path) -> DriveResult<Vec<u8>> {
        Ok(fs::read(path)?)
    }

    fn open(&self, path: &Path) -> DriveResult<Box<dyn ReadSeek>> {
        let file = fs::File::open(path)?;
        Ok(Box::new(file))
    }

    fn write(&self, path: &Path, data: &[u8]) -> DriveResult<()> {
        use std::io::Write;

        self.ensure_parent(path)?;
        let mut file = self.create_file(path)?;
        file.write_all(data)?;
        file.flush()?;
        Ok(())
    }

    fn write_from(&self, path: &Path, source: &mut dyn Read) -> DriveResult<u64> {
        self.ensure_parent(path)?;
        let mut file = self.create_file(path)?;
        Ok(io::copy(source, &mut file)?)
    }

    fn create_dir_all(&self, path: &Path) -> DriveResult<()> {
        Ok(self.mkdir_all(path)?)
    }

    fn remove_all(&self, path: &Path) -> DriveResult<()> {
        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if meta.is_dir() {
            fs::remove_dir_all(path)?;
        } else {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn copy_file(&self, from: &Path, to: &Path) -> DriveResult<()> {
        self.ensure_parent(to)?;
        fs::copy(from, to)?;
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> DriveResult<()> {
        self.ensure_parent(to)?;
        fs::rename(from, to)?;
        Ok(())
    }
}
