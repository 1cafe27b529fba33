//! Core drive types.
//!
//! `FsEntry` is the caller-facing record; `Metadata`/`DirEntry` are what
//! stores hand back. Stores never see ids, the drive never hands out paths.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use strum::{AsRefStr, Display, EnumString};

use crate::collision::check_suffix;
use crate::error::DriveResult;

/// Kind of an entry as reported to callers.
///
/// `Folder` and `File` are structural; the rest are categories assigned by
/// the classifier from the file extension.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntryKind {
    Folder,
    File,
    Document,
    Code,
    Video,
    Image,
    Audio,
    Archive,
}

impl EntryKind {
    /// Returns true for folders.
    pub fn is_folder(&self) -> bool {
        matches!(self, EntryKind::Folder)
    }
}

/// One file-or-folder record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FsEntry {
    /// Base name.
    pub name: String,
    /// Root-relative id, always `/`-separated and starting with `/`.
    pub id: String,
    /// Size in bytes, 0 for folders.
    pub size: u64,
    /// Last modification, epoch seconds.
    pub modified_at: i64,
    /// Folder, file, or a category tag.
    pub kind: EntryKind,
    /// Matching descendants, only filled by nested listings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FsEntry>,
}

impl FsEntry {
    /// Total number of entries in this subtree, counting `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(FsEntry::count).sum::<usize>()
    }
}

/// The unit policies predicate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    Read,
    Write,
}

/// Options for write-class operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationConfig {
    /// Rename around existing targets instead of overwriting them.
    pub prevent_name_collision: bool,
    /// Appended to a colliding name until it is free.
    pub collision_suffix: String,
}

impl Default for OperationConfig {
    fn default() -> Self {
        Self {
            prevent_name_collision: false,
            collision_suffix: ".new".to_string(),
        }
    }
}

impl OperationConfig {
    /// Config with collision avoidance switched on.
    pub fn no_clobber() -> Self {
        Self {
            prevent_name_collision: true,
            ..Self::default()
        }
    }

    /// Set the collision suffix.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.collision_suffix = suffix.into();
        self
    }

    /// `Config` error if the collision suffix is empty or holds a separator.
    pub fn validate(&self) -> DriveResult<()> {
        check_suffix(&self.collision_suffix)
    }
}

/// Store-level entry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl FileType {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }
}

/// Metadata as reported by a store.
#[derive(Debug, Clone)]
pub struct Metadata {
    pub kind: FileType,
    /// Size in bytes. Stores report 0 for directories.
    pub size: u64,
    pub modified: SystemTime,
}

impl Metadata {
    /// Metadata for a file of `size` bytes modified now.
    pub fn file(size: u64) -> Self {
        Self {
            kind: FileType::File,
            size,
            modified: SystemTime::now(),
        }
    }

    /// Metadata for a directory modified now.
    pub fn directory() -> Self {
        Self {
            kind: FileType::Directory,
            size: 0,
            modified: SystemTime::now(),
        }
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Modification time as epoch seconds; pre-epoch times clamp to 0.
    pub fn modified_secs(&self) -> i64 {
        self.modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// Directory entry with its metadata.
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// Entry name (not full path).
    pub name: String,
    pub meta: Metadata,
}

impl DirEntry {
    /// Create a new directory entry.
    pub fn new(name: impl Into<String>, meta: Metadata) -> Self {
        Self {
            name: name.into(),
            meta,
        }
    }
}
