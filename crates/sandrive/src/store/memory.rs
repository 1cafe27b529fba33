//! In-memory store.
//!
//! Used for tests and throwaway drives. All data is lost when dropped.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;
use std::time::SystemTime;

use crate::error::{DriveError, DriveResult};
use crate::store::{ReadSeek, Store};
use crate::types::{DirEntry, Metadata};

/// Entry in the memory store.
#[derive(Debug, Clone)]
enum Entry {
    File { data: Vec<u8>, modified: SystemTime },
    Directory { modified: SystemTime },
}

impl Entry {
    fn metadata(&self) -> Metadata {
        match self {
            Entry::File { data, modified } => Metadata {
                size: data.len() as u64,
                modified: *modified,
                ..Metadata::file(0)
            },
            Entry::Directory { modified } => Metadata {
                modified: *modified,
                ..Metadata::directory()
            },
        }
    }

    fn is_dir(&self) -> bool {
        matches!(self, Entry::Directory { .. })
    }
}

/// In-memory store.
///
/// Thread-safe via an internal `RwLock`. Paths are absolute; `/` always
/// exists. Keys are kept in a `BTreeMap` so a subtree is a contiguous range.
#[derive(Debug)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<PathBuf, Entry>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store holding only `/`.
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            PathBuf::from("/"),
            Entry::Directory {
                modified: SystemTime::now(),
            },
        );
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Create a store whose tree already contains `root` as a directory.
    pub fn with_root(root: impl AsRef<Path>) -> DriveResult<Self> {
        let store = Self::new();
        store.create_dir_all(root.as_ref())?;
        Ok(store)
    }

    /// Normalize a path: make it absolute, resolve `.` and `..`.
    fn normalize(path: &Path) -> PathBuf {
        let mut result = PathBuf::from("/");
        for component in path.components() {
            match component {
                Component::ParentDir => {
                    result.pop();
                }
                Component::Normal(s) => result.push(s),
                Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
            }
        }
        result
    }

    fn path_str(path: &Path) -> String {
        path.display().to_string()
    }

    fn read_lock(&self) -> DriveResult<std::sync::RwLockReadGuard<'_, BTreeMap<PathBuf, Entry>>> {
        self.entries
            .read()
            .map_err(|_| DriveError::Io(std::io::Error::other("lock poisoned")))
    }

    fn write_lock(
        &self,
    ) -> DriveResult<std::sync::RwLockWriteGuard<'_, BTreeMap<PathBuf, Entry>>> {
        self.entries
            .write()
            .map_err(|_| DriveError::Io(std::io::Error::other("lock poisoned")))
    }

    /// Create every missing ancestor of `path` as a directory.
    fn ensure_parents(entries: &mut BTreeMap<PathBuf, Entry>, path: &Path) -> DriveResult<()> {
        let Some(parent) = path.parent() else {
            return Ok(());
        };
        let mut current = PathBuf::from("/");
        for component in parent.components() {
            if let Component::Normal(s) = component {
                current.push(s);
                match entries.get(&current) {
                    Some(e) if e.is_dir() => {}
                    Some(_) => {
                        return Err(DriveError::Io(std::io::Error::other(format!(
                            "not a directory: {}",
                            Self::path_str(&current)
                        ))));
                    }
                    None => {
                        entries.insert(
                            current.clone(),
                            Entry::Directory {
                                modified: SystemTime::now(),
                            },
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// Keys of `path` and everything below it.
    fn subtree(entries: &BTreeMap<PathBuf, Entry>, path: &Path) -> Vec<PathBuf> {
        entries
            .range(path.to_path_buf()..)
            .take_while(|(key, _)| key.starts_with(path))
            .map(|(key, _)| key.clone())
            .collect()
    }
}

impl Store for MemoryStore {
    fn stat(&self, path: &Path) -> DriveResult<Metadata> {
        let normalized = Self::normalize(path);
        let entries = self.read_lock()?;
        entries
            .get(&normalized)
            .map(Entry::metadata)
            .ok_or_else(|| DriveError::not_found(Self::path_str(&normalized)))
    }

    fn read_dir(&self, path: &Path) -> DriveResult<Vec<DirEntry>> {
        let normalized = Self::normalize(path);
        let entries = self.read_lock()?;

        match entries.get(&normalized) {
            Some(e) if e.is_dir() => {}
            Some(_) => {
                return Err(DriveError::Io(std::io::Error::other(format!(
                    "not a directory: {}",
                    Self::path_str(&normalized)
                ))));
            }
            None => return Err(DriveError::not_found(Self::path_str(&normalized))),
        }

        let mut result = Vec::new();
        for (entry_path, entry) in entries.range(normalized.clone()..) {
            if !entry_path.starts_with(&normalized) {
                break;
            }
            if entry_path.parent() == Some(normalized.as_path()) {
                if let Some(name) = entry_path.file_name() {
                    result.push(DirEntry::new(
                        name.to_string_lossy().into_owned(),
                        entry.metadata(),
                    ));
                }
            }
        }
        Ok(result)
    }

    fn read(&self, path: &Path) -> DriveResult<Vec<u8>> {
        let normalized = Self::normalize(path);
        let entries = self.read_lock()?;
        match entries.get(&normalized) {
            Some(Entry::File { data, .. }) => Ok(data.clone()),
            Some(Entry::Directory { .. }) => Err(DriveError::Io(std::io::Error::other(format!(
                "is a directory: {}",
                Self::path_str(&normalized)
            )))),
            None => Err(DriveError::not_found(Self::path_str(&normalized))),
        }
    }

    fn open(&self, path: &Path) -> DriveResult<Box<dyn ReadSeek>> {
        let data = self.read(path)?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn write(&self, path: &Path, data: &[u8]) -> DriveResult<()> {
        let normalized = Self::normalize(path);
        let mut entries = self.write_lock()?;
        if entries.get(&normalized).is_some_and(Entry::is_dir) {
            return Err(DriveError::Io(std::io::Error::other(format!(
                "is a directory: {}",
                Self::path_str(&normalized)
            ))));
        }
        Self::ensure_parents(&mut entries, &normalized)?;
        entries.insert(
            normalized,
            Entry::File {
                data: data.to_vec(),
                modified: SystemTime::now(),
            },
        );
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> DriveResult<()> {
        let normalized = Self::normalize(path);
        let mut entries = self.write_lock()?;
        match entries.get(&normalized) {
            Some(e) if e.is_dir() => return Ok(()),
            Some(_) => {
                return Err(DriveError::Io(std::io::Error::other(format!(
                    "file exists: {}",
                    Self::path_str(&normalized)
                ))));
            }
            None => {}
        }
        Self::ensure_parents(&mut entries, &normalized)?;
        entries.insert(
            normalized,
            Entry::Directory {
                modified: SystemTime::now(),
            },
        );
        Ok(())
    }

    fn remove_all(&self, path: &Path) -> DriveResult<()> {
        let normalized = Self::normalize(path);
        let mut entries = self.write_lock()?;
        for key in Self::subtree(&entries, &normalized) {
            entries.remove(&key);
        }
        Ok(())
    }

    fn copy_file(&self, from: &Path, to: &Path) -> DriveResult<()> {
        let data = self.read(from)?;
        self.write(to, &data)
    }

    fn rename(&self, from: &Path, to: &Path) -> DriveResult<()> {
        let from = Self::normalize(from);
        let to = Self::normalize(to);
        let mut entries = self.write_lock()?;

        if !entries.contains_key(&from) {
            return Err(DriveError::not_found(Self::path_str(&from)));
        }
        if from == to {
            return Ok(());
        }
        if to.starts_with(&from) {
            return Err(DriveError::Io(std::io::Error::other(format!(
                "cannot move {} into itself",
                Self::path_str(&from)
            ))));
        }

        Self::ensure_parents(&mut entries, &to)?;

        // Replace whatever sits at the destination, like rename(2).
        for key in Self::subtree(&entries, &to) {
            entries.remove(&key);
        }
        for key in Self::subtree(&entries, &from) {
            if let Some(entry) = entries.remove(&key) {
                let suffix = key.strip_prefix(&from).unwrap_or(Path::new(""));
                let dest = if suffix.as_os_str().is_empty() {
                    to.clone()
                } else {
                    to.join(suffix)
                };
                entries.insert(dest, entry);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read() {
        let store = MemoryStore::new();
        store.write(Path::new("/data/test.txt"), b"hello").unwrap();
        assert_eq!(store.read(Path::new("/data/test.txt")).unwrap(), b"hello");
        assert!(store.stat(Path::new("/data")).unwrap().is_dir());
    }

    #[test]
    fn test_read_dir_direct_children_only() {
        let store = MemoryStore::with_root("/data").unwrap();
        store.write(Path::new("/data/a.txt"), b"a").unwrap();
        store.write(Path::new("/data/sub/b.txt"), b"b").unwrap();
        store.create_dir_all(Path::new("/data2")).unwrap();

        let mut names: Vec<_> = store
            .read_dir(Path::new("/data"))
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.txt", "sub"]);
    }

    #[test]
    fn test_read_dir_on_file_fails() {
        let store = MemoryStore::new();
        store.write(Path::new("/f"), b"x").unwrap();
        assert!(store.read_dir(Path::new("/f")).is_err());
        assert!(store.read_dir(Path::new("/missing")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_remove_all_leaves_siblings_with_shared_prefix() {
        let store = MemoryStore::new();
        store.write(Path::new("/data/x"), b"x").unwrap();
        store.write(Path::new("/database/y"), b"y").unwrap();
        store.remove_all(Path::new("/data")).unwrap();
        assert!(!store.exists(Path::new("/data")).unwrap());
        assert!(store.exists(Path::new("/database/y")).unwrap());
    }

    #[test]
    fn test_rename_directory_moves_subtree() {
        let store = MemoryStore::new();
        store.write(Path::new("/a/one.txt"), b"1").unwrap();
        store.write(Path::new("/a/deep/two.txt"), b"2").unwrap();
        store.rename(Path::new("/a"), Path::new("/b/a")).unwrap();

        assert!(!store.exists(Path::new("/a")).unwrap());
        assert_eq!(store.read(Path::new("/b/a/deep/two.txt")).unwrap(), b"2");
    }

    #[test]
    fn test_rename_into_self_fails() {
        let store = MemoryStore::new();
        store.create_dir_all(Path::new("/a")).unwrap();
        assert!(store.rename(Path::new("/a"), Path::new("/a/b")).is_err());
    }

    #[test]
    fn test_open_returns_cursor() {
        use std::io::Read;

        let store = MemoryStore::new();
        store.write(Path::new("/f.txt"), b"abc").unwrap();
        let mut s = String::new();
        store.open(Path::new("/f.txt")).unwrap().read_to_string(&mut s).unwrap();
        assert_eq!(s, "abc");
    }

    #[test]
    fn test_write_over_directory_fails() {
        let store = MemoryStore::new();
        store.create_dir_all(Path::new("/d")).unwrap();
        assert!(store.write(Path::new("/d"), b"x").is_err());
    }
}
