//! Entry classification by file extension.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::types::EntryKind;

/// Decides the [`EntryKind`] of a listed entry.
pub trait Classifier: Send + Sync {
    fn classify(&self, name: &str, is_dir: bool) -> EntryKind;
}

/// Built-in extension table. Keys are lowercase, without the dot.
static EXTENSIONS: LazyLock<HashMap<&'static str, EntryKind>> = LazyLock::new(|| {
    use EntryKind::*;

    let table: &[(&[&'static str], EntryKind)] = &[
        (
            &["docx", "doc", "odt", "xls", "xslx", "pdf", "djvu", "djv", "pptx", "ppt"],
            Document,
        ),
        (
            &[
                "html", "htm", "js", "json", "css", "scss", "sass", "php", "sh", "coffee", "txt",
                "md",
            ],
            Code,
        ),
        (&["mpg", "mp4", "avi", "mkv", "ogv"], Video),
        (&["png", "jpg", "jpeg", "gif", "tiff", "tif", "svg"], Image),
        (&["mp3", "ogg", "flac", "wav"], Audio),
        (&["zip", "rar", "7z", "tar", "gz"], Archive),
    ];

    table
        .iter()
        .flat_map(|(exts, kind)| exts.iter().map(move |ext| (*ext, *kind)))
        .collect()
});

/// Classifier backed by the built-in extension table, with optional
/// per-drive overrides consulted first.
#[derive(Debug, Clone, Default)]
pub struct ExtensionClassifier {
    overrides: HashMap<String, EntryKind>,
}

impl ExtensionClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `ext` (without the dot, any case) to `kind` for this classifier.
    pub fn with_extension(mut self, ext: &str, kind: EntryKind) -> Self {
        self.overrides.insert(ext.to_lowercase(), kind);
        self
    }

    /// Extension of `name`, lowercased. Dotfiles like `.bashrc` have none.
    fn extension(name: &str) -> Option<String> {
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }
}

impl Classifier for ExtensionClassifier {
    fn classify(&self, name: &str, is_dir: bool) -> EntryKind {
        if is_dir {
            return EntryKind::Folder;
        }
        let Some(ext) = Self::extension(name) else {
            return EntryKind::File;
        };
        self.overrides
            .get(&ext)
            .or_else(|| EXTENSIONS.get(ext.as_str()))
            .copied()
            .unwrap_or(EntryKind::File)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_categories() {
        let c = ExtensionClassifier::new();
        assert_eq!(c.classify("report.PDF", false), EntryKind::Document);
        assert_eq!(c.classify("a.txt", false), EntryKind::Code);
        assert_eq!(c.classify("c.jpg", false), EntryKind::Image);
        assert_eq!(c.classify("song.flac", false), EntryKind::Audio);
        assert_eq!(c.classify("backup.tar.gz", false), EntryKind::Archive);
    }

    #[test]
    fn test_unknown_and_missing_extensions_are_files() {
        let c = ExtensionClassifier::new();
        assert_eq!(c.classify("Makefile", false), EntryKind::File);
        assert_eq!(c.classify("data.xyz", false), EntryKind::File);
        assert_eq!(c.classify(".bashrc", false), EntryKind::File);
        assert_eq!(c.classify("trailing.", false), EntryKind::File);
    }

    #[test]
    fn test_directories_are_folders_regardless_of_name() {
        let c = ExtensionClassifier::new();
        assert_eq!(c.classify("test.folder", true), EntryKind::Folder);
        assert_eq!(c.classify("photos.jpg", true), EntryKind::Folder);
    }

    #[test]
    fn test_overrides_win() {
        let c = ExtensionClassifier::new()
            .with_extension("RS", EntryKind::Code)
            .with_extension("txt", EntryKind::Document);
        assert_eq!(c.classify("main.rs", false), EntryKind::Code);
        assert_eq!(c.classify("notes.txt", false), EntryKind::Document);
    }
}
