//! Listing options.

use crate::matcher::NameMatcher;

/// How a listing walks and filters a folder.
///
/// Folders are never filtered by `include`/`exclude`: they are always listed
/// and, with `recurse`, always descended into. Patterns are not applied to
/// folder names either, so `exclude = [".*"]` still lists a `.git` folder
/// while hiding `.env` files.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Omit non-folder entries.
    pub skip_files: bool,
    /// Walk descendant folders.
    pub recurse: bool,
    /// Attach descendants under their folder instead of one flat sequence.
    pub nested: bool,
    /// Files must match this to be listed.
    pub include: Option<NameMatcher>,
    /// Files matching this are skipped.
    pub exclude: Option<NameMatcher>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recursive nested listing: a full tree.
    pub fn tree() -> Self {
        Self {
            recurse: true,
            nested: true,
            ..Self::default()
        }
    }

    pub fn skip_files(mut self, skip: bool) -> Self {
        self.skip_files = skip;
        self
    }

    pub fn recurse(mut self, recurse: bool) -> Self {
        self.recurse = recurse;
        self
    }

    pub fn nested(mut self, nested: bool) -> Self {
        self.nested = nested;
        self
    }

    pub fn include(mut self, matcher: NameMatcher) -> Self {
        self.include = Some(matcher);
        self
    }

    pub fn exclude(mut self, matcher: NameMatcher) -> Self {
        self.exclude = Some(matcher);
        self
    }

    /// Whether a file named `name` passes the filters.
    pub fn admits_file(&self, name: &str) -> bool {
        if self.skip_files {
            return false;
        }
        if let Some(include) = &self.include {
            if !include.matches(name) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude {
            if exclude.matches(name) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_admits_everything() {
        assert!(ListOptions::new().admits_file("anything"));
    }

    #[test]
    fn test_skip_files() {
        assert!(!ListOptions::new().skip_files(true).admits_file("a.txt"));
    }

    #[test]
    fn test_include_and_exclude() {
        let opts = ListOptions::new()
            .include(NameMatcher::glob("*.txt").unwrap())
            .exclude(NameMatcher::glob("b*").unwrap());
        assert!(opts.admits_file("a.txt"));
        assert!(!opts.admits_file("b.txt"));
        assert!(!opts.admits_file("c.jpg"));
    }
}
