//! Drive configuration: TOML file format and the builder it feeds.
//!
//! ```toml
//! root = "/srv/files"
//! policy = "read-only"
//!
//! [list]
//! recurse = true
//! include = ["*.txt", "*.md"]
//!
//! [operation]
//! prevent_name_collision = true
//!
//! [classifier]
//! extensions = { rs = "code" }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::{Classifier, ExtensionClassifier};
use crate::drive::Drive;
use crate::error::{DriveError, DriveResult};
use crate::matcher::NameMatcher;
use crate::options::ListOptions;
use crate::policy::{AllowAll, Policy, PolicyKind};
use crate::store::{LocalStore, Store};
use crate::types::{EntryKind, OperationConfig};

/// Listing defaults as written in a config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    pub skip_files: bool,
    pub recurse: bool,
    pub nested: bool,
    /// Globs; a file must match one of them.
    pub include: Vec<String>,
    /// Globs; a file matching any of them is skipped.
    pub exclude: Vec<String>,
}

impl ListConfig {
    /// Compile into [`ListOptions`]. Bad globs are a `Config` error.
    pub fn to_options(&self) -> DriveResult<ListOptions> {
        Ok(ListOptions {
            skip_files: self.skip_files,
            recurse: self.recurse,
            nested: self.nested,
            include: NameMatcher::any_glob(&self.include)?,
            exclude: NameMatcher::any_glob(&self.exclude)?,
        })
    }
}

/// Extension overrides, e.g. `{ rs = "code" }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub extensions: BTreeMap<String, EntryKind>,
}

impl ClassifierConfig {
    pub fn to_classifier(&self) -> DriveResult<ExtensionClassifier> {
        let mut classifier = ExtensionClassifier::new();
        for (ext, kind) in &self.extensions {
            if kind.is_folder() {
                return Err(DriveError::config(format!(
                    "extension {ext:?}: \"folder\" is not a file category"
                )));
            }
            classifier = classifier.with_extension(ext.trim_start_matches('.'), *kind);
        }
        Ok(classifier)
    }
}

/// Top-level drive config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Folder the drive is sandboxed to.
    pub root: Option<PathBuf>,
    pub policy: PolicyKind,
    pub list: ListConfig,
    pub operation: OperationConfig,
    pub classifier: ClassifierConfig,
}

impl DriveConfig {
    /// Read and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> DriveResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DriveError::config(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), "loaded drive config");
        Self::from_toml(&content)
    }

    /// Parse and validate config text.
    pub fn from_toml(content: &str) -> DriveResult<Self> {
        let config: DriveConfig =
            toml::from_str(content).map_err(|e| DriveError::config(e.to_string()))?;
        config.list.to_options()?;
        config.classifier.to_classifier()?;
        config.operation.validate()?;
        Ok(config)
    }

    /// A builder for a local drive carrying everything in this config.
    pub fn builder(&self) -> DriveResult<DriveBuilder> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| DriveError::config("no root configured"))?;
        Ok(DriveBuilder::new(root)
            .policy_arc(self.policy.into_policy())
            .list_options(self.list.to_options()?)
            .operation_config(self.operation.clone())
            .classifier(self.classifier.to_classifier()?))
    }

    /// Shorthand for `self.builder()?.build()`.
    pub fn build(&self) -> DriveResult<Drive> {
        self.builder()?.build()
    }
}

/// Assembles a [`Drive`], validating its root.
///
/// Without an explicit store the drive is backed by a [`LocalStore`] and the
/// root is canonicalized, so symlinked or relative roots sandbox the real
/// folder.
pub struct DriveBuilder {
    root: PathBuf,
    store: Option<Arc<dyn Store>>,
    policy: Arc<dyn Policy>,
    list_options: ListOptions,
    operation: OperationConfig,
    classifier: Arc<dyn Classifier>,
}

impl DriveBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            store: None,
            policy: Arc::new(AllowAll),
            list_options: ListOptions::default(),
            operation: OperationConfig::default(),
            classifier: Arc::new(ExtensionClassifier::new()),
        }
    }

    /// Use `store` instead of the local filesystem. The root is then taken
    /// verbatim (absolute, in the store's namespace).
    pub fn store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// Policy consulted before the sandbox.
    pub fn policy(self, policy: impl Policy + 'static) -> Self {
        self.policy_arc(Arc::new(policy))
    }

    pub fn policy_arc(mut self, policy: Arc<dyn Policy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn list_options(mut self, options: ListOptions) -> Self {
        self.list_options = options;
        self
    }

    pub fn operation_config(mut self, config: OperationConfig) -> Self {
        self.operation = config;
        self
    }

    pub fn classifier(mut self, classifier: impl Classifier + 'static) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Build the drive. Fails with `Config` unless the root is an existing
    /// folder and the operation config is usable.
    pub fn build(self) -> DriveResult<Drive> {
        self.operation.validate()?;
        let (store, root): (Arc<dyn Store>, PathBuf) = match self.store {
            Some(store) => (store, self.root),
            None => {
                let root = dunce::canonicalize(&self.root).map_err(|e| {
                    DriveError::config(format!("root {}: {e}", self.root.display()))
                })?;
                (Arc::new(LocalStore::new()), root)
            }
        };

        match store.stat(&root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(DriveError::config(format!(
                    "root {} is not a folder",
                    root.display()
                )));
            }
            Err(e) => {
                return Err(DriveError::config(format!("root {}: {e}", root.display())));
            }
        }

        debug!(root = %root.display(), "drive ready");
        Ok(Drive::new(store, root, self.policy)
            .with_classifier(self.classifier)
            .with_list_options(self.list_options)
            .with_operation_config(self.operation))
    }
}

impl fmt::Debug for DriveBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriveBuilder")
            .field("root", &self.root)
            .field("custom_store", &self.store.is_some())
            .field("list_options", &self.list_options)
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}
