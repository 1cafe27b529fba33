//! Sandboxed virtual drive over a directory tree.
//!
//! A [`Drive`] exposes files and folders under a root through stable,
//! root-relative ids (`/`, `/docs/report.pdf`). Every operation is checked
//! against a [`Policy`] chain that always ends with a [`RootSandbox`], so no
//! id, however many `..` segments it carries, reaches the backing store
//! outside the root.
//!
//! ```no_run
//! use sandrive::{DriveBuilder, ListOptions, OperationConfig};
//!
//! # fn main() -> sandrive::DriveResult<()> {
//! let drive = DriveBuilder::new("/srv/files")
//!     .operation_config(OperationConfig::no_clobber())
//!     .build()?;
//!
//! let id = drive.write("/notes/today.md", b"# hello")?;
//! for entry in drive.list_with("/", &ListOptions::tree())? {
//!     println!("{} {}", entry.kind, entry.id);
//! }
//! drive.remove(&id)?;
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod collision;
pub mod config;
pub mod drive;
pub mod error;
pub mod lister;
pub mod matcher;
pub mod options;
pub mod policy;
pub mod resolver;
pub mod store;
pub mod types;

pub use classify::{Classifier, ExtensionClassifier};
pub use collision::CollisionResolver;
pub use config::{ClassifierConfig, DriveBuilder, DriveConfig, ListConfig};
pub use drive::Drive;
pub use error::{DriveError, DriveResult};
pub use lister::sort_entries;
pub use matcher::NameMatcher;
pub use options::ListOptions;
pub use policy::{AllowAll, Combined, DenyAll, Policy, PolicyKind, ReadOnly, RootSandbox};
pub use resolver::PathResolver;
pub use store::{LocalStore, MemoryStore, ReadSeek, Store};
pub use types::{
    DirEntry, EntryKind, FileType, FsEntry, Metadata, Operation, OperationConfig,
};
