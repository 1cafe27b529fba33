//! Access policies.
//!
//! A [`Policy`] is a pure predicate over a backing path and an
//! [`Operation`]. Policies compose with [`Combined`]; a drive always ends its
//! chain with a [`RootSandbox`] for its own root.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::resolver::normalize;
use crate::types::Operation;

/// Rule that allows or denies an operation on a path.
pub trait Policy: Send + Sync {
    /// Returns true if `operation` on `path` is allowed.
    fn comply(&self, path: &Path, operation: Operation) -> bool;
}

/// Closures are policies, for one-off custom rules.
impl<F> Policy for F
where
    F: Fn(&Path, Operation) -> bool + Send + Sync,
{
    fn comply(&self, path: &Path, operation: Operation) -> bool {
        self(path, operation)
    }
}

/// Allows everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Policy for AllowAll {
    fn comply(&self, _path: &Path, _operation: Operation) -> bool {
        true
    }
}

/// Denies everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl Policy for DenyAll {
    fn comply(&self, _path: &Path, _operation: Operation) -> bool {
        false
    }
}

/// Allows reads, blocks any modification.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnly;

impl Policy for ReadOnly {
    fn comply(&self, _path: &Path, operation: Operation) -> bool {
        operation == Operation::Read
    }
}

/// Denies any path outside `root`.
///
/// Containment is component-wise: `/data` contains `/data` and `/data/x`
/// but not `/database`. The path is normalized first, so `..` segments are
/// judged by where they actually land.
#[derive(Debug, Clone)]
pub struct RootSandbox {
    root: PathBuf,
}

impl RootSandbox {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: normalize(root.as_ref()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Policy for RootSandbox {
    fn comply(&self, path: &Path, _operation: Operation) -> bool {
        normalize(path).starts_with(&self.root)
    }
}

/// Allows an operation only when every member allows it.
///
/// Members are evaluated in order and evaluation stops at the first denial.
#[derive(Clone, Default)]
pub struct Combined {
    policies: Vec<Arc<dyn Policy>>,
}

impl Combined {
    pub fn new(policies: Vec<Arc<dyn Policy>>) -> Self {
        Self { policies }
    }

    /// Append a policy to the end of the chain.
    pub fn with(mut self, policy: impl Policy + 'static) -> Self {
        self.policies.push(Arc::new(policy));
        self
    }

    /// Append an already shared policy.
    pub fn with_arc(mut self, policy: Arc<dyn Policy>) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl fmt::Debug for Combined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Combined")
            .field("policies", &self.policies.len())
            .finish()
    }
}

impl Policy for Combined {
    fn comply(&self, path: &Path, operation: Operation) -> bool {
        self.policies.iter().all(|p| p.comply(path, operation))
    }
}

/// Policies selectable from a config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    #[default]
    AllowAll,
    DenyAll,
    ReadOnly,
}

impl PolicyKind {
    pub fn into_policy(self) -> Arc<dyn Policy> {
        match self {
            PolicyKind::AllowAll => Arc::new(AllowAll),
            PolicyKind::DenyAll => Arc::new(DenyAll),
            PolicyKind::ReadOnly => Arc::new(ReadOnly),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_simple_policies() {
        let p = Path::new("/any");
        assert!(AllowAll.comply(p, Operation::Write));
        assert!(!DenyAll.comply(p, Operation::Read));
        assert!(ReadOnly.comply(p, Operation::Read));
        assert!(!ReadOnly.comply(p, Operation::Write));
    }

    #[test]
    fn test_root_sandbox_is_a_true_prefix_test() {
        let sandbox = RootSandbox::new("/sandbox/./x/..");
        assert_eq!(sandbox.root(), Path::new("/sandbox"));
        assert!(sandbox.comply(Path::new("/sandbox/any"), Operation::Read));
        assert!(sandbox.comply(Path::new("/sandbox/"), Operation::Read));
        assert!(sandbox.comply(Path::new("/sandbox"), Operation::Write));
        assert!(!sandbox.comply(Path::new("/sandboxes/any"), Operation::Read));
        assert!(!sandbox.comply(Path::new("/any"), Operation::Read));
    }

    #[test]
    fn test_root_sandbox_normalizes_traversal() {
        let sandbox = RootSandbox::new("/sandbox");
        assert!(!sandbox.comply(Path::new("/sandbox/../etc/passwd"), Operation::Read));
        assert!(sandbox.comply(Path::new("/sandbox/a/../b"), Operation::Read));
        assert!(!sandbox.comply(Path::new("relative/path"), Operation::Read));
    }

    #[test]
    fn test_combined_is_logical_and() {
        let both = Combined::default().with(ReadOnly).with(RootSandbox::new("/data"));
        assert!(both.comply(Path::new("/data/x"), Operation::Read));
        assert!(!both.comply(Path::new("/data/x"), Operation::Write));
        assert!(!both.comply(Path::new("/etc/x"), Operation::Read));

        let reversed = Combined::default().with(RootSandbox::new("/data")).with(ReadOnly);
        for (path, op) in [
            ("/data/x", Operation::Read),
            ("/data/x", Operation::Write),
            ("/etc/x", Operation::Read),
        ] {
            assert_eq!(
                both.comply(Path::new(path), op),
                reversed.comply(Path::new(path), op)
            );
        }
    }

    #[test]
    fn test_combined_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let combined = Combined::default().with(DenyAll).with(move |_: &Path, _: Operation| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });
        assert!(!combined.comply(Path::new("/x"), Operation::Read));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_combined_allows() {
        let empty = Combined::default();
        assert!(empty.is_empty());
        assert!(empty.comply(Path::new("/x"), Operation::Write));

        let one = empty.with(ReadOnly);
        assert_eq!(one.len(), 1);
        assert!(!one.is_empty());
    }

    #[test]
    fn test_closure_policy() {
        let no_secrets = |path: &Path, _op: Operation| {
            !path.components().any(|c| c.as_os_str() == "secret")
        };
        assert!(no_secrets.comply(Path::new("/data/public"), Operation::Read));
        assert!(!no_secrets.comply(Path::new("/data/secret/key"), Operation::Read));
    }

    #[test]
    fn test_policy_kind_from_config_strings() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: PolicyKind,
        }
        let w: Wrapper = toml::from_str(r#"policy = "read-only""#).unwrap();
        assert_eq!(w.policy, PolicyKind::ReadOnly);
        assert!(!w.policy.into_policy().comply(Path::new("/x"), Operation::Write));
    }
}
