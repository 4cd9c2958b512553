//! Network namespace identity.
//!
//! Every process has an `ns/net` link under `/proc/<pid>`. Its target,
//! something like `net:[4026531840]`, is the same for all processes that
//! share a socket table, which makes it a cheap deduplication key. The
//! target is only ever compared, never opened.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default mount point of procfs.
pub const PROC_ROOT: &str = "/proc";

/// Path of a process's network namespace reference.
pub fn netns_path(proc_root: &Path, pid: u32) -> PathBuf {
    proc_root.join(pid.to_string()).join("ns/net")
}

/// Opaque identity of a network namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId(String);

impl NamespaceId {
    /// Wrap a resolved link target.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves which network namespace a process lives in.
pub trait NamespaceResolver {
    /// Namespace of the calling process.
    fn self_namespace(&self) -> Result<NamespaceId>;

    /// Namespace of the given process.
    fn namespace_of(&self, pid: u32) -> Result<NamespaceId>;
}

/// [`NamespaceResolver`] reading `ns/net` links from procfs.
#[derive(Debug, Clone)]
pub struct ProcNamespaces {
    proc_root: PathBuf,
}

impl ProcNamespaces {
    /// Resolve against the given procfs mount.
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }

    /// Get the procfs mount this resolver reads.
    pub fn proc_root(&self) -> &Path {
        &self.proc_root
    }

    fn resolve(&self, path: PathBuf) -> Result<NamespaceId> {
        match fs::read_link(&path) {
            Ok(target) => Ok(NamespaceId(target.to_string_lossy().into_owned())),
            Err(source) => Err(Error::NamespaceUnavailable { path, source }),
        }
    }
}

impl Default for ProcNamespaces {
    fn default() -> Self {
        Self::new(PROC_ROOT)
    }
}

impl NamespaceResolver for ProcNamespaces {
    fn self_namespace(&self) -> Result<NamespaceId> {
        self.resolve(self.proc_root.join("self/ns/net"))
    }

    fn namespace_of(&self, pid: u32) -> Result<NamespaceId> {
        self.resolve(netns_path(&self.proc_root, pid))
    }
}
