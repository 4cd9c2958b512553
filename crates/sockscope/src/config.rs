//! Tracker configuration.
//!
//! Defaults can be overridden from the environment:
//!
//! | variable                 | meaning                                   |
//! |--------------------------|-------------------------------------------|
//! | `SOCKSCOPE_NSENTER`      | launcher command line, e.g. `sudo -n nsenter` |
//! | `SOCKSCOPE_EXE`          | binary to re-execute inside namespaces    |
//! | `SOCKSCOPE_PROC_ROOT`    | procfs mount point                        |
//! | `SOCKSCOPE_TIMEOUT_SECS` | per-namespace re-entry timeout            |

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::namespace::PROC_ROOT;
use crate::util::tokens;

/// Launcher used when nothing else is configured.
pub const DEFAULT_LAUNCHER: &str = "nsenter";

/// Settings for a [`SocketTracker`](crate::SocketTracker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Program (plus leading arguments) that enters a namespace and runs a
    /// command. It receives `--net=<path>` followed by the command.
    pub launcher: Vec<String>,
    /// The binary re-executed inside foreign namespaces.
    pub executable: PathBuf,
    /// Where procfs is mounted.
    pub proc_root: PathBuf,
    /// Upper bound on one re-entry. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            launcher: vec![DEFAULT_LAUNCHER.to_string()],
            executable: std::env::current_exe().unwrap_or_else(|_| PathBuf::from("sockscope")),
            proc_root: PathBuf::from(PROC_ROOT),
            timeout: None,
        }
    }
}

impl TrackerConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides taken from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(launcher) = lookup("SOCKSCOPE_NSENTER") {
            config = config.launcher_line(&launcher)?;
        }
        if let Some(exe) = lookup("SOCKSCOPE_EXE") {
            config.executable = PathBuf::from(exe);
        }
        if let Some(root) = lookup("SOCKSCOPE_PROC_ROOT") {
            config.proc_root = PathBuf::from(root);
        }
        if let Some(secs) = lookup("SOCKSCOPE_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::InvalidConfig(format!("SOCKSCOPE_TIMEOUT_SECS: '{}' is not a number", secs))
            })?;
            config.timeout = (secs > 0).then_some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Set the launcher from a whitespace-separated command line.
    pub fn launcher_line(mut self, line: &str) -> Result<Self> {
        let launcher = tokens(line);
        if launcher.is_empty() {
            return Err(Error::InvalidConfig("launcher command is empty".to_string()));
        }
        self.launcher = launcher;
        Ok(self)
    }

    /// Set the binary to re-execute.
    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = path.into();
        self
    }

    /// Set the procfs mount point.
    pub fn proc_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.proc_root = path.into();
        self
    }

    /// Set the re-entry timeout.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.launcher, vec!["nsenter"]);
        assert_eq!(config.proc_root, PathBuf::from("/proc"));
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = TrackerConfig::from_lookup(lookup_from(&[
            ("SOCKSCOPE_NSENTER", "sudo -n  nsenter"),
            ("SOCKSCOPE_EXE", "/usr/local/bin/sockscope"),
            ("SOCKSCOPE_PROC_ROOT", "/host/proc"),
            ("SOCKSCOPE_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();

        assert_eq!(config.launcher, vec!["sudo", "-n", "nsenter"]);
        assert_eq!(config.executable, PathBuf::from("/usr/local/bin/sockscope"));
        assert_eq!(config.proc_root, PathBuf::from("/host/proc"));
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let config =
            TrackerConfig::from_lookup(lookup_from(&[("SOCKSCOPE_TIMEOUT_SECS", "0")])).unwrap();
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_invalid_values() {
        let err = TrackerConfig::from_lookup(lookup_from(&[("SOCKSCOPE_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let err =
            TrackerConfig::from_lookup(lookup_from(&[("SOCKSCOPE_NSENTER", "   ")])).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
