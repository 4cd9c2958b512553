//! Producing the socket map of a given process's namespace.
//!
//! There is no way to read another namespace's socket table from here, so
//! [`ReexecScanner`] runs this same binary inside the target namespace
//! (through `nsenter` by default) and decodes what it prints. The child
//! runs the `scan` command, which writes the current namespace's
//! [`ProcessToSocket`] in the same JSON this side decodes.

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::collect::collect;
use crate::config::TrackerConfig;
use crate::error::{Error, Result};
use crate::namespace::netns_path;
use crate::system::{ConnectionLister, ConnectionScope};
use crate::types::ProcessToSocket;

/// Subcommand a re-entered instance is started with.
pub const SCAN_COMMAND: &str = "scan";

/// Produces the socket map of the namespace a process lives in.
pub trait NamespaceScanner {
    /// Scan the network namespace of `pid`.
    fn scan_in_namespace(&self, pid: u32) -> impl Future<Output = Result<ProcessToSocket>> + Send;
}

/// Scanner that re-executes the binary inside the target namespace.
#[derive(Debug, Clone)]
pub struct ReexecScanner {
    launcher: Vec<String>,
    executable: PathBuf,
    proc_root: PathBuf,
    timeout: Option<Duration>,
}

impl ReexecScanner {
    /// Create a scanner from tracker settings.
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            launcher: config.launcher.clone(),
            executable: config.executable.clone(),
            proc_root: config.proc_root.clone(),
            timeout: config.timeout,
        }
    }

    /// Build `<launcher> --net=<proc>/<pid>/ns/net <executable> scan`.
    fn command(&self, pid: u32) -> Result<Command> {
        let (program, args) = self.launcher.split_first().ok_or_else(|| Error::ExecutionFailed {
            pid,
            reason: "launcher command is empty".to_string(),
        })?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .arg(format!("--net={}", netns_path(&self.proc_root, pid).display()))
            .arg(&self.executable)
            .arg(SCAN_COMMAND)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        Ok(cmd)
    }
}

impl NamespaceScanner for ReexecScanner {
    async fn scan_in_namespace(&self, pid: u32) -> Result<ProcessToSocket> {
        let mut cmd = self.command(pid)?;
        let program = cmd.as_std().get_program().to_string_lossy().into_owned();
        tracing::debug!(pid, command = ?cmd.as_std(), "re-entering namespace");

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, cmd.output()).await {
                Ok(output) => output,
                // Dropping the output future kills the child.
                Err(_) => {
                    return Err(Error::ExecutionFailed {
                        pid,
                        reason: format!("timed out after {:?}", limit),
                    });
                }
            },
            None => cmd.output().await,
        };

        let output = output.map_err(|e| Error::ExecutionFailed {
            pid,
            reason: format!("cannot run '{}': {}", program, e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ExecutionFailed {
                pid,
                reason: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        ProcessToSocket::from_json(&output.stdout)
            .map_err(|source| Error::MalformedOutput { pid, source })
    }
}

/// Scanner that collects directly from the caller's own namespace.
///
/// The pid passed to [`NamespaceScanner::scan_in_namespace`] is ignored:
/// whatever namespace this process is in is the one reported.
#[derive(Debug, Clone, Default)]
pub struct CurrentNamespaceScanner<C> {
    connections: C,
}

impl<C: ConnectionLister> CurrentNamespaceScanner<C> {
    /// Wrap a connection lister.
    pub fn new(connections: C) -> Self {
        Self { connections }
    }

    /// Collect the socket map of the current namespace.
    pub fn scan(&self) -> Result<ProcessToSocket> {
        let records = self.connections.list_connections(ConnectionScope::All)?;
        Ok(collect(records))
    }
}

impl<C: ConnectionLister + Sync> NamespaceScanner for CurrentNamespaceScanner<C> {
    async fn scan_in_namespace(&self, _pid: u32) -> Result<ProcessToSocket> {
        self.scan()
    }
}
