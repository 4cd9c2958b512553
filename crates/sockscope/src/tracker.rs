//! Cross-namespace aggregation.
//!
//! [`SocketTracker::track_connections`] scans the caller's own namespace
//! directly, then walks every live process and scans each namespace it
//! has not seen before. Namespaces are visited one at a time; the first
//! failure aborts the run and no partial map is returned.

use std::collections::HashSet;

use crate::config::TrackerConfig;
use crate::error::Result;
use crate::namespace::{NamespaceResolver, ProcNamespaces};
use crate::scanner::{CurrentNamespaceScanner, NamespaceScanner, ReexecScanner};
use crate::system::{ConnectionLister, ProcConnections, ProcProcesses, ProcessLister};
use crate::types::ProcessToSocket;

/// Builds socket-to-process maps across network namespaces.
///
/// Every system capability is a type parameter so that tests can swap in
/// fakes; [`SocketTracker::new`] wires up the real ones.
#[derive(Debug, Clone)]
pub struct SocketTracker<
    S = ReexecScanner,
    C = ProcConnections,
    P = ProcProcesses,
    R = ProcNamespaces,
> {
    scanner: S,
    current: CurrentNamespaceScanner<C>,
    processes: P,
    resolver: R,
}

impl SocketTracker {
    /// Create a tracker backed by procfs and `nsenter`.
    ///
    /// Processes, sockets and namespaces are all read from
    /// `config.proc_root`.
    pub fn new(config: &TrackerConfig) -> Self {
        Self::with_parts(
            ReexecScanner::new(config),
            ProcConnections::new(&config.proc_root),
            ProcProcesses::new(&config.proc_root),
            ProcNamespaces::new(&config.proc_root),
        )
    }
}

impl<S, C, P, R> SocketTracker<S, C, P, R>
where
    S: NamespaceScanner,
    C: ConnectionLister,
    P: ProcessLister,
    R: NamespaceResolver,
{
    /// Create a tracker from explicit capabilities.
    pub fn with_parts(scanner: S, connections: C, processes: P, resolver: R) -> Self {
        Self {
            scanner,
            current: CurrentNamespaceScanner::new(connections),
            processes,
            resolver,
        }
    }

    /// Socket map of the namespace this process runs in.
    pub fn track_connections_in_current_namespace(&self) -> Result<ProcessToSocket> {
        self.current.scan()
    }

    /// Socket map of the namespace `pid` runs in, via the scanner.
    pub async fn track_connections_in_namespace(&self, pid: u32) -> Result<ProcessToSocket> {
        self.scanner.scan_in_namespace(pid).await
    }

    /// Socket map of every namespace reachable from the host.
    ///
    /// Maps are merged per process ID, later namespaces overwriting
    /// earlier ones. Process IDs are only unique within one pid
    /// namespace, so a collision silently drops the earlier entry.
    pub async fn track_connections(&self) -> Result<ProcessToSocket> {
        let mut visited = HashSet::new();
        visited.insert(self.resolver.self_namespace()?);

        let mut result = self.track_connections_in_current_namespace()?;

        let pids = self.processes.list_pids()?;
        for pid in pids {
            let namespace = self.resolver.namespace_of(pid)?;
            if visited.contains(&namespace) {
                tracing::trace!(pid, %namespace, "namespace already visited");
                continue;
            }

            tracing::info!(pid, %namespace, "scanning namespace");
            let found = self.track_connections_in_namespace(pid).await?;
            tracing::debug!(pid, processes = found.len(), "namespace scanned");
            result.merge(found);
            visited.insert(namespace);
        }

        tracing::info!(
            namespaces = visited.len(),
            processes = result.len(),
            sockets = result.socket_count(),
            "aggregation complete"
        );
        Ok(result)
    }
}
