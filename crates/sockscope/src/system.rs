//! System primitives: listing connections and processes.
//!
//! The tracker only depends on the [`ConnectionLister`] and
//! [`ProcessLister`] traits. The procfs-backed implementations here are
//! what the binary uses.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use procfs::net::{TcpNetEntries, TcpNetEntry, UdpNetEntries, UdpNetEntry};
use procfs::process::{FDTarget, all_processes_with_root};
use procfs::{FromReadSI, ProcError, current_system_info};

use crate::error::{Error, Result};
use crate::namespace::PROC_ROOT;
use crate::types::SocketKind;

/// Which sockets a connection listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionScope {
    /// TCP and UDP, IPv4 and IPv6.
    #[default]
    All,
    /// TCP only.
    Tcp,
    /// UDP only.
    Udp,
}

impl ConnectionScope {
    fn includes(&self, kind: SocketKind) -> bool {
        match self {
            Self::All => true,
            Self::Tcp => kind.is_tcp(),
            Self::Udp => !kind.is_tcp(),
        }
    }
}

/// One endpoint as reported by a connection listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEndpoint {
    /// IP in text form. May be anything; the collector validates it.
    pub ip: String,
    /// Port number.
    pub port: u32,
}

impl RawEndpoint {
    /// Create an endpoint.
    pub fn new(ip: impl Into<String>, port: u32) -> Self {
        Self {
            ip: ip.into(),
            port,
        }
    }
}

impl From<SocketAddr> for RawEndpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip().to_string(), u32::from(addr.port()))
    }
}

/// One connection as reported by a connection listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawConnection {
    /// Owning process.
    pub pid: u32,
    /// Local endpoint.
    pub local: RawEndpoint,
    /// Remote endpoint.
    pub remote: RawEndpoint,
    /// Kernel socket inode.
    pub inode: u64,
    /// Transport type.
    pub kind: SocketKind,
}

/// Lists the open connections visible in the current network namespace.
pub trait ConnectionLister {
    /// List connections within `scope`.
    fn list_connections(&self, scope: ConnectionScope) -> Result<Vec<RawConnection>>;
}

/// Lists live process IDs.
pub trait ProcessLister {
    /// List the IDs of all processes visible to the caller.
    fn list_pids(&self) -> Result<Vec<u32>>;
}

/// [`ConnectionLister`] backed by `<proc>/net` and `<proc>/<pid>/fd`.
#[derive(Debug, Clone)]
pub struct ProcConnections {
    proc_root: PathBuf,
}

impl ProcConnections {
    /// Read from the given procfs mount.
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }

    fn tcp_table(&self, name: &'static str) -> Result<Vec<TcpNetEntry>> {
        let path = self.proc_root.join("net").join(name);
        optional_table(TcpNetEntries::from_file(path, current_system_info()).map(|t| t.0), name)
    }

    fn udp_table(&self, name: &'static str) -> Result<Vec<UdpNetEntry>> {
        let path = self.proc_root.join("net").join(name);
        optional_table(UdpNetEntries::from_file(path, current_system_info()).map(|t| t.0), name)
    }
}

impl Default for ProcConnections {
    fn default() -> Self {
        Self::new(PROC_ROOT)
    }
}

impl ConnectionLister for ProcConnections {
    fn list_connections(&self, scope: ConnectionScope) -> Result<Vec<RawConnection>> {
        let owners = socket_owners(&self.proc_root)?;
        let mut connections = Vec::new();

        let mut push = |kind: SocketKind, local: SocketAddr, remote: SocketAddr, inode: u64| {
            match owners.get(&inode) {
                Some(&pid) => connections.push(RawConnection {
                    pid,
                    local: local.into(),
                    remote: remote.into(),
                    inode,
                    kind,
                }),
                None => tracing::trace!(inode, %local, %remote, "socket has no owning process"),
            }
        };

        if scope.includes(SocketKind::Tcp) {
            for entry in self.tcp_table("tcp")? {
                push(SocketKind::Tcp, entry.local_address, entry.remote_address, entry.inode);
            }
            for entry in self.tcp_table("tcp6")? {
                push(SocketKind::Tcp6, entry.local_address, entry.remote_address, entry.inode);
            }
        }
        if scope.includes(SocketKind::Udp) {
            for entry in self.udp_table("udp")? {
                push(SocketKind::Udp, entry.local_address, entry.remote_address, entry.inode);
            }
            for entry in self.udp_table("udp6")? {
                push(SocketKind::Udp6, entry.local_address, entry.remote_address, entry.inode);
            }
        }

        Ok(connections)
    }
}

/// [`ProcessLister`] backed by the numeric entries of a procfs mount.
#[derive(Debug, Clone)]
pub struct ProcProcesses {
    proc_root: PathBuf,
}

impl ProcProcesses {
    /// Read from the given procfs mount.
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }
}

impl Default for ProcProcesses {
    fn default() -> Self {
        Self::new(PROC_ROOT)
    }
}

impl ProcessLister for ProcProcesses {
    fn list_pids(&self) -> Result<Vec<u32>> {
        let processes = all_processes_with_root(&self.proc_root)
            .map_err(|e| Error::enumeration("processes", e))?;

        let mut pids = Vec::new();
        for process in processes {
            match process {
                Ok(process) => match u32::try_from(process.pid()) {
                    Ok(pid) => pids.push(pid),
                    Err(_) => tracing::trace!(pid = process.pid(), "ignoring negative pid"),
                },
                // Exited between readdir and open.
                Err(e) => tracing::trace!(error = %e, "skipping process"),
            }
        }
        Ok(pids)
    }
}

/// A missing table means the protocol family is disabled.
fn optional_table<T>(table: procfs::ProcResult<Vec<T>>, what: &'static str) -> Result<Vec<T>> {
    match table {
        Ok(entries) => Ok(entries),
        Err(ProcError::NotFound(_)) => Ok(Vec::new()),
        Err(e) => Err(Error::enumeration(what, e)),
    }
}

/// Map every socket inode to the process holding a descriptor for it.
///
/// When several processes share a socket the lowest pid wins.
fn socket_owners(proc_root: &Path) -> Result<HashMap<u64, u32>> {
    let processes =
        all_processes_with_root(proc_root).map_err(|e| Error::enumeration("processes", e))?;

    let mut owners = HashMap::new();
    for process in processes.filter_map(std::result::Result::ok) {
        let Ok(pid) = u32::try_from(process.pid()) else {
            continue;
        };
        let fds = match process.fd() {
            Ok(fds) => fds,
            Err(e) => {
                // Permission denied or already gone; neither is fatal here.
                tracing::trace!(pid, error = %e, "cannot read descriptors");
                continue;
            }
        };
        for fd in fds.filter_map(std::result::Result::ok) {
            if let FDTarget::Socket(inode) = fd.target {
                owners
                    .entry(inode)
                    .and_modify(|owner: &mut u32| *owner = (*owner).min(pid))
                    .or_insert(pid);
            }
        }
    }
    Ok(owners)
}
