//! Core data model for socket attribution.
//!
//! The serialized form of [`ProcessToSocket`] is the wire format that a
//! re-entered instance writes to stdout and its parent reads back, so the
//! serde attributes here are part of the protocol.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An IP address plus a port.
///
/// Equality and hashing use the canonical form of the IP, so an IPv4
/// address equals its IPv4-mapped IPv6 form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Address {
    /// IP address.
    pub ip: IpAddr,
    /// Port number.
    pub port: u32,
}

impl Address {
    /// Create a new address.
    pub fn new(ip: impl Into<IpAddr>, port: u32) -> Self {
        Self {
            ip: ip.into(),
            port,
        }
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.port == other.port && self.ip.to_canonical() == other.ip.to_canonical()
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ip.to_canonical().hash(state);
        self.port.hash(state);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip {
            IpAddr::V4(ip) => write!(f, "{}:{}", ip, self.port),
            IpAddr::V6(ip) => write!(f, "[{}]:{}", ip, self.port),
        }
    }
}

impl FromStr for Address {
    type Err = Error;

    /// Parse `ip:port` or `[ipv6]:port`.
    ///
    /// IPv6 hosts must be bracketed: `::1:53` is itself a valid IPv6
    /// address, so without brackets the port is ambiguous.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| Error::InvalidAddress(format!("'{}' is missing a port", s)))?;
        let host = match host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
            Some(inner) => inner,
            None if host.contains(':') => {
                return Err(Error::InvalidAddress(format!(
                    "'{}' needs brackets around the IPv6 address",
                    s
                )));
            }
            None => host,
        };
        let ip: IpAddr = host
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("'{}' is not an IP address", host)))?;
        let port: u32 = port
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("'{}' is not a port", port)))?;
        Ok(Self { ip, port })
    }
}

/// Transport type of a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocketKind {
    /// TCP over IPv4.
    Tcp,
    /// TCP over IPv6.
    Tcp6,
    /// UDP over IPv4.
    Udp,
    /// UDP over IPv6.
    Udp6,
}

impl SocketKind {
    /// Get the kind name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Tcp6 => "tcp6",
            Self::Udp => "udp",
            Self::Udp6 => "udp6",
        }
    }

    /// Check if this is a TCP socket.
    pub fn is_tcp(&self) -> bool {
        matches!(self, Self::Tcp | Self::Tcp6)
    }
}

impl fmt::Display for SocketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// One open socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocketInfo {
    /// Local endpoint.
    pub local_address: Address,
    /// Remote endpoint.
    pub remote_address: Address,
    /// Kernel socket inode.
    pub inode: u64,
    /// Transport type.
    #[serde(rename = "type")]
    pub kind: SocketKind,
}

/// Sockets grouped by the process that owns them.
///
/// A process never appears with an empty socket list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<u32, Vec<SocketInfo>>")]
pub struct ProcessToSocket(BTreeMap<u32, Vec<SocketInfo>>);

impl ProcessToSocket {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a socket to a process's list.
    pub fn push(&mut self, pid: u32, socket: SocketInfo) {
        self.0.entry(pid).or_default().push(socket);
    }

    /// Replace a process's socket list.
    ///
    /// An empty list removes the process.
    pub fn insert(&mut self, pid: u32, sockets: Vec<SocketInfo>) -> Option<Vec<SocketInfo>> {
        if sockets.is_empty() {
            self.0.remove(&pid)
        } else {
            self.0.insert(pid, sockets)
        }
    }

    /// Merge another map into this one.
    ///
    /// Entries are replaced per process ID; on a collision the incoming
    /// list wins and the existing one is discarded, not appended to.
    pub fn merge(&mut self, other: ProcessToSocket) {
        self.0.extend(other.0);
    }

    /// Get the sockets owned by a process.
    pub fn get(&self, pid: u32) -> Option<&[SocketInfo]> {
        self.0.get(&pid).map(Vec::as_slice)
    }

    /// Check if a process owns any sockets.
    pub fn contains(&self, pid: u32) -> bool {
        self.0.contains_key(&pid)
    }

    /// Number of processes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if no process owns any sockets.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of sockets across all processes.
    pub fn socket_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// Iterate over process IDs in ascending order.
    pub fn pids(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.keys().copied()
    }

    /// Iterate over `(pid, sockets)` in ascending pid order.
    pub fn iter(&self) -> btree_map::Iter<'_, u32, Vec<SocketInfo>> {
        self.0.iter()
    }

    /// Encode to the compact wire format.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decode from the wire format.
    pub fn from_json(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }
}

impl From<BTreeMap<u32, Vec<SocketInfo>>> for ProcessToSocket {
    fn from(mut map: BTreeMap<u32, Vec<SocketInfo>>) -> Self {
        map.retain(|_, sockets| !sockets.is_empty());
        Self(map)
    }
}

impl FromIterator<(u32, SocketInfo)> for ProcessToSocket {
    fn from_iter<I: IntoIterator<Item = (u32, SocketInfo)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (pid, socket) in iter {
            map.push(pid, socket);
        }
        map
    }
}

impl<'a> IntoIterator for &'a ProcessToSocket {
    type Item = (&'a u32, &'a Vec<SocketInfo>);
    type IntoIter = btree_map::Iter<'a, u32, Vec<SocketInfo>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Criteria for a lookup. `None` matches any value for that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupParameters {
    /// Local endpoint to match.
    pub local_address: Option<Address>,
    /// Remote endpoint to match.
    pub remote_address: Option<Address>,
}

impl LookupParameters {
    /// Parameters that match every socket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Match only sockets with this local endpoint.
    pub fn local(mut self, addr: Address) -> Self {
        self.local_address = Some(addr);
        self
    }

    /// Match only sockets with this remote endpoint.
    pub fn remote(mut self, addr: Address) -> Self {
        self.remote_address = Some(addr);
        self
    }

    /// Check if a socket satisfies both sides of the criteria.
    pub fn matches(&self, socket: &SocketInfo) -> bool {
        self.local_address
            .is_none_or(|addr| addr == socket.local_address)
            && self
                .remote_address
                .is_none_or(|addr| addr == socket.remote_address)
    }
}
