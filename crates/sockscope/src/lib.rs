//! Namespace-aware socket to process attribution for Linux.
//!
//! This crate answers "which process owns this socket?" on hosts with
//! several network namespaces. It lists the TCP/UDP sockets of the
//! caller's namespace, re-enters every other namespace it can find to do
//! the same there, and merges the results into one [`ProcessToSocket`]
//! map that can be queried by endpoint.
//!
//! # Example
//!
//! ```ignore
//! use sockscope::{LookupParameters, SocketTracker, TrackerConfig};
//!
//! #[tokio::main]
//! async fn main() -> sockscope::Result<()> {
//!     let tracker = SocketTracker::new(&TrackerConfig::from_env()?);
//!     let map = tracker.track_connections().await?;
//!
//!     let params = LookupParameters::new().local("10.0.0.1:80".parse()?);
//!     for pid in map.find_processes(&params) {
//!         println!("{}", pid);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Re-entry
//!
//! Sockets of another namespace are read by running this crate's binary
//! inside it (`nsenter --net=/proc/<pid>/ns/net sockscope scan`) and
//! decoding its JSON output. The caller needs the privileges to enter
//! those namespaces; nothing here acquires them.

pub mod collect;
pub mod config;
pub mod error;
pub mod lookup;
pub mod namespace;
pub mod scanner;
pub mod system;
pub mod tracker;
pub mod types;
pub mod util;

#[cfg(test)]
mod fake_proc;

pub use collect::collect;
pub use config::TrackerConfig;
pub use error::{Error, Result};
pub use lookup::find_processes;
pub use namespace::{NamespaceId, NamespaceResolver, ProcNamespaces};
pub use scanner::{CurrentNamespaceScanner, NamespaceScanner, ReexecScanner, SCAN_COMMAND};
pub use system::{
    ConnectionLister, ConnectionScope, ProcConnections, ProcProcesses, ProcessLister,
    RawConnection, RawEndpoint,
};
pub use tracker::SocketTracker;
pub use types::{Address, LookupParameters, ProcessToSocket, SocketInfo, SocketKind};
