//! Turning raw connection records into a [`ProcessToSocket`] map.

use std::net::IpAddr;

use crate::system::RawConnection;
use crate::types::{Address, ProcessToSocket, SocketInfo};

/// Build a socket map from the records of one namespace.
///
/// Records with both ports zero carry no usable endpoint and are dropped,
/// as are records whose local or remote IP does not parse. Nothing here
/// fails; dropped records are only logged. Per-process order follows the
/// input order.
pub fn collect<I>(records: I) -> ProcessToSocket
where
    I: IntoIterator<Item = RawConnection>,
{
    records
        .into_iter()
        .filter_map(|record| to_socket_info(&record).map(|socket| (record.pid, socket)))
        .collect()
}

fn to_socket_info(record: &RawConnection) -> Option<SocketInfo> {
    if record.local.port == 0 && record.remote.port == 0 {
        tracing::trace!(pid = record.pid, inode = record.inode, "skipping record with zero ports");
        return None;
    }
    let Ok(local) = record.local.ip.parse::<IpAddr>() else {
        tracing::debug!(pid = record.pid, ip = %record.local.ip, "skipping unparseable local ip");
        return None;
    };
    let Ok(remote) = record.remote.ip.parse::<IpAddr>() else {
        tracing::debug!(pid = record.pid, ip = %record.remote.ip, "skipping unparseable remote ip");
        return None;
    };

    Some(SocketInfo {
        local_address: Address::new(local, record.local.port),
        remote_address: Address::new(remote, record.remote.port),
        inode: record.inode,
        kind: record.kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::RawEndpoint;
    use crate::types::SocketKind;

    fn record(pid: u32, local: (&str, u32), remote: (&str, u32), inode: u64) -> RawConnection {
        RawConnection {
            pid,
            local: RawEndpoint::new(local.0, local.1),
            remote: RawEndpoint::new(remote.0, remote.1),
            inode,
            kind: SocketKind::Tcp,
        }
    }

    #[test]
    fn test_collect_groups_by_pid_in_order() {
        let map = collect(vec![
            record(7, ("10.0.0.1", 80), ("10.0.0.2", 9000), 1),
            record(8, ("10.0.0.1", 22), ("10.0.0.3", 5000), 2),
            record(7, ("10.0.0.1", 80), ("10.0.0.4", 9001), 3),
        ]);

        assert_eq!(map.len(), 2);
        let inodes: Vec<u64> = map.get(7).unwrap().iter().map(|s| s.inode).collect();
        assert_eq!(inodes, vec![1, 3]);
        assert_eq!(map.get(8).unwrap()[0].remote_address.port, 5000);
    }

    #[test]
    fn test_collect_drops_zero_ports() {
        let map = collect(vec![
            record(1, ("0.0.0.0", 0), ("0.0.0.0", 0), 10),
            record(2, ("10.0.0.1", 53), ("0.0.0.0", 0), 11),
        ]);

        assert!(!map.contains(1));
        assert_eq!(map.get(2).unwrap()[0].inode, 11);
    }

    #[test]
    fn test_collect_drops_unparseable_ips() {
        let map = collect(vec![
            record(1, ("not-an-ip", 80), ("10.0.0.2", 9000), 1),
            record(2, ("10.0.0.1", 80), ("not-an-ip", 9000), 2),
            record(3, ("", 80), ("10.0.0.2", 9000), 3),
        ]);
        assert!(map.is_empty());
    }

    #[test]
    fn test_collect_keeps_ipv6() {
        let mut rec = record(4, ("::1", 8080), ("::ffff:10.0.0.2", 40000), 5);
        rec.kind = SocketKind::Tcp6;
        let map = collect(vec![rec]);

        let socket = &map.get(4).unwrap()[0];
        assert_eq!(socket.kind, SocketKind::Tcp6);
        assert_eq!(socket.remote_address, "10.0.0.2:40000".parse().unwrap());
    }

    #[test]
    fn test_collect_empty() {
        assert!(collect(Vec::new()).is_empty());
    }
}
