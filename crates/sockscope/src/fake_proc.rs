//! Throwaway procfs trees for tests.

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

static FAKE_ROOT_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Header line of `/proc/net/{tcp,udp}`; parsers skip it.
pub const NET_TABLE_HEADER: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode";

/// A directory laid out like procfs, removed on drop.
pub struct FakeProc {
    root: PathBuf,
}

impl FakeProc {
    pub fn new() -> Self {
        let id = FAKE_ROOT_COUNTER.fetch_add(1, Ordering::SeqCst);
        let root = std::env::temp_dir().join(format!(
            "sockscope-proc-{}-{}",
            std::process::id(),
            id
        ));
        fs::create_dir_all(&root).unwrap();
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Point `<who>/ns/net` at `target`.
    pub fn add_namespace(&self, who: &str, target: &str) {
        let ns = self.root.join(who).join("ns");
        fs::create_dir_all(&ns).unwrap();
        symlink(target, ns.join("net")).unwrap();
    }

    /// Give `pid` a descriptor for socket `inode`.
    pub fn add_socket_fd(&self, pid: u32, fd: u32, inode: u64) {
        let dir = self.root.join(pid.to_string()).join("fd");
        fs::create_dir_all(&dir).unwrap();
        symlink(format!("socket:[{}]", inode), dir.join(fd.to_string())).unwrap();
    }

    /// Write `net/<table>` with the header and the given rows.
    pub fn write_net_table(&self, table: &str, rows: &[&str]) {
        let dir = self.root.join("net");
        fs::create_dir_all(&dir).unwrap();
        let mut contents = String::from(NET_TABLE_HEADER);
        contents.push('\n');
        for row in rows {
            contents.push_str(row);
            contents.push('\n');
        }
        fs::write(dir.join(table), contents).unwrap();
    }
}

impl Drop for FakeProc {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}
