//! Output formatting for the sockscope command.

use std::io::{self, Write};

use sockscope::ProcessToSocket;

/// Print the compact wire format read back by re-entry parents.
pub fn print_wire(map: &ProcessToSocket) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer(&mut handle, map)?;
    writeln!(handle)?;
    handle.flush()
}

/// Print the socket map as JSON.
pub fn print_json(map: &ProcessToSocket, pretty: bool) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if pretty {
        serde_json::to_writer_pretty(&mut handle, map)?;
    } else {
        serde_json::to_writer(&mut handle, map)?;
    }
    writeln!(handle)?;
    Ok(())
}

/// Print the socket map as a table.
pub fn print_text(map: &ProcessToSocket) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    writeln!(
        handle,
        "{:<8} {:<6} {:<46} {:<46} {}",
        "PID", "Netid", "Local Address:Port", "Peer Address:Port", "Inode"
    )?;
    for (pid, sockets) in map {
        for socket in sockets {
            writeln!(
                handle,
                "{:<8} {:<6} {:<46} {:<46} {}",
                pid,
                socket.kind,
                socket.local_address.to_string(),
                socket.remote_address.to_string(),
                socket.inode
            )?;
        }
    }
    Ok(())
}

/// Print lookup results, one pid per matching socket.
pub fn print_pids(pids: &[u32], json: bool) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if json {
        serde_json::to_writer(&mut handle, pids)?;
        writeln!(handle)?;
    } else {
        for pid in pids {
            writeln!(handle, "{}", pid)?;
        }
    }
    Ok(())
}
