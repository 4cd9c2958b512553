//! Endpoint lookups against a finished socket map.

use crate::types::{LookupParameters, ProcessToSocket};

/// Find the processes holding a socket that matches `params`.
///
/// A process appears once per matching socket, so the result can contain
/// the same pid several times. Results come in ascending pid order. An
/// empty vector means nothing matched.
pub fn find_processes(map: &ProcessToSocket, params: &LookupParameters) -> Vec<u32> {
    map.iter()
        .flat_map(|(&pid, sockets)| {
            sockets
                .iter()
                .filter(move |socket| params.matches(socket))
                .map(move |_| pid)
        })
        .collect()
}

impl ProcessToSocket {
    /// Find the processes holding a socket that matches `params`.
    ///
    /// See [`find_processes`].
    pub fn find_processes(&self, params: &LookupParameters) -> Vec<u32> {
        find_processes(self, params)
    }
}
