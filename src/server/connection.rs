//! Connection state and the table of active connections.
//!
//! Each accepted client is paired with its own accumulator and partial-frame
//! reader. The table's slab key doubles as the connection's `mio::Token`, so
//! the watch registration and the table entry always correspond; keys of
//! surviving entries are stable across removals.

use crate::codec::FrameReader;
use crate::stats::TextStats;
use mio::net::TcpStream;
use slab::Slab;
use std::net::SocketAddr;

/// Logical state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// Streaming word frames.
    Active,
    /// Disconnect observed; teardown in progress.
    Closing,
}

/// A single accepted client.
///
/// Exclusively owned by the [`ConnectionTable`]; the accumulator lives and
/// dies with the connection.
#[derive(Debug)]
pub struct Connection {
    pub stream: TcpStream,
    pub peer: SocketAddr,
    pub stats: TextStats,
    pub reader: FrameReader,
    pub state: ConnState,
}

impl Connection {
    /// Create a connection in the active state with a zeroed accumulator.
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self {
            stream,
            peer,
            stats: TextStats::new(),
            reader: FrameReader::new(),
            state: ConnState::Active,
        }
    }

    /// Mark the connection for teardown.
    pub fn mark_closing(&mut self) {
        self.state = ConnState::Closing;
    }

    pub fn is_closing(&self) -> bool {
        self.state == ConnState::Closing
    }
}

/// Registry of active connections keyed by slab index.
///
/// O(1) insert, lookup, and remove.
pub struct ConnectionTable {
    connections: Slab<Connection>,
    max_connections: usize,
}

impl ConnectionTable {
    pub fn new(max_connections: usize) -> Self {
        Self {
            connections: Slab::with_capacity(max_connections),
            max_connections,
        }
    }

    /// Insert a new connection, returning its key.
    ///
    /// Returns `None` at capacity; the rejected connection is dropped (and
    /// its stream closed) by the caller letting it fall out of scope.
    pub fn insert(&mut self, conn: Connection) -> Option<usize> {
        if self.connections.len() >= self.max_connections {
            return None;
        }
        Some(self.connections.insert(conn))
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut Connection> {
        self.connections.get_mut(id)
    }

    /// Remove a connection. Must only be called after that connection's
    /// teardown side effects are complete; dropping the returned value closes
    /// the stream and frees the accumulator.
    pub fn remove(&mut self, id: usize) -> Option<Connection> {
        self.connections.try_remove(id)
    }

    pub fn contains(&self, id: usize) -> bool {
        self.connections.contains(id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Drop all connections (terminal cleanup).
    pub fn clear(&mut self) {
        self.connections.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn connect_pair(listener: &TcpListener) -> Connection {
        let addr = listener.local_addr().unwrap();
        let stream = TcpStream::connect(addr).unwrap();
        Connection::new(stream, addr)
    }

    #[test]
    fn test_connection_state_transitions() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let mut conn = connect_pair(&listener);

        assert_eq!(conn.state, ConnState::Active);
        assert!(!conn.is_closing());
        assert_eq!(conn.stats.word_count, 0);

        conn.mark_closing();
        assert!(conn.is_closing());
    }

    #[test]
    fn test_insert_remove_leaves_others_untouched() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let mut table = ConnectionTable::new(8);

        let id1 = table.insert(connect_pair(&listener)).unwrap();
        let id2 = table.insert(connect_pair(&listener)).unwrap();
        table.get_mut(id2).unwrap().stats.update(b"word");
        let len_before = table.len();

        let id3 = table.insert(connect_pair(&listener)).unwrap();
        assert!(table.remove(id3).is_some());

        // Same length as before the insert; other entries keep their keys
        // and contents.
        assert_eq!(table.len(), len_before);
        assert!(table.contains(id1));
        assert_eq!(table.get_mut(id2).unwrap().stats.word_count, 1);
    }

    #[test]
    fn test_capacity_limit() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let mut table = ConnectionTable::new(1);

        let id = table.insert(connect_pair(&listener)).unwrap();
        assert!(table.insert(connect_pair(&listener)).is_none());

        table.remove(id);
        assert!(table.insert(connect_pair(&listener)).is_some());
    }

    #[test]
    fn test_remove_missing_is_none() {
        let mut table = ConnectionTable::new(4);
        assert!(table.remove(0).is_none());
        assert!(table.is_empty());
    }
}
