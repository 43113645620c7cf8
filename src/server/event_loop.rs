//! mio event loop: accept, per-connection dispatch, and ordered teardown.
//!
//! Readiness-based model: poll tells us when sockets are ready, then we
//! perform non-blocking read/write syscalls. Everything runs on one thread;
//! the only suspension point is the poll call, which is bounded by
//! `POLL_INTERVAL` so a shutdown signal is observed promptly.

use crate::codec::{encode_stats, ReadOutcome};
use crate::config::ServerConfig;
use crate::server::connection::{Connection, ConnectionTable};
use crate::shutdown::ShutdownFlag;
use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const LISTENER_TOKEN: Token = Token(usize::MAX);

const EVENTS_CAPACITY: usize = 256;

/// Upper bound on one poll wait; the shutdown flag is re-checked after each.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Retry budget for the best-effort final stats write.
const SEND_RETRY_LIMIT: u32 = 50;
const SEND_RETRY_DELAY: Duration = Duration::from_millis(2);

/// The word-tally server: one listener, one poll, one connection table.
pub struct Server {
    poll: Poll,
    events: Events,
    listener: TcpListener,
    table: ConnectionTable,
    shutdown: ShutdownFlag,
}

impl Server {
    /// Bind the listener with the configured backlog and register it with a
    /// fresh poll. Any failure here is fatal to the process.
    pub fn bind(config: &ServerConfig, shutdown: ShutdownFlag) -> io::Result<Self> {
        let listener = create_listener(config.addr, config.backlog)?;
        let mut listener = TcpListener::from_std(listener);

        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, LISTENER_TOKEN, Interest::READABLE)?;

        Ok(Self {
            poll,
            events: Events::with_capacity(EVENTS_CAPACITY),
            listener,
            table: ConnectionTable::new(config.max_connections),
            shutdown,
        })
    }

    /// The address the listener actually bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run until the shutdown flag is set.
    ///
    /// A poll failure is the one error with no degradation path and is
    /// returned to the caller; per-connection errors are handled locally as
    /// disconnections and never escape the loop.
    pub fn run(&mut self) -> io::Result<()> {
        let Server {
            poll,
            events,
            listener,
            table,
            shutdown,
        } = self;

        info!(addr = %listener.local_addr()?, "Server listening");

        while !shutdown.is_set() {
            if let Err(e) = poll.poll(events, Some(POLL_INTERVAL)) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                error!(error = %e, "Poll failed");
                return Err(e);
            }

            for event in events.iter() {
                match event.token() {
                    LISTENER_TOKEN => accept_connections(listener, poll, table),
                    Token(conn_id) => {
                        // The entry may already be gone if an earlier event in
                        // this batch tore the connection down.
                        if !table.contains(conn_id) {
                            continue;
                        }

                        match handle_readable(conn_id, table) {
                            Ok(ReadOutcome::Open) => {}
                            Ok(ReadOutcome::Closed) => teardown(poll, table, conn_id),
                            Err(e) => {
                                debug!(conn_id, error = %e, "Connection error");
                                teardown(poll, table, conn_id);
                            }
                        }
                    }
                }
            }
        }

        if !table.is_empty() {
            info!(connections = table.len(), "Closing remaining connections");
            table.clear();
        }
        info!("Server exited cleanly");
        Ok(())
    }
}

/// Accept pending connections until the listener would block.
///
/// Accept failures are logged, not fatal; a full table rejects the client by
/// dropping its stream.
fn accept_connections(listener: &TcpListener, poll: &mut Poll, table: &mut ConnectionTable) {
    loop {
        match listener.accept() {
            Ok((stream, peer)) => {
                let conn_id = match table.insert(Connection::new(stream, peer)) {
                    Some(id) => id,
                    None => {
                        warn!(%peer, "Connection limit reached, rejecting");
                        continue;
                    }
                };

                // Re-borrow after insert to register under the slab key.
                if let Some(conn) = table.get_mut(conn_id) {
                    if let Err(e) = poll.registry().register(
                        &mut conn.stream,
                        Token(conn_id),
                        Interest::READABLE,
                    ) {
                        error!(conn_id, error = %e, "Failed to register connection");
                        table.remove(conn_id);
                        continue;
                    }
                }

                debug!(conn_id, %peer, "Accepted connection");
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                error!(error = %e, "Accept error");
                break;
            }
        }
    }
}

/// Drain word frames from one connection into its accumulator.
///
/// The frame reader carries any partial frame to the next readiness event;
/// `Closed` means the client half-closed (or vanished) and teardown is due.
fn handle_readable(conn_id: usize, table: &mut ConnectionTable) -> io::Result<ReadOutcome> {
    let conn = match table.get_mut(conn_id) {
        Some(conn) => conn,
        None => return Ok(ReadOutcome::Open),
    };

    let Connection {
        ref mut stream,
        ref mut reader,
        ref mut stats,
        ..
    } = *conn;

    reader.read_from(stream, |word| {
        stats.update(word);
        debug!(conn_id, word = %String::from_utf8_lossy(word), "Received word");
    })
}

/// Ordered disconnection teardown: serialize, best-effort send, print, close,
/// remove. Single-threaded, so nothing else observes the intermediate states.
fn teardown(poll: &mut Poll, table: &mut ConnectionTable, conn_id: usize) {
    let conn = match table.get_mut(conn_id) {
        Some(conn) => conn,
        None => return,
    };
    if conn.is_closing() {
        return;
    }
    conn.mark_closing();

    let blob = encode_stats(&conn.stats);
    if let Err(e) = send_best_effort(&mut conn.stream, &blob) {
        // The client may already be gone; its loss.
        warn!(conn_id, peer = %conn.peer, error = %e, "Failed to send final stats");
    }

    info!(
        conn_id,
        peer = %conn.peer,
        words = conn.stats.word_count,
        characters = conn.stats.character_count,
        "Client disconnected"
    );
    info!("Final statistics for {}:\n{}", conn.peer, conn.stats);

    let _ = poll.registry().deregister(&mut conn.stream);
    // Dropping the entry closes the stream and frees the accumulator.
    table.remove(conn_id);
}

/// Write the whole blob to a non-blocking stream with a bounded retry budget.
fn send_best_effort(stream: &mut TcpStream, mut data: &[u8]) -> io::Result<()> {
    let mut retries = 0;

    while !data.is_empty() {
        match stream.write(data) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => data = &data[n..],
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                retries += 1;
                if retries > SEND_RETRY_LIMIT {
                    return Err(io::ErrorKind::TimedOut.into());
                }
                thread::sleep(SEND_RETRY_DELAY);
            }
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    stream.flush()
}

/// Create the std listener via socket2 so the CLI backlog is honored.
fn create_listener(addr: SocketAddr, backlog: i32) -> io::Result<std::net::TcpListener> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;

    Ok(socket.into())
}
