//! End-to-end scenarios over real sockets: one event loop thread, blocking
//! clients driving it through the public client helpers.

use std::io;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::thread::{self, JoinHandle};
use wordtally::client::{send_words, Pacing};
use wordtally::codec::read_stats;
use wordtally::config::ServerConfig;
use wordtally::server::Server;
use wordtally::shutdown::ShutdownFlag;
use wordtally::stats::TextStats;

struct TestServer {
    addr: SocketAddr,
    shutdown: ShutdownFlag,
    handle: JoinHandle<io::Result<()>>,
}

impl TestServer {
    fn start() -> Self {
        let config = ServerConfig {
            addr: "127.0.0.1:0".parse().unwrap(),
            backlog: 16,
            max_connections: 32,
            log_level: "info".to_string(),
        };

        let shutdown = ShutdownFlag::new();
        let mut server = Server::bind(&config, shutdown.clone()).unwrap();
        let addr = server.local_addr().unwrap();
        let handle = thread::spawn(move || server.run());

        Self {
            addr,
            shutdown,
            handle,
        }
    }

    fn stop(self) {
        self.shutdown.set();
        self.handle.join().unwrap().unwrap();
    }
}

/// Send a whitespace-separated word list and collect the final stats.
fn run_session(addr: SocketAddr, words: &str, pacing: Pacing) -> TextStats {
    let mut stream = TcpStream::connect(addr).unwrap();
    send_words(words.as_bytes(), &mut stream, &pacing).unwrap();
    stream.shutdown(Shutdown::Write).unwrap();
    read_stats(&mut stream).unwrap()
}

#[test]
fn test_single_client_scenario() {
    let server = TestServer::start();

    let stats = run_session(server.addr, "Hello hello WORLD", Pacing::none());

    assert_eq!(stats.word_count, 3);
    assert_eq!(stats.character_count, 15);
    assert_eq!(stats.character_frequency[b'h' as usize], 2);
    assert_eq!(stats.character_frequency[b'l' as usize], 5);
    assert_eq!(stats.character_frequency[b'w' as usize], 1);
    assert_eq!(stats.character_frequency[b'o' as usize], 3);

    server.stop();
}

#[test]
fn test_zero_word_client_gets_valid_blob() {
    let server = TestServer::start();

    let mut stream = TcpStream::connect(server.addr).unwrap();
    stream.shutdown(Shutdown::Write).unwrap();
    let stats = read_stats(&mut stream).unwrap();

    assert_eq!(stats, TextStats::new());

    server.stop();
}

#[test]
fn test_slow_and_fast_clients_interleave() {
    let server = TestServer::start();
    let addr = server.addr;

    // Slow client paces its words so the fast client connects, finishes, and
    // tears down mid-stream; its table entry must survive the compaction.
    let slow = thread::spawn(move || {
        run_session(addr, "alpha beta gamma delta", Pacing::from_millis(20, 30))
    });

    let fast = run_session(addr, "one two three", Pacing::none());
    assert_eq!(fast.word_count, 3);
    assert_eq!(fast.character_count, 11);

    let slow_stats = slow.join().unwrap();
    assert_eq!(slow_stats.word_count, 4);
    assert_eq!(slow_stats.character_count, 19);
    assert_eq!(slow_stats.character_frequency[b'a' as usize], 6);

    server.stop();
}

#[test]
fn test_sequential_clients_get_independent_tallies() {
    let server = TestServer::start();

    let first = run_session(server.addr, "aa aa", Pacing::none());
    let second = run_session(server.addr, "b", Pacing::none());

    // No aggregation across connections.
    assert_eq!(first.word_count, 2);
    assert_eq!(first.character_frequency[b'a' as usize], 4);
    assert_eq!(second.word_count, 1);
    assert_eq!(second.character_frequency[b'a' as usize], 0);
    assert_eq!(second.character_frequency[b'b' as usize], 1);

    server.stop();
}

#[test]
fn test_server_stops_on_flag() {
    let server = TestServer::start();

    // A still-open connection must not prevent shutdown.
    let _lingering = TcpStream::connect(server.addr).unwrap();

    server.stop();
}
