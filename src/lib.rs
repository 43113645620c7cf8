//! wordtally: word- and character-frequency statistics over TCP.
//!
//! A client streams whitespace-delimited words from a file, one
//! length-prefixed frame per word. The server multiplexes all clients on a
//! single readiness loop, tallies per-connection counters, and answers each
//! client's half-close with a fixed-layout statistics blob.

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod server;
pub mod shutdown;
pub mod stats;
