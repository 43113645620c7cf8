//! Single-threaded readiness server.
//!
//! One mio `Poll` multiplexes the listener and every client connection; the
//! connection table and all accumulators are owned by the loop's thread, so
//! nothing here needs locking.

mod connection;
mod event_loop;

pub use event_loop::Server;
