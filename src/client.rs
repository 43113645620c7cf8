//! Blocking client: tokenize a file into words, stream them as frames, then
//! half-close and collect the final statistics blob.
//!
//! The inter-word pacing delay is deliberate: it simulates slow clients so a
//! server can be exercised under many concurrently-slow connections.

use crate::codec;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::stats::TextStats;
use rand::Rng;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Randomized delay window applied after every word transmission.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    min: Duration,
    max: Duration,
}

impl Pacing {
    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min: Duration::from_millis(min_ms),
            max: Duration::from_millis(max_ms),
        }
    }

    /// No delay at all; used by tests and fast bulk senders.
    pub fn none() -> Self {
        Self::from_millis(0, 0)
    }

    fn sleep(&self, rng: &mut impl Rng) {
        if self.max.is_zero() {
            return;
        }
        let delay = if self.min == self.max {
            self.min
        } else {
            let ms = rng.gen_range(self.min.as_millis() as u64..=self.max.as_millis() as u64);
            Duration::from_millis(ms)
        };
        thread::sleep(delay);
    }
}

/// Tokenize `input` on whitespace and transmit each word as one frame,
/// sleeping the pacing delay between sends.
///
/// A word over the frame limit is a fatal input-validation error; it is never
/// truncated or split. Returns the number of words sent.
pub fn send_words<R: BufRead, W: Write>(
    input: R,
    stream: &mut W,
    pacing: &Pacing,
) -> Result<u64, ClientError> {
    let mut rng = rand::thread_rng();
    let mut sent = 0u64;

    for line in input.lines() {
        let line = line?;
        for word in line.split_whitespace() {
            debug!(len = word.len(), word, "Sending word");
            codec::write_word(stream, word.as_bytes())?;
            sent += 1;
            pacing.sleep(&mut rng);
        }
    }

    Ok(sent)
}

/// Run the full client session: connect, stream the file's words, half-close,
/// read back the statistics.
pub fn run(config: &ClientConfig) -> Result<TextStats, ClientError> {
    let file = File::open(&config.file).map_err(|e| ClientError::FileOpen {
        path: config.file.clone(),
        source: e,
    })?;

    info!(addr = %config.addr, "Connecting");
    let mut stream = TcpStream::connect(config.addr)?;
    info!(peer = %stream.peer_addr()?, "Connected");

    let pacing = Pacing::from_millis(config.min_delay_ms, config.max_delay_ms);
    let sent = send_words(BufReader::new(file), &mut stream, &pacing)?;
    info!(words = sent, "All words sent, half-closing");

    // Signals "no more words"; the read side stays open for the stats blob.
    stream.shutdown(Shutdown::Write)?;

    let stats = codec::read_stats(&mut stream)?;
    Ok(stats)
}
