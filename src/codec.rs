//! Wire codec for word frames and the statistics blob.
//!
//! ## Word frame (client -> server)
//!
//! ```text
//! [u8 length L][L raw bytes]
//! ```
//!
//! No terminator, no padding. `L = 0` is a valid empty-word frame, distinct
//! from end-of-stream. The one-byte prefix caps words at 255 bytes and bounds
//! per-frame memory.
//!
//! ## Statistics blob (server -> client, sent once at teardown)
//!
//! All integers big-endian, explicit field order; native struct layout is
//! never transmitted.
//!
//! ```text
//! [u32 payload length = 2064]
//! [u64 word_count]
//! [u64 character_count]
//! [u64 character_frequency[0..=255]]
//! ```
//!
//! Header and body are decoded in separate phases so the server can interleave
//! partially delivered frames from many connections; [`FrameReader`] keeps the
//! in-progress frame across readiness events.

use crate::error::CodecError;
use crate::stats::{TextStats, CHAR_TABLE_SIZE};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::{self, Read, Write};

/// Maximum word length representable by the one-byte frame prefix.
pub const MAX_WORD_LEN: usize = 255;

/// Fixed size of the stats blob payload: two totals plus the frequency table.
pub const STATS_PAYLOAD_LEN: usize = 8 + 8 + CHAR_TABLE_SIZE * 8;

/// Append one word frame to `out`.
///
/// Fails with [`CodecError::WordTooLong`] for words over [`MAX_WORD_LEN`]
/// bytes; long input is never truncated or split.
pub fn encode_word(word: &[u8], out: &mut BytesMut) -> Result<(), CodecError> {
    if word.len() > MAX_WORD_LEN {
        return Err(CodecError::WordTooLong {
            len: word.len(),
            max: MAX_WORD_LEN,
        });
    }

    out.reserve(1 + word.len());
    out.put_u8(word.len() as u8);
    out.put_slice(word);
    Ok(())
}

/// Write one word frame to a blocking stream.
///
/// `write_all` is the reliable-write primitive here: it retries on
/// interruption and only fails on a genuine I/O error.
pub fn write_word<W: Write>(writer: &mut W, word: &[u8]) -> Result<(), CodecError> {
    let mut frame = BytesMut::with_capacity(1 + word.len());
    encode_word(word, &mut frame)?;
    writer.write_all(&frame)?;
    Ok(())
}

/// Serialize an accumulator into a complete stats blob (length prefix
/// included). Pure; the accumulator is not mutated.
pub fn encode_stats(stats: &TextStats) -> Bytes {
    let mut out = BytesMut::with_capacity(4 + STATS_PAYLOAD_LEN);
    out.put_u32(STATS_PAYLOAD_LEN as u32);
    out.put_u64(stats.word_count);
    out.put_u64(stats.character_count);
    for &count in stats.character_frequency.iter() {
        out.put_u64(count);
    }
    out.freeze()
}

/// Reconstruct an accumulator from a stats payload (length prefix already
/// consumed).
pub fn decode_stats(payload: &[u8]) -> Result<TextStats, CodecError> {
    if payload.len() != STATS_PAYLOAD_LEN {
        return Err(CodecError::LengthMismatch {
            expected: STATS_PAYLOAD_LEN,
            actual: payload.len(),
        });
    }

    let mut buf = payload;
    let mut stats = TextStats::new();
    stats.word_count = buf.get_u64();
    stats.character_count = buf.get_u64();
    for slot in stats.character_frequency.iter_mut() {
        *slot = buf.get_u64();
    }
    Ok(stats)
}

/// Read a complete stats blob from a blocking stream.
///
/// Reads the length field first, validates it against the fixed layout, then
/// reads exactly that many payload bytes. A stream that closes early fails
/// with [`CodecError::ShortRead`].
pub fn read_stats<R: Read>(reader: &mut R) -> Result<TextStats, CodecError> {
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes).map_err(map_eof)?;
    let declared = u32::from_be_bytes(len_bytes) as usize;

    if declared != STATS_PAYLOAD_LEN {
        return Err(CodecError::LengthMismatch {
            expected: STATS_PAYLOAD_LEN,
            actual: declared,
        });
    }

    let mut payload = vec![0u8; declared];
    reader.read_exact(&mut payload).map_err(map_eof)?;
    decode_stats(&payload)
}

fn map_eof(e: io::Error) -> CodecError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        CodecError::ShortRead
    } else {
        CodecError::Io(e)
    }
}

/// Result of driving a [`FrameReader`] against a non-blocking stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The stream would block; any partial frame is held until the next
    /// readiness event.
    Open,
    /// The peer closed its write side (EOF), possibly mid-frame.
    Closed,
}

#[derive(Debug, Clone, Copy)]
enum FrameState {
    /// Waiting for the one-byte length prefix.
    Header,
    /// Collecting `len` body bytes, `filled` received so far.
    Body { len: usize, filled: usize },
}

/// Incremental word-frame decoder for one connection.
///
/// A frame's header and body need not arrive in the same readiness event, or
/// even in the same TCP segment; the reader carries the in-progress frame
/// across calls. Each call consumes as many complete frames as the stream can
/// deliver without blocking.
#[derive(Debug)]
pub struct FrameReader {
    state: FrameState,
    buf: [u8; MAX_WORD_LEN],
}

impl FrameReader {
    pub fn new() -> Self {
        Self {
            state: FrameState::Header,
            buf: [0; MAX_WORD_LEN],
        }
    }

    /// Drain complete word frames from `stream`, invoking `on_word` for each.
    ///
    /// Returns `Ok(Open)` on `WouldBlock`, `Ok(Closed)` on EOF (a zero-byte
    /// read in either state, including mid-body), and `Err` on any other I/O
    /// failure. Interrupted reads are retried.
    pub fn read_from<R, F>(&mut self, stream: &mut R, mut on_word: F) -> io::Result<ReadOutcome>
    where
        R: Read,
        F: FnMut(&[u8]),
    {
        loop {
            match self.state {
                FrameState::Header => {
                    let mut header = [0u8; 1];
                    match stream.read(&mut header) {
                        Ok(0) => return Ok(ReadOutcome::Closed),
                        Ok(_) => {
                            let len = header[0] as usize;
                            if len == 0 {
                                on_word(&[]);
                            } else {
                                self.state = FrameState::Body { len, filled: 0 };
                            }
                        }
                        Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                            return Ok(ReadOutcome::Open)
                        }
                        Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(e) => return Err(e),
                    }
                }
                FrameState::Body { len, filled } => {
                    match stream.read(&mut self.buf[filled..len]) {
                        Ok(0) => return Ok(ReadOutcome::Closed),
                        Ok(n) => {
                            let filled = filled + n;
                            if filled == len {
                                self.state = FrameState::Header;
                                on_word(&self.buf[..len]);
                            } else {
                                self.state = FrameState::Body { len, filled };
                            }
                        }
                        Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                            return Ok(ReadOutcome::Open)
                        }
                        Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(e) => return Err(e),
                    }
                }
            }
        }
    }
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}
