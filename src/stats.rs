//! Per-connection text statistics accumulator.
//!
//! Each connection owns exactly one [`TextStats`]; it is mutated only by the
//! event handler processing that connection's data and read only during
//! teardown, so no synchronization is needed.

/// Number of entries in the byte-frequency table (one per byte value).
pub const CHAR_TABLE_SIZE: usize = 256;

/// Running tally of words, characters, and per-byte frequencies.
///
/// Frequencies are indexed by byte value after ASCII lowercase folding, so
/// `"AbC"` and `"abc"` contribute identical deltas. All counters saturate at
/// `u64::MAX` rather than wrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextStats {
    pub word_count: u64,
    pub character_count: u64,
    pub character_frequency: [u64; CHAR_TABLE_SIZE],
}

impl TextStats {
    /// Create an accumulator with all counters at zero.
    pub fn new() -> Self {
        Self {
            word_count: 0,
            character_count: 0,
            character_frequency: [0; CHAR_TABLE_SIZE],
        }
    }

    /// Fold one word into the tally.
    ///
    /// Increments the word count by one, the character count by the word's
    /// byte length, and the frequency slot of each byte's lowercase form.
    pub fn update(&mut self, word: &[u8]) {
        self.word_count = self.word_count.saturating_add(1);
        self.character_count = self.character_count.saturating_add(word.len() as u64);

        for &byte in word {
            let slot = &mut self.character_frequency[byte.to_ascii_lowercase() as usize];
            *slot = slot.saturating_add(1);
        }
    }
}

impl Default for TextStats {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TextStats {
    /// Human-readable listing: the two totals, then one line per non-zero
    /// frequency entry.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Word Count: {}", self.word_count)?;
        writeln!(f, "Character Count: {}", self.character_count)?;
        writeln!(f, "Character Frequency")?;
        for (index, &count) in self.character_frequency.iter().enumerate() {
            if count != 0 {
                let byte = index as u8;
                let shown = if byte.is_ascii_graphic() {
                    byte as char
                } else {
                    '?'
                };
                writeln!(f, "Character: {shown} (0x{byte:02x}) Frequency: {count}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_match_input() {
        let mut stats = TextStats::new();
        let words: [&[u8]; 4] = [b"one", b"two", b"three", b""];

        for word in words {
            stats.update(word);
        }

        assert_eq!(stats.word_count, 4);
        let expected: u64 = words.iter().map(|w| w.len() as u64).sum();
        assert_eq!(stats.character_count, expected);
    }

    #[test]
    fn test_case_folding() {
        let mut upper = TextStats::new();
        let mut lower = TextStats::new();

        upper.update(b"AbC");
        lower.update(b"abc");

        assert_eq!(upper.character_frequency, lower.character_frequency);
        assert_eq!(upper.character_frequency[b'a' as usize], 1);
        assert_eq!(upper.character_frequency[b'A' as usize], 0);
    }

    #[test]
    fn test_hello_world_scenario() {
        let mut stats = TextStats::new();
        stats.update(b"Hello");
        stats.update(b"hello");
        stats.update(b"WORLD");

        assert_eq!(stats.word_count, 3);
        assert_eq!(stats.character_count, 15);
        assert_eq!(stats.character_frequency[b'h' as usize], 2);
        assert_eq!(stats.character_frequency[b'l' as usize], 5);
        assert_eq!(stats.character_frequency[b'w' as usize], 1);
        assert_eq!(stats.character_frequency[b'o' as usize], 3);
    }

    #[test]
    fn test_empty_word_counts_once() {
        let mut stats = TextStats::new();
        stats.update(b"");

        assert_eq!(stats.word_count, 1);
        assert_eq!(stats.character_count, 0);
        assert!(stats.character_frequency.iter().all(|&c| c == 0));
    }

    #[test]
    fn test_saturating_counters() {
        let mut stats = TextStats::new();
        stats.word_count = u64::MAX;
        stats.character_frequency[b'a' as usize] = u64::MAX;

        stats.update(b"a");

        assert_eq!(stats.word_count, u64::MAX);
        assert_eq!(stats.character_frequency[b'a' as usize], u64::MAX);
    }

    #[test]
    fn test_non_alphabetic_bytes_not_folded() {
        let mut stats = TextStats::new();
        stats.update(&[0x00, 0xFF, b'1']);

        assert_eq!(stats.character_frequency[0x00], 1);
        assert_eq!(stats.character_frequency[0xFF], 1);
        assert_eq!(stats.character_frequency[b'1' as usize], 1);
    }
}
