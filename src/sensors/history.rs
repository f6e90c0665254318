//! Fixed-capacity ring of recent readings.
//!
//! Backed by [`heapless::HistoryBuffer`]: the newest write overwrites the
//! oldest slot once full, and iteration runs oldest → newest.

use heapless::HistoryBuffer;

use super::Reading;
use crate::config::HISTORY_CAPACITY;

pub struct SampleHistory {
    buf: HistoryBuffer<Reading, HISTORY_CAPACITY>,
}

impl SampleHistory {
    pub const fn new() -> Self {
        Self {
            buf: HistoryBuffer::new(),
        }
    }

    /// Append a reading, evicting the oldest when full.
    pub fn record(&mut self, reading: Reading) {
        self.buf.write(reading);
    }

    /// Newest entry that is valid and undisturbed by the heater, or the
    /// [`Reading::sentinel`] when there is none.
    pub fn most_recent_trusted(&self) -> Reading {
        self.buf
            .oldest_ordered()
            .filter(|r| r.is_trusted())
            .last()
            .copied()
            .unwrap_or_else(Reading::sentinel)
    }

    /// The last `n` entries (fewer if the ring holds fewer), oldest first.
    pub fn newest(&self, n: usize) -> impl Iterator<Item = &Reading> + '_ {
        self.buf.oldest_ordered().skip(self.buf.len().saturating_sub(n))
    }

    /// Most recently recorded entry.
    pub fn latest(&self) -> Option<&Reading> {
        self.buf.recent()
    }

    /// Readings currently stored, capped at [`HISTORY_CAPACITY`].
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.len() == 0
    }

    /// Drop every stored reading.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl Default for SampleHistory {
    fn default() -> Self {
        Self::new()
    }
}
