//! # Bitmap Occupancy Tracking
//!
//! Two bit-vectors the length of the arena: one marks the first byte of
//! every region, the other marks the last byte. Metadata is fixed at
//! `capacity / 8` bytes per vector no matter how many allocations are live,
//! and every scan costs time proportional to capacity.

use super::tracking::{OccupancyMap, Region};

const WORD_BITS: usize = u64::BITS as usize;

/// Fixed-length bit-vector.
#[derive(Debug, Default)]
struct Bits {
    words: Vec<u64>,
    len: usize,
}

impl Bits {
    fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(WORD_BITS)],
            len,
        }
    }

    #[inline]
    fn get(&self, index: usize) -> bool {
        index < self.len && self.words[index / WORD_BITS] & (1 << (index % WORD_BITS)) != 0
    }

    #[inline]
    fn set(&mut self, index: usize) {
        self.words[index / WORD_BITS] |= 1 << (index % WORD_BITS);
    }

    #[inline]
    fn clear(&mut self, index: usize) {
        self.words[index / WORD_BITS] &= !(1 << (index % WORD_BITS));
    }

    /// Lowest set bit at or after `from`.
    fn next_set(&self, from: usize) -> Option<usize> {
        if from >= self.len {
            return None;
        }

        let mut word_index = from / WORD_BITS;
        let mut word = self.words[word_index] & (u64::MAX << (from % WORD_BITS));
        loop {
            if word != 0 {
                let index = word_index * WORD_BITS + word.trailing_zeros() as usize;
                return (index < self.len).then_some(index);
            }
            word_index += 1;
            word = *self.words.get(word_index)?;
        }
    }
}

/// Start/end bitmap representation of the occupancy map.
#[derive(Debug, Default)]
pub struct RegionBitmap {
    starts: Bits,
    ends: Bits,
    count: usize,
}

impl RegionBitmap {
    /// Last byte of the region starting at `start`.
    fn last_byte(&self, start: usize) -> Option<usize> {
        self.ends.next_set(start)
    }
}

impl OccupancyMap for RegionBitmap {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            starts: Bits::new(capacity),
            ends: Bits::new(capacity),
            count: 0,
        }
    }

    fn first_fit(&self, size: usize, capacity: usize) -> Option<usize> {
        let mut cursor = 0;
        while let Some(start) = self.starts.next_set(cursor) {
            if start - cursor >= size {
                return Some(cursor);
            }
            cursor = self.last_byte(start)? + 1;
        }
        (capacity.saturating_sub(cursor) >= size).then_some(cursor)
    }

    fn insert(&mut self, region: Region) {
        debug_assert!(region.len > 0, "empty regions are never tracked");
        debug_assert!(region.end() <= self.starts.len);
        self.starts.set(region.start);
        self.ends.set(region.end() - 1);
        self.count += 1;
    }

    fn remove(&mut self, start: usize) -> Option<Region> {
        let region = self.get(start)?;
        self.starts.clear(region.start);
        self.ends.clear(region.end() - 1);
        self.count -= 1;
        Some(region)
    }

    fn get(&self, start: usize) -> Option<Region> {
        if !self.starts.get(start) {
            return None;
        }
        let last = self.last_byte(start)?;
        Some(Region::new(start, last + 1 - start))
    }

    fn len(&self) -> usize {
        self.count
    }

    fn regions(&self) -> Vec<Region> {
        let mut regions = Vec::with_capacity(self.count);
        let mut cursor = 0;
        while let Some(start) = self.starts.next_set(cursor) {
            let Some(region) = self.get(start) else { break };
            cursor = region.end();
            regions.push(region);
        }
        regions
    }
}
