//! # Occupancy Tracking
//!
//! Metadata describing which sub-ranges of the arena are in use.
//!
//! Regions are disjoint, never empty, and always lie inside `[0, capacity)`.
//! The allocator owns one map and mutates it only under its mutex.

/// One allocated region of the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Region {
    /// Offset of the first byte.
    pub start: usize,
    /// Length in bytes. Never zero.
    pub len: usize,
}

impl Region {
    /// Creates a region covering `[start, start + len)`.
    #[inline]
    #[must_use]
    pub const fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// One past the last byte.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Tracks occupied regions and answers first-fit queries.
///
/// Implementations must keep regions disjoint and report them in ascending
/// address order. `remove` followed by `insert` of the returned region must
/// restore the map exactly; resize rollback depends on it.
pub trait OccupancyMap: Send {
    /// Creates an empty map for an arena of `capacity` bytes.
    fn with_capacity(capacity: usize) -> Self
    where
        Self: Sized;

    /// Returns the start of the lowest gap of at least `size` bytes.
    ///
    /// Gaps are visited in address order: before the first region, between
    /// neighbours, after the last region. `size` is never zero.
    fn first_fit(&self, size: usize, capacity: usize) -> Option<usize>;

    /// Records an occupied region. The caller guarantees it is free.
    fn insert(&mut self, region: Region);

    /// Removes the region starting exactly at `start`.
    fn remove(&mut self, start: usize) -> Option<Region>;

    /// Looks up the region starting exactly at `start`.
    fn get(&self, start: usize) -> Option<Region>;

    /// Number of live regions.
    fn len(&self) -> usize;

    /// True when nothing is allocated.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All regions in ascending address order.
    fn regions(&self) -> Vec<Region>;
}

/// Ordered allocation records.
///
/// Metadata grows with the number of live allocations, not with capacity.
#[derive(Debug, Default)]
pub struct RegionList {
    /// Sorted by `start`.
    records: Vec<Region>,
}

impl RegionList {
    fn position(&self, start: usize) -> Result<usize, usize> {
        self.records.binary_search_by_key(&start, |r| r.start)
    }
}

impl OccupancyMap for RegionList {
    fn with_capacity(_capacity: usize) -> Self {
        Self::default()
    }

    fn first_fit(&self, size: usize, capacity: usize) -> Option<usize> {
        let mut cursor = 0;
        for region in &self.records {
            if region.start - cursor >= size {
                return Some(cursor);
            }
            cursor = region.end();
        }
        (capacity.saturating_sub(cursor) >= size).then_some(cursor)
    }

    fn insert(&mut self, region: Region) {
        debug_assert!(region.len > 0, "empty regions are never tracked");
        let index = self.records.partition_point(|r| r.start < region.start);
        debug_assert!(index == 0 || self.records[index - 1].end() <= region.start);
        debug_assert!(!matches!(self.records.get(index), Some(next) if next.start < region.end()));
        self.records.insert(index, region);
    }

    fn remove(&mut self, start: usize) -> Option<Region> {
        let index = self.position(start).ok()?;
        Some(self.records.remove(index))
    }

    fn get(&self, start: usize) -> Option<Region> {
        let index = self.position(start).ok()?;
        Some(self.records[index])
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn regions(&self) -> Vec<Region> {
        self.records.clone()
    }
}
