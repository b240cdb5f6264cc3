//! # Pool Allocator
//!
//! Variable-size allocator over one fixed byte arena reserved up front.
//!
//! Regions are granted first-fit in address order. Freed space becomes
//! whatever gap it now borders; there is no coalescing pass and no
//! compaction, so fragmentation is expected.

use crate::config::PoolConfig;
use crate::error::{PoolError, PoolResult};
use crate::memory::tracking::{OccupancyMap, Region, RegionList};
use parking_lot::Mutex;

/// Offset of an allocated region inside the arena.
///
/// Valid from the moment it is returned until it is freed, resized away,
/// or the pool is torn down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(usize);

impl Handle {
    /// Wraps a raw arena offset.
    #[inline]
    #[must_use]
    pub const fn from_offset(offset: usize) -> Self {
        Self(offset)
    }

    /// The arena offset this handle refers to.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> usize {
        self.0
    }
}

/// Point-in-time pool usage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Arena size in bytes.
    pub capacity: usize,
    /// Bytes covered by live regions.
    pub used_bytes: usize,
    /// Number of live regions.
    pub allocation_count: usize,
    /// Largest single request that would currently succeed.
    pub largest_free_gap: usize,
}

impl PoolStats {
    /// Bytes not covered by any region (possibly fragmented).
    #[inline]
    #[must_use]
    pub const fn free_bytes(&self) -> usize {
        self.capacity - self.used_bytes
    }
}

/// Arena plus occupancy metadata. Only ever touched under the pool mutex.
struct PoolInner<M> {
    storage: Box<[u8]>,
    map: M,
}

impl<M: OccupancyMap> PoolInner<M> {
    fn new(capacity: usize) -> Self {
        Self {
            storage: vec![0u8; capacity].into_boxed_slice(),
            map: M::with_capacity(capacity),
        }
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// First-fit grant. The caller holds the pool lock.
    fn allocate(&mut self, size: usize) -> PoolResult<Handle> {
        let capacity = self.capacity();
        if size > capacity {
            return Err(PoolError::AllocationFailure { requested: size, capacity });
        }
        if size == 0 {
            // every zero-size request aliases the arena base
            tracing::trace!("zero-size allocation aliases offset 0");
            return Ok(Handle(0));
        }

        let start = self
            .map
            .first_fit(size, capacity)
            .ok_or(PoolError::AllocationFailure { requested: size, capacity })?;
        self.map.insert(Region::new(start, size));
        Ok(Handle(start))
    }

    fn check_bounds(&self, handle: Handle, len: usize) -> PoolResult<std::ops::Range<usize>> {
        let offset = handle.offset();
        let capacity = self.capacity();
        match offset.checked_add(len) {
            Some(end) if end <= capacity => Ok(offset..end),
            _ => Err(PoolError::OutOfBounds { offset, len, capacity }),
        }
    }

    fn stats(&self) -> PoolStats {
        let capacity = self.capacity();
        let mut used_bytes = 0;
        let mut largest_free_gap = 0;
        let mut cursor = 0;
        for region in self.map.regions() {
            used_bytes += region.len;
            largest_free_gap = largest_free_gap.max(region.start - cursor);
            cursor = region.end();
        }
        largest_free_gap = largest_free_gap.max(capacity - cursor);

        PoolStats {
            capacity,
            used_bytes,
            allocation_count: self.map.len(),
            largest_free_gap,
        }
    }
}

/// A thread-safe pool allocator over a fixed-size arena.
///
/// Every operation takes one internal mutex for the duration of its
/// metadata search and update, so concurrent calls never interleave their
/// mutations. The allocator never calls out while holding it.
///
/// The occupancy representation is a type parameter: [`RegionList`]
/// (the default) keeps ordered records, [`RegionBitmap`] keeps start/end
/// bit-vectors. Both behave identically.
///
/// [`RegionBitmap`]: crate::memory::RegionBitmap
///
/// # Example
///
/// ```rust,ignore
/// let pool: PoolAllocator = PoolAllocator::new(64);
///
/// let handle = pool.allocate(16)?;
/// pool.write(handle, b"sixteen bytes!!!")?;
///
/// // Grow in place or move; on failure the old region is untouched
/// let handle = pool.resize(Some(handle), 32)?;
///
/// pool.free(handle.unwrap());
/// ```
pub struct PoolAllocator<M: OccupancyMap = RegionList> {
    inner: Mutex<PoolInner<M>>,
}

impl<M: OccupancyMap> PoolAllocator<M> {
    /// Reserves an arena of exactly `capacity` bytes with nothing allocated.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        tracing::debug!(capacity, "pool reserved");
        Self {
            inner: Mutex::new(PoolInner::new(capacity)),
        }
    }

    /// Builds a pool from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] if the configuration is rejected.
    pub fn from_config(config: &PoolConfig) -> PoolResult<Self> {
        config.validate()?;
        Ok(Self::new(config.capacity))
    }

    /// Replaces the arena with a fresh one of `capacity` bytes.
    ///
    /// Every handle issued before this call becomes invalid. Contents of the
    /// previous arena are dropped.
    pub fn init(&self, capacity: usize) {
        let mut inner = self.inner.lock();
        if !inner.map.is_empty() {
            tracing::warn!(
                live = inner.map.len(),
                "pool re-initialized with live allocations; their handles are now invalid"
            );
        }
        *inner = PoolInner::new(capacity);
        tracing::debug!(capacity, "pool reserved");
    }

    /// Releases the arena and all tracking metadata.
    ///
    /// Every handle becomes invalid. Afterwards the pool has capacity zero:
    /// non-empty allocations fail until [`init`](Self::init) is called again.
    /// Calling it twice is harmless.
    pub fn deinit(&self) {
        let mut inner = self.inner.lock();
        *inner = PoolInner::new(0);
        tracing::debug!("pool released");
    }

    /// Returns the arena size in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    /// Allocates `size` bytes from the lowest gap that fits.
    ///
    /// A `size` of zero returns the arena base without recording anything,
    /// so every zero-size handle aliases offset 0.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::AllocationFailure`] if `size` exceeds capacity
    /// or no free gap is large enough.
    pub fn allocate(&self, size: usize) -> PoolResult<Handle> {
        let result = self.inner.lock().allocate(size);
        match &result {
            Ok(handle) => tracing::debug!(size, offset = handle.offset(), "allocated"),
            Err(err) => tracing::warn!(size, %err, "allocation failed"),
        }
        result
    }

    /// Frees the region that starts exactly at `handle`.
    ///
    /// Unknown, stale, double-freed and interior handles are ignored.
    pub fn free(&self, handle: Handle) {
        let removed = self.inner.lock().map.remove(handle.offset());
        match removed {
            Some(region) => tracing::debug!(offset = region.start, len = region.len, "freed"),
            None => tracing::debug!(offset = handle.offset(), "free of untracked handle ignored"),
        }
    }

    /// Resizes a region, moving it if needed, with rollback on failure.
    ///
    /// - `handle` of `None` behaves as [`allocate`](Self::allocate).
    /// - `new_size` of zero behaves as [`free`](Self::free) and returns `None`.
    /// - Otherwise the old region is released, `new_size` bytes are granted
    ///   first-fit (possibly at the same offset), and the first
    ///   `min(old, new)` bytes are carried over.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidArgument`] if `handle` is not the start of a
    ///   live region.
    /// - [`PoolError::AllocationFailure`] if no gap fits `new_size`. The
    ///   original region, handle and bytes are left exactly as they were.
    pub fn resize(&self, handle: Option<Handle>, new_size: usize) -> PoolResult<Option<Handle>> {
        let Some(handle) = handle else {
            return self.allocate(new_size).map(Some);
        };
        if new_size == 0 {
            self.free(handle);
            return Ok(None);
        }

        let mut inner = self.inner.lock();
        let Some(old) = inner.map.remove(handle.offset()) else {
            tracing::warn!(offset = handle.offset(), "resize of untracked handle");
            return Err(PoolError::InvalidArgument("handle is not the start of a live region"));
        };

        match inner.allocate(new_size) {
            Ok(moved) => {
                if moved != handle {
                    let keep = old.len.min(new_size);
                    inner.storage.copy_within(old.start..old.start + keep, moved.offset());
                }
                tracing::debug!(
                    from = old.start,
                    to = moved.offset(),
                    old_len = old.len,
                    new_len = new_size,
                    "resized"
                );
                Ok(Some(moved))
            }
            Err(err) => {
                inner.map.insert(old);
                tracing::warn!(offset = old.start, new_size, %err, "resize rolled back");
                Err(err)
            }
        }
    }

    /// Copies `data` into the arena starting at `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::OutOfBounds`] if the write would leave the arena.
    pub fn write(&self, handle: Handle, data: &[u8]) -> PoolResult<()> {
        let mut inner = self.inner.lock();
        let range = inner.check_bounds(handle, data.len())?;
        inner.storage[range].copy_from_slice(data);
        Ok(())
    }

    /// Copies `buf.len()` bytes out of the arena starting at `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::OutOfBounds`] if the read would leave the arena.
    pub fn read(&self, handle: Handle, buf: &mut [u8]) -> PoolResult<()> {
        let inner = self.inner.lock();
        let range = inner.check_bounds(handle, buf.len())?;
        buf.copy_from_slice(&inner.storage[range]);
        Ok(())
    }

    /// Runs `f` over a read-only view of the whole arena.
    ///
    /// The pool lock is held while `f` runs; `f` must not call back into
    /// this pool.
    pub fn with_storage<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let inner = self.inner.lock();
        f(&inner.storage)
    }

    /// Length of the live region starting at `handle`.
    #[must_use]
    pub fn region_len(&self, handle: Handle) -> Option<usize> {
        self.inner.lock().map.get(handle.offset()).map(|r| r.len)
    }

    /// Snapshot of live regions in ascending address order.
    #[must_use]
    pub fn regions(&self) -> Vec<Region> {
        self.inner.lock().map.regions()
    }

    /// Returns current usage figures.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.inner.lock().stats()
    }
}

impl<M: OccupancyMap> std::fmt::Debug for PoolAllocator<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("PoolAllocator")
            .field("capacity", &stats.capacity)
            .field("used_bytes", &stats.used_bytes)
            .field("allocation_count", &stats.allocation_count)
            .finish()
    }
}
