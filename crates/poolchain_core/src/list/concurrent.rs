//! # Concurrent List
//!
//! Singly linked list of `u16` values whose nodes live in a pool arena.
//!
//! ## Locking
//!
//! ```text
//!   insert_* / delete / teardown ──> list.write() ──> pool.lock() ... unlock
//!   search / count / display     ──> list.read()  ──> pool.lock() ... unlock
//! ```
//!
//! The list lock is always taken first. The pool lock is taken and released
//! inside that scope, and the pool never calls back into the list, so the
//! nesting cannot deadlock.

use super::node::{Chain, NodeRecord, NodeRef, NODE_SIZE, SERIAL_MASK};
use crate::config::PoolConfig;
use crate::error::{PoolError, PoolResult};
use crate::memory::{Handle, OccupancyMap, PoolAllocator, PoolStats, RegionList};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_LIST_ID: AtomicU64 = AtomicU64::new(1);

/// Guarded by the list's reader-writer lock.
#[derive(Debug, Default)]
struct ListState {
    head: Option<Handle>,
    next_serial: u64,
}

impl ListState {
    fn stamp(&mut self) -> u64 {
        let serial = self.next_serial;
        self.next_serial = (serial + 1) & SERIAL_MASK;
        serial
    }
}

/// A node located by a traversal, with its predecessor.
struct Found {
    prev: Option<Handle>,
    at: Handle,
    record: NodeRecord,
}

fn find(
    storage: &[u8],
    head: Option<Handle>,
    mut pred: impl FnMut(Handle, &NodeRecord) -> bool,
) -> Option<Found> {
    let mut prev = None;
    for (at, record) in Chain::new(storage, head) {
        if pred(at, &record) {
            return Some(Found { prev, at, record });
        }
        prev = Some(at);
    }
    None
}

/// A thread-safe singly linked list built on a [`PoolAllocator`].
///
/// Every node is a [`NODE_SIZE`]-byte region of the list's own pool. Many
/// readers may traverse at once; every mutation is exclusive.
///
/// # Example
///
/// ```rust,ignore
/// let list: ConcurrentList = ConcurrentList::new(64);
///
/// list.insert_tail(1)?;
/// list.insert_tail(3)?;
/// let three = list.search(3).unwrap();
/// list.insert_before(Some(three), 2)?;
///
/// assert_eq!(list.display(), "[1, 2, 3]");
/// ```
pub struct ConcurrentList<M: OccupancyMap = RegionList> {
    id: u64,
    pool: PoolAllocator<M>,
    state: RwLock<ListState>,
}

impl<M: OccupancyMap> ConcurrentList<M> {
    /// Creates an empty list over a fresh pool of `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_pool(PoolAllocator::new(capacity))
    }

    /// Creates an empty list over a pool built from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] if the configuration is rejected.
    pub fn from_config(config: &PoolConfig) -> PoolResult<Self> {
        Ok(Self::with_pool(PoolAllocator::from_config(config)?))
    }

    /// Creates an empty list that takes ownership of `pool`.
    #[must_use]
    pub fn with_pool(pool: PoolAllocator<M>) -> Self {
        Self {
            id: NEXT_LIST_ID.fetch_add(1, Ordering::Relaxed),
            pool,
            state: RwLock::new(ListState::default()),
        }
    }

    /// Appends `value` after the last node.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::AllocationFailure`] if the pool has no room for
    /// another node. The list is unchanged.
    pub fn insert_tail(&self, value: u16) -> PoolResult<NodeRef> {
        let mut state = self.state.write();
        let head = state.head;
        let tail = self
            .pool
            .with_storage(|storage| Chain::new(storage, head).last().map(|(at, _)| at));

        let node = self.spawn(&mut state, value, None)?;
        self.attach(&mut state, tail, node)?;
        Ok(node)
    }

    /// Inserts `value` immediately after `anchor`.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidArgument`] if `anchor` is `None` or is not a
    ///   node of this list. Nothing is allocated.
    /// - [`PoolError::AllocationFailure`] if the pool is full.
    pub fn insert_after(&self, anchor: Option<NodeRef>, value: u16) -> PoolResult<NodeRef> {
        let Some(anchor) = anchor else {
            tracing::warn!("insert_after called without an anchor");
            return Err(PoolError::InvalidArgument("anchor node is required"));
        };

        let mut state = self.state.write();
        let head = state.head;
        let found = self
            .pool
            .with_storage(|storage| find(storage, head, |at, r| anchor.is(self.id, at, r)));
        let Some(found) = found else {
            tracing::warn!(offset = anchor.handle.offset(), "insert_after anchor is not in this list");
            return Err(PoolError::InvalidArgument("anchor node is not in this list"));
        };

        let node = self.spawn(&mut state, value, found.record.next())?;
        self.attach(&mut state, Some(found.at), node)?;
        Ok(node)
    }

    /// Inserts `value` immediately before `anchor`.
    ///
    /// If `anchor` is the head, the new node becomes the head. If `anchor`
    /// is not reachable from the head, nothing happens and `Ok(None)` is
    /// returned.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidArgument`] if `anchor` is `None`.
    /// - [`PoolError::AllocationFailure`] if the pool is full.
    pub fn insert_before(&self, anchor: Option<NodeRef>, value: u16) -> PoolResult<Option<NodeRef>> {
        let Some(anchor) = anchor else {
            tracing::warn!("insert_before called without an anchor");
            return Err(PoolError::InvalidArgument("anchor node is required"));
        };

        let mut state = self.state.write();
        let head = state.head;
        let found = self
            .pool
            .with_storage(|storage| find(storage, head, |at, r| anchor.is(self.id, at, r)));
        let Some(found) = found else {
            tracing::debug!(offset = anchor.handle.offset(), "insert_before anchor not reachable");
            return Ok(None);
        };

        let node = self.spawn(&mut state, value, Some(found.at))?;
        self.attach(&mut state, found.prev, node)?;
        Ok(Some(node))
    }

    /// Removes the first node holding `value` and returns its storage to
    /// the pool.
    ///
    /// Returns `false` if no node matched; that is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::OutOfBounds`] only if a predecessor link cannot
    /// be rewritten, which means the arena was torn down underneath.
    pub fn delete(&self, value: u16) -> PoolResult<bool> {
        let mut state = self.state.write();
        let head = state.head;
        let found = self
            .pool
            .with_storage(|storage| find(storage, head, |_, r| r.value() == value));
        let Some(found) = found else {
            tracing::debug!(value, "delete found no match");
            return Ok(false);
        };

        match found.prev {
            None => state.head = found.record.next(),
            Some(prev) => self.relink(prev, found.record.next())?,
        }
        self.pool.free(found.at);
        Ok(true)
    }

    /// Finds the first node holding `value`.
    ///
    /// The reference is advisory: the node may be deleted by another thread
    /// as soon as this returns. Operations taking a [`NodeRef`] re-validate it.
    #[must_use]
    pub fn search(&self, value: u16) -> Option<NodeRef> {
        let state = self.state.read();
        let head = state.head;
        self.pool.with_storage(|storage| {
            find(storage, head, |_, r| r.value() == value)
                .map(|found| NodeRef::new(self.id, found.at, &found.record))
        })
    }

    /// Number of nodes reachable from the head.
    #[must_use]
    pub fn count(&self) -> usize {
        let state = self.state.read();
        let head = state.head;
        self.pool.with_storage(|storage| Chain::new(storage, head).count())
    }

    /// True if the list has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().head.is_none()
    }

    /// Values in traversal order.
    #[must_use]
    pub fn values(&self) -> Vec<u16> {
        let state = self.state.read();
        let head = state.head;
        self.pool
            .with_storage(|storage| Chain::new(storage, head).map(|(_, r)| r.value()).collect())
    }

    /// Renders the whole list, e.g. `[1, 2, 3]`, or `[]` when empty.
    #[must_use]
    pub fn display(&self) -> String {
        self.display_range(None, None)
    }

    /// Renders the values from `start` through `end` inclusive.
    ///
    /// `None` for `start` means the head; `None` for `end` means the tail.
    /// A `start` that is not in this list renders `[]`. An `end` that is not
    /// in this list, or that lies before `start`, renders through the tail.
    #[must_use]
    pub fn display_range(&self, start: Option<NodeRef>, end: Option<NodeRef>) -> String {
        let state = self.state.read();
        let head = state.head;
        self.pool.with_storage(|storage| {
            let first = match start {
                None => head,
                Some(start) => find(storage, head, |at, r| start.is(self.id, at, r)).map(|f| f.at),
            };
            let mut values = Vec::new();
            for (at, record) in Chain::new(storage, first) {
                values.push(record.value().to_string());
                if matches!(end, Some(end) if end.is(self.id, at, &record)) {
                    break;
                }
            }
            format!("[{}]", values.join(", "))
        })
    }

    /// Frees every node, empties the list and releases the pool.
    ///
    /// Later inserts fail with [`PoolError::AllocationFailure`].
    pub fn teardown(&self) {
        let mut state = self.state.write();
        let head = state.head.take();
        let nodes: Vec<Handle> = self
            .pool
            .with_storage(|storage| Chain::new(storage, head).map(|(at, _)| at).collect());
        for at in &nodes {
            self.pool.free(*at);
        }
        self.pool.deinit();
        tracing::debug!(list = self.id, released = nodes.len(), "list torn down");
    }

    /// Usage figures of the underlying pool.
    #[must_use]
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Allocates and writes a detached node. The caller holds the write lock.
    fn spawn(&self, state: &mut ListState, value: u16, next: Option<Handle>) -> PoolResult<NodeRef> {
        let handle = self.pool.allocate(NODE_SIZE)?;
        let record = NodeRecord::new(value, state.stamp(), next);
        if let Err(err) = self.pool.write(handle, record.as_bytes()) {
            self.pool.free(handle);
            return Err(err);
        }
        Ok(NodeRef::new(self.id, handle, &record))
    }

    /// Links a spawned node after `prev`, or at the head. Frees it on failure.
    fn attach(&self, state: &mut ListState, prev: Option<Handle>, node: NodeRef) -> PoolResult<()> {
        let linked = match prev {
            None => {
                state.head = Some(node.handle);
                Ok(())
            }
            Some(prev) => self.relink(prev, Some(node.handle)),
        };
        if linked.is_err() {
            self.pool.free(node.handle);
        }
        linked
    }

    /// Rewrites the `next` field of the node at `at`.
    fn relink(&self, at: Handle, next: Option<Handle>) -> PoolResult<()> {
        let mut bytes = [0u8; NODE_SIZE];
        self.pool.read(at, &mut bytes)?;
        let mut record = NodeRecord::from_bytes(&bytes);
        record.set_next(next);
        self.pool.write(at, record.as_bytes())
    }
}

impl<M: OccupancyMap> fmt::Display for ConcurrentList<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl<M: OccupancyMap> fmt::Debug for ConcurrentList<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentList")
            .field("id", &self.id)
            .field("count", &self.count())
            .field("pool", &self.pool)
            .finish()
    }
}
