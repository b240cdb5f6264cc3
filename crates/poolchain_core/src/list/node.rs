//! # Node Layout
//!
//! A list node is a 16-byte plain-old-data record stored inside the pool
//! arena. Its `next` field is the arena offset of the following node, which
//! is the only owner of that node.
//!
//! ```text
//! [8 bytes: next offset, all ones = end of chain]
//! [4 bytes: serial, low half]
//! [2 bytes: serial, high half]
//! [2 bytes: value]
//! ```
//!
//! Records are read with unaligned loads; the arena gives byte granularity
//! only.

use crate::memory::Handle;
use bytemuck::{Pod, Zeroable};

/// Bytes of arena consumed by one list node.
pub const NODE_SIZE: usize = std::mem::size_of::<NodeRecord>();

const _: () = assert!(NODE_SIZE == 16);

const NIL: u64 = u64::MAX;

/// Serials are 48 bits wide and wrap after `SERIAL_MASK + 1` allocations.
pub(crate) const SERIAL_MASK: u64 = (1 << 48) - 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct NodeRecord {
    next: u64,
    serial_lo: u32,
    serial_hi: u16,
    value: u16,
}

impl NodeRecord {
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn new(value: u16, serial: u64, next: Option<Handle>) -> Self {
        let serial = serial & SERIAL_MASK;
        let mut record = Self {
            next: NIL,
            serial_lo: serial as u32,
            serial_hi: (serial >> 32) as u16,
            value,
        };
        record.set_next(next);
        record
    }

    #[inline]
    pub(crate) const fn value(&self) -> u16 {
        self.value
    }

    #[inline]
    pub(crate) fn serial(&self) -> u64 {
        (u64::from(self.serial_hi) << 32) | u64::from(self.serial_lo)
    }

    #[inline]
    pub(crate) fn next(&self) -> Option<Handle> {
        if self.next == NIL {
            return None;
        }
        usize::try_from(self.next).ok().map(Handle::from_offset)
    }

    #[inline]
    pub(crate) fn set_next(&mut self, next: Option<Handle>) {
        self.next = next.map_or(NIL, |h| h.offset() as u64);
    }

    /// Decodes the record at `at`, or `None` if it would overrun the arena.
    pub(crate) fn read(storage: &[u8], at: Handle) -> Option<Self> {
        let start = at.offset();
        let bytes = storage.get(start..start.checked_add(NODE_SIZE)?)?;
        Some(bytemuck::pod_read_unaligned(bytes))
    }

    #[inline]
    pub(crate) fn from_bytes(bytes: &[u8; NODE_SIZE]) -> Self {
        bytemuck::pod_read_unaligned(bytes)
    }

    #[inline]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Weak reference to a list node, returned by `search` and the insert calls.
///
/// It does not keep the node alive. Another thread may delete the node the
/// moment the reference is handed out; every list operation that accepts a
/// `NodeRef` re-validates it under the list lock. A reference only
/// validates against the list that issued it, and only while the exact node
/// it was taken from is still linked: a node allocated later at the same
/// offset carries a different serial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub(crate) list: u64,
    pub(crate) handle: Handle,
    pub(crate) serial: u64,
    pub(crate) value: u16,
}

impl NodeRef {
    pub(crate) fn new(list: u64, handle: Handle, record: &NodeRecord) -> Self {
        Self {
            list,
            handle,
            serial: record.serial(),
            value: record.value(),
        }
    }

    /// Value the node held when this reference was taken.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> u16 {
        self.value
    }

    /// Arena handle of the node's storage.
    #[inline]
    #[must_use]
    pub const fn handle(&self) -> Handle {
        self.handle
    }

    /// True if `record`, found at `handle` in list `list`, is this node.
    #[inline]
    pub(crate) fn is(&self, list: u64, handle: Handle, record: &NodeRecord) -> bool {
        self.list == list && self.handle == handle && self.serial == record.serial()
    }
}

/// Walks a chain of node records through a borrowed arena view.
///
/// Stops at the end of the chain, at a record that would overrun the arena,
/// or after more steps than the arena can hold nodes.
pub(crate) struct Chain<'a> {
    storage: &'a [u8],
    next: Option<Handle>,
    budget: usize,
}

impl<'a> Chain<'a> {
    pub(crate) fn new(storage: &'a [u8], head: Option<Handle>) -> Self {
        Self {
            storage,
            next: head,
            budget: storage.len() / NODE_SIZE,
        }
    }
}

impl Iterator for Chain<'_> {
    type Item = (Handle, NodeRecord);

    fn next(&mut self) -> Option<Self::Item> {
        let at = self.next?;
        debug_assert!(self.budget > 0, "node chain longer than the arena can hold");
        if self.budget == 0 {
            self.next = None;
            return None;
        }
        self.budget -= 1;

        let record = NodeRecord::read(self.storage, at)?;
        self.next = record.next();
        Some((at, record))
    }
}
