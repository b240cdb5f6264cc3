//! # Arena-Backed List
//!
//! A singly linked list whose nodes are regions of a [`PoolAllocator`],
//! shared between threads behind a reader-writer lock.
//!
//! Node links are arena offsets rather than pointers. A [`NodeRef`] handed
//! to a caller is a weak reference: it names a node, never owns it, and is
//! re-checked every time it is used.
//!
//! [`PoolAllocator`]: crate::memory::PoolAllocator

mod concurrent;
mod node;

pub use concurrent::ConcurrentList;
pub use node::{NodeRef, NODE_SIZE};
