//! # Poolchain Core
//!
//! A fixed-capacity pool allocator and a thread-safe linked list that lives
//! entirely inside it. Built for targets where asking the operating system
//! for memory at runtime is not an option:
//! - One arena, reserved once
//! - Every list node carved out of that arena
//! - Failures returned as values, never panics
//!
//! ## Architecture Rules
//!
//! 1. **The list never touches the global heap for nodes** - storage comes from the pool
//! 2. **Lock order is fixed** - list lock first, pool lock inside it
//! 3. **Resize is transactional** - a failed resize leaves the old region intact
//!
//! ## Example
//!
//! ```rust,ignore
//! use poolchain_core::{ConcurrentList, PoolAllocator};
//!
//! let list: ConcurrentList = ConcurrentList::new(64);
//! list.insert_tail(1)?;
//! list.insert_tail(2)?;
//! assert_eq!(list.display(), "[1, 2]");
//!
//! let pool: PoolAllocator = PoolAllocator::new(64);
//! assert!(pool.allocate(100).is_err());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod list;
pub mod memory;

pub use config::PoolConfig;
pub use error::{PoolError, PoolResult};
pub use list::{ConcurrentList, NodeRef, NODE_SIZE};
pub use memory::{
    Handle, OccupancyMap, PoolAllocator, PoolStats, Region, RegionBitmap, RegionList,
};
