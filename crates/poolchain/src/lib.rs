//! # Poolchain
//!
//! Facade over [`poolchain_core`] plus the golden path walkthrough.
//!
//! ```text
//!   ┌──────────────────────────┐
//!   │     ConcurrentList       │  RwLock (taken first)
//!   │  head ─> node ─> node    │
//!   └────────────┬─────────────┘
//!                │ allocate / free / read / write
//!   ┌────────────▼─────────────┐
//!   │     PoolAllocator        │  Mutex (taken second)
//!   │  [ arena ........... ]   │
//!   │  occupancy map           │
//!   └──────────────────────────┘
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod golden_path;

pub use poolchain_core as core;
pub use poolchain_core::{
    ConcurrentList, Handle, NodeRef, PoolAllocator, PoolConfig, PoolError, PoolResult, PoolStats,
};
