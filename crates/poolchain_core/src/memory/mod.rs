//! # Memory Management
//!
//! One arena, reserved once, carved into variable-size regions.
//!
//! ## Design Philosophy
//!
//! The arena is allocated at startup. After that:
//! - No heap allocation for pooled data
//! - Handles are plain offsets, checked against the arena on every access
//! - A failed resize never disturbs the region it was asked to move

mod bitmap;
mod pool;
mod tracking;

pub use bitmap::RegionBitmap;
pub use pool::{Handle, PoolAllocator, PoolStats};
pub use tracking::{OccupancyMap, Region, RegionList};
