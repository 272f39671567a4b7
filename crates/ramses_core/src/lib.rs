//! # Ramses Core
//!
//! Foundational types shared by the scene graph crates:
//!
//! - [`handle`]: typed integer handles with an `INVALID` sentinel
//! - [`memory_pool`]: handle-indexed slot pools in auto-assigning and
//!   explicit-only flavors, plus the [`PoolFamily`] abstraction used to stay
//!   generic over them
//! - [`errors`]: error type of the checked pool operations

pub mod errors;
pub mod handle;
pub mod memory_pool;

pub use errors::PoolError;
pub use handle::MemoryHandle;
pub use memory_pool::{AutoPools, ExplicitPools, MemoryPool, MemoryPoolExplicit, PoolFamily, SlotPool};
