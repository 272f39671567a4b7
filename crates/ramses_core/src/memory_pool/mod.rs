//! Slot Pools
//!
//! Array-backed allocators mapping a [`MemoryHandle`] to a value of type `T`.
//!
//! # Variants
//!
//! - [`MemoryPool`]: auto-assigning. `allocate(None)` reuses the lowest free
//!   slot or appends a new one; `allocate(Some(h))` places the value at `h`,
//!   growing the storage if needed.
//! - [`MemoryPoolExplicit`]: explicit-only. Every allocation names its slot,
//!   and the slot must already exist (see [`SlotPool::preallocate_size`]).
//!   Used where handles come from an external numbering, e.g. a file format.
//!
//! Both reset a slot to `T::default()` on allocation, so a new tenant never
//! observes data left behind by the previous one.
//!
//! # Contracts
//!
//! `release`, `get_memory` and `get_memory_mut` require a live handle. This is
//! checked with `debug_assert!` only; use [`SlotPool::get`] or the `try_*`
//! operations where the handle is not known to be valid.
//!
//! Code that is generic over the allocation discipline takes a
//! [`PoolFamily`] parameter and names its pools through `F::Pool<T, H>`.

pub mod explicit;
pub mod pool;

pub use explicit::MemoryPoolExplicit;
pub use pool::MemoryPool;

use crate::errors::{PoolError, Result};
use crate::handle::MemoryHandle;

/// Common contract of both slot pool variants.
pub trait SlotPool<T: Default, H: MemoryHandle>: Default {
    /// Iterator over live `(handle, &value)` pairs in ascending handle order.
    type Iter<'a>: Iterator<Item = (H, &'a T)> + Clone
    where
        Self: 'a,
        T: 'a;

    /// Iterator over live `(handle, &mut value)` pairs in ascending handle order.
    type IterMut<'a>: Iterator<Item = (H, &'a mut T)>
    where
        Self: 'a,
        T: 'a;

    /// Creates a pool with `size` unallocated slots.
    fn with_size(size: usize) -> Self {
        let mut pool = Self::default();
        pool.preallocate_size(size);
        pool
    }

    /// Allocates a slot and resets it to `T::default()`.
    ///
    /// `None` asks the pool to choose a handle, which only the auto-assigning
    /// variant supports.
    fn allocate(&mut self, handle: Option<H>) -> H;

    /// Releases a live slot.
    fn release(&mut self, handle: H);

    /// Returns `true` if `handle` names a live slot. Safe for any handle value.
    fn is_allocated(&self, handle: H) -> bool;

    /// Returns the value of a live slot.
    fn get_memory(&self, handle: H) -> &T;

    /// Returns the value of a live slot mutably.
    fn get_memory_mut(&mut self, handle: H) -> &mut T;

    /// Number of slots, including unallocated ones.
    fn total_count(&self) -> usize;

    /// Number of live slots.
    fn actual_count(&self) -> usize;

    /// Grows the storage to at least `size` slots. Never shrinks.
    fn preallocate_size(&mut self, size: usize);

    /// Iterates live slots in ascending handle order.
    fn iter(&self) -> Self::Iter<'_>;

    /// Iterates live slots mutably in ascending handle order.
    fn iter_mut(&mut self) -> Self::IterMut<'_>;

    /// Checked [`allocate`](SlotPool::allocate).
    fn try_allocate(&mut self, handle: Option<H>) -> Result<H>;

    /// Checked [`release`](SlotPool::release).
    fn try_release(&mut self, handle: H) -> Result<()> {
        if !self.is_allocated(handle) {
            return Err(PoolError::NotAllocated(handle.as_index()));
        }
        self.release(handle);
        Ok(())
    }

    /// Returns the value if `handle` is live.
    #[inline]
    fn get(&self, handle: H) -> Option<&T> {
        if self.is_allocated(handle) {
            Some(self.get_memory(handle))
        } else {
            None
        }
    }

    /// Returns the value mutably if `handle` is live.
    #[inline]
    fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        if self.is_allocated(handle) {
            Some(self.get_memory_mut(handle))
        } else {
            None
        }
    }
}

// ============================================================================
// Pool families
// ============================================================================

/// Selects one slot pool implementation for every entity kind of a scene.
pub trait PoolFamily: 'static {
    /// The pool type used for values `T` keyed by `H`.
    type Pool<T: Default, H: MemoryHandle>: SlotPool<T, H>;

    /// Whether pools of this family pick handles on their own.
    const AUTO_ASSIGNS_HANDLES: bool;
}

/// Family of auto-assigning [`MemoryPool`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoPools;

impl PoolFamily for AutoPools {
    type Pool<T: Default, H: MemoryHandle> = MemoryPool<T, H>;

    const AUTO_ASSIGNS_HANDLES: bool = true;
}

/// Family of explicit-only [`MemoryPoolExplicit`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitPools;

impl PoolFamily for ExplicitPools {
    type Pool<T: Default, H: MemoryHandle> = MemoryPoolExplicit<T, H>;

    const AUTO_ASSIGNS_HANDLES: bool = false;
}
