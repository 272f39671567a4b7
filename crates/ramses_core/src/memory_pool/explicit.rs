use std::marker::PhantomData;

use crate::errors::{PoolError, Result};
use crate::handle::MemoryHandle;
use crate::memory_pool::SlotPool;

/// Explicit-only slot pool.
///
/// Every allocation names its slot and the slot must already be inside the
/// preallocated range; the pool never grows on its own. Liveness is kept in a
/// parallel byte sequence rather than a free list.
#[derive(Debug, Clone)]
pub struct MemoryPoolExplicit<T, H> {
    memory: Vec<T>,
    allocated: Vec<u8>,
    live_count: usize,
    _marker: PhantomData<fn() -> H>,
}

impl<T, H> Default for MemoryPoolExplicit<T, H> {
    fn default() -> Self {
        Self {
            memory: Vec::new(),
            allocated: Vec::new(),
            live_count: 0,
            _marker: PhantomData,
        }
    }
}

impl<T, H: MemoryHandle> MemoryPoolExplicit<T, H> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn is_live(&self, index: usize) -> bool {
        self.allocated.get(index).is_some_and(|&flag| flag != 0)
    }

    fn next_live(&self, from: usize) -> usize {
        self.allocated
            .get(from..)
            .and_then(|rest| rest.iter().position(|&flag| flag != 0))
            .map_or(self.allocated.len(), |offset| from + offset)
    }
}

impl<T: Default, H: MemoryHandle> SlotPool<T, H> for MemoryPoolExplicit<T, H> {
    type Iter<'a>
        = Iter<'a, T, H>
    where
        Self: 'a,
        T: 'a;

    type IterMut<'a>
        = IterMut<'a, T, H>
    where
        Self: 'a,
        T: 'a;

    fn allocate(&mut self, handle: Option<H>) -> H {
        let Some(handle) = handle else {
            panic!("explicit memory pool requires a caller-supplied handle");
        };
        let index = handle.as_index();
        debug_assert!(
            index < self.memory.len(),
            "handle {index} outside preallocated range of {}",
            self.memory.len()
        );
        debug_assert!(!self.is_live(index), "handle {index} is already allocated");

        if self.allocated[index] == 0 {
            self.live_count += 1;
        }
        self.allocated[index] = 1;
        self.memory[index] = T::default();
        handle
    }

    fn release(&mut self, handle: H) {
        let index = handle.as_index();
        debug_assert!(self.is_live(index), "releasing unallocated handle {handle:?}");

        if self.allocated[index] != 0 {
            self.live_count -= 1;
        }
        self.allocated[index] = 0;
        self.memory[index] = T::default();
    }

    #[inline]
    fn is_allocated(&self, handle: H) -> bool {
        self.is_live(handle.as_index())
    }

    #[inline]
    fn get_memory(&self, handle: H) -> &T {
        debug_assert!(self.is_allocated(handle), "access to unallocated handle {handle:?}");
        &self.memory[handle.as_index()]
    }

    #[inline]
    fn get_memory_mut(&mut self, handle: H) -> &mut T {
        debug_assert!(self.is_allocated(handle), "access to unallocated handle {handle:?}");
        &mut self.memory[handle.as_index()]
    }

    #[inline]
    fn total_count(&self) -> usize {
        self.memory.len()
    }

    #[inline]
    fn actual_count(&self) -> usize {
        self.live_count
    }

    fn preallocate_size(&mut self, size: usize) {
        if size > self.memory.len() {
            self.memory.resize_with(size, T::default);
            self.allocated.resize(size, 0);
        }
    }

    fn iter(&self) -> Iter<'_, T, H> {
        Iter {
            pool: Some(self),
            position: self.next_live(0),
        }
    }

    fn iter_mut(&mut self) -> IterMut<'_, T, H> {
        IterMut {
            inner: self.memory.iter_mut().zip(self.allocated.iter()).enumerate(),
            _marker: PhantomData,
        }
    }

    fn try_allocate(&mut self, handle: Option<H>) -> Result<H> {
        let handle = handle.ok_or(PoolError::MissingHandle)?;
        if !handle.is_valid() {
            return Err(PoolError::InvalidHandle);
        }
        let index = handle.as_index();
        if index >= self.memory.len() {
            return Err(PoolError::OutOfRange { index, size: self.memory.len() });
        }
        if self.is_live(index) {
            return Err(PoolError::AlreadyAllocated(index));
        }
        Ok(self.allocate(Some(handle)))
    }
}

// ============================================================================
// Iteration
// ============================================================================

/// Shared iterator over the live slots of a [`MemoryPoolExplicit`].
///
/// Equality follows the same rules as [`pool::Iter`](super::pool::Iter).
#[derive(Debug)]
pub struct Iter<'a, T, H> {
    pool: Option<&'a MemoryPoolExplicit<T, H>>,
    position: usize,
}

impl<T, H> Default for Iter<'_, T, H> {
    fn default() -> Self {
        Self { pool: None, position: 0 }
    }
}

impl<T, H> Clone for Iter<'_, T, H> {
    fn clone(&self) -> Self {
        Self { pool: self.pool, position: self.position }
    }
}

impl<T, H> PartialEq for Iter<'_, T, H> {
    fn eq(&self, other: &Self) -> bool {
        match (self.pool, other.pool) {
            (Some(a), Some(b)) => std::ptr::eq(a, b) && self.position == other.position,
            _ => false,
        }
    }
}

impl<'a, T, H: MemoryHandle> Iterator for Iter<'a, T, H> {
    type Item = (H, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let pool = self.pool?;
        if !pool.is_live(self.position) {
            return None;
        }
        let value = &pool.memory[self.position];
        let handle = H::from_index(self.position);
        self.position = pool.next_live(self.position + 1);
        Some((handle, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.pool.map_or(0, |pool| pool.memory.len() - self.position);
        (0, Some(remaining))
    }
}

/// Mutable iterator over the live slots of a [`MemoryPoolExplicit`].
#[derive(Debug)]
pub struct IterMut<'a, T, H> {
    inner: std::iter::Enumerate<std::iter::Zip<std::slice::IterMut<'a, T>, std::slice::Iter<'a, u8>>>,
    _marker: PhantomData<fn() -> H>,
}

impl<'a, T, H: MemoryHandle> Iterator for IterMut<'a, T, H> {
    type Item = (H, &'a mut T);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .by_ref()
            .find_map(|(index, (value, &flag))| (flag != 0).then(|| (H::from_index(index), value)))
    }
}

impl<'a, T: Default, H: MemoryHandle> IntoIterator for &'a MemoryPoolExplicit<T, H> {
    type Item = (H, &'a T);
    type IntoIter = Iter<'a, T, H>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T: Default, H: MemoryHandle> IntoIterator for &'a mut MemoryPoolExplicit<T, H> {
    type Item = (H, &'a mut T);
    type IntoIter = IterMut<'a, T, H>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
