use std::collections::BTreeSet;
use std::marker::PhantomData;

use crate::errors::{PoolError, Result};
use crate::handle::MemoryHandle;
use crate::memory_pool::SlotPool;

/// Auto-assigning slot pool.
///
/// Dead slots hold `None`. Free slot indices are kept ordered, so automatic
/// allocation always hands out the lowest free handle before growing.
#[derive(Debug, Clone)]
pub struct MemoryPool<T, H> {
    memory: Vec<Option<T>>,
    free_handles: BTreeSet<usize>,
    _marker: PhantomData<fn() -> H>,
}

impl<T, H> Default for MemoryPool<T, H> {
    fn default() -> Self {
        Self {
            memory: Vec::new(),
            free_handles: BTreeSet::new(),
            _marker: PhantomData,
        }
    }
}

impl<T, H: MemoryHandle> MemoryPool<T, H> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends unallocated slots until the storage holds `size` of them.
    fn grow_to(&mut self, size: usize) {
        let old_size = self.memory.len();
        if size <= old_size {
            return;
        }
        self.memory.resize_with(size, || None);
        self.free_handles.extend(old_size..size);
    }

    /// First live slot at or after `from`, or the storage length.
    fn next_live(&self, from: usize) -> usize {
        self.memory
            .get(from..)
            .and_then(|rest| rest.iter().position(Option::is_some))
            .map_or(self.memory.len(), |offset| from + offset)
    }
}

impl<T: Default, H: MemoryHandle> SlotPool<T, H> for MemoryPool<T, H> {
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
        let index = match handle {
            Some(handle) => {
                debug_assert!(handle.is_valid(), "cannot allocate the invalid handle");
                let index = handle.as_index();
                self.grow_to(index + 1);
                let was_free = self.free_handles.remove(&index);
                debug_assert!(was_free, "handle {index} is already allocated");
                index
            }
            None => {
                let index = self.free_handles.first().copied().unwrap_or(self.memory.len());
                assert!(
                    index < H::INVALID.as_index(),
                    "memory pool exhausted: every handle below the invalid sentinel is taken"
                );
                if index == self.memory.len() {
                    self.memory.push(None);
                } else {
                    self.free_handles.remove(&index);
                }
                index
            }
        };

        self.memory[index] = Some(T::default());
        H::from_index(index)
    }

    fn release(&mut self, handle: H) {
        debug_assert!(self.is_allocated(handle), "releasing unallocated handle {handle:?}");
        let index = handle.as_index();
        self.memory[index] = None;
        self.free_handles.insert(index);
    }

    #[inline]
    fn is_allocated(&self, handle: H) -> bool {
        self.memory
            .get(handle.as_index())
            .is_some_and(Option::is_some)
    }

    #[inline]
    fn get_memory(&self, handle: H) -> &T {
        match &self.memory[handle.as_index()] {
            Some(value) => value,
            None => panic!("access to unallocated handle {handle:?}"),
        }
    }

    #[inline]
    fn get_memory_mut(&mut self, handle: H) -> &mut T {
        match &mut self.memory[handle.as_index()] {
            Some(value) => value,
            None => panic!("access to unallocated handle {handle:?}"),
        }
    }

    #[inline]
    fn total_count(&self) -> usize {
        self.memory.len()
    }

    #[inline]
    fn actual_count(&self) -> usize {
        self.memory.len() - self.free_handles.len()
    }

    fn preallocate_size(&mut self, size: usize) {
        self.grow_to(size);
    }

    fn iter(&self) -> Iter<'_, T, H> {
        Iter {
            pool: Some(self),
            position: self.next_live(0),
        }
    }

    fn iter_mut(&mut self) -> IterMut<'_, T, H> {
        IterMut {
            inner: self.memory.iter_mut().enumerate(),
            _marker: PhantomData,
        }
    }

    fn try_allocate(&mut self, handle: Option<H>) -> Result<H> {
        if let Some(handle) = handle {
            if !handle.is_valid() {
                return Err(PoolError::InvalidHandle);
            }
            if self.is_allocated(handle) {
                return Err(PoolError::AlreadyAllocated(handle.as_index()));
            }
        }
        Ok(self.allocate(handle))
    }
}

// ============================================================================
// Iteration
// ============================================================================

/// Shared iterator over the live slots of a [`MemoryPool`].
///
/// Its position always rests on a live slot or on the end, so two iterators of
/// the same pool compare equal exactly when they would yield the same rest.
/// A default-constructed iterator is detached: it yields nothing and is never
/// equal to an iterator of a pool.
#[derive(Debug)]
pub struct Iter<'a, T, H> {
    pool: Option<&'a MemoryPool<T, H>>,
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
        let value = pool.memory.get(self.position)?.as_ref()?;
        let handle = H::from_index(self.position);
        self.position = pool.next_live(self.position + 1);
        Some((handle, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.pool.map_or(0, |pool| pool.memory.len() - self.position);
        (0, Some(remaining))
    }
}

/// Mutable iterator over the live slots of a [`MemoryPool`].
#[derive(Debug)]
pub struct IterMut<'a, T, H> {
    inner: std::iter::Enumerate<std::slice::IterMut<'a, Option<T>>>,
    _marker: PhantomData<fn() -> H>,
}

impl<'a, T, H: MemoryHandle> Iterator for IterMut<'a, T, H> {
    type Item = (H, &'a mut T);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .by_ref()
            .find_map(|(index, slot)| slot.as_mut().map(|value| (H::from_index(index), value)))
    }
}

impl<'a, T: Default, H: MemoryHandle> IntoIterator for &'a MemoryPool<T, H> {
    type Item = (H, &'a T);
    type IntoIter = Iter<'a, T, H>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T: Default, H: MemoryHandle> IntoIterator for &'a mut MemoryPool<T, H> {
    type Item = (H, &'a mut T);
    type IntoIter = IterMut<'a, T, H>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
