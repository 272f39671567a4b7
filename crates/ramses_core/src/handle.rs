//! Typed Slot Handles
//!
//! A handle is a plain unsigned integer naming a slot in a pool. It carries no
//! ownership and no generation counter; the pool decides whether the slot is
//! currently live.
//!
//! The maximum representable value is reserved as the `INVALID` sentinel and
//! is never handed out by a pool.
//!
//! Distinct entity kinds get distinct handle types through
//! [`new_handle_type!`](crate::new_handle_type), so a `NodeHandle` can never be
//! passed where a `TransformHandle` is expected.

use std::fmt::Debug;
use std::hash::Hash;

/// Integer-like key accepted by the slot pools.
pub trait MemoryHandle: Copy + Eq + Ord + Hash + Debug {
    /// Reserved sentinel, never a valid slot.
    const INVALID: Self;

    /// Builds a handle from a slot index.
    ///
    /// The index must be representable and must not collide with `INVALID`.
    fn from_index(index: usize) -> Self;

    /// Returns the slot index this handle refers to.
    fn as_index(self) -> usize;

    /// Returns `true` unless this is the `INVALID` sentinel.
    #[inline]
    fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

macro_rules! impl_primitive_handle {
    ($($ty:ty),*) => {
        $(
            impl MemoryHandle for $ty {
                const INVALID: Self = <$ty>::MAX;

                #[inline]
                fn from_index(index: usize) -> Self {
                    debug_assert!(index < <$ty>::MAX as usize, "slot index {index} exceeds handle range");
                    index as $ty
                }

                #[inline]
                fn as_index(self) -> usize {
                    self as usize
                }
            }
        )*
    };
}

impl_primitive_handle!(u16, u32);

/// Declares strongly typed `u32` handles.
///
/// ```
/// ramses_core::new_handle_type! {
///     /// Handle of a mesh slot.
///     pub struct MeshHandle;
/// }
///
/// use ramses_core::MemoryHandle;
/// assert!(!MeshHandle::invalid().is_valid());
/// assert_eq!(MeshHandle::new(3).as_u32(), 3);
/// ```
#[macro_export]
macro_rules! new_handle_type {
    ( $( $(#[$outer:meta])* $vis:vis struct $name:ident; )* ) => {
        $(
            $(#[$outer])*
            #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
            #[repr(transparent)]
            $vis struct $name(u32);

            impl $name {
                /// Wraps a raw slot value.
                #[inline]
                #[must_use]
                pub const fn new(value: u32) -> Self {
                    Self(value)
                }

                /// The reserved sentinel value.
                #[inline]
                #[must_use]
                pub const fn invalid() -> Self {
                    Self(u32::MAX)
                }

                /// Returns the raw slot value.
                #[inline]
                #[must_use]
                pub const fn as_u32(self) -> u32 {
                    self.0
                }
            }

            impl Default for $name {
                fn default() -> Self {
                    Self::invalid()
                }
            }

            impl From<u32> for $name {
                fn from(value: u32) -> Self {
                    Self(value)
                }
            }

            impl ::std::fmt::Display for $name {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    if self.0 == u32::MAX {
                        write!(f, "{}(invalid)", stringify!($name))
                    } else {
                        write!(f, "{}({})", stringify!($name), self.0)
                    }
                }
            }

            impl $crate::MemoryHandle for $name {
                const INVALID: Self = Self::invalid();

                #[inline]
                fn from_index(index: usize) -> Self {
                    debug_assert!(index < u32::MAX as usize, "slot index {index} exceeds handle range");
                    Self(index as u32)
                }

                #[inline]
                fn as_index(self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    new_handle_type! {
        struct TestHandle;
    }

    #[test]
    fn primitive_invalid_is_max() {
        assert_eq!(<u16 as MemoryHandle>::INVALID, u16::MAX);
        assert_eq!(<u32 as MemoryHandle>::INVALID, u32::MAX);
        assert!(!u32::MAX.is_valid());
        assert!(0u32.is_valid());
    }

    #[test]
    fn typed_handle_defaults_to_invalid() {
        assert_eq!(TestHandle::default(), TestHandle::invalid());
        assert!(!TestHandle::default().is_valid());
        assert!(TestHandle::new(0).is_valid());
    }

    #[test]
    fn typed_handle_orders_by_value() {
        assert!(TestHandle::new(1) < TestHandle::new(2));
        assert_eq!(TestHandle::from_index(7), TestHandle::from(7));
        assert_eq!(TestHandle::new(7).as_index(), 7);
    }

    #[test]
    fn typed_handle_display() {
        assert_eq!(TestHandle::new(4).to_string(), "TestHandle(4)");
        assert_eq!(TestHandle::invalid().to_string(), "TestHandle(invalid)");
    }
}
