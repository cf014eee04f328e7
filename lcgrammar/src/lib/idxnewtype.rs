// This macro generates a struct which exposes a `usize`/`u32` API over a `u32` store. Rule
// arenas never come close to `u32::MAX` entries, so conversions from `usize` panic rather than
// silently truncate.

use std::{fmt, mem::size_of};

macro_rules! IdxNewtype {
    ($(#[$attr:meta])* $n: ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        #[cfg_attr(feature="serde", derive(Serialize, Deserialize))]
        pub struct $n(pub u32);

        impl From<usize> for $n {
            fn from(v: usize) -> Self {
                $n(num_traits::cast(v).unwrap())
            }
        }

        impl From<$n> for usize {
            fn from(st: $n) -> Self {
                debug_assert!(size_of::<usize>() >= size_of::<u32>());
                num_traits::cast(st.0).unwrap()
            }
        }

        impl From<$n> for u32 {
            fn from(st: $n) -> Self {
                st.0
            }
        }

        impl fmt::Display for $n {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    }
}

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

IdxNewtype!(
    /// A type specifically for rule indices. Terminals, non-terminals, the built-in rules and
    /// the anonymous rules lifted out of nested items all live in the same arena, so an `RIdx`
    /// is also how terminals are named in lookahead sets and leaves.
    ///
    /// `RIdx::from(x_usize)` panics if `x_usize` does not fit in a `u32`; `usize::from(ridx)`
    /// never loses precision.
    RIdx);
