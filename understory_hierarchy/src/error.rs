// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by the hierarchy mapper.

use core::fmt;

/// Error returned by [`HierarchyMapper`](crate::HierarchyMapper) operations.
///
/// `E` is the error type of the [`HierarchySource`](crate::HierarchySource)
/// backing the mapper.
#[derive(Clone, PartialEq, Eq)]
pub enum MapperError<E> {
    /// The node is not currently visible, or its ancestor chain does not reach
    /// a root.
    ///
    /// This is recoverable: callers usually treat it as "no index".
    NotFound,
    /// An index or range fell outside `0..len`.
    RangeInvalid {
        /// Requested start (or the single requested index).
        start: usize,
        /// Requested end (exclusive).
        end: usize,
        /// Number of rows that were addressable at the time of the call.
        len: usize,
    },
    /// The hierarchy source failed to produce children or a parent.
    Source(E),
}

impl<E> MapperError<E> {
    /// Returns `true` if this is [`MapperError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    pub(crate) fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::RangeInvalid {
            start: index,
            end: index.saturating_add(1),
            len,
        }
    }
}

impl<E> From<E> for MapperError<E> {
    fn from(err: E) -> Self {
        Self::Source(err)
    }
}

impl<E: fmt::Debug> fmt::Debug for MapperError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("NotFound"),
            Self::RangeInvalid { start, end, len } => f
                .debug_struct("RangeInvalid")
                .field("start", start)
                .field("end", end)
                .field("len", len)
                .finish(),
            Self::Source(err) => f.debug_tuple("Source").field(err).finish(),
        }
    }
}

impl<E: fmt::Display> fmt::Display for MapperError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("node is not visible in the current hierarchy"),
            Self::RangeInvalid { start, end, len } => {
                write!(f, "range {start}..{end} is outside of 0..{len}")
            }
            Self::Source(err) => write!(f, "hierarchy source failed: {err}"),
        }
    }
}

impl<E> core::error::Error for MapperError<E>
where
    E: core::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Source(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::string::ToString;

    #[derive(Debug)]
    struct Offline;

    impl fmt::Display for Offline {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("backend offline")
        }
    }

    impl core::error::Error for Offline {}

    #[test]
    fn display_messages() {
        let err = MapperError::<Offline>::RangeInvalid {
            start: 3,
            end: 9,
            len: 5,
        };
        assert_eq!(err.to_string(), "range 3..9 is outside of 0..5");
        assert_eq!(
            MapperError::Source(Offline).to_string(),
            "hierarchy source failed: backend offline"
        );
    }

    #[test]
    fn source_is_forwarded() {
        use core::error::Error as _;

        let err = MapperError::Source(Offline);
        assert!(err.source().is_some());
        assert!(MapperError::<Offline>::NotFound.source().is_none());
        assert!(MapperError::<Offline>::NotFound.is_not_found());
    }
}
