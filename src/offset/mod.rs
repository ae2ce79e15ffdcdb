//! Coordinate offsets and ordered offset lists.
//!
//! An [`Offset`] records a net insertion (positive value) or deletion
//! (negative value) at a genome position. [`OffsetList`] keeps offsets in
//! strictly increasing position order and refuses anything that would break
//! that ordering, so every consumer downstream can rely on it.

mod table;

pub use table::OffsetTable;

use thiserror::Error;

/// Shared empty list for lookups that find nothing.
pub(crate) static EMPTY: OffsetList = OffsetList::new();

/// Errors raised when building offset lists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OffsetError {
    /// An offset was appended at or before the position of the previous one.
    #[error("offset at position {position} does not follow previous offset at {previous}")]
    OutOfOrder {
        /// Position of the rejected offset.
        position: u64,
        /// Position of the last offset already in the list.
        previous: u64,
    },
}

/// Coordinate shift at a genome position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Offset {
    position: u64,
    value: i64,
}

impl Offset {
    /// Construct a new offset.
    pub const fn new(position: u64, value: i64) -> Self {
        Self { position, value }
    }

    /// Genome coordinate the offset is anchored at.
    pub const fn position(&self) -> u64 {
        self.position
    }

    /// Signed length delta (positive = insertion, negative = deletion).
    pub const fn value(&self) -> i64 {
        self.value
    }

    /// Number of bases inserted or removed.
    pub const fn magnitude(&self) -> u64 {
        self.value.unsigned_abs()
    }

    /// Whether the offset describes an insertion.
    pub const fn is_insertion(&self) -> bool {
        self.value > 0
    }

    /// Whether the offset describes a deletion.
    pub const fn is_deletion(&self) -> bool {
        self.value < 0
    }
}

/// Offsets of one chromosome, strictly increasing by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OffsetList {
    offsets: Vec<Offset>,
}

impl OffsetList {
    /// Create an empty list.
    pub const fn new() -> Self {
        Self {
            offsets: Vec::new(),
        }
    }

    /// Create an empty list with room for `capacity` offsets.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            offsets: Vec::with_capacity(capacity),
        }
    }

    /// Build a list from offsets that must already be strictly increasing.
    pub fn from_sorted(offsets: Vec<Offset>) -> Result<Self, OffsetError> {
        for pair in offsets.windows(2) {
            if pair[1].position <= pair[0].position {
                return Err(OffsetError::OutOfOrder {
                    position: pair[1].position,
                    previous: pair[0].position,
                });
            }
        }
        Ok(Self { offsets })
    }

    pub(crate) fn from_sorted_unchecked(offsets: Vec<Offset>) -> Self {
        debug_assert!(offsets.windows(2).all(|w| w[0].position < w[1].position));
        Self { offsets }
    }

    /// Append an offset after the current last one.
    pub fn push(&mut self, offset: Offset) -> Result<(), OffsetError> {
        if let Some(last) = self.offsets.last() {
            if offset.position <= last.position {
                return Err(OffsetError::OutOfOrder {
                    position: offset.position,
                    previous: last.position,
                });
            }
        }
        self.offsets.push(offset);
        Ok(())
    }

    /// Number of offsets.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the list holds no offsets.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Offset at `index`.
    pub fn get(&self, index: usize) -> Option<&Offset> {
        self.offsets.get(index)
    }

    /// Last offset of the list.
    pub fn last(&self) -> Option<&Offset> {
        self.offsets.last()
    }

    /// Iterate over offsets in position order.
    pub fn iter(&self) -> std::slice::Iter<'_, Offset> {
        self.offsets.iter()
    }

    /// Borrow the offsets as a slice.
    pub fn as_slice(&self) -> &[Offset] {
        &self.offsets
    }

    /// Value of the last offset anchored at or before `position`, 0 if none.
    ///
    /// On a synchronized list values are cumulative, so this is the total
    /// coordinate shift in effect at `position`.
    pub fn shift_at(&self, position: u64) -> i64 {
        let idx = self
            .offsets
            .partition_point(|offset| offset.position <= position);
        if idx == 0 {
            0
        } else {
            self.offsets[idx - 1].value
        }
    }
}

impl<'a> IntoIterator for &'a OffsetList {
    type Item = &'a Offset;
    type IntoIter = std::slice::Iter<'a, Offset>;

    fn into_iter(self) -> Self::IntoIter {
        self.offsets.iter()
    }
}

impl From<OffsetList> for Vec<Offset> {
    fn from(list: OffsetList) -> Self {
        list.offsets
    }
}
