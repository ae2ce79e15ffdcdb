use std::collections::BTreeMap;
use std::sync::Arc;

use crate::offset::{Offset, OffsetList, OffsetTable, EMPTY};

/// Effect of recording an insertion on the reference track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceUpdate {
    /// First insertion seen at this position.
    Inserted,
    /// A longer insertion replaced the previous one.
    Widened {
        /// Length held before the update.
        previous: i64,
    },
    /// An equal or longer insertion was already recorded.
    Unchanged,
}

/// Accumulates insertions from every genome, keeping the longest per locus.
///
/// Files are scanned one after another, so insertions do not arrive in
/// position order across genomes; the ordered map restores it at freeze time.
#[derive(Debug, Default)]
pub struct ReferenceTrackBuilder {
    insertions: BTreeMap<Arc<str>, BTreeMap<u64, i64>>,
}

impl ReferenceTrackBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an insertion of `length` bases at `position`.
    ///
    /// Non-positive lengths are not insertions and leave the track untouched.
    pub fn record_insertion(&mut self, chrom: &Arc<str>, position: u64, length: i64) -> ReferenceUpdate {
        if length <= 0 {
            return ReferenceUpdate::Unchanged;
        }
        let loci = self.insertions.entry(Arc::clone(chrom)).or_default();
        match loci.get_mut(&position) {
            None => {
                loci.insert(position, length);
                ReferenceUpdate::Inserted
            }
            Some(current) if *current < length => {
                let previous = *current;
                *current = length;
                ReferenceUpdate::Widened { previous }
            }
            Some(_) => ReferenceUpdate::Unchanged,
        }
    }

    /// Number of distinct insertion loci recorded so far.
    pub fn len(&self) -> usize {
        self.insertions.values().map(BTreeMap::len).sum()
    }

    /// Whether no insertion has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Freeze into an immutable track.
    pub fn freeze(self) -> ReferenceTrack {
        let mut offsets = OffsetTable::new();
        for (chrom, loci) in self.insertions {
            // BTreeMap iteration yields unique ascending keys.
            let list = OffsetList::from_sorted_unchecked(
                loci.into_iter()
                    .map(|(position, length)| Offset::new(position, length))
                    .collect(),
            );
            offsets.insert(chrom, list);
        }
        ReferenceTrack { offsets }
    }
}

/// Frozen reference offset track: sorted, insertion-only, longest per locus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceTrack {
    offsets: OffsetTable,
}

impl ReferenceTrack {
    /// Track built from an already-frozen table.
    ///
    /// Non-insertion offsets are dropped.
    pub fn from_table(table: OffsetTable) -> Self {
        let mut builder = ReferenceTrackBuilder::new();
        for (chrom, list) in table.iter() {
            for offset in list {
                builder.record_insertion(chrom, offset.position(), offset.value());
            }
        }
        builder.freeze()
    }

    /// Offsets of `chrom`; empty when no genome inserted anything there.
    pub fn offsets(&self, chrom: &str) -> &OffsetList {
        self.offsets.get(chrom).unwrap_or(&EMPTY)
    }

    /// Underlying table.
    pub fn table(&self) -> &OffsetTable {
        &self.offsets
    }

    /// Chromosomes with at least one insertion.
    pub fn chromosomes(&self) -> impl Iterator<Item = &Arc<str>> {
        self.offsets.chromosomes()
    }

    /// Total number of insertion loci.
    pub fn len(&self) -> usize {
        self.offsets.offset_count()
    }

    /// Whether the track holds no insertion.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
