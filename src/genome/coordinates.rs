use std::collections::BTreeMap;
use std::sync::Arc;

use super::ReferenceTrack;

/// Meta-genome extent of one reference insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InsertionSpan {
    /// Reference position of the anchor base.
    pub reference_position: u64,
    /// Meta-genome position of the anchor base.
    pub meta_position: u64,
    /// Bases inserted after the anchor.
    pub length: u64,
    /// Total inserted bases up to and including this span.
    pub cumulative: u64,
}

impl InsertionSpan {
    /// Last meta-genome position occupied by the inserted bases.
    pub fn meta_end(&self) -> u64 {
        self.meta_position.saturating_add(self.length)
    }
}

/// Translation between reference and meta-genome coordinates.
///
/// Inserted bases are placed right after their anchor base, so for a
/// reference position `p` the meta position is `p` plus the lengths of all
/// insertions anchored strictly before `p`.
///
/// Meta positions saturate at `u64::MAX`, so positions past that point
/// collapse onto it and building the table never fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceCoordinates {
    spans: BTreeMap<Arc<str>, Vec<InsertionSpan>>,
}

impl ReferenceCoordinates {
    /// Build the table from a frozen reference track.
    pub fn from_track(track: &ReferenceTrack) -> Self {
        let mut spans = BTreeMap::new();
        for (chrom, list) in track.table().iter() {
            let mut cumulative = 0u64;
            let chrom_spans = list
                .iter()
                .map(|offset| {
                    let meta_position = offset.position().saturating_add(cumulative);
                    cumulative = cumulative.saturating_add(offset.magnitude());
                    InsertionSpan {
                        reference_position: offset.position(),
                        meta_position,
                        length: offset.magnitude(),
                        cumulative,
                    }
                })
                .collect::<Vec<_>>();
            spans.insert(Arc::clone(chrom), chrom_spans);
        }
        Self { spans }
    }

    /// Insertion spans of `chrom`, ordered by position.
    pub fn spans(&self, chrom: &str) -> &[InsertionSpan] {
        self.spans.get(chrom).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Meta-genome position of reference position `position`.
    pub fn meta_position(&self, chrom: &str, position: u64) -> u64 {
        let spans = self.spans(chrom);
        let idx = spans.partition_point(|span| span.reference_position < position);
        match idx {
            0 => position,
            _ => position.saturating_add(spans[idx - 1].cumulative),
        }
    }

    /// Reference position shown at meta-genome position `meta`.
    ///
    /// Returns `None` when `meta` falls on bases inserted by some genome.
    pub fn reference_position(&self, chrom: &str, meta: u64) -> Option<u64> {
        let spans = self.spans(chrom);
        let idx = spans.partition_point(|span| span.meta_position < meta);
        if idx == 0 {
            return Some(meta);
        }
        let span = &spans[idx - 1];
        if meta <= span.meta_end() {
            None
        } else {
            meta.checked_sub(span.cumulative)
        }
    }

    /// Total bases inserted on `chrom`.
    pub fn total_inserted(&self, chrom: &str) -> u64 {
        self.spans(chrom).last().map_or(0, |span| span.cumulative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offset::{Offset, OffsetList, OffsetTable};

    fn coordinates() -> ReferenceCoordinates {
        let mut table = OffsetTable::new();
        table.insert(
            Arc::from("chr1"),
            OffsetList::from_sorted(vec![Offset::new(100, 5), Offset::new(300, 2)]).unwrap(),
        );
        ReferenceCoordinates::from_track(&ReferenceTrack::from_table(table))
    }

    #[test]
    fn meta_positions_shift_after_each_insertion() {
        let coords = coordinates();
        assert_eq!(coords.meta_position("chr1", 50), 50);
        assert_eq!(coords.meta_position("chr1", 100), 100);
        assert_eq!(coords.meta_position("chr1", 101), 106);
        assert_eq!(coords.meta_position("chr1", 300), 305);
        assert_eq!(coords.meta_position("chr1", 301), 308);
        assert_eq!(coords.meta_position("chrX", 301), 301);
        assert_eq!(coords.total_inserted("chr1"), 7);
    }

    #[test]
    fn inserted_bases_have_no_reference_position() {
        let coords = coordinates();
        assert_eq!(coords.reference_position("chr1", 100), Some(100));
        for meta in 101..=105 {
            assert_eq!(coords.reference_position("chr1", meta), None);
        }
        assert_eq!(coords.reference_position("chr1", 106), Some(101));
        assert_eq!(coords.reference_position("chr1", 305), Some(300));
        assert_eq!(coords.reference_position("chr1", 306), None);
        assert_eq!(coords.reference_position("chr1", 307), None);
        assert_eq!(coords.reference_position("chr1", 308), Some(301));
    }

    #[test]
    fn insertions_near_the_end_of_the_axis_saturate() {
        let mut table = OffsetTable::new();
        table.insert(
            Arc::from("chr1"),
            OffsetList::from_sorted(vec![Offset::new(10, 5), Offset::new(u64::MAX - 1, 1)]).unwrap(),
        );
        let coords = ReferenceCoordinates::from_track(&ReferenceTrack::from_table(table));

        let last = coords.spans("chr1")[1];
        assert_eq!(last.meta_position, u64::MAX);
        assert_eq!(last.meta_end(), u64::MAX);
        assert_eq!(coords.total_inserted("chr1"), 6);
        assert_eq!(coords.meta_position("chr1", u64::MAX - 1), u64::MAX);
        assert_eq!(coords.meta_position("chr1", 11), 16);
        assert_eq!(coords.reference_position("chr1", 16), Some(11));
        assert_eq!(coords.reference_position("chr1", 12), None);
    }
}
