use std::collections::BTreeMap;
use std::sync::Arc;

use super::OffsetList;

/// Offset lists keyed by chromosome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetTable {
    lists: BTreeMap<Arc<str>, OffsetList>,
}

impl OffsetTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            lists: BTreeMap::new(),
        }
    }

    /// List for `chrom`, if any offsets were recorded there.
    pub fn get(&self, chrom: &str) -> Option<&OffsetList> {
        self.lists.get(chrom)
    }

    /// Mutable list for `chrom`, created on first access.
    pub fn entry(&mut self, chrom: &Arc<str>) -> &mut OffsetList {
        self.lists.entry(Arc::clone(chrom)).or_default()
    }

    /// Replace the list stored for `chrom`.
    pub fn insert(&mut self, chrom: Arc<str>, list: OffsetList) -> Option<OffsetList> {
        self.lists.insert(chrom, list)
    }

    /// Chromosomes present in the table, in sorted order.
    pub fn chromosomes(&self) -> impl Iterator<Item = &Arc<str>> {
        self.lists.keys()
    }

    /// Iterate over `(chromosome, list)` pairs in chromosome order.
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &OffsetList)> {
        self.lists.iter()
    }

    /// Number of chromosomes in the table.
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    /// Whether the table has no chromosomes.
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Total number of offsets across all chromosomes.
    pub fn offset_count(&self) -> usize {
        self.lists.values().map(OffsetList::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offset::Offset;

    #[test]
    fn entry_creates_lists_per_chromosome() {
        let chr1: Arc<str> = Arc::from("chr1");
        let chr2: Arc<str> = Arc::from("chr2");
        let mut table = OffsetTable::new();
        table.entry(&chr2).push(Offset::new(5, 1)).unwrap();
        table.entry(&chr1).push(Offset::new(9, -2)).unwrap();
        table.entry(&chr1).push(Offset::new(12, 3)).unwrap();

        let names: Vec<&str> = table.chromosomes().map(|c| c.as_ref()).collect();
        assert_eq!(names, vec!["chr1", "chr2"]);
        assert_eq!(table.offset_count(), 3);
        assert!(table.get("chr3").is_none());
    }
}
