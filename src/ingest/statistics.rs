use std::collections::BTreeMap;
use std::sync::Arc;

use crate::variant::{VariantType, Zygosity};

const NUM_TYPES: usize = VariantType::ALL.len();

/// Receiver of the counters produced while ingesting variant records.
///
/// Aggregation and presentation live with the caller; ingestion only reports.
pub trait StatisticsSink {
    /// A genome carries an alternative of type `kind` with the given zygosity.
    fn record_call(&mut self, genome: &Arc<str>, kind: VariantType, zygosity: Zygosity);

    /// Per-file counters of a completed file.
    fn record_file(&mut self, _file: &Arc<str>, _stats: &FileStatistics) {}
}

/// Zygosity counters of one sample, split by variant type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SampleStatistics {
    homozygous: [u64; NUM_TYPES],
    heterozygous: [u64; NUM_TYPES],
    hemizygous: [u64; NUM_TYPES],
}

impl SampleStatistics {
    /// Count one call. Non-variant zygosities are ignored.
    pub fn observe(&mut self, kind: VariantType, zygosity: Zygosity) {
        let counter = match zygosity {
            Zygosity::Homozygous => &mut self.homozygous,
            Zygosity::Heterozygous => &mut self.heterozygous,
            Zygosity::Hemizygous => &mut self.hemizygous,
            Zygosity::Reference | Zygosity::NoCall => return,
        };
        counter[kind.index()] += 1;
    }

    /// Homozygous calls of `kind`.
    pub fn homozygous(&self, kind: VariantType) -> u64 {
        self.homozygous[kind.index()]
    }

    /// Heterozygous calls of `kind`.
    pub fn heterozygous(&self, kind: VariantType) -> u64 {
        self.heterozygous[kind.index()]
    }

    /// Hemizygous calls of `kind`.
    pub fn hemizygous(&self, kind: VariantType) -> u64 {
        self.hemizygous[kind.index()]
    }

    /// All calls of `kind`.
    pub fn total(&self, kind: VariantType) -> u64 {
        self.homozygous(kind) + self.heterozygous(kind) + self.hemizygous(kind)
    }

    /// All variant calls of the sample.
    pub fn total_variants(&self) -> u64 {
        VariantType::ALL.iter().map(|&kind| self.total(kind)).sum()
    }
}

/// Counters of one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FileStatistics {
    /// Records read from the file.
    pub records: u64,
    /// Alternatives seen, split by type.
    pub alternatives: [u64; NUM_TYPES],
    /// Offsets appended to allele lists.
    pub offsets: u64,
    /// Project genomes the file does not contain.
    pub skipped_genomes: Vec<Arc<str>>,
}

impl FileStatistics {
    /// Alternatives of `kind` seen in the file.
    pub fn alternatives(&self, kind: VariantType) -> u64 {
        self.alternatives[kind.index()]
    }
}

/// Default sink: keeps sample and file counters in memory.
#[derive(Debug, Clone, Default)]
pub struct ProjectStatistics {
    samples: BTreeMap<Arc<str>, SampleStatistics>,
    files: BTreeMap<Arc<str>, FileStatistics>,
}

impl ProjectStatistics {
    /// Empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters of `genome`.
    pub fn sample(&self, genome: &str) -> Option<&SampleStatistics> {
        self.samples.get(genome)
    }

    /// Counters of the file called `name`.
    pub fn file(&self, name: &str) -> Option<&FileStatistics> {
        self.files.get(name)
    }

    /// Iterate over sample counters in genome-name order.
    pub fn samples(&self) -> impl Iterator<Item = (&Arc<str>, &SampleStatistics)> {
        self.samples.iter()
    }
}

impl StatisticsSink for ProjectStatistics {
    fn record_call(&mut self, genome: &Arc<str>, kind: VariantType, zygosity: Zygosity) {
        self.samples
            .entry(Arc::clone(genome))
            .or_default()
            .observe(kind, zygosity);
    }

    fn record_file(&mut self, file: &Arc<str>, stats: &FileStatistics) {
        self.files.insert(Arc::clone(file), stats.clone());
    }
}
