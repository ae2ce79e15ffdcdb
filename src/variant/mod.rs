//! Variant records as handed over by the file-reading layer.
//!
//! Records are ephemeral: ingestion consumes them one at a time and keeps
//! only the offsets and statistics derived from them.

mod genotype;

pub use genotype::{AlleleCall, Genotype, GenotypeError, Zygosity};

use std::collections::HashMap;
use std::sync::Arc;

/// Category of an alternative allele relative to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VariantType {
    /// Same length as the reference allele.
    Snp,
    /// Longer than the reference allele.
    Insertion,
    /// Shorter than the reference allele.
    Deletion,
    /// Symbolic or otherwise unclassified alternative.
    Other,
}

impl VariantType {
    /// All variant types, in counter order.
    pub const ALL: [VariantType; 4] = [
        VariantType::Snp,
        VariantType::Insertion,
        VariantType::Deletion,
        VariantType::Other,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            VariantType::Snp => 0,
            VariantType::Insertion => 1,
            VariantType::Deletion => 2,
            VariantType::Other => 3,
        }
    }

    /// Whether an alternative of this type moves coordinates.
    pub fn shifts_coordinates(self) -> bool {
        !matches!(self, VariantType::Snp)
    }
}

/// One alternative allele of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Alternative {
    /// Pre-classified variant type.
    pub kind: VariantType,
    /// Signed length delta (insertions positive, deletions negative).
    pub length: i64,
}

impl Alternative {
    /// Construct an alternative.
    pub fn new(kind: VariantType, length: i64) -> Self {
        Self { kind, length }
    }

    /// Single-nucleotide alternative.
    pub fn snp() -> Self {
        Self::new(VariantType::Snp, 0)
    }

    /// Insertion of `length` bases.
    pub fn insertion(length: u32) -> Self {
        Self::new(VariantType::Insertion, i64::from(length))
    }

    /// Deletion of `length` bases.
    pub fn deletion(length: u32) -> Self {
        Self::new(VariantType::Deletion, -i64::from(length))
    }
}

/// A single variant line: one locus, its alternatives and per-genome genotypes.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRecord {
    /// Chromosome identifier.
    pub chrom: Arc<str>,
    /// Reference-genome position of the locus.
    pub position: u64,
    /// Alternatives, indexed by `AlleleCall::Alt`.
    pub alternatives: Vec<Alternative>,
    /// Genotype string per genome name (e.g. `"0/1"`, `"1|1"`, `"./."`).
    pub genotypes: HashMap<Arc<str>, String>,
}

impl VariantRecord {
    /// Create a record without genotypes.
    pub fn new(chrom: impl Into<Arc<str>>, position: u64, alternatives: Vec<Alternative>) -> Self {
        Self {
            chrom: chrom.into(),
            position,
            alternatives,
            genotypes: HashMap::new(),
        }
    }

    /// Attach the genotype string of `genome`.
    pub fn with_genotype(mut self, genome: impl Into<Arc<str>>, genotype: impl Into<String>) -> Self {
        self.genotypes.insert(genome.into(), genotype.into());
        self
    }

    /// Genotype string reported for `genome`.
    pub fn genotype(&self, genome: &str) -> Option<&str> {
        self.genotypes.get(genome).map(String::as_str)
    }

    /// Alternative referenced by a call index.
    pub fn alternative(&self, index: usize) -> Option<&Alternative> {
        self.alternatives.get(index)
    }
}
