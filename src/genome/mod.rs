//! Genomes of a project and the reference backbone they are aligned on.

mod coordinates;
mod reference;

pub use coordinates::{InsertionSpan, ReferenceCoordinates};
pub use reference::{ReferenceTrack, ReferenceTrackBuilder, ReferenceUpdate};

use std::collections::HashSet;
use std::sync::Arc;

use crate::offset::OffsetTable;
use thiserror::Error;

/// Errors raised while describing a project.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectError {
    /// The same genome name was declared twice.
    #[error("genome '{0}' is declared more than once")]
    DuplicateGenome(String),

    /// Project contains no genome.
    #[error("project must contain at least one genome")]
    Empty,
}

/// Number of alleles a genome carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Ploidy {
    /// One allele.
    Haploid,
    /// Two alleles.
    Diploid,
}

impl Ploidy {
    /// Number of alleles.
    pub fn allele_count(self) -> usize {
        match self {
            Ploidy::Haploid => 1,
            Ploidy::Diploid => 2,
        }
    }
}

/// Declaration of a genome required by the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomeSpec {
    /// Sample name as it appears in source files.
    pub name: Arc<str>,
    /// Number of alleles.
    pub ploidy: Ploidy,
}

impl GenomeSpec {
    /// Diploid genome.
    pub fn diploid(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            ploidy: Ploidy::Diploid,
        }
    }

    /// Haploid genome.
    pub fn haploid(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            ploidy: Ploidy::Haploid,
        }
    }
}

/// Set of genomes displayed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    genomes: Vec<GenomeSpec>,
}

impl Project {
    /// Create a project from genome declarations; names must be unique.
    pub fn new(genomes: Vec<GenomeSpec>) -> Result<Self, ProjectError> {
        if genomes.is_empty() {
            return Err(ProjectError::Empty);
        }
        let mut seen = HashSet::new();
        for spec in &genomes {
            if !seen.insert(Arc::clone(&spec.name)) {
                return Err(ProjectError::DuplicateGenome(spec.name.to_string()));
            }
        }
        Ok(Self { genomes })
    }

    /// Declared genomes, in declaration order.
    pub fn genomes(&self) -> &[GenomeSpec] {
        &self.genomes
    }

    /// Index of the genome called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.genomes.iter().position(|spec| spec.name.as_ref() == name)
    }
}

/// Offsets of one genome: one table per allele.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genome {
    name: Arc<str>,
    alleles: Vec<OffsetTable>,
}

impl Genome {
    /// Empty genome with as many alleles as `spec` declares.
    pub fn new(spec: &GenomeSpec) -> Self {
        Self {
            name: Arc::clone(&spec.name),
            alleles: vec![OffsetTable::new(); spec.ploidy.allele_count()],
        }
    }

    pub(crate) fn from_alleles(name: Arc<str>, alleles: Vec<OffsetTable>) -> Self {
        Self { name, alleles }
    }

    /// Genome name.
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// Number of alleles.
    pub fn allele_count(&self) -> usize {
        self.alleles.len()
    }

    /// Offsets of allele `index`.
    pub fn allele(&self, index: usize) -> Option<&OffsetTable> {
        self.alleles.get(index)
    }

    pub(crate) fn allele_mut(&mut self, index: usize) -> Option<&mut OffsetTable> {
        self.alleles.get_mut(index)
    }

    /// All allele tables.
    pub fn alleles(&self) -> &[OffsetTable] {
        &self.alleles
    }
}
