//! Variant ingestion: turns variant records into raw per-allele offset lists
//! and the reference insertion track.
//!
//! Ingestion is all-or-nothing. The first failing record poisons the
//! session and every later call (including [`IngestionSession::finish`])
//! reports [`IngestError::Poisoned`], so partially built lists never reach
//! the synchronizer.

mod statistics;

pub use statistics::{FileStatistics, ProjectStatistics, SampleStatistics, StatisticsSink};

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::genome::{Genome, Project, ReferenceTrack, ReferenceTrackBuilder, ReferenceUpdate};
use crate::offset::{Offset, OffsetError};
use crate::variant::{Genotype, GenotypeError, VariantRecord, VariantType};
use thiserror::Error;
use tracing::{debug, trace};

/// Location of a record, used in error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locus {
    /// Source file name.
    pub file: Arc<str>,
    /// Chromosome of the record.
    pub chrom: Arc<str>,
    /// Reference position of the record.
    pub position: u64,
}

impl Locus {
    fn of(file: &SourceFile, record: &VariantRecord) -> Self {
        Self {
            file: Arc::clone(&file.name),
            chrom: Arc::clone(&record.chrom),
            position: record.position,
        }
    }
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.chrom, self.position)
    }
}

/// Errors that abort an ingestion pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// Genotype string could not be parsed.
    #[error("{locus}: genome '{genome}': {source}")]
    Genotype {
        /// Record location.
        locus: Locus,
        /// Genome whose genotype failed.
        genome: Arc<str>,
        /// Parse failure.
        source: GenotypeError,
    },

    /// A call referenced an alternative the record does not have.
    #[error("{locus}: genome '{genome}' calls alternative {index} but the record has {available}")]
    UnknownAlternative {
        /// Record location.
        locus: Locus,
        /// Genome making the call.
        genome: Arc<str>,
        /// 0-based alternative index that was called.
        index: usize,
        /// Number of alternatives on the record.
        available: usize,
    },

    /// Genotype has more calls than the genome has alleles.
    #[error("{locus}: genome '{genome}' has {alleles} allele(s) but the genotype has {calls} calls")]
    PloidyMismatch {
        /// Record location.
        locus: Locus,
        /// Genome concerned.
        genome: Arc<str>,
        /// Calls in the genotype.
        calls: usize,
        /// Alleles declared for the genome.
        alleles: usize,
    },

    /// File claims to contain a genome but the record has no genotype for it.
    #[error("{locus}: no genotype for genome '{genome}'")]
    MissingGenotype {
        /// Record location.
        locus: Locus,
        /// Genome without genotype.
        genome: Arc<str>,
    },

    /// Records did not arrive in position order for an allele.
    #[error("{locus}: genome '{genome}' allele {allele}: {source}")]
    OutOfOrder {
        /// Record location.
        locus: Locus,
        /// Genome concerned.
        genome: Arc<str>,
        /// Allele whose list rejected the offset.
        allele: usize,
        /// Ordering failure.
        source: OffsetError,
    },

    /// An earlier record failed; the session can no longer be used.
    #[error("ingestion session aborted by an earlier error")]
    Poisoned,
}

/// A variant source file and the genomes it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Display name of the file.
    pub name: Arc<str>,
    /// Genome names present in the file.
    pub genomes: HashSet<Arc<str>>,
}

impl SourceFile {
    /// Describe a source file.
    pub fn new<G, N>(name: impl Into<Arc<str>>, genomes: G) -> Self
    where
        G: IntoIterator<Item = N>,
        N: Into<Arc<str>>,
    {
        Self {
            name: name.into(),
            genomes: genomes.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the file contains `genome`.
    pub fn contains(&self, genome: &str) -> bool {
        self.genomes.contains(genome)
    }
}

/// Raw offsets of every genome plus the frozen reference track.
///
/// Produced once all files are ingested; input of the synchronization phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedProject {
    genomes: Vec<Genome>,
    reference: ReferenceTrack,
}

impl IngestedProject {
    /// Assemble from already-built parts.
    pub fn new(genomes: Vec<Genome>, reference: ReferenceTrack) -> Self {
        Self { genomes, reference }
    }

    /// Genomes with their raw offsets.
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    /// Genome called `name`.
    pub fn genome(&self, name: &str) -> Option<&Genome> {
        self.genomes.iter().find(|genome| genome.name().as_ref() == name)
    }

    /// Frozen reference track.
    pub fn reference(&self) -> &ReferenceTrack {
        &self.reference
    }

    pub(crate) fn into_parts(self) -> (Vec<Genome>, ReferenceTrack) {
        (self.genomes, self.reference)
    }
}

/// Mutable state of the ingestion phase.
#[derive(Debug)]
pub struct IngestionSession<S = ProjectStatistics> {
    project: Project,
    genomes: Vec<Genome>,
    reference: ReferenceTrackBuilder,
    statistics: S,
    poisoned: bool,
}

impl IngestionSession<ProjectStatistics> {
    /// Start a session collecting statistics in memory.
    pub fn new(project: Project) -> Self {
        Self::with_statistics(project, ProjectStatistics::new())
    }
}

impl<S: StatisticsSink> IngestionSession<S> {
    /// Start a session reporting statistics to `statistics`.
    pub fn with_statistics(project: Project, statistics: S) -> Self {
        let genomes = project.genomes().iter().map(Genome::new).collect();
        Self {
            project,
            genomes,
            reference: ReferenceTrackBuilder::new(),
            statistics,
            poisoned: false,
        }
    }

    /// Ingest every record of one file, in file order.
    pub fn ingest_file<I>(&mut self, file: &SourceFile, records: I) -> Result<FileStatistics, IngestError>
    where
        I: IntoIterator<Item = VariantRecord>,
    {
        if self.poisoned {
            return Err(IngestError::Poisoned);
        }

        let mut stats = FileStatistics {
            skipped_genomes: self
                .project
                .genomes()
                .iter()
                .filter(|spec| !file.contains(&spec.name))
                .map(|spec| Arc::clone(&spec.name))
                .collect(),
            ..FileStatistics::default()
        };

        for record in records {
            let appended = self.process_record(file, &record)?;
            stats.records += 1;
            stats.offsets += appended as u64;
            for alternative in &record.alternatives {
                stats.alternatives[alternative.kind.index()] += 1;
            }
        }

        debug!(
            file = %file.name,
            records = stats.records,
            offsets = stats.offsets,
            skipped = stats.skipped_genomes.len(),
            "ingested variant file"
        );
        self.statistics.record_file(&file.name, &stats);
        Ok(stats)
    }

    /// Apply one record to the raw offset lists and the reference track.
    ///
    /// Returns the number of offsets appended to allele lists.
    pub fn process_record(&mut self, file: &SourceFile, record: &VariantRecord) -> Result<usize, IngestError> {
        if self.poisoned {
            return Err(IngestError::Poisoned);
        }
        let result = self.apply_record(file, record);
        if result.is_err() {
            self.poisoned = true;
        }
        result
    }

    fn apply_record(&mut self, file: &SourceFile, record: &VariantRecord) -> Result<usize, IngestError> {
        let mut appended = 0;

        for (genome_idx, spec) in self.project.genomes().iter().enumerate() {
            if !file.contains(&spec.name) {
                continue;
            }

            let raw = record
                .genotype(&spec.name)
                .ok_or_else(|| IngestError::MissingGenotype {
                    locus: Locus::of(file, record),
                    genome: Arc::clone(&spec.name),
                })?;
            let genotype = Genotype::parse(raw).map_err(|source| IngestError::Genotype {
                locus: Locus::of(file, record),
                genome: Arc::clone(&spec.name),
                source,
            })?;

            let alleles = spec.ploidy.allele_count();
            if genotype.len() > alleles {
                return Err(IngestError::PloidyMismatch {
                    locus: Locus::of(file, record),
                    genome: Arc::clone(&spec.name),
                    calls: genotype.len(),
                    alleles,
                });
            }
            if let Some(index) = genotype
                .calls()
                .iter()
                .filter_map(|call| call.alt_index())
                .find(|&index| index >= record.alternatives.len())
            {
                return Err(IngestError::UnknownAlternative {
                    locus: Locus::of(file, record),
                    genome: Arc::clone(&spec.name),
                    index,
                    available: record.alternatives.len(),
                });
            }

            let zygosity = genotype.zygosity();
            for index in genotype.alt_indices() {
                self.statistics
                    .record_call(&spec.name, record.alternatives[index].kind, zygosity);
            }

            for (allele, call) in genotype.calls().iter().enumerate() {
                let Some(index) = call.alt_index() else {
                    continue;
                };
                let alternative = record.alternatives[index];
                if !alternative.kind.shifts_coordinates() || alternative.length == 0 {
                    continue;
                }

                let Some(table) = self.genomes[genome_idx].allele_mut(allele) else {
                    continue;
                };
                table
                    .entry(&record.chrom)
                    .push(Offset::new(record.position, alternative.length))
                    .map_err(|source| IngestError::OutOfOrder {
                        locus: Locus::of(file, record),
                        genome: Arc::clone(&spec.name),
                        allele,
                        source,
                    })?;
                appended += 1;

                if alternative.kind == VariantType::Insertion {
                    let update = self.reference.record_insertion(
                        &record.chrom,
                        record.position,
                        alternative.length,
                    );
                    if let ReferenceUpdate::Widened { previous } = update {
                        trace!(
                            chrom = %record.chrom,
                            position = record.position,
                            previous,
                            length = alternative.length,
                            genome = %spec.name,
                            "widened reference insertion"
                        );
                    }
                }
            }
        }

        Ok(appended)
    }

    /// Counters reported so far.
    pub fn statistics(&self) -> &S {
        &self.statistics
    }

    /// Close the ingestion phase and freeze the reference track.
    pub fn finish(self) -> Result<(IngestedProject, S), IngestError> {
        if self.poisoned {
            return Err(IngestError::Poisoned);
        }
        debug!(
            genomes = self.genomes.len(),
            reference_insertions = self.reference.len(),
            "ingestion complete"
        );
        let project = IngestedProject {
            genomes: self.genomes,
            reference: self.reference.freeze(),
        };
        Ok((project, self.statistics))
    }
}

/// Ingest every `(file, records)` pair in order and close the phase.
pub fn ingest_all<I, R>(project: Project, sources: I) -> Result<(IngestedProject, ProjectStatistics), IngestError>
where
    I: IntoIterator<Item = (SourceFile, R)>,
    R: IntoIterator<Item = VariantRecord>,
{
    let mut session = IngestionSession::new(project);
    for (file, records) in sources {
        session.ingest_file(&file, records)?;
    }
    session.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::GenomeSpec;
    use crate::variant::Alternative;

    fn project() -> Project {
        Project::new(vec![GenomeSpec::diploid("A"), GenomeSpec::haploid("B")]).unwrap()
    }

    #[test]
    fn deletion_goes_to_allele_list_only() {
        let file = SourceFile::new("a.vcf", ["A"]);
        let mut session = IngestionSession::new(project());
        let record = VariantRecord::new("chr1", 50, vec![Alternative::deletion(4)])
            .with_genotype("A", "0/1");
        assert_eq!(session.process_record(&file, &record).unwrap(), 1);

        let (ingested, stats) = session.finish().unwrap();
        let genome = ingested.genome("A").unwrap();
        assert!(genome.allele(0).unwrap().get("chr1").is_none());
        assert_eq!(
            genome.allele(1).unwrap().get("chr1").unwrap().as_slice(),
            &[Offset::new(50, -4)]
        );
        assert!(ingested.reference().is_empty());
        assert_eq!(
            stats.sample("A").unwrap().heterozygous(VariantType::Deletion),
            1
        );
    }

    #[test]
    fn errors_poison_the_session() {
        let file = SourceFile::new("a.vcf", ["A"]);
        let mut session = IngestionSession::new(project());
        let bad = VariantRecord::new("chr1", 10, vec![Alternative::insertion(2)])
            .with_genotype("A", "0/3");
        assert!(matches!(
            session.process_record(&file, &bad),
            Err(IngestError::UnknownAlternative {
                index: 2,
                available: 1,
                ..
            })
        ));

        let good = VariantRecord::new("chr1", 20, vec![Alternative::insertion(2)])
            .with_genotype("A", "1/1");
        assert_eq!(
            session.process_record(&file, &good),
            Err(IngestError::Poisoned)
        );
        assert!(matches!(session.finish(), Err(IngestError::Poisoned)));
    }

    #[test]
    fn diploid_call_on_haploid_genome_is_rejected() {
        let file = SourceFile::new("b.vcf", ["B"]);
        let mut session = IngestionSession::new(project());
        let record =
            VariantRecord::new("chr1", 10, vec![Alternative::snp()]).with_genotype("B", "0/1");
        assert!(matches!(
            session.process_record(&file, &record),
            Err(IngestError::PloidyMismatch {
                calls: 2,
                alleles: 1,
                ..
            })
        ));
    }

    #[test]
    fn genomes_absent_from_file_are_skipped() {
        let file = SourceFile::new("a.vcf", ["A"]);
        let mut session = IngestionSession::new(project());
        let records = vec![
            VariantRecord::new("chr1", 10, vec![Alternative::insertion(3)]).with_genotype("A", "1/0"),
        ];
        let stats = session.ingest_file(&file, records).unwrap();
        assert_eq!(stats.records, 1);
        assert_eq!(stats.offsets, 1);
        assert_eq!(stats.alternatives(VariantType::Insertion), 1);
        assert_eq!(stats.skipped_genomes, vec![Arc::from("B")]);
    }

    #[test]
    fn missing_genotype_for_declared_genome_fails() {
        let file = SourceFile::new("a.vcf", ["A", "B"]);
        let mut session = IngestionSession::new(project());
        let record =
            VariantRecord::new("chr1", 10, vec![Alternative::snp()]).with_genotype("A", "0/1");
        assert!(matches!(
            session.process_record(&file, &record),
            Err(IngestError::MissingGenotype { .. })
        ));
    }
}
