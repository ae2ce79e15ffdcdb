use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, trace, warn};

use super::{synchronize, SyncError, SyncOutcome, SyncWarning};
use crate::genome::{Genome, ReferenceCoordinates, ReferenceTrack};
use crate::ingest::IngestedProject;
use crate::offset::{OffsetList, OffsetTable, EMPTY};

/// Cooperative cancellation flag, checked between work units.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Fresh, non-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Work units already running complete.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Options of the synchronization phase.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Run work units on the rayon pool.
    pub parallel: bool,
    /// Optional cancellation flag.
    pub cancel: Option<CancelToken>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            cancel: None,
        }
    }
}

impl SyncOptions {
    /// Parallel execution, no cancellation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

/// One (genome, allele, chromosome) work unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyncTask {
    /// Genome name.
    pub genome: Arc<str>,
    /// Allele index within the genome.
    pub allele: usize,
    /// Chromosome.
    pub chrom: Arc<str>,
}

impl fmt::Display for SyncTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]:{}", self.genome, self.allele, self.chrom)
    }
}

/// A work unit that could not be synchronized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    /// Failed unit.
    pub task: SyncTask,
    /// Cause.
    pub error: SyncError,
}

/// Aggregate outcome of the synchronization phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Work units planned.
    pub tasks: usize,
    /// Warnings, tagged with their work unit.
    pub warnings: Vec<(SyncTask, SyncWarning)>,
    /// Work units that failed; their lists are absent from the result.
    pub failures: Vec<TaskFailure>,
    /// Work units skipped because of cancellation.
    pub cancelled: usize,
}

impl SyncReport {
    /// Whether every unit completed without warning.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.failures.is_empty() && self.cancelled == 0
    }

    /// Work units that produced a list.
    pub fn completed(&self) -> usize {
        self.tasks - self.failures.len() - self.cancelled
    }
}

/// Result of the synchronization phase.
#[derive(Debug, Clone)]
pub struct SynchronizedProject {
    genomes: Vec<Genome>,
    reference: ReferenceTrack,
    coordinates: ReferenceCoordinates,
    report: SyncReport,
}

impl SynchronizedProject {
    /// Genomes with their synchronized offsets.
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    /// Genome called `name`.
    pub fn genome(&self, name: &str) -> Option<&Genome> {
        self.genomes.iter().find(|genome| genome.name().as_ref() == name)
    }

    /// Synchronized list of one work unit.
    ///
    /// `None` when the unit failed, was cancelled, or does not exist.
    pub fn offsets(&self, genome: &str, allele: usize, chrom: &str) -> Option<&OffsetList> {
        self.genome(genome)?.allele(allele)?.get(chrom)
    }

    /// Reference insertion track the genomes were synchronized against.
    pub fn reference(&self) -> &ReferenceTrack {
        &self.reference
    }

    /// Reference/meta-genome coordinate translation.
    pub fn coordinates(&self) -> &ReferenceCoordinates {
        &self.coordinates
    }

    /// Warnings and failures of the phase.
    pub fn report(&self) -> &SyncReport {
        &self.report
    }
}

enum TaskOutcome {
    Done(SyncOutcome),
    Failed(SyncError),
    Cancelled,
}

/// Chromosomes handled for an allele: its own plus every reference chromosome.
fn plan(genomes: &[Genome], reference: &ReferenceTrack) -> Vec<(usize, SyncTask)> {
    let mut tasks = Vec::new();
    for (genome_idx, genome) in genomes.iter().enumerate() {
        for (allele, table) in genome.alleles().iter().enumerate() {
            let chroms: BTreeSet<&Arc<str>> =
                table.chromosomes().chain(reference.chromosomes()).collect();
            tasks.extend(chroms.into_iter().map(|chrom| {
                (
                    genome_idx,
                    SyncTask {
                        genome: Arc::clone(genome.name()),
                        allele,
                        chrom: Arc::clone(chrom),
                    },
                )
            }));
        }
    }
    tasks
}

/// Synchronize every (genome, allele, chromosome) of an ingested project.
///
/// Units are independent: each reads the shared reference track and its own
/// raw list. A failing unit is reported and left out without affecting the
/// others. The raw lists are dropped once replaced.
pub fn synchronize_all(ingested: IngestedProject, options: &SyncOptions) -> SynchronizedProject {
    let (raw_genomes, reference) = ingested.into_parts();
    let tasks = plan(&raw_genomes, &reference);
    debug!(tasks = tasks.len(), parallel = options.parallel, "synchronizing");

    let run = |(genome_idx, task): &(usize, SyncTask)| -> TaskOutcome {
        if options.is_cancelled() {
            return TaskOutcome::Cancelled;
        }
        let raw = raw_genomes[*genome_idx]
            .allele(task.allele)
            .and_then(|table| table.get(&task.chrom))
            .unwrap_or(&EMPTY);
        trace!(task = %task, offsets = raw.len(), "synchronizing work unit");
        match synchronize(reference.offsets(&task.chrom), raw) {
            Ok(outcome) => TaskOutcome::Done(outcome),
            Err(error) => TaskOutcome::Failed(error),
        }
    };

    let outcomes: Vec<TaskOutcome> = if options.parallel {
        tasks.par_iter().map(&run).collect()
    } else {
        tasks.iter().map(&run).collect()
    };

    let mut report = SyncReport {
        tasks: tasks.len(),
        ..SyncReport::default()
    };
    let mut tables: Vec<Vec<OffsetTable>> = raw_genomes
        .iter()
        .map(|genome| vec![OffsetTable::new(); genome.allele_count()])
        .collect();

    for ((genome_idx, task), outcome) in tasks.into_iter().zip(outcomes) {
        match outcome {
            TaskOutcome::Done(SyncOutcome { offsets, warnings }) => {
                report
                    .warnings
                    .extend(warnings.into_iter().map(|warning| (task.clone(), warning)));
                tables[genome_idx][task.allele].insert(task.chrom, offsets);
            }
            TaskOutcome::Failed(error) => {
                warn!(task = %task, %error, "synchronization failed");
                report.failures.push(TaskFailure { task, error });
            }
            TaskOutcome::Cancelled => report.cancelled += 1,
        }
    }

    let genomes = raw_genomes
        .iter()
        .zip(tables)
        .map(|(genome, alleles)| Genome::from_alleles(Arc::clone(genome.name()), alleles))
        .collect();

    debug!(
        completed = report.completed(),
        failed = report.failures.len(),
        warnings = report.warnings.len(),
        cancelled = report.cancelled,
        "synchronization complete"
    );

    let coordinates = ReferenceCoordinates::from_track(&reference);
    SynchronizedProject {
        genomes,
        reference,
        coordinates,
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::GenomeSpec;
    use crate::offset::Offset;

    fn ingested() -> IngestedProject {
        let chr1: Arc<str> = Arc::from("chr1");
        let chr2: Arc<str> = Arc::from("chr2");
        let mut genome = Genome::new(&GenomeSpec::diploid("A"));
        genome
            .allele_mut(0)
            .unwrap()
            .entry(&chr2)
            .push(Offset::new(50, -4))
            .unwrap();

        let mut reference = OffsetTable::new();
        reference.entry(&chr1).push(Offset::new(200, 2)).unwrap();
        IngestedProject::new(vec![genome], ReferenceTrack::from_table(reference))
    }

    #[test]
    fn every_allele_covers_reference_chromosomes() {
        let project = synchronize_all(ingested(), &SyncOptions::new().with_parallel(false));
        assert_eq!(project.report().tasks, 3);
        assert!(project.report().is_clean());

        assert_eq!(
            project.offsets("A", 0, "chr1").unwrap().as_slice(),
            &[Offset::new(200, 2)]
        );
        assert_eq!(
            project.offsets("A", 0, "chr2").unwrap().as_slice(),
            &[Offset::new(50, 4)]
        );
        assert_eq!(
            project.offsets("A", 1, "chr1").unwrap().as_slice(),
            &[Offset::new(200, 2)]
        );
        assert!(project.offsets("A", 1, "chr2").is_none());
        assert_eq!(project.coordinates().meta_position("chr1", 201), 203);
    }

    #[test]
    fn cancelled_units_are_counted() {
        let token = CancelToken::new();
        token.cancel();
        let project = synchronize_all(ingested(), &SyncOptions::new().with_cancel(token));
        assert_eq!(project.report().cancelled, 3);
        assert_eq!(project.report().completed(), 0);
        assert!(project.offsets("A", 0, "chr1").is_none());
    }
}
