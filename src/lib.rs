//! # Multi-genome variant position synchronization
//!
//! Several genomes aligned on the same reference are shown on one shared
//! axis, the *meta genome*, wide enough to host every insertion any of them
//! carries. This crate computes the offsets needed for that axis.
//!
//! ## Pipeline
//!
//! 1. **Ingestion**: variant records are scanned file by file. Every
//!    non-SNP alternative called on an allele becomes an offset on that
//!    allele's raw list; insertions also widen the shared reference track,
//!    which keeps the longest insertion per locus.
//! 2. **Barrier**: the reference track is frozen.
//! 3. **Synchronization**: each (genome, allele, chromosome) raw list is
//!    merged with the reference track into a list expressed in meta-genome
//!    coordinates. Units are independent and run in parallel.
//!
//! ## Usage Example
//!
//! ```
//! use metagenome::{Pipeline, PipelineConfig};
//! use metagenome::genome::{GenomeSpec, Project};
//! use metagenome::ingest::SourceFile;
//! use metagenome::variant::{Alternative, VariantRecord};
//!
//! let project = Project::new(vec![GenomeSpec::diploid("A"), GenomeSpec::diploid("B")])?;
//! let file = SourceFile::new("cohort.vcf", ["A", "B"]);
//! let records = vec![
//!     VariantRecord::new("chr1", 100, vec![Alternative::insertion(5), Alternative::insertion(3)])
//!         .with_genotype("A", "1/1")
//!         .with_genotype("B", "2/2"),
//! ];
//!
//! let result = Pipeline::new(project, PipelineConfig::new()).run([(file, records)])?;
//! let offsets = result.project.offsets("B", 0, "chr1").unwrap();
//! assert_eq!(offsets.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod genome;     // Genomes, reference track, meta coordinates
pub mod ingest;     // Variant ingestion and statistics
pub mod io;         // Minimal VCF reader and TSV writers
pub mod offset;     // Offsets and ordered offset lists
pub mod sync;       // Position synchronizer and orchestration
pub mod variant;    // Variant records and genotypes

// Re-exports for convenience
pub use genome::{GenomeSpec, Ploidy, Project, ReferenceCoordinates, ReferenceTrack};
pub use ingest::{IngestError, IngestedProject, IngestionSession, ProjectStatistics, SourceFile};
pub use offset::{Offset, OffsetError, OffsetList, OffsetTable};
pub use sync::{
    synchronize, synchronize_all, CancelToken, SyncError, SyncOptions, SyncReport, SyncWarning,
    SynchronizedProject, TaskFailure,
};
pub use variant::{AlleleCall, Alternative, Genotype, VariantRecord, VariantType, Zygosity};

use thiserror::Error;
use tracing::info;

/// Configuration of a full ingest-then-synchronize run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Synchronize work units on the rayon pool.
    pub parallel: bool,

    /// Turn any failed synchronization unit into an error.
    pub strict: bool,

    /// Cancellation flag checked between synchronization units.
    pub cancel: Option<CancelToken>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            strict: false,
            cancel: None,
        }
    }
}

impl PipelineConfig {
    /// Parallel, lenient configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable parallel synchronization.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Enable or disable strict mode.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Options handed to the synchronization phase.
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            parallel: self.parallel,
            cancel: self.cancel.clone(),
        }
    }
}

/// Errors that keep a project out of multi-genome mode.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A record could not be ingested; nothing was synchronized.
    #[error("ingestion failed: {0}")]
    Ingestion(#[from] IngestError),

    /// Strict mode and at least one unit failed.
    #[error("{} of {tasks} synchronization units failed", .failures.len())]
    Synchronization {
        /// Units planned.
        tasks: usize,
        /// Failed units.
        failures: Vec<TaskFailure>,
    },

    /// Cancellation was requested before every unit ran.
    #[error("synchronization cancelled, {skipped} units skipped")]
    Cancelled {
        /// Units not run.
        skipped: usize,
    },
}

/// Output of a successful run.
#[derive(Debug)]
pub struct PipelineResult {
    /// Synchronized offsets, reference track and report.
    pub project: SynchronizedProject,
    /// Per-sample and per-file counters.
    pub statistics: ProjectStatistics,
}

/// Ingest-all, then synchronize-all.
#[derive(Debug)]
pub struct Pipeline {
    project: Project,
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline for `project`.
    pub fn new(project: Project, config: PipelineConfig) -> Self {
        Self { project, config }
    }

    /// Project being processed.
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Run both phases over `(file, records)` pairs, in order.
    pub fn run<I, R>(&self, sources: I) -> Result<PipelineResult, PipelineError>
    where
        I: IntoIterator<Item = (SourceFile, R)>,
        R: IntoIterator<Item = VariantRecord>,
    {
        let (ingested, statistics) = ingest::ingest_all(self.project.clone(), sources)?;
        info!(
            genomes = ingested.genomes().len(),
            reference_insertions = ingested.reference().len(),
            "ingestion finished"
        );

        let project = synchronize_all(ingested, &self.config.sync_options());
        let report = project.report();

        if report.cancelled > 0 {
            return Err(PipelineError::Cancelled {
                skipped: report.cancelled,
            });
        }
        if self.config.strict && !report.failures.is_empty() {
            return Err(PipelineError::Synchronization {
                tasks: report.tasks,
                failures: report.failures.clone(),
            });
        }

        info!(
            units = report.tasks,
            warnings = report.warnings.len(),
            failures = report.failures.len(),
            "synchronization finished"
        );
        Ok(PipelineResult {
            project,
            statistics,
        })
    }
}
