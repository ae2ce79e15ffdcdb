//! Position synchronization.
//!
//! Rewrites one allele's raw offsets into meta-genome coordinates by merging
//! them with the reference insertion track of the same chromosome.
//!
//! ## Merge
//!
//! Both lists are walked with one cursor each, always consuming the offset
//! with the smaller position (both when they share a locus):
//!
//! | locus                          | action                                   |
//! |--------------------------------|------------------------------------------|
//! | shared, reference longer       | emit from the allele, padded to the reference width |
//! | shared, same length            | fold the length into the pending run     |
//! | allele only, deletion          | emit from the allele                     |
//! | allele only, insertion         | fold the length into the pending run     |
//! | reference only                 | emit from the reference                  |
//!
//! Every emitted offset is chained off the previously emitted one, so
//! positions and values in the output are cumulative along the chromosome.

mod orchestrator;

pub use orchestrator::{
    synchronize_all, CancelToken, SyncOptions, SyncReport, SyncTask, SynchronizedProject,
    TaskFailure,
};

use std::cmp::Ordering;
use std::fmt;

use crate::offset::{Offset, OffsetError, OffsetList};
use thiserror::Error;
use tracing::warn;

/// Errors that abort the synchronization of one allele/chromosome pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Emitted offsets failed to stay ordered.
    #[error("synchronized offsets out of order: {0}")]
    Offset(#[from] OffsetError),

    /// Coordinates exceeded the representable range.
    #[error("coordinate overflow while synchronizing locus {position}")]
    Overflow {
        /// Input position being processed.
        position: u64,
    },
}

/// Non-fatal anomaly observed during synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncWarning {
    /// The reference track held a shorter insertion than the allele.
    ///
    /// The reference track keeps the longest insertion of every genome, so
    /// this points at inconsistent inputs. The locus is treated as matching.
    ReferenceShorter {
        /// Shared locus.
        position: u64,
        /// Length on the reference track.
        reference: i64,
        /// Length on the allele.
        allele: i64,
    },
}

impl fmt::Display for SyncWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncWarning::ReferenceShorter {
                position,
                reference,
                allele,
            } => write!(
                f,
                "reference insertion at {position} ({reference} bp) shorter than allele insertion ({allele} bp)"
            ),
        }
    }
}

/// Synchronized list plus the warnings raised while building it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Offsets in meta-genome coordinates.
    pub offsets: OffsetList,
    /// Anomalies encountered.
    pub warnings: Vec<SyncWarning>,
}

/// Merge state carried across loci.
#[derive(Debug)]
struct Merger {
    output: OffsetList,
    last_ref_position: u64,
    accumulated_length: u64,
    warnings: Vec<SyncWarning>,
}

impl Merger {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            output: OffsetList::with_capacity(capacity),
            last_ref_position: 0,
            accumulated_length: 0,
            warnings: Vec::new(),
        }
    }

    /// Chain a new offset for `current` off the last emitted one.
    fn emit(&mut self, current: &Offset, additional: u64) -> Result<(), SyncError> {
        let overflow = || SyncError::Overflow {
            position: current.position(),
        };

        let next = match self.output.last() {
            None => Offset::new(
                current.position(),
                i64::try_from(current.magnitude()).map_err(|_| overflow())?,
            ),
            Some(last) => {
                // Loci inside an already consumed deletion sit right after it.
                let gap = current.position().saturating_sub(self.last_ref_position);
                let position = last
                    .position()
                    .checked_add(gap)
                    .and_then(|p| p.checked_add(self.accumulated_length))
                    .and_then(|p| p.checked_add(additional))
                    .and_then(|p| p.checked_add(1))
                    .ok_or_else(overflow)?;
                let value = i64::try_from(current.magnitude())
                    .ok()
                    .and_then(|magnitude| last.value().checked_add(magnitude))
                    .ok_or_else(overflow)?;
                Offset::new(position, value)
            }
        };

        self.output.push(next)?;
        Ok(())
    }

    fn fold(&mut self, position: u64, length: i64) -> Result<(), SyncError> {
        self.accumulated_length = self
            .accumulated_length
            .checked_add(length.unsigned_abs())
            .ok_or(SyncError::Overflow { position })?;
        Ok(())
    }

    fn restart_after(&mut self, position: u64) -> Result<(), SyncError> {
        self.last_ref_position = position
            .checked_add(1)
            .ok_or(SyncError::Overflow { position })?;
        self.accumulated_length = 0;
        Ok(())
    }

    fn shared_locus(&mut self, reference: &Offset, allele: &Offset) -> Result<(), SyncError> {
        match reference.value().cmp(&allele.value()) {
            Ordering::Greater => {
                let padding = reference.value() - allele.value().max(0);
                self.emit(allele, padding.unsigned_abs())?;
                self.restart_after(reference.position())
            }
            Ordering::Equal => self.fold(allele.position(), allele.value()),
            Ordering::Less => {
                let warning = SyncWarning::ReferenceShorter {
                    position: allele.position(),
                    reference: reference.value(),
                    allele: allele.value(),
                };
                warn!(
                    position = allele.position(),
                    reference = reference.value(),
                    allele = allele.value(),
                    "reference insertion shorter than allele insertion"
                );
                self.warnings.push(warning);
                self.fold(allele.position(), reference.value())
            }
        }
    }

    fn allele_only(&mut self, allele: &Offset) -> Result<(), SyncError> {
        if allele.is_deletion() {
            self.emit(allele, 0)?;
            let end = allele
                .position()
                .checked_add(allele.magnitude())
                .ok_or(SyncError::Overflow {
                    position: allele.position(),
                })?;
            self.restart_after(end)
        } else {
            if allele.is_insertion() {
                self.fold(allele.position(), allele.value())?;
            }
            Ok(())
        }
    }

    fn reference_only(&mut self, reference: &Offset) -> Result<(), SyncError> {
        self.emit(reference, 0)?;
        self.restart_after(reference.position())
    }

    fn finish(self) -> SyncOutcome {
        SyncOutcome {
            offsets: self.output,
            warnings: self.warnings,
        }
    }
}

/// Synchronize one allele's raw offsets against the reference track.
///
/// Both lists belong to the same chromosome. Empty inputs yield an empty
/// list. Positions of the returned list are strictly increasing.
pub fn synchronize(reference: &OffsetList, allele: &OffsetList) -> Result<SyncOutcome, SyncError> {
    let mut merger = Merger::with_capacity(reference.len() + allele.len());
    let mut ref_idx = 0;
    let mut allele_idx = 0;

    loop {
        match (reference.get(ref_idx), allele.get(allele_idx)) {
            (Some(r), Some(a)) => match a.position().cmp(&r.position()) {
                Ordering::Equal => {
                    merger.shared_locus(r, a)?;
                    ref_idx += 1;
                    allele_idx += 1;
                }
                Ordering::Less => {
                    merger.allele_only(a)?;
                    allele_idx += 1;
                }
                Ordering::Greater => {
                    merger.reference_only(r)?;
                    ref_idx += 1;
                }
            },
            (None, Some(a)) => {
                merger.allele_only(a)?;
                allele_idx += 1;
            }
            (Some(r), None) => {
                merger.reference_only(r)?;
                ref_idx += 1;
            }
            (None, None) => break,
        }
    }

    Ok(merger.finish())
}
