use std::io::BufRead;
use std::sync::Arc;

use crate::ingest::SourceFile;
use crate::variant::{Alternative, VariantRecord, VariantType};
use thiserror::Error;

const FIXED_COLUMNS: usize = 8;
const FORMAT_COLUMN: usize = 8;
const GENOTYPE_KEY: &str = "GT";

/// Errors raised while reading a variant file.
#[derive(Debug, Error)]
pub enum VcfError {
    /// Underlying reader failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data line found before the `#CHROM` header.
    #[error("line {line}: variant data before the #CHROM header")]
    MissingHeader {
        /// 1-based line number.
        line: usize,
    },

    /// Line has fewer columns than the header requires.
    #[error("line {line}: expected {expected} columns, found {found}")]
    MissingColumn {
        /// 1-based line number.
        line: usize,
        /// Columns required.
        expected: usize,
        /// Columns present.
        found: usize,
    },

    /// POS column is not a non-negative integer.
    #[error("line {line}: invalid position '{value}'")]
    InvalidPosition {
        /// 1-based line number.
        line: usize,
        /// Raw column value.
        value: String,
    },

    /// FORMAT column lacks the genotype key.
    #[error("line {line}: FORMAT '{format}' has no GT key")]
    MissingGenotypeField {
        /// 1-based line number.
        line: usize,
        /// Raw FORMAT column.
        format: String,
    },
}

/// Records of one file with the genomes it contains.
#[derive(Debug, Clone)]
pub struct VariantFile {
    /// File description for ingestion.
    pub source: SourceFile,
    /// Records in file order.
    pub records: Vec<VariantRecord>,
}

/// Classify an alternative allele against its reference allele.
///
/// Symbolic alleles, breakends and the `*` overlap marker are `Other`;
/// otherwise the length difference decides.
pub fn classify(reference: &str, alternative: &str) -> Alternative {
    let symbolic = alternative.starts_with('<')
        || alternative == "*"
        || alternative.contains('[')
        || alternative.contains(']');
    if symbolic {
        return Alternative::new(VariantType::Other, 0);
    }
    let diff = alternative.len() as i64 - reference.len() as i64;
    match diff {
        0 => Alternative::new(VariantType::Snp, 0),
        d if d > 0 => Alternative::new(VariantType::Insertion, d),
        d => Alternative::new(VariantType::Deletion, d),
    }
}

/// Read the tab-separated body of a VCF file.
///
/// Only the columns needed for synchronization are interpreted: CHROM, POS,
/// REF, ALT and the GT key of each sample.
pub fn read_variants<R: BufRead>(name: &str, reader: R) -> Result<VariantFile, VcfError> {
    let mut samples: Option<Vec<Arc<str>>> = None;
    let mut records = Vec::new();
    let mut chroms: Vec<Arc<str>> = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() || line.starts_with("##") {
            continue;
        }
        if let Some(header) = line.strip_prefix('#') {
            samples = Some(
                header
                    .split('\t')
                    .skip(FIXED_COLUMNS + 1)
                    .map(Arc::from)
                    .collect(),
            );
            continue;
        }

        let samples = samples
            .as_ref()
            .ok_or(VcfError::MissingHeader { line: line_no })?;
        let fields: Vec<&str> = line.split('\t').collect();
        let expected = if samples.is_empty() {
            FIXED_COLUMNS
        } else {
            FIXED_COLUMNS + 1 + samples.len()
        };
        if fields.len() < expected {
            return Err(VcfError::MissingColumn {
                line: line_no,
                expected,
                found: fields.len(),
            });
        }

        let chrom = match chroms.iter().find(|c| c.as_ref() == fields[0]) {
            Some(chrom) => Arc::clone(chrom),
            None => {
                let chrom: Arc<str> = Arc::from(fields[0]);
                chroms.push(Arc::clone(&chrom));
                chrom
            }
        };
        let position = fields[1]
            .parse::<u64>()
            .map_err(|_| VcfError::InvalidPosition {
                line: line_no,
                value: fields[1].to_string(),
            })?;
        let reference = fields[3];
        let alternatives = match fields[4] {
            "." => Vec::new(),
            alts => alts.split(',').map(|alt| classify(reference, alt)).collect(),
        };

        let mut record = VariantRecord::new(chrom, position, alternatives);
        if !samples.is_empty() {
            let format = fields[FORMAT_COLUMN];
            let gt_index = format
                .split(':')
                .position(|key| key == GENOTYPE_KEY)
                .ok_or_else(|| VcfError::MissingGenotypeField {
                    line: line_no,
                    format: format.to_string(),
                })?;
            for (sample, column) in samples.iter().zip(&fields[FORMAT_COLUMN + 1..]) {
                // Trailing sample keys may be dropped.
                let genotype = column.split(':').nth(gt_index).unwrap_or(".");
                record
                    .genotypes
                    .insert(Arc::clone(sample), genotype.to_string());
            }
        }
        records.push(record);
    }

    let genomes = samples.unwrap_or_default();
    Ok(VariantFile {
        source: SourceFile::new(name, genomes),
        records,
    })
}
