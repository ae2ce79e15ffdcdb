//! Minimal text input and output around the core.
//!
//! The reader interprets just enough of a VCF body to build variant records;
//! the writers print synchronized offsets and the reference track as TSV.

mod table;
mod vcf;

pub use table::{render_offsets, write_offsets, write_reference};
pub use vcf::{classify, read_variants, VariantFile, VcfError};
