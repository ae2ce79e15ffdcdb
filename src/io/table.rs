use anyhow::{anyhow, Result};
use std::io::Write;

use crate::sync::SynchronizedProject;

const OFFSETS_HEADER: &str = "#genome\tallele\tchrom\tposition\tvalue\n";
const REFERENCE_HEADER: &str = "#chrom\tposition\tlength\tmeta_position\n";

/// Write every synchronized offset as one TSV line, grouped by genome,
/// allele and chromosome.
pub fn write_offsets<W: Write>(writer: &mut W, project: &SynchronizedProject) -> Result<()> {
    writer.write_all(OFFSETS_HEADER.as_bytes())?;

    for genome in project.genomes() {
        for (allele, table) in genome.alleles().iter().enumerate() {
            for (chrom, list) in table.iter() {
                for offset in list {
                    writeln!(
                        writer,
                        "{genome}\t{allele}\t{chrom}\t{position}\t{value}",
                        genome = genome.name(),
                        position = offset.position(),
                        value = offset.value(),
                    )?;
                }
            }
        }
    }

    writer.flush()?;
    Ok(())
}

/// Render synchronized offsets into a string (useful for tests and snapshots).
pub fn render_offsets(project: &SynchronizedProject) -> Result<String> {
    let mut buffer = Vec::new();
    write_offsets(&mut buffer, project)?;
    String::from_utf8(buffer).map_err(|_| anyhow!("rendered offsets are not valid UTF-8"))
}

/// Write the reference insertion track with the meta-genome position of
/// every anchor.
pub fn write_reference<W: Write>(writer: &mut W, project: &SynchronizedProject) -> Result<()> {
    writer.write_all(REFERENCE_HEADER.as_bytes())?;

    for chrom in project.reference().chromosomes() {
        for span in project.coordinates().spans(chrom) {
            writeln!(
                writer,
                "{chrom}\t{}\t{}\t{}",
                span.reference_position, span.length, span.meta_position
            )?;
        }
    }

    writer.flush()?;
    Ok(())
}
