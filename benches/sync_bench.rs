//! Synchronizer and pipeline throughput

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use metagenome::genome::{GenomeSpec, Project};
use metagenome::ingest::SourceFile;
use metagenome::offset::{Offset, OffsetList};
use metagenome::variant::{Alternative, VariantRecord};
use metagenome::{synchronize, Pipeline, PipelineConfig};

fn track(len: u64, stride: u64, phase: u64) -> OffsetList {
    OffsetList::from_sorted(
        (0..len)
            .map(|i| {
                let value = match (i + phase) % 4 {
                    0 => -((i % 7) as i64 + 1),
                    _ => (i % 5) as i64 + 1,
                };
                Offset::new(i * stride + phase, value)
            })
            .collect(),
    )
    .expect("positions are increasing")
}

fn benchmark_synchronize(c: &mut Criterion) {
    let mut group = c.benchmark_group("synchronize");
    for size in [1_000u64, 10_000, 100_000] {
        let reference = OffsetList::from_sorted(
            (0..size).map(|i| Offset::new(i * 10, (i % 9) as i64 + 1)).collect(),
        )
        .expect("positions are increasing");
        let allele = track(size, 15, 3);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| synchronize(black_box(&reference), black_box(&allele)));
        });
    }
    group.finish();
}

fn benchmark_pipeline(c: &mut Criterion) {
    let genomes: Vec<String> = (0..8).map(|g| format!("g{g}")).collect();
    let sources: Vec<(SourceFile, Vec<VariantRecord>)> = genomes
        .iter()
        .enumerate()
        .map(|(g, name)| {
            let records = (0..5_000u64)
                .map(|i| {
                    let alternative = if (i + g as u64) % 2 == 0 {
                        Alternative::insertion(1 + (i % 6) as u32)
                    } else {
                        Alternative::deletion(1 + (i % 3) as u32)
                    };
                    VariantRecord::new("chr1", i * 20, vec![alternative])
                        .with_genotype(name.as_str(), if i % 3 == 0 { "1/1" } else { "0/1" })
                })
                .collect();
            (SourceFile::new(format!("{name}.vcf"), [name.as_str()]), records)
        })
        .collect();
    let project = Project::new(genomes.iter().map(|name| GenomeSpec::diploid(name.as_str())).collect())
        .expect("valid project");

    for parallel in [false, true] {
        let pipeline = Pipeline::new(project.clone(), PipelineConfig::new().with_parallel(parallel));
        let label = if parallel { "pipeline_parallel" } else { "pipeline_sequential" };
        c.bench_function(label, |b| {
            b.iter(|| pipeline.run(black_box(sources.clone())).expect("pipeline succeeds"));
        });
    }
}

criterion_group!(benches, benchmark_synchronize, benchmark_pipeline);
criterion_main!(benches);
