use metagenome::genome::{GenomeSpec, Project};
use metagenome::ingest::{IngestError, IngestedProject, IngestionSession, SourceFile};
use metagenome::offset::Offset;
use metagenome::variant::{Alternative, VariantRecord, VariantType};
use test_case::test_case;

fn project() -> Project {
    Project::new(vec![GenomeSpec::diploid("A"), GenomeSpec::diploid("B")]).expect("valid project")
}

fn allele_offsets(ingested: &IngestedProject, genome: &str, allele: usize) -> Vec<Offset> {
    ingested
        .genome(genome)
        .and_then(|g| g.allele(allele))
        .and_then(|table| table.get("chr1"))
        .map(|list| list.as_slice().to_vec())
        .unwrap_or_default()
}

#[test_case("0/1", &[], &[(100, 4)] ; "heterozygous second allele")]
#[test_case("1/0", &[(100, 4)], &[] ; "heterozygous first allele")]
#[test_case("1|1", &[(100, 4)], &[(100, 4)] ; "phased homozygous")]
#[test_case("./.", &[], &[] ; "no call")]
#[test_case("0/0", &[], &[] ; "reference")]
fn genotype_routes_offsets_to_alleles(genotype: &str, first: &[(u64, i64)], second: &[(u64, i64)]) {
    let file = SourceFile::new("a.vcf", ["A"]);
    let mut session = IngestionSession::new(project());
    let record = VariantRecord::new("chr1", 100, vec![Alternative::insertion(4)])
        .with_genotype("A", genotype);
    session.process_record(&file, &record).expect("record ingests");
    let (ingested, _) = session.finish().expect("session closes");

    let expect = |pairs: &[(u64, i64)]| pairs.iter().map(|&(p, v)| Offset::new(p, v)).collect::<Vec<_>>();
    assert_eq!(allele_offsets(&ingested, "A", 0), expect(first));
    assert_eq!(allele_offsets(&ingested, "A", 1), expect(second));

    // Both alleles of "1|1" share one reference locus.
    let carried = !first.is_empty() || !second.is_empty();
    assert_eq!(ingested.reference().len(), usize::from(carried));
}

#[test]
fn heterozygous_snp_counts_without_offsets() {
    let file = SourceFile::new("a.vcf", ["A"]);
    let mut session = IngestionSession::new(project());
    let record = VariantRecord::new("chr1", 42, vec![Alternative::snp()]).with_genotype("A", "0/1");
    assert_eq!(session.process_record(&file, &record).unwrap(), 0);

    let (ingested, statistics) = session.finish().unwrap();
    assert!(allele_offsets(&ingested, "A", 0).is_empty());
    assert!(allele_offsets(&ingested, "A", 1).is_empty());
    assert!(ingested.reference().is_empty());

    let a = statistics.sample("A").unwrap();
    assert_eq!(a.heterozygous(VariantType::Snp), 1);
    assert_eq!(a.total_variants(), 1);
}

#[test]
fn reference_track_keeps_longest_insertion_across_files() {
    let mut session = IngestionSession::new(project());
    let first = SourceFile::new("a.vcf", ["A"]);
    let second = SourceFile::new("b.vcf", ["B"]);

    session
        .ingest_file(
            &first,
            vec![
                VariantRecord::new("chr1", 100, vec![Alternative::insertion(3)]).with_genotype("A", "1/1"),
                VariantRecord::new("chr1", 400, vec![Alternative::insertion(2)]).with_genotype("A", "0/1"),
            ],
        )
        .unwrap();
    session
        .ingest_file(
            &second,
            vec![
                VariantRecord::new("chr1", 100, vec![Alternative::insertion(7)]).with_genotype("B", "0/1"),
                VariantRecord::new("chr1", 250, vec![Alternative::deletion(5)]).with_genotype("B", "1/1"),
            ],
        )
        .unwrap();

    let (ingested, statistics) = session.finish().unwrap();
    assert_eq!(
        ingested.reference().offsets("chr1").as_slice(),
        &[Offset::new(100, 7), Offset::new(400, 2)]
    );
    assert_eq!(
        allele_offsets(&ingested, "B", 0),
        vec![Offset::new(250, -5)]
    );
    assert_eq!(
        allele_offsets(&ingested, "B", 1),
        vec![Offset::new(100, 7), Offset::new(250, -5)]
    );

    let b = statistics.sample("B").unwrap();
    assert_eq!(b.heterozygous(VariantType::Insertion), 1);
    assert_eq!(b.homozygous(VariantType::Deletion), 1);

    let file = statistics.file("a.vcf").unwrap();
    assert_eq!(file.records, 2);
    assert_eq!(file.offsets, 3);
    assert_eq!(file.alternatives(VariantType::Insertion), 2);
    assert_eq!(file.skipped_genomes.len(), 1);
    assert_eq!(file.skipped_genomes[0].as_ref(), "B");
}

#[test]
fn snps_and_multi_allelic_records() {
    let file = SourceFile::new("a.vcf", ["A"]);
    let mut session = IngestionSession::new(project());
    let record = VariantRecord::new(
        "chr1",
        10,
        vec![Alternative::snp(), Alternative::deletion(2)],
    )
    .with_genotype("A", "1/2");
    assert_eq!(session.process_record(&file, &record).unwrap(), 1);

    let (ingested, statistics) = session.finish().unwrap();
    assert!(allele_offsets(&ingested, "A", 0).is_empty());
    assert_eq!(allele_offsets(&ingested, "A", 1), vec![Offset::new(10, -2)]);

    let a = statistics.sample("A").unwrap();
    assert_eq!(a.heterozygous(VariantType::Snp), 1);
    assert_eq!(a.heterozygous(VariantType::Deletion), 1);
}

#[test]
fn haploid_genome_takes_a_single_call() {
    let project = Project::new(vec![GenomeSpec::haploid("H")]).unwrap();
    let file = SourceFile::new("h.vcf", ["H"]);
    let mut session = IngestionSession::new(project);

    let record = VariantRecord::new("chr1", 5, vec![Alternative::insertion(1)]).with_genotype("H", "1");
    session.process_record(&file, &record).unwrap();

    let diploid_call = VariantRecord::new("chr1", 9, vec![Alternative::insertion(1)]).with_genotype("H", "0/1");
    let err = session.process_record(&file, &diploid_call).unwrap_err();
    assert!(matches!(err, IngestError::PloidyMismatch { calls: 2, alleles: 1, .. }));
}

#[test_case(
    VariantRecord::new("chr1", 1, vec![Alternative::insertion(1)]).with_genotype("A", "0/x")
    ; "malformed genotype"
)]
#[test_case(
    VariantRecord::new("chr1", 1, vec![Alternative::insertion(1)]).with_genotype("A", "0/3")
    ; "unknown alternative"
)]
#[test_case(
    VariantRecord::new("chr1", 1, vec![Alternative::insertion(1)])
    ; "missing genotype"
)]
fn first_error_poisons_the_session(record: VariantRecord) {
    let file = SourceFile::new("a.vcf", ["A"]);
    let mut session = IngestionSession::new(project());
    assert!(session.process_record(&file, &record).is_err());

    let good = VariantRecord::new("chr1", 2, vec![Alternative::insertion(1)]).with_genotype("A", "1/1");
    assert!(matches!(session.process_record(&file, &good), Err(IngestError::Poisoned)));
    assert!(matches!(session.finish(), Err(IngestError::Poisoned)));
}

#[test]
fn unsorted_records_are_rejected() {
    let file = SourceFile::new("a.vcf", ["A"]);
    let mut session = IngestionSession::new(project());
    let records = vec![
        VariantRecord::new("chr1", 100, vec![Alternative::deletion(1)]).with_genotype("A", "1/1"),
        VariantRecord::new("chr1", 50, vec![Alternative::deletion(1)]).with_genotype("A", "1/1"),
    ];

    let err = session.ingest_file(&file, records).unwrap_err();
    match err {
        IngestError::OutOfOrder { genome, allele, .. } => {
            assert_eq!(genome.as_ref(), "A");
            assert_eq!(allele, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}
