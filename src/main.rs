use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use metagenome::io::{read_variants, write_offsets, write_reference, VariantFile};
use metagenome::{GenomeSpec, Pipeline, PipelineConfig, PipelineResult, Project};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "metagenome", about = "Synchronize variant offsets of aligned genomes on a shared axis")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Variant files (VCF body with a #CHROM header), ingested in order.
    #[arg(required = true)]
    vcfs: Vec<PathBuf>,
    /// Genomes to treat as haploid (default: diploid).
    #[arg(long = "haploid", value_name = "GENOME")]
    haploid: Vec<String>,
    /// Run synchronization units on a single thread.
    #[arg(long)]
    sequential: bool,
    /// Fail when any synchronization unit fails.
    #[arg(long)]
    strict: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print synchronized offsets of every genome, allele and chromosome.
    Sync(InputArgs),
    /// Print the reference insertion track with meta-genome positions.
    Reference(InputArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Sync(args) => {
            let result = run_pipeline(&args)?;
            let mut stdout = io::stdout().lock();
            write_offsets(&mut stdout, &result.project).context("failed to write offsets")?;
            print_report(&result);
        }
        Commands::Reference(args) => {
            let result = run_pipeline(&args)?;
            let mut stdout = io::stdout().lock();
            write_reference(&mut stdout, &result.project)
                .context("failed to write reference track")?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_pipeline(args: &InputArgs) -> Result<PipelineResult> {
    let files = args
        .vcfs
        .iter()
        .map(|path| read_variant_file(path))
        .collect::<Result<Vec<_>>>()?;

    let project = build_project(&files, &args.haploid)?;
    let config = PipelineConfig::new()
        .with_parallel(!args.sequential)
        .with_strict(args.strict);

    Pipeline::new(project, config)
        .run(files.into_iter().map(|file| (file.source, file.records)))
        .context("synchronization failed")
}

fn read_variant_file(path: &Path) -> Result<VariantFile> {
    let reader = BufReader::new(
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
    );
    read_variants(&path.display().to_string(), reader)
        .with_context(|| format!("failed to read variants from {}", path.display()))
}

/// Every sample found in the inputs, file by file, sorted within a file.
fn build_project(files: &[VariantFile], haploid: &[String]) -> Result<Project> {
    let haploid: HashSet<&str> = haploid.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let mut genomes = Vec::new();

    for file in files {
        let mut names: Vec<_> = file.source.genomes.iter().cloned().collect();
        names.sort();
        for name in names {
            if !seen.insert(name.clone()) {
                continue;
            }
            genomes.push(if haploid.contains(name.as_ref()) {
                GenomeSpec::haploid(name)
            } else {
                GenomeSpec::diploid(name)
            });
        }
    }

    Project::new(genomes).context("input files contain no genome")
}

fn print_report(result: &PipelineResult) {
    let report = result.project.report();
    for (task, warning) in &report.warnings {
        eprintln!("warning: {task}: {warning}");
    }
    for failure in &report.failures {
        eprintln!("error: {}: {}", failure.task, failure.error);
    }
    for (genome, stats) in result.statistics.samples() {
        eprintln!("{genome}\tvariants={}", stats.total_variants());
    }
}
