use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::info;
use tracing_subscriber::{EnvFilter, fmt};

use vcfplotein_annotate::annotate;
use vcfplotein_annotate::config::{AnnotationConfig, AnnotationConfigFile, RetryPolicy};
use vcfplotein_annotate::consts::DEFAULT_INITIAL_BACKOFF_MS;
use vcfplotein_core::models::{AnnotationBundle, VariantType};
use vcfplotein_core::read_vcf;

use super::cli::DEFAULT_LOG_LEVEL;

pub fn run_annotate(matches: &ArgMatches) -> Result<()> {
    let level = matches
        .get_one::<String>("log-level")
        .map(String::as_str)
        .unwrap_or(DEFAULT_LOG_LEVEL);
    init_logging(level);

    let vcf = matches
        .get_one::<String>("vcf")
        .context("A path to a VCF file is required.")?;
    let transcript = matches
        .get_one::<String>("transcript")
        .context("A transcript identifier is required.")?;

    let config = build_config(matches)?;
    info!(
        "Annotating {} on {} against {}",
        vcf,
        transcript,
        config.version()
    );

    let variants = read_vcf(Path::new(vcf)).with_context(|| format!("Failed to read {vcf}"))?;
    info!("Read {} sites from {}", variants.len(), vcf);

    let bundle = annotate(&config, &variants, transcript)
        .with_context(|| format!("Annotation of {vcf} failed"))?;
    info!(
        "{} annotated variants: {} insertions, {} deletions",
        bundle.len(),
        bundle.of_type(VariantType::Insertion).count(),
        bundle.of_type(VariantType::Deletion).count()
    );

    match matches.get_one::<String>("output") {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create {path}"))?;
            write_bundle(&bundle, BufWriter::new(file))?;
            info!("Wrote {} variants to {}", bundle.len(), path);
        }
        None => write_bundle(&bundle, stdout().lock())?,
    }

    Ok(())
}

///
/// Layer the command-line overrides on top of the config file, if any.
///
fn build_config(matches: &ArgMatches) -> Result<AnnotationConfig> {
    let file = match matches.get_one::<String>("config") {
        Some(path) => AnnotationConfigFile::try_from(Path::new(path))
            .with_context(|| format!("Failed to load config {path}"))?,
        None => AnnotationConfigFile::default(),
    };

    let mut builder = file.into_builder();
    if let Some(version) = matches.get_one::<u32>("version") {
        builder = builder.with_version(*version);
    }
    if let Some(url) = matches.get_one::<String>("api-url") {
        builder = builder.with_api_url(url.clone());
    }
    if let Some(url) = matches.get_one::<String>("ensembl-url") {
        builder = builder.with_ensembl_url(url.clone());
    }
    if let Some(attempts) = matches.get_one::<u32>("max-attempts") {
        builder = builder.with_retry(RetryPolicy::new(
            *attempts,
            Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
        ));
    }

    Ok(builder.finish()?)
}

fn write_bundle<W: Write>(bundle: &AnnotationBundle, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, bundle)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}
