//! # vcfplotein-annotate
//!
//! Batched protein-level annotation of VCF variants.
//!
//! Variants are expanded into one request line per alternate allele, sent to
//! the variant-effect service in version-sized chunks, rebuilt into one
//! record per affected transcript, classified as insertion or deletion, and
//! finally merged with presence flags from the local variant databases.
//!
//! The entry point is [aggregate::Aggregator]; [annotate] wires it to the
//! HTTP clients for a given configuration.

pub mod aggregate;
pub mod chunk;
pub mod client;
pub mod config;
pub mod consts;
pub mod errors;
pub mod format;
pub mod presence;
pub mod retry;
pub mod utils;

pub use aggregate::Aggregator;
pub use config::{AnnotationConfig, RetryPolicy, ServiceVersion};
pub use errors::{AnnotateError, ConfigError, Result};

use vcfplotein_core::models::{AnnotationBundle, RawVariant};

///
/// Annotate variants on a transcript using the configured HTTP services.
///
/// # Arguments
/// - config: service version, endpoints and retry policy
/// - variants: input sites, e.g. from [vcfplotein_core::read_vcf]
/// - transcript_id: transcript to restrict annotation to
pub fn annotate(
    config: &AnnotationConfig,
    variants: &[RawVariant],
    transcript_id: &str,
) -> Result<AnnotationBundle> {
    Aggregator::from_config(config)?.run(config, variants, transcript_id)
}
