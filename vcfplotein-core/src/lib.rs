//! # vcfplotein-core
//!
//! Models shared by the vcfplotein crates and the VCF reader that produces
//! the pipeline input.
//!
//! - [models::RawVariant]: one VCF site with its alternates and sample calls
//! - [models::Variant]: an annotated, classified variant with presence flags
//! - [models::AnnotationBundle]: the output of one annotation run

pub mod errors;
pub mod models;
pub mod utils;
pub mod vcf;

pub use errors::{Result, VcfError};
pub use vcf::{read_variants, read_vcf};
