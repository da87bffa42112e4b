//! Constants for annotation service configuration.
//!
//! This module defines environment variable names, default endpoints and the
//! per-version request limits of the variant-effect service.

// Environment variable names

/// Environment variable name for setting the vcfplotein API endpoint, which
/// serves the database presence lookup.
///
/// When set, this overrides the default API endpoint
/// (`https://vcfplotein.liigh.unam.mx:8181`).
///
/// # Example
///
/// ```bash
/// export VCFPLOTEIN_API=http://localhost:8181
/// ```
pub const VCFPLOTEIN_API_ENV: &str = "VCFPLOTEIN_API";

/// Environment variable name for overriding the variant-effect (Ensembl REST)
/// endpoint regardless of the assembly version.
pub const VCFPLOTEIN_ENSEMBL_API_ENV: &str = "VCFPLOTEIN_ENSEMBL_API";

// Endpoints

pub const DEFAULT_VCFPLOTEIN_API: &str = "https://vcfplotein.liigh.unam.mx:8181";

/// Ensembl REST endpoint for the GRCh37 assembly.
pub const ENSEMBL_GRCH37_URL: &str = "https://grch37.rest.ensembl.org";

/// Ensembl REST endpoint for the GRCh38 assembly.
pub const ENSEMBL_GRCH38_URL: &str = "https://rest.ensembl.org";

/// Batch variant-effect path, relative to the Ensembl endpoint.
pub const VEP_REGION_PATH: &str = "vep/homo_sapiens/region";

/// Presence lookup path, relative to the vcfplotein API.
pub const PRESENCE_PATH: &str = "variant-information";

// Request limits

/// Maximum number of variant lines per request against GRCh37.
pub const GRCH37_CHUNK_SIZE: usize = 300;

/// Maximum number of variant lines per request against GRCh38.
pub const GRCH38_CHUNK_SIZE: usize = 200;

pub const DEFAULT_SERVICE_VERSION: u32 = 38;

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// One attempt per request, i.e. no retry.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;

/// Upper bound on the wait between two attempts.
pub const MAX_BACKOFF_MS: u64 = 30_000;
