use std::env;

use super::consts::{DEFAULT_VCFPLOTEIN_API, VCFPLOTEIN_API_ENV, VCFPLOTEIN_ENSEMBL_API_ENV};
use super::config::ServiceVersion;

/// Get default vcfplotein api from environment variable
///
/// # Returns
/// - vcfplotein api for url
pub fn get_default_api_url() -> String {
    env::var(VCFPLOTEIN_API_ENV).unwrap_or_else(|_| DEFAULT_VCFPLOTEIN_API.to_string())
}

/// Get default variant-effect endpoint from environment variable, if not
/// available then use the Ensembl endpoint of the given assembly version
pub fn get_default_ensembl_url(version: ServiceVersion) -> String {
    env::var(VCFPLOTEIN_ENSEMBL_API_ENV).unwrap_or_else(|_| version.ensembl_url().to_string())
}

/// Join a base url and a relative path with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
