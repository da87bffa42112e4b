//! Annotation run configuration.
//!
//! An [AnnotationConfig] is built once and then only read: every pipeline
//! run takes it by reference, so concurrent runs never observe each other's
//! settings.

use std::fmt::{self, Display};
use std::fs::read_to_string;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::consts::{
    DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_SERVICE_VERSION,
    DEFAULT_TIMEOUT_SECS, ENSEMBL_GRCH37_URL, ENSEMBL_GRCH38_URL, GRCH37_CHUNK_SIZE,
    GRCH38_CHUNK_SIZE,
};
use super::errors::{ConfigError, ConfigResult};
use super::utils::{get_default_api_url, get_default_ensembl_url};

///
/// Assembly version of the variant-effect service. Selects both the
/// endpoint family and the maximum request size.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ServiceVersion {
    Grch37,
    Grch38,
}

impl ServiceVersion {
    pub fn chunk_size(&self) -> usize {
        match self {
            ServiceVersion::Grch37 => GRCH37_CHUNK_SIZE,
            ServiceVersion::Grch38 => GRCH38_CHUNK_SIZE,
        }
    }

    pub fn ensembl_url(&self) -> &'static str {
        match self {
            ServiceVersion::Grch37 => ENSEMBL_GRCH37_URL,
            ServiceVersion::Grch38 => ENSEMBL_GRCH38_URL,
        }
    }
}

impl TryFrom<u32> for ServiceVersion {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            37 => Ok(ServiceVersion::Grch37),
            38 => Ok(ServiceVersion::Grch38),
            other => Err(ConfigError::InvalidServiceVersion(other)),
        }
    }
}

impl From<ServiceVersion> for u32 {
    fn from(value: ServiceVersion) -> Self {
        match value {
            ServiceVersion::Grch37 => 37,
            ServiceVersion::Grch38 => 38,
        }
    }
}

impl Display for ServiceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GRCh{}", u32::from(*self))
    }
}

///
/// How often a remote request is attempted before its error is surfaced.
/// The wait between attempts starts at `initial_backoff` and doubles.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        RetryPolicy {
            max_attempts,
            initial_backoff,
        }
    }

    /// A single attempt per request.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_ATTEMPTS,
            Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
        )
    }
}

/// Builder for constructing an [`AnnotationConfig`].
///
/// # Examples
///
/// ```rust
/// use vcfplotein_annotate::config::AnnotationConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AnnotationConfig::builder()
///     .with_version(37)
///     .with_api_url("http://localhost:8181".to_string())
///     .finish()?;
/// assert_eq!(config.chunk_size(), 300);
/// # Ok(())
/// # }
/// ```
#[derive(Default, Debug, Clone)]
pub struct AnnotationConfigBuilder {
    version: Option<u32>,
    ensembl_url: Option<String>,
    api_url: Option<String>,
    chunk_size: Option<usize>,
    timeout: Option<Duration>,
    retry: Option<RetryPolicy>,
}

impl AnnotationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the assembly version (37 or 38). Validated by [Self::finish].
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_ensembl_url(mut self, url: String) -> Self {
        self.ensembl_url = Some(url);
        self
    }

    pub fn with_api_url(mut self, url: String) -> Self {
        self.api_url = Some(url);
        self
    }

    /// Overrides the version-derived request size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Consumes the builder and validates the configuration.
    pub fn finish(self) -> ConfigResult<AnnotationConfig> {
        let version =
            ServiceVersion::try_from(self.version.unwrap_or(DEFAULT_SERVICE_VERSION))?;

        let chunk_size = self.chunk_size.unwrap_or_else(|| version.chunk_size());
        if chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize);
        }

        let retry = self.retry.unwrap_or_default();
        if retry.max_attempts == 0 {
            return Err(ConfigError::InvalidRetryPolicy);
        }

        Ok(AnnotationConfig {
            version,
            ensembl_url: self
                .ensembl_url
                .unwrap_or_else(|| get_default_ensembl_url(version)),
            api_url: self.api_url.unwrap_or_else(get_default_api_url),
            chunk_size,
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            retry,
        })
    }
}

///
/// Validated, immutable settings of an annotation run.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationConfig {
    version: ServiceVersion,
    ensembl_url: String,
    api_url: String,
    chunk_size: usize,
    timeout: Duration,
    retry: RetryPolicy,
}

impl AnnotationConfig {
    pub fn builder() -> AnnotationConfigBuilder {
        AnnotationConfigBuilder::default()
    }

    /// Default configuration for an assembly version.
    pub fn new(version: u32) -> ConfigResult<Self> {
        Self::builder().with_version(version).finish()
    }

    pub fn version(&self) -> ServiceVersion {
        self.version
    }

    pub fn ensembl_url(&self) -> &str {
        &self.ensembl_url
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }
}

impl TryFrom<&Path> for AnnotationConfig {
    type Error = ConfigError;

    ///
    /// Load a configuration from a toml file.
    ///
    /// # Arguments
    /// - path: Path to the config file (a .toml) file.
    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        AnnotationConfigFile::try_from(path)?.into_builder().finish()
    }
}

///
/// On-disk form of an [AnnotationConfig]. Every field is optional and falls
/// back to the builder defaults.
///
#[derive(Deserialize, Serialize, Debug, PartialEq, Default)]
pub struct AnnotationConfigFile {
    pub version: Option<u32>,
    pub ensembl_url: Option<String>,
    pub api_url: Option<String>,
    pub chunk_size: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub initial_backoff_ms: Option<u64>,
}

impl AnnotationConfigFile {
    pub fn into_builder(self) -> AnnotationConfigBuilder {
        let retry = match (self.max_attempts, self.initial_backoff_ms) {
            (None, None) => None,
            (attempts, backoff) => Some(RetryPolicy::new(
                attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
                Duration::from_millis(backoff.unwrap_or(DEFAULT_INITIAL_BACKOFF_MS)),
            )),
        };

        AnnotationConfigBuilder {
            version: self.version,
            ensembl_url: self.ensembl_url,
            api_url: self.api_url,
            chunk_size: self.chunk_size,
            timeout: self.timeout_secs.map(Duration::from_secs),
            retry,
        }
    }
}

impl TryFrom<&Path> for AnnotationConfigFile {
    type Error = ConfigError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let toml_str = read_to_string(path)?;
        let config = toml::from_str(&toml_str)?;
        Ok(config)
    }
}
