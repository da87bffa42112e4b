//! Variant-effect annotation client.
//!
//! [AnnotationClient] is the seam between the pipeline and the remote
//! service; [VepClient] implements it against the Ensembl REST region
//! endpoint.

use log::debug;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};

use crate::chunk::AnnotationChunk;
use crate::config::AnnotationConfig;
use crate::consts::VEP_REGION_PATH;
use crate::errors::{AnnotateError, Result};
use crate::utils::join_url;

///
/// Predicted effect of a variant on one transcript.
///
/// The amino-acid fields are also accepted under the names the Ensembl
/// service uses (`protein_start`, `amino_acids`).
///
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TranscriptConsequence {
    #[serde(default)]
    pub transcript_id: Option<String>,
    #[serde(default, alias = "protein_start")]
    pub amino_acid_start: Option<u32>,
    #[serde(default, alias = "amino_acids")]
    pub amino_acid_change: Option<String>,
    #[serde(default)]
    pub consequence_terms: Vec<String>,
}

impl TranscriptConsequence {
    ///
    /// Amino-acid position and change, if this consequence reaches the
    /// protein. An empty change string counts as absent.
    ///
    pub fn protein_change(&self) -> Option<(u32, &str)> {
        let start = self.amino_acid_start?;
        let change = self.amino_acid_change.as_deref().filter(|c| !c.is_empty())?;
        Some((start, change))
    }
}

///
/// One response entry: the echoed request line and its transcript
/// consequences. Entries without consequences are valid.
///
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawAnnotationResult {
    pub input: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub transcript_consequences: Vec<TranscriptConsequence>,
}

#[derive(Debug, Serialize)]
pub struct AnnotationRequest<'a> {
    pub variants: Vec<&'a str>,
    pub transcript_id: &'a str,
}

impl<'a> AnnotationRequest<'a> {
    pub fn new(chunk: &'a AnnotationChunk, transcript_id: &'a str) -> Self {
        AnnotationRequest {
            variants: chunk.texts(),
            transcript_id,
        }
    }
}

pub trait AnnotationClient {
    ///
    /// Annotate one chunk. Returns one result per distinct submitted line, in
    /// the order the service answers (which mirrors the submitted order).
    ///
    fn submit(
        &self,
        chunk: &AnnotationChunk,
        transcript_id: &str,
    ) -> Result<Vec<RawAnnotationResult>>;
}

///
/// Blocking client for the Ensembl REST `vep/homo_sapiens/region` endpoint.
///
pub struct VepClient {
    client: Client,
    url: String,
}

impl VepClient {
    pub fn new(config: &AnnotationConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(VepClient {
            client,
            url: join_url(config.ensembl_url(), VEP_REGION_PATH),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl AnnotationClient for VepClient {
    fn submit(
        &self,
        chunk: &AnnotationChunk,
        transcript_id: &str,
    ) -> Result<Vec<RawAnnotationResult>> {
        debug!("POST {} ({} lines)", self.url, chunk.len());

        let response = self
            .client
            .post(&self.url)
            .header(ACCEPT, "application/json")
            .json(&AnnotationRequest::new(chunk, transcript_id))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AnnotateError::from_status(status, &body));
        }

        Ok(response.json::<Vec<RawAnnotationResult>>()?)
    }
}
