//! Local database presence lookup.
//!
//! The presence service answers, for each submitted variant identity, whether
//! it is known to the population, clinical, cancer and variant catalogs. Only
//! coordinates and alleles are ever sent; sample data stays local.

use log::debug;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Deserializer, Serialize};
use vcfplotein_core::models::{PresenceFlags, Variant, VariantIdentity};

use crate::config::AnnotationConfig;
use crate::consts::PRESENCE_PATH;
use crate::errors::{AnnotateError, Result};
use crate::utils::join_url;

///
/// Identity-only projection of a variant, as sent to the presence service.
///
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PresenceQuery {
    pub chr: String,
    pub pos: String,
    #[serde(rename = "ref")]
    pub ref_allele: String,
    #[serde(rename = "alt")]
    pub alt_allele: String,
}

impl From<&VariantIdentity> for PresenceQuery {
    fn from(identity: &VariantIdentity) -> Self {
        PresenceQuery {
            chr: identity.chr.clone(),
            pos: identity.pos.to_string(),
            ref_allele: identity.ref_allele.clone(),
            alt_allele: identity.alt_allele.clone(),
        }
    }
}

///
/// Presence flags for one identity. The service may answer positions as
/// numbers or strings; both are accepted.
///
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PresenceRecord {
    pub chr: String,
    #[serde(deserialize_with = "deserialize_position")]
    pub pos: u64,
    #[serde(rename = "ref")]
    pub ref_allele: String,
    #[serde(rename = "alt")]
    pub alt_allele: String,
    #[serde(flatten)]
    pub flags: PresenceFlags,
}

impl PresenceRecord {
    pub fn new(identity: VariantIdentity, flags: PresenceFlags) -> Self {
        PresenceRecord {
            chr: identity.chr,
            pos: identity.pos,
            ref_allele: identity.ref_allele,
            alt_allele: identity.alt_allele,
            flags,
        }
    }

    pub fn identity(&self) -> VariantIdentity {
        VariantIdentity::new(&self.chr, self.pos, &self.ref_allele, &self.alt_allele)
    }
}

fn deserialize_position<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Position {
        Number(u64),
        Text(String),
    }

    match Position::deserialize(deserializer)? {
        Position::Number(pos) => Ok(pos),
        Position::Text(text) => text.trim().parse::<u64>().map_err(serde::de::Error::custom),
    }
}

///
/// Project variants down to their distinct identities, in first-seen order.
///
pub fn non_confidential(variants: &[Variant]) -> Vec<PresenceQuery> {
    let mut seen = fxhash::FxHashSet::default();
    variants
        .iter()
        .filter(|v| seen.insert(&v.identity))
        .map(|v| PresenceQuery::from(&v.identity))
        .collect()
}

pub trait PresenceClient {
    ///
    /// Look up presence flags for all queries in a single request. Records
    /// may come back in any order.
    ///
    fn lookup(&self, queries: &[PresenceQuery]) -> Result<Vec<PresenceRecord>>;
}

///
/// Blocking client for the vcfplotein API `variant-information` endpoint.
///
pub struct HttpPresenceClient {
    client: Client,
    url: String,
}

impl HttpPresenceClient {
    pub fn new(config: &AnnotationConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(HttpPresenceClient {
            client,
            url: join_url(config.api_url(), PRESENCE_PATH),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl PresenceClient for HttpPresenceClient {
    fn lookup(&self, queries: &[PresenceQuery]) -> Result<Vec<PresenceRecord>> {
        debug!("POST {} ({} identities)", self.url, queries.len());

        let response = self
            .client
            .post(&self.url)
            .header(ACCEPT, "application/json")
            .json(queries)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AnnotateError::from_status(status, &body));
        }

        Ok(response.json::<Vec<PresenceRecord>>()?)
    }
}
