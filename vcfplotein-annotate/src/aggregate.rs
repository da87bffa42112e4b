//! Annotation aggregation.
//!
//! Drives one annotation run end to end:
//!
//! 1. expand input variants into request lines ([format_lines])
//! 2. submit them chunk by chunk, one request in flight at a time
//! 3. rebuild one [Variant] per transcript consequence with a protein change
//! 4. look up database presence for all accepted variants in one request
//! 5. merge presence flags back by exact identity
//!
//! Any failed request aborts the run; nothing partial is returned.

use std::collections::BTreeSet;

use fxhash::FxHashMap;
use log::{debug, info, warn};
use vcfplotein_core::models::{
    AnnotationBundle, PresenceFlags, RawVariant, Variant, VariantIdentity, VariantType,
};

use crate::chunk::Chunker;
use crate::client::{AnnotationClient, RawAnnotationResult, VepClient};
use crate::config::AnnotationConfig;
use crate::errors::{AnnotateError, Result};
use crate::format::{FormattedLine, format_lines, parse_echo};
use crate::presence::{HttpPresenceClient, PresenceClient, PresenceRecord, non_confidential};
use crate::retry::with_retry;

/// Where a request line came from: input variant and alternate index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineOrigin {
    pub source: usize,
    pub alt_index: usize,
}

///
/// Lookup from annotation results back to submitted lines, by correlation id
/// and by identity.
///
#[derive(Debug, Default)]
pub struct LineIndex {
    by_id: FxHashMap<String, (LineOrigin, VariantIdentity)>,
    by_identity: FxHashMap<VariantIdentity, LineOrigin>,
}

impl LineIndex {
    pub fn new(lines: &[FormattedLine]) -> Self {
        let mut index = LineIndex::default();
        for line in lines {
            let origin = LineOrigin {
                source: line.source,
                alt_index: line.alt_index,
            };
            index
                .by_id
                .insert(line.id.clone(), (origin, line.identity.clone()));
            index
                .by_identity
                .entry(line.identity.clone())
                .or_insert(origin);
        }
        index
    }

    ///
    /// Find the line an annotation result belongs to.
    ///
    /// A known correlation id wins, but only if the echoed identity agrees
    /// with the line it names. Otherwise the first line with the same
    /// identity is used.
    ///
    pub fn resolve(&self, id: Option<&str>, identity: &VariantIdentity) -> Result<Option<LineOrigin>> {
        if let Some(id) = id {
            if let Some((origin, expected)) = self.by_id.get(id) {
                if expected != identity {
                    return Err(AnnotateError::MalformedEcho(format!(
                        "id {id} was submitted as {expected} but echoed as {identity}"
                    )));
                }
                return Ok(Some(*origin));
            }
        }
        Ok(self.by_identity.get(identity).copied())
    }
}

type RecordKey = (VariantIdentity, String, u32, String);

///
/// Variants rebuilt from annotation results, before presence merging.
///
#[derive(Debug, Default)]
pub struct Reconstruction {
    pub variants: Vec<Variant>,
    pub consequences: BTreeSet<String>,
    /// Transcript consequences dropped for lacking a protein change.
    pub discarded: usize,
    keys: FxHashMap<RecordKey, usize>,
}

impl Reconstruction {
    fn accept(&mut self, variant: Variant) {
        self.consequences
            .extend(variant.consequences.iter().cloned());

        let (identity, transcript, aa_pos, aa_change) = variant.record_key();
        let key = (
            identity.clone(),
            transcript.to_string(),
            aa_pos,
            aa_change.to_string(),
        );

        match self.keys.get(&key) {
            Some(&i) => {
                let kept = &mut self.variants[i];
                kept.consequences.extend(variant.consequences);
                for call in variant.samples {
                    if !kept.samples.contains(&call) {
                        kept.samples.push(call);
                    }
                }
            }
            None => {
                self.keys.insert(key, self.variants.len());
                self.variants.push(variant);
            }
        }
    }
}

///
/// Rebuild variants from annotation results.
///
/// Every transcript consequence yields one candidate; only candidates with
/// both an amino-acid position and change are kept. Identical records are
/// collapsed; their consequence terms and carrier samples are combined.
///
/// # Arguments
/// - results: concatenated results of all chunks
/// - index: lookup built from the submitted lines
/// - raw: the pipeline input, for sample data
pub fn reconstruct(
    results: &[RawAnnotationResult],
    index: &LineIndex,
    raw: &[RawVariant],
) -> Result<Reconstruction> {
    let mut reconstruction = Reconstruction::default();

    for result in results {
        if result.transcript_consequences.is_empty() {
            continue;
        }

        let identity = parse_echo(&result.input)?;
        let origin = index.resolve(result.id.as_deref(), &identity)?;
        if origin.is_none() {
            warn!("Annotation for {identity} does not match any submitted line");
        }
        let samples = origin
            .and_then(|o| raw.get(o.source).map(|v| v.carriers(o.alt_index)))
            .unwrap_or_default();
        let variant_type = VariantType::classify(&identity.ref_allele, &identity.alt_allele);

        for consequence in &result.transcript_consequences {
            let Some((aa_pos, aa_change)) = consequence.protein_change() else {
                reconstruction.discarded += 1;
                continue;
            };

            reconstruction.accept(Variant {
                identity: identity.clone(),
                transcript_id: consequence.transcript_id.clone().unwrap_or_default(),
                aa_pos,
                aa_change: aa_change.to_string(),
                consequences: consequence.consequence_terms.iter().cloned().collect(),
                samples: samples.clone(),
                variant_type,
                presence: PresenceFlags::default(),
            });
        }
    }

    Ok(reconstruction)
}

///
/// Copy presence flags onto variants by exact identity. Variants without a
/// matching record keep their current flags. Several records for the same
/// identity are combined.
///
/// # Returns
/// - the number of variants that matched a record
pub fn merge_presence(variants: &mut [Variant], records: &[PresenceRecord]) -> usize {
    let mut flags_by_identity: FxHashMap<VariantIdentity, PresenceFlags> = FxHashMap::default();
    for record in records {
        let flags = flags_by_identity.entry(record.identity()).or_default();
        *flags = flags.union(record.flags);
    }

    let mut matched = 0;
    for variant in variants.iter_mut() {
        if let Some(flags) = flags_by_identity.get(&variant.identity) {
            variant.presence = *flags;
            matched += 1;
        }
    }
    matched
}

///
/// Runs the annotation pipeline against an annotation and a presence client.
///
/// The aggregator holds no per-run state: configuration and input are passed
/// to [Aggregator::run], so one instance may serve concurrent runs.
///
/// # Examples
///
/// ```rust,no_run
/// use vcfplotein_annotate::aggregate::Aggregator;
/// use vcfplotein_annotate::config::AnnotationConfig;
/// use vcfplotein_core::models::RawVariant;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AnnotationConfig::new(38)?;
/// let aggregator = Aggregator::from_config(&config)?;
///
/// let variants = vec![RawVariant::new("7", 124532327, "G", "C")];
/// let bundle = aggregator.run(&config, &variants, "ENST00000265724")?;
/// println!("{} annotated variants", bundle.len());
/// # Ok(())
/// # }
/// ```
pub struct Aggregator<A, P> {
    annotation: A,
    presence: P,
}

impl Aggregator<VepClient, HttpPresenceClient> {
    /// Aggregator backed by the HTTP clients for the configured endpoints.
    pub fn from_config(config: &AnnotationConfig) -> Result<Self> {
        Ok(Aggregator::new(
            VepClient::new(config)?,
            HttpPresenceClient::new(config)?,
        ))
    }
}

impl<A: AnnotationClient, P: PresenceClient> Aggregator<A, P> {
    pub fn new(annotation: A, presence: P) -> Self {
        Aggregator {
            annotation,
            presence,
        }
    }

    pub fn annotation(&self) -> &A {
        &self.annotation
    }

    pub fn presence(&self) -> &P {
        &self.presence
    }

    ///
    /// Annotate `variants` on the given transcript.
    ///
    /// # Arguments
    /// - config: endpoints, chunk size and retry policy for this run
    /// - variants: the input sites
    /// - transcript_id: transcript to restrict annotation to
    ///
    /// # Returns
    /// - the annotated variants and their consequence vocabulary
    pub fn run(
        &self,
        config: &AnnotationConfig,
        variants: &[RawVariant],
        transcript_id: &str,
    ) -> Result<AnnotationBundle> {
        let lines = format_lines(variants);
        info!(
            "Annotating {} variants ({} alleles) on {} against {}",
            variants.len(),
            lines.len(),
            transcript_id,
            config.version()
        );

        let index = LineIndex::new(&lines);
        let results = self.fetch_chunks(config, lines, transcript_id)?;

        let mut reconstruction = reconstruct(&results, &index, variants)?;
        debug!(
            "Kept {} variants, discarded {} consequences without protein change",
            reconstruction.variants.len(),
            reconstruction.discarded
        );

        self.fetch_presence(config, &mut reconstruction.variants)?;

        let bundle = AnnotationBundle::new(reconstruction.variants, reconstruction.consequences);
        info!(
            "Annotation finished: {} variants, {} consequence terms",
            bundle.len(),
            bundle.consequences.len()
        );
        Ok(bundle)
    }

    ///
    /// Submit all lines chunk by chunk and concatenate the results in chunk
    /// order. Each chunk completes before the next is sent.
    ///
    pub fn fetch_chunks(
        &self,
        config: &AnnotationConfig,
        lines: Vec<FormattedLine>,
        transcript_id: &str,
    ) -> Result<Vec<RawAnnotationResult>> {
        let chunker = Chunker::new(lines, config.chunk_size())?;
        let total = chunker.remaining();
        let mut results = Vec::new();

        for chunk in chunker {
            info!(
                "Submitting chunk {}/{} ({} lines)",
                chunk.index + 1,
                total,
                chunk.len()
            );

            let label = format!("annotation chunk {}", chunk.index);
            let data = with_retry(config.retry(), &label, || {
                self.annotation.submit(&chunk, transcript_id)
            })
            .map_err(|e| AnnotateError::AnnotationRequest {
                chunk: chunk.index,
                source: Box::new(e),
            })?;

            results.extend(data);
        }

        Ok(results)
    }

    fn fetch_presence(&self, config: &AnnotationConfig, variants: &mut [Variant]) -> Result<()> {
        if variants.is_empty() {
            debug!("No annotated variants, skipping presence lookup");
            return Ok(());
        }

        let queries = non_confidential(variants);
        info!("Looking up database presence for {} variants", queries.len());

        let records = with_retry(config.retry(), "presence lookup", || {
            self.presence.lookup(&queries)
        })
        .map_err(|e| AnnotateError::PresenceRequest {
            source: Box::new(e),
        })?;

        let matched = merge_presence(variants, &records);
        let known = variants.iter().filter(|v| v.presence.any()).count();
        debug!(
            "{matched} of {} variants matched a presence record, {known} known to at least one database",
            variants.len()
        );
        Ok(())
    }
}
