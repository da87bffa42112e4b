//! End-to-end pipeline runs against in-memory annotation and presence services.

use std::sync::Mutex;
use std::time::Duration;

use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use vcfplotein_annotate::aggregate::Aggregator;
use vcfplotein_annotate::chunk::AnnotationChunk;
use vcfplotein_annotate::client::{AnnotationClient, RawAnnotationResult, TranscriptConsequence};
use vcfplotein_annotate::config::{AnnotationConfig, RetryPolicy};
use vcfplotein_annotate::errors::{AnnotateError, Result};
use vcfplotein_annotate::presence::{PresenceClient, PresenceQuery, PresenceRecord};
use vcfplotein_core::models::{
    PresenceFlags, RawVariant, SampleCall, VariantIdentity, VariantType,
};

const TRANSCRIPT: &str = "ENST00000265724";

type Annotate = fn(&VariantIdentity) -> Vec<TranscriptConsequence>;

/// Echoes every submitted line with the consequences produced by `annotate`.
struct MockVep {
    annotate: Annotate,
    chunk_sizes: Mutex<Vec<usize>>,
    fail_chunk: Option<usize>,
    failures_left: Mutex<u32>,
}

impl MockVep {
    fn new(annotate: Annotate) -> Self {
        MockVep {
            annotate,
            chunk_sizes: Mutex::new(Vec::new()),
            fail_chunk: None,
            failures_left: Mutex::new(0),
        }
    }

    fn failing(mut self, chunk: usize, times: u32) -> Self {
        self.fail_chunk = Some(chunk);
        self.failures_left = Mutex::new(times);
        self
    }

    fn chunk_sizes(&self) -> Vec<usize> {
        self.chunk_sizes.lock().unwrap().clone()
    }
}

impl AnnotationClient for MockVep {
    fn submit(&self, chunk: &AnnotationChunk, transcript_id: &str) -> Result<Vec<RawAnnotationResult>> {
        assert_eq!(transcript_id, TRANSCRIPT);
        self.chunk_sizes.lock().unwrap().push(chunk.len());

        if self.fail_chunk == Some(chunk.index) {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(AnnotateError::Service {
                    status: 503,
                    message: "Service Unavailable".to_string(),
                });
            }
        }

        Ok(chunk
            .lines
            .iter()
            .map(|line| RawAnnotationResult {
                input: line.text.clone(),
                id: Some(line.id.clone()),
                transcript_consequences: (self.annotate)(&line.identity),
            })
            .collect())
    }
}

/// Answers from a fixed record list, in reverse order of the request.
struct MockPresence {
    records: Vec<PresenceRecord>,
    queries: Mutex<Vec<Vec<PresenceQuery>>>,
    failures_left: Mutex<u32>,
}

impl MockPresence {
    fn new(records: Vec<PresenceRecord>) -> Self {
        MockPresence {
            records,
            queries: Mutex::new(Vec::new()),
            failures_left: Mutex::new(0),
        }
    }

    fn failing(times: u32) -> Self {
        MockPresence {
            failures_left: Mutex::new(times),
            ..MockPresence::new(vec![])
        }
    }

    fn queries(&self) -> Vec<Vec<PresenceQuery>> {
        self.queries.lock().unwrap().clone()
    }
}

impl PresenceClient for MockPresence {
    fn lookup(&self, queries: &[PresenceQuery]) -> Result<Vec<PresenceRecord>> {
        self.queries.lock().unwrap().push(queries.to_vec());
        let mut left = self.failures_left.lock().unwrap();
        if *left > 0 {
            *left -= 1;
            return Err(AnnotateError::Service {
                status: 502,
                message: "Bad Gateway".to_string(),
            });
        }
        Ok(self.records.iter().rev().cloned().collect())
    }
}

fn missense(_: &VariantIdentity) -> Vec<TranscriptConsequence> {
    vec![TranscriptConsequence {
        transcript_id: Some(TRANSCRIPT.to_string()),
        amino_acid_start: Some(30),
        amino_acid_change: Some("R/D".to_string()),
        consequence_terms: vec!["missense_variant".to_string()],
    }]
}

/// Protein change only for positions divisible by 10.
fn sparse(identity: &VariantIdentity) -> Vec<TranscriptConsequence> {
    if identity.pos % 10 == 0 {
        missense(identity)
    } else {
        vec![TranscriptConsequence {
            transcript_id: Some(TRANSCRIPT.to_string()),
            consequence_terms: vec!["intron_variant".to_string()],
            ..Default::default()
        }]
    }
}

fn config(version: u32) -> AnnotationConfig {
    AnnotationConfig::builder()
        .with_version(version)
        .with_ensembl_url("http://localhost:3000".to_string())
        .with_api_url("http://localhost:8181".to_string())
        .finish()
        .unwrap()
}

fn many_variants(n: u64) -> Vec<RawVariant> {
    (0..n)
        .map(|i| RawVariant::new("17", 7670000 + i, "C", "T"))
        .collect()
}

#[fixture]
fn all_false() -> MockPresence {
    MockPresence::new(vec![PresenceRecord::new(
        VariantIdentity::new("7", 124532327, "G", "C"),
        PresenceFlags::default(),
    )])
}

#[rstest]
fn test_single_missense_end_to_end(all_false: MockPresence) {
    let variants = vec![RawVariant::new("7", 124532327, "G", "C")];
    let aggregator = Aggregator::new(MockVep::new(missense), all_false);

    let bundle = aggregator.run(&config(38), &variants, TRANSCRIPT).unwrap();

    assert_eq!(bundle.variants.len(), 1);
    let variant = &bundle.variants[0];
    assert_eq!(variant.identity, VariantIdentity::new("7", 124532327, "G", "C"));
    assert_eq!(variant.variant_type, VariantType::Unclassified);
    assert_eq!(variant.aa_pos, 30);
    assert_eq!(variant.aa_change, "R/D");
    assert_eq!(
        variant.consequences.iter().collect::<Vec<_>>(),
        vec!["missense_variant"]
    );
    assert_eq!(variant.presence, PresenceFlags::default());
    assert_eq!(bundle.consequences, vec!["missense_variant"]);
    assert!(bundle.deletions.is_empty());
    assert!(bundle.insertions.is_empty());
}

#[rstest]
#[case(38, vec![200, 200, 50])]
#[case(37, vec![300, 150])]
fn test_chunk_size_follows_service_version(#[case] version: u32, #[case] expected: Vec<usize>) {
    let aggregator = Aggregator::new(MockVep::new(missense), MockPresence::new(vec![]));

    let bundle = aggregator
        .run(&config(version), &many_variants(450), TRANSCRIPT)
        .unwrap();

    assert_eq!(aggregator.annotation().chunk_sizes(), expected);
    assert_eq!(bundle.len(), 450);
}

#[rstest]
fn test_multi_allelic_sites_yield_one_line_per_alternate() {
    let variants = vec![
        RawVariant::new("7", 100, "G", "GCA,C,A").with_samples(vec![
            SampleCall::new("tumor", "1/2"),
            SampleCall::new("normal", "0/3"),
        ]),
    ];
    let aggregator = Aggregator::new(MockVep::new(missense), MockPresence::new(vec![]));

    let bundle = aggregator.run(&config(38), &variants, TRANSCRIPT).unwrap();

    assert_eq!(aggregator.annotation().chunk_sizes(), vec![3]);
    let summary: Vec<(&str, VariantType, Vec<&str>)> = bundle
        .variants
        .iter()
        .map(|v| {
            (
                v.identity.alt_allele.as_str(),
                v.variant_type,
                v.samples.iter().map(|s| s.sample.as_str()).collect(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("GCA", VariantType::Insertion, vec!["tumor"]),
            ("C", VariantType::Unclassified, vec!["tumor"]),
            ("A", VariantType::Unclassified, vec!["normal"]),
        ]
    );
}

#[rstest]
fn test_protein_impact_filter_drops_terms_too() {
    let aggregator = Aggregator::new(MockVep::new(sparse), MockPresence::new(vec![]));

    let bundle = aggregator
        .run(&config(38), &many_variants(25), TRANSCRIPT)
        .unwrap();

    assert_eq!(bundle.len(), 3);
    assert!(bundle.variants.iter().all(|v| v.identity.pos % 10 == 0));
    assert_eq!(bundle.consequences, vec!["missense_variant"]);
}

#[rstest]
fn test_presence_merge_matches_by_identity() {
    let variants = vec![
        RawVariant::new("7", 124532327, "G", "C").with_samples(vec![SampleCall::new("P1", "0/1")]),
        RawVariant::new("7", 124532400, "A", "T"),
    ];
    let known = PresenceFlags {
        in_population_db: true,
        in_variant_db: true,
        ..Default::default()
    };
    let presence = MockPresence::new(vec![
        PresenceRecord::new(VariantIdentity::new("7", 124532327, "G", "C"), known),
        PresenceRecord::new(
            VariantIdentity::new("7", 124532400, "A", "G"),
            PresenceFlags {
                in_cancer_db: true,
                ..Default::default()
            },
        ),
    ]);
    let aggregator = Aggregator::new(MockVep::new(missense), presence);

    let bundle = aggregator.run(&config(38), &variants, TRANSCRIPT).unwrap();

    assert_eq!(bundle.variants[0].presence, known);
    assert_eq!(bundle.variants[1].presence, PresenceFlags::default());

    let queries = aggregator.presence().queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(
        queries[0]
            .iter()
            .map(|q| (q.chr.as_str(), q.pos.as_str(), q.alt_allele.as_str()))
            .collect::<Vec<_>>(),
        vec![("7", "124532327", "C"), ("7", "124532400", "T")]
    );
}

#[rstest]
fn test_presence_is_one_request_for_many_chunks() {
    let aggregator = Aggregator::new(MockVep::new(missense), MockPresence::new(vec![]));

    aggregator
        .run(&config(38), &many_variants(1001), TRANSCRIPT)
        .unwrap();

    assert_eq!(aggregator.annotation().chunk_sizes().len(), 6);
    let queries = aggregator.presence().queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].len(), 1001);
}

#[rstest]
fn test_chunk_failure_aborts_run() {
    let aggregator = Aggregator::new(
        MockVep::new(missense).failing(1, 1),
        MockPresence::new(vec![]),
    );

    let result = aggregator.run(&config(38), &many_variants(450), TRANSCRIPT);

    assert!(matches!(result, Err(AnnotateError::AnnotationRequest { chunk: 1, .. })));
    // the third chunk is never sent and presence is never asked
    assert_eq!(aggregator.annotation().chunk_sizes(), vec![200, 200]);
    assert!(aggregator.presence().queries().is_empty());
}

#[rstest]
fn test_chunk_is_replayed_under_retry_policy() {
    let config = AnnotationConfig::builder()
        .with_ensembl_url("http://localhost:3000".to_string())
        .with_api_url("http://localhost:8181".to_string())
        .with_retry(RetryPolicy::new(3, Duration::ZERO))
        .finish()
        .unwrap();
    let aggregator = Aggregator::new(
        MockVep::new(missense).failing(0, 2),
        MockPresence::new(vec![]),
    );

    let bundle = aggregator.run(&config, &many_variants(250), TRANSCRIPT).unwrap();

    assert_eq!(bundle.len(), 250);
    assert_eq!(aggregator.annotation().chunk_sizes(), vec![200, 200, 200, 50]);
}

#[rstest]
fn test_presence_lookup_is_replayed_under_retry_policy() {
    let config = AnnotationConfig::builder()
        .with_ensembl_url("http://localhost:3000".to_string())
        .with_api_url("http://localhost:8181".to_string())
        .with_retry(RetryPolicy::new(2, Duration::ZERO))
        .finish()
        .unwrap();
    let aggregator = Aggregator::new(MockVep::new(missense), MockPresence::failing(1));

    let bundle = aggregator.run(&config, &many_variants(3), TRANSCRIPT).unwrap();

    assert_eq!(bundle.len(), 3);
    let queries = aggregator.presence().queries();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0], queries[1]);
}

#[rstest]
fn test_presence_failure_is_fatal() {
    let aggregator = Aggregator::new(MockVep::new(missense), MockPresence::failing(u32::MAX));

    let result = aggregator.run(&config(38), &many_variants(3), TRANSCRIPT);

    assert!(matches!(result, Err(AnnotateError::PresenceRequest { .. })));
    assert_eq!(aggregator.presence().queries().len(), 1);
}

#[rstest]
fn test_empty_input_makes_no_requests() {
    let aggregator = Aggregator::new(MockVep::new(missense), MockPresence::new(vec![]));

    let bundle = aggregator.run(&config(37), &[], TRANSCRIPT).unwrap();

    assert!(bundle.is_empty());
    assert!(aggregator.annotation().chunk_sizes().is_empty());
    assert!(aggregator.presence().queries().is_empty());
}

#[rstest]
fn test_concurrent_runs_do_not_share_state() {
    let aggregator = Aggregator::new(MockVep::new(missense), MockPresence::new(vec![]));
    let grch37 = config(37);
    let grch38 = config(38);
    let first = many_variants(10);
    let second = vec![RawVariant::new("7", 124532327, "G", "GT")];

    let (a, b) = std::thread::scope(|scope| {
        let a = scope.spawn(|| aggregator.run(&grch37, &first, TRANSCRIPT));
        let b = scope.spawn(|| aggregator.run(&grch38, &second, TRANSCRIPT));
        (a.join().unwrap().unwrap(), b.join().unwrap().unwrap())
    });

    assert_eq!(a.len(), 10);
    assert!(a.variants.iter().all(|v| v.identity.chr == "17"));
    assert_eq!(b.len(), 1);
    assert_eq!(b.variants[0].variant_type, VariantType::Insertion);
}
