use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

///
/// Genotype call of one sample at a VCF site, e.g. `0/1` or `1|2`.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone, Serialize, Deserialize)]
pub struct SampleCall {
    pub sample: String,
    pub genotype: String,
}

impl SampleCall {
    pub fn new(sample: &str, genotype: &str) -> Self {
        SampleCall {
            sample: sample.to_string(),
            genotype: genotype.to_string(),
        }
    }

    /// Allele indices named by the genotype. Missing calls (`.`) are skipped.
    pub fn allele_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.genotype
            .split(['/', '|'])
            .filter_map(|allele| allele.parse::<usize>().ok())
    }

    ///
    /// Whether this sample carries the allele with the given VCF allele index
    /// (0 is the reference, 1 the first alternate, ...).
    ///
    pub fn carries(&self, allele_index: usize) -> bool {
        self.allele_indices().any(|i| i == allele_index)
    }
}

///
/// A variant as read from the input VCF: one site, possibly multi-allelic.
///
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawVariant {
    pub chr: String,
    pub pos: u64,
    pub ref_allele: String,
    pub alternates: Vec<String>,
    pub samples: Vec<SampleCall>,
}

impl RawVariant {
    ///
    /// Create a new [RawVariant] without sample data.
    ///
    /// # Arguments
    /// - alt: comma-joined alternate alleles, as found in the ALT column
    pub fn new(chr: &str, pos: u64, ref_allele: &str, alt: &str) -> Self {
        RawVariant {
            chr: chr.to_string(),
            pos,
            ref_allele: ref_allele.to_string(),
            alternates: alt.split(',').map(str::to_string).collect(),
            samples: Vec::new(),
        }
    }

    pub fn with_samples(mut self, samples: Vec<SampleCall>) -> Self {
        self.samples = samples;
        self
    }

    ///
    /// Identity of one alternate allele of this site.
    ///
    /// # Arguments
    /// - alt_index: 0-based index into `alternates`
    pub fn identity(&self, alt_index: usize) -> Option<VariantIdentity> {
        self.alternates.get(alt_index).map(|alt| VariantIdentity {
            chr: self.chr.clone(),
            pos: self.pos,
            ref_allele: self.ref_allele.clone(),
            alt_allele: alt.clone(),
        })
    }

    /// Samples carrying the alternate at `alt_index` (0-based).
    pub fn carriers(&self, alt_index: usize) -> Vec<SampleCall> {
        self.samples
            .iter()
            .filter(|call| call.carries(alt_index + 1))
            .cloned()
            .collect()
    }
}

///
/// Exact identity of a single-alternate variant. Used as the match key
/// between annotation output and presence records, so no normalization
/// is ever applied.
///
#[derive(Eq, PartialEq, Hash, Ord, PartialOrd, Debug, Clone, Serialize, Deserialize)]
pub struct VariantIdentity {
    pub chr: String,
    pub pos: u64,
    #[serde(rename = "ref")]
    pub ref_allele: String,
    #[serde(rename = "alt")]
    pub alt_allele: String,
}

impl VariantIdentity {
    pub fn new(chr: &str, pos: u64, ref_allele: &str, alt_allele: &str) -> Self {
        VariantIdentity {
            chr: chr.to_string(),
            pos,
            ref_allele: ref_allele.to_string(),
            alt_allele: alt_allele.to_string(),
        }
    }
}

impl Display for VariantIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} {}>{}",
            self.chr, self.pos, self.ref_allele, self.alt_allele
        )
    }
}

#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantType {
    Insertion,
    Deletion,
    Unclassified,
}

impl VariantType {
    ///
    /// Classify a variant from its allele lengths alone: a longer alternate is
    /// an insertion, a shorter one a deletion, anything else is unclassified.
    ///
    pub fn classify(ref_allele: &str, alt_allele: &str) -> Self {
        match alt_allele.len().cmp(&ref_allele.len()) {
            Ordering::Greater => VariantType::Insertion,
            Ordering::Less => VariantType::Deletion,
            Ordering::Equal => VariantType::Unclassified,
        }
    }
}

///
/// Presence of a variant identity in the local reference databases.
/// Serialized with the names the presence service uses.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PresenceFlags {
    #[serde(rename = "gnomAD", default)]
    pub in_population_db: bool,
    #[serde(rename = "clinvar", default)]
    pub in_clinical_db: bool,
    #[serde(rename = "cosmic", default)]
    pub in_cancer_db: bool,
    #[serde(rename = "dbSNP", default)]
    pub in_variant_db: bool,
}

impl PresenceFlags {
    /// Union of two flag records.
    pub fn union(self, other: PresenceFlags) -> PresenceFlags {
        PresenceFlags {
            in_population_db: self.in_population_db || other.in_population_db,
            in_clinical_db: self.in_clinical_db || other.in_clinical_db,
            in_cancer_db: self.in_cancer_db || other.in_cancer_db,
            in_variant_db: self.in_variant_db || other.in_variant_db,
        }
    }

    pub fn any(&self) -> bool {
        self.in_population_db || self.in_clinical_db || self.in_cancer_db || self.in_variant_db
    }
}

///
/// A fully annotated variant: one alternate allele on one transcript with a
/// protein-level change, its consequence terms, carrier samples and presence
/// flags.
///
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    #[serde(flatten)]
    pub identity: VariantIdentity,
    pub transcript_id: String,
    pub aa_pos: u32,
    pub aa_change: String,
    pub consequences: BTreeSet<String>,
    pub samples: Vec<SampleCall>,
    #[serde(rename = "type")]
    pub variant_type: VariantType,
    #[serde(flatten)]
    pub presence: PresenceFlags,
}

impl Variant {
    ///
    /// Key under which two records are considered the same annotated variant.
    ///
    pub fn record_key(&self) -> (&VariantIdentity, &str, u32, &str) {
        (
            &self.identity,
            self.transcript_id.as_str(),
            self.aa_pos,
            self.aa_change.as_str(),
        )
    }
}
