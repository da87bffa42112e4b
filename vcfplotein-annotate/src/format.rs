//! Request lines for the variant-effect service.
//!
//! The region endpoint takes VCF-like, whitespace separated lines:
//!
//! ```text
//! CHROM POS ID REF ALT QUAL FILTER INFO
//! 7 124532327 v0 G C . . .
//! ```
//!
//! The ID column carries a correlation id (`v{n}`, `n` the 0-based line
//! index) and the service echoes the full line back as `input`. Parsing the
//! echo with [parse_echo] recovers CHROM, POS, REF and ALT from fields
//! 0, 1, 3 and 4.

use vcfplotein_core::models::{RawVariant, VariantIdentity};

use crate::errors::{AnnotateError, Result};

///
/// One single-alternate request line, tied back to the [RawVariant] it came from.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedLine {
    /// Correlation id written into the ID column.
    pub id: String,
    /// Index of the originating variant in the pipeline input.
    pub source: usize,
    /// Index of the alternate within the originating variant.
    pub alt_index: usize,
    pub identity: VariantIdentity,
    pub text: String,
}

impl FormattedLine {
    pub fn new(index: usize, source: usize, alt_index: usize, identity: VariantIdentity) -> Self {
        let id = correlation_id(index);
        let text = format!(
            "{} {} {} {} {} . . .",
            identity.chr, identity.pos, id, identity.ref_allele, identity.alt_allele
        );
        FormattedLine {
            id,
            source,
            alt_index,
            identity,
            text,
        }
    }
}

pub fn correlation_id(index: usize) -> String {
    format!("v{index}")
}

///
/// Expand variants into request lines, one per alternate allele.
///
/// Variant order and, within a variant, alternate order are preserved.
/// Nothing is validated: odd chromosome names or alleles are sent as-is.
///
pub fn format_lines(variants: &[RawVariant]) -> Vec<FormattedLine> {
    let mut lines = Vec::with_capacity(variants.len());

    for (source, variant) in variants.iter().enumerate() {
        for alt_index in 0..variant.alternates.len() {
            if let Some(identity) = variant.identity(alt_index) {
                lines.push(FormattedLine::new(lines.len(), source, alt_index, identity));
            }
        }
    }

    lines
}

///
/// Recover the variant identity from an echoed request line.
///
/// # Arguments
/// - input: the `input` field of an annotation result
pub fn parse_echo(input: &str) -> Result<VariantIdentity> {
    let fields: Vec<&str> = input.split_whitespace().collect();
    if fields.len() < 5 {
        return Err(AnnotateError::MalformedEcho(input.to_string()));
    }

    let pos = fields[1]
        .parse::<u64>()
        .map_err(|_| AnnotateError::MalformedEcho(input.to_string()))?;

    Ok(VariantIdentity::new(fields[0], pos, fields[3], fields[4]))
}
