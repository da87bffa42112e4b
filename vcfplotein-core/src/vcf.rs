//! VCF parsing into [RawVariant]s.
//!
//! Reads a VCF file (plain text or gzipped/bgzf) keeping what the annotation
//! pipeline needs: site coordinates, alleles and per-sample genotype calls.
//! No validation of chromosome names or alleles is done here; whatever is in
//! the file is handed to the annotation service as-is.

use std::io::BufRead;
use std::path::Path;

use log::{debug, warn};

use crate::errors::{Result, VcfError};
use crate::models::{RawVariant, SampleCall};
use crate::utils::get_dynamic_reader;

/// Index of the first sample column.
const FIRST_SAMPLE_COLUMN: usize = 9;

/// Read all variants from a VCF file on disk.
pub fn read_vcf(path: &Path) -> Result<Vec<RawVariant>> {
    let reader = get_dynamic_reader(path)?;
    let variants = read_variants(reader)?;
    debug!("Read {} variants from {}", variants.len(), path.display());
    Ok(variants)
}

///
/// Read all variants from an open VCF stream.
///
/// Sample names come from the `#CHROM` header line. Genotypes are only
/// recorded when the FORMAT column starts with `GT`.
///
pub fn read_variants<R: BufRead>(mut reader: R) -> Result<Vec<RawVariant>> {
    let mut sample_names: Vec<String> = Vec::new();
    let mut variants = Vec::new();
    let mut line_buf = String::new();
    let mut line_number = 0usize;

    loop {
        line_buf.clear();
        if reader.read_line(&mut line_buf)? == 0 {
            break;
        }
        line_number += 1;

        let line = line_buf.trim_end_matches('\n').trim_end_matches('\r');
        if let Some(header) = line.strip_prefix("#CHROM") {
            sample_names = header
                .split('\t')
                .skip(FIRST_SAMPLE_COLUMN)
                .map(str::to_string)
                .collect();
            continue;
        }
        if line.starts_with('#') || line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 5 {
            warn!("Skipping VCF line {line_number}: expected at least 5 columns");
            continue;
        }

        let pos = fields[1]
            .parse::<u64>()
            .map_err(|_| VcfError::InvalidPosition {
                line: line_number,
                value: fields[1].to_string(),
            })?;

        let variant = RawVariant::new(fields[0], pos, fields[3], fields[4])
            .with_samples(sample_calls(&fields, &sample_names));
        variants.push(variant);
    }

    Ok(variants)
}

fn sample_calls(fields: &[&str], sample_names: &[String]) -> Vec<SampleCall> {
    let has_gt = fields
        .get(FIRST_SAMPLE_COLUMN - 1)
        .is_some_and(|format| format.split(':').next() == Some("GT"));
    if !has_gt {
        return Vec::new();
    }

    fields
        .iter()
        .skip(FIRST_SAMPLE_COLUMN)
        .zip(sample_names)
        .filter_map(|(value, name)| {
            value
                .split(':')
                .next()
                .map(|genotype| SampleCall::new(name, genotype))
        })
        .collect()
}
