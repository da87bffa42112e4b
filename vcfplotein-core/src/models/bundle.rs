use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::variant::{Variant, VariantType};

///
/// Result of one annotation run: the annotated variants plus the consequence
/// vocabulary observed across them.
///
/// `deletions` and `insertions` are part of the published output shape but
/// are not filled by the pipeline; use [AnnotationBundle::of_type] to split
/// variants by classification.
///
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationBundle {
    pub variants: Vec<Variant>,
    pub consequences: Vec<String>,
    pub deletions: Vec<Variant>,
    pub insertions: Vec<Variant>,
}

impl AnnotationBundle {
    pub fn new(variants: Vec<Variant>, consequences: BTreeSet<String>) -> Self {
        AnnotationBundle {
            variants,
            consequences: consequences.into_iter().collect(),
            deletions: Vec::new(),
            insertions: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn of_type(&self, variant_type: VariantType) -> impl Iterator<Item = &Variant> {
        self.variants
            .iter()
            .filter(move |v| v.variant_type == variant_type)
    }
}
