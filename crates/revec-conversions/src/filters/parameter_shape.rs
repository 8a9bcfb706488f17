#![forbid(unsafe_code)]

use super::{ConversionStage, StageContext};
use crate::error::ERROR_CODE_UNVERIFIABLE_SHAPE;
use crate::generator::ConversionPair;
use crate::intrinsics::IntrinsicCatalog;

/// Keeps pairs whose intrinsics take parameters of the same shape, pairwise:
/// scalar or vector, element kind and width. Vector length may differ.
#[derive(Debug, Clone)]
pub struct ParameterShapeFilter {
    catalog: IntrinsicCatalog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeVerdict {
    Compatible,
    Mismatch,
    Unverifiable,
}

impl ParameterShapeFilter {
    pub fn new(catalog: IntrinsicCatalog) -> Self {
        Self { catalog }
    }

    pub fn check(&self, pair: &ConversionPair) -> ShapeVerdict {
        let (Some(source), Some(target)) = (
            self.catalog.parameter_shapes(&pair.source.id),
            self.catalog.parameter_shapes(&pair.target.id),
        ) else {
            return ShapeVerdict::Unverifiable;
        };
        if source == target {
            ShapeVerdict::Compatible
        } else {
            ShapeVerdict::Mismatch
        }
    }
}

impl ConversionStage for ParameterShapeFilter {
    fn name(&self) -> &'static str {
        "parameter_shape"
    }

    fn apply(&self, pairs: Vec<ConversionPair>, cx: &mut StageContext<'_>) -> Vec<ConversionPair> {
        let mut kept = Vec::with_capacity(pairs.len());
        let mut unverifiable = Vec::new();
        for pair in pairs {
            match self.check(&pair) {
                ShapeVerdict::Compatible => kept.push(pair),
                ShapeVerdict::Mismatch => {}
                ShapeVerdict::Unverifiable => unverifiable.push(pair),
            }
        }

        if !unverifiable.is_empty() {
            let sample = unverifiable
                .iter()
                .take(3)
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            cx.warn(
                "parameter_metadata_missing",
                ERROR_CODE_UNVERIFIABLE_SHAPE,
                format!(
                    "{} pairs excluded for missing or undecodable intrinsic metadata (e.g. {sample})",
                    unverifiable.len()
                ),
            );
        }
        kept
    }
}
