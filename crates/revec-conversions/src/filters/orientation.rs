#![forbid(unsafe_code)]

use std::cmp::Ordering;

use super::{ConversionStage, StageContext};
use crate::config::OrientationPolicy;
use crate::error::ERROR_CODE_AMBIGUOUS_ORIENTATION;
use crate::generator::ConversionPair;

/// Puts the higher-repeat side first; on equal repeats, the older family.
#[derive(Debug, Clone)]
pub struct OrientationStage {
    family_order: Vec<String>,
    policy: OrientationPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Orientation {
    Keep,
    Flip,
    Ambiguous(String),
}

impl OrientationStage {
    pub fn new(family_order: Vec<String>, policy: OrientationPolicy) -> Self {
        Self {
            family_order,
            policy,
        }
    }

    fn rank(&self, family: &str) -> Option<usize> {
        self.family_order.iter().position(|known| known == family)
    }

    pub fn orient(&self, pair: &ConversionPair) -> Orientation {
        // VF = source.repeat / target.repeat, compared without division.
        match pair.source.repeat.cmp(&pair.target.repeat) {
            Ordering::Greater => return Orientation::Keep,
            Ordering::Less => return Orientation::Flip,
            Ordering::Equal => {}
        }

        if self.policy == OrientationPolicy::ReportOnly {
            return Orientation::Ambiguous("equal repeat counts".to_string());
        }

        let source_family = pair.source.instruction_set();
        let target_family = pair.target.instruction_set();
        match (self.rank(source_family), self.rank(target_family)) {
            (Some(source_rank), Some(target_rank)) => match source_rank.cmp(&target_rank) {
                Ordering::Less => Orientation::Keep,
                Ordering::Greater => Orientation::Flip,
                Ordering::Equal => Orientation::Ambiguous(format!(
                    "equal repeat counts within instruction set `{source_family}`"
                )),
            },
            _ => Orientation::Ambiguous(format!(
                "equal repeat counts and unranked instruction set (`{source_family}` vs `{target_family}`)"
            )),
        }
    }
}

impl ConversionStage for OrientationStage {
    fn name(&self) -> &'static str {
        "orientation"
    }

    fn apply(&self, pairs: Vec<ConversionPair>, cx: &mut StageContext<'_>) -> Vec<ConversionPair> {
        let mut oriented = Vec::with_capacity(pairs.len());
        for pair in pairs {
            match self.orient(&pair) {
                Orientation::Keep => oriented.push(pair),
                Orientation::Flip => oriented.push(pair.flipped()),
                Orientation::Ambiguous(reason) => cx.warn(
                    "unclear_conversion_direction",
                    ERROR_CODE_AMBIGUOUS_ORIENTATION,
                    format!(
                        "{reason}; base: {} target: {}",
                        pair.source, pair.target
                    ),
                ),
            }
        }
        oriented
    }
}
