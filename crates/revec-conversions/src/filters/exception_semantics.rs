#![forbid(unsafe_code)]

//! `comi*` and `ucomi*` compare the same way but differ in which inputs raise
//! floating-point exceptions, so matching outputs do not make them
//! interchangeable.

use std::sync::OnceLock;

use regex::Regex;

use super::{ConversionStage, StageContext};
use crate::configuration::Configuration;
use crate::generator::ConversionPair;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExceptionSemanticsFilter;

fn comparison_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^int_[a-z0-9]+_([a-z0-9]+)_(u?)comi").expect("comi regex"))
}

/// `(family, unordered)` for a comi/ucomi intrinsic.
fn comparison_kind(config: &Configuration) -> Option<(&str, bool)> {
    let caps = comparison_regex().captures(&config.id)?;
    let family = caps.get(1)?.as_str();
    let unordered = caps.get(2).is_some_and(|m| !m.as_str().is_empty());
    Some((family, unordered))
}

pub fn mixes_exception_semantics(pair: &ConversionPair) -> bool {
    match (comparison_kind(&pair.source), comparison_kind(&pair.target)) {
        (Some((source_family, source_unordered)), Some((target_family, target_unordered))) => {
            source_family == target_family && source_unordered != target_unordered
        }
        _ => false,
    }
}

impl ConversionStage for ExceptionSemanticsFilter {
    fn name(&self) -> &'static str {
        "exception_semantics"
    }

    fn apply(&self, pairs: Vec<ConversionPair>, _cx: &mut StageContext<'_>) -> Vec<ConversionPair> {
        pairs
            .into_iter()
            .filter(|pair| !mixes_exception_semantics(pair))
            .collect()
    }
}
