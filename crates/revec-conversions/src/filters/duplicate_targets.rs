#![forbid(unsafe_code)]

//! Keeps one target per `(source, target instruction set)`.

use std::collections::{BTreeMap, BTreeSet};

use super::{ConversionStage, StageContext};
use crate::configuration::{Configuration, Layout};
use crate::error::ERROR_CODE_AMBIGUOUS_TARGET;
use crate::generator::ConversionPair;

#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateTargetFilter;

/// Levenshtein distance over bytes.
pub fn edit_distance(a: &[u8], b: &[u8]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Narrows same-family candidates to the surviving ones, best first.
///
/// Order of preference: fewest target repeats, closest operation name, an
/// ANY target over the specific-layout copy of it. Anything still tied is
/// returned sorted so the caller can take the first and report the rest.
pub fn rank_targets(source: &Configuration, targets: &[Configuration]) -> Vec<Configuration> {
    let Some(min_repeat) = targets.iter().map(|target| target.repeat).min() else {
        return Vec::new();
    };
    let fewest_repeats: Vec<&Configuration> = targets
        .iter()
        .filter(|target| target.repeat == min_repeat)
        .collect();

    let operation = source.operation().as_bytes();
    let distance = |target: &Configuration| edit_distance(operation, target.operation().as_bytes());
    let min_distance = fewest_repeats
        .iter()
        .map(|target| distance(*target))
        .min()
        .unwrap_or_default();
    let closest: BTreeSet<&Configuration> = fewest_repeats
        .into_iter()
        .filter(|target| distance(*target) == min_distance)
        .collect();

    closest
        .iter()
        .filter(|target| {
            target.layout == Layout::Any || !closest.contains(&target.with_layout(Layout::Any))
        })
        .map(|target| (*target).clone())
        .collect()
}

impl ConversionStage for DuplicateTargetFilter {
    fn name(&self) -> &'static str {
        "duplicate_targets"
    }

    fn apply(&self, pairs: Vec<ConversionPair>, cx: &mut StageContext<'_>) -> Vec<ConversionPair> {
        let mut by_source: BTreeMap<(Configuration, String), BTreeSet<Configuration>> =
            BTreeMap::new();
        for pair in pairs {
            let family = pair.target.instruction_set().to_string();
            by_source
                .entry((pair.source, family))
                .or_default()
                .insert(pair.target);
        }

        let mut chosen = Vec::with_capacity(by_source.len());
        for ((source, family), targets) in by_source {
            let targets: Vec<Configuration> = targets.into_iter().collect();
            let ranked = rank_targets(&source, &targets);
            let Some(target) = ranked.first().cloned() else {
                continue;
            };
            if ranked.len() > 1 {
                let candidates = ranked
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                cx.warn(
                    "multiple_conversion_candidates",
                    ERROR_CODE_AMBIGUOUS_TARGET,
                    format!(
                        "{source} has {} `{family}` targets after filtering, picking first: {candidates}",
                        ranked.len()
                    ),
                );
            }
            chosen.push(ConversionPair::new(source, target));
        }
        chosen
    }
}
