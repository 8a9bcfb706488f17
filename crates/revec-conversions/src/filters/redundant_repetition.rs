#![forbid(unsafe_code)]

//! Don't convert 4x sse2 into 2x avx2 if 2x sse2 into 1x avx2 is available.

use std::collections::BTreeSet;

use super::{ConversionStage, StageContext};
use crate::generator::ConversionPair;

#[derive(Debug, Clone, Copy, Default)]
pub struct RedundantRepetitionFilter;

pub fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Divisors of `n` greater than one, ascending. Trial division up to `sqrt(n)`.
pub fn divisors_above_one(n: u32) -> Vec<u32> {
    let mut low = Vec::new();
    let mut high = Vec::new();
    let mut divisor: u32 = 1;
    while u64::from(divisor) * u64::from(divisor) <= u64::from(n) {
        if n % divisor == 0 {
            if divisor > 1 {
                low.push(divisor);
            }
            let cofactor = n / divisor;
            if cofactor != divisor {
                high.push(cofactor);
            }
        }
        divisor += 1;
    }
    low.extend(high.into_iter().rev());
    low
}

/// The pair with both repeats divided by `divisor`.
pub fn reduced(pair: &ConversionPair, divisor: u32) -> ConversionPair {
    ConversionPair::new(
        pair.source.with_repeat(pair.source.repeat / divisor),
        pair.target.with_repeat(pair.target.repeat / divisor),
    )
}

/// True if some strictly smaller integer-scaled copy of `pair` is present.
fn has_reduced_form(pair: &ConversionPair, present: &BTreeSet<&ConversionPair>) -> bool {
    let common = gcd(pair.source.repeat, pair.target.repeat);
    if common < 2 {
        return false;
    }
    present.contains(&reduced(pair, common))
        || divisors_above_one(common)
            .into_iter()
            .any(|divisor| present.contains(&reduced(pair, divisor)))
}

impl ConversionStage for RedundantRepetitionFilter {
    fn name(&self) -> &'static str {
        "redundant_repetition"
    }

    fn apply(&self, pairs: Vec<ConversionPair>, _cx: &mut StageContext<'_>) -> Vec<ConversionPair> {
        let present: BTreeSet<&ConversionPair> = pairs.iter().collect();
        let keep: Vec<bool> = pairs
            .iter()
            .map(|pair| !has_reduced_form(pair, &present))
            .collect();
        pairs
            .into_iter()
            .zip(keep)
            .filter_map(|(pair, keep)| keep.then_some(pair))
            .collect()
    }
}
