#![forbid(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Tracks, per testbed, the testbeds that matched it in every log seen so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EquivalenceMap {
    equivalences: BTreeMap<String, BTreeSet<String>>,
}

/// Finalized equivalence relation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquivalenceReport {
    /// Classes of two or more testbeds, each sorted, list sorted.
    pub classes: Vec<Vec<String>>,
    /// Testbeds that matched nothing else, sorted.
    pub missed: Vec<String>,
}

impl EquivalenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Narrows every member's set by the group it appears in.
    ///
    /// A later log can only remove testbeds from an equivalence, never add
    /// them, so the result does not depend on the order logs are refined in.
    pub fn refine<G, S>(&mut self, candidate_groups: G)
    where
        G: IntoIterator<Item = S>,
        S: AsRef<[String]>,
    {
        for group in candidate_groups {
            let candidate: BTreeSet<String> = group.as_ref().iter().cloned().collect();
            for member in &candidate {
                match self.equivalences.get_mut(member) {
                    Some(existing) => existing.retain(|other| candidate.contains(other)),
                    None => {
                        self.equivalences.insert(member.clone(), candidate.clone());
                    }
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.equivalences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equivalences.is_empty()
    }

    /// Sum of all tracked set sizes.
    pub fn refined_count(&self) -> usize {
        self.equivalences.values().map(BTreeSet::len).sum()
    }

    /// Collapses the per-testbed sets into a partition.
    ///
    /// `y` stays in `x`'s class only if `x` is also in `y`'s set. When logs
    /// cover different testbed subsets the raw sets can overlap; mutual
    /// membership keeps each testbed in exactly one class.
    pub fn finalize(&self) -> EquivalenceReport {
        let mut distinct: BTreeSet<Vec<String>> = BTreeSet::new();
        for (testbed, set) in &self.equivalences {
            let class: Vec<String> = set
                .iter()
                .filter(|other| {
                    *other == testbed
                        || self
                            .equivalences
                            .get(*other)
                            .is_some_and(|back| back.contains(testbed))
                })
                .cloned()
                .collect();
            distinct.insert(class);
        }

        let mut report = EquivalenceReport::default();
        for class in distinct {
            if class.len() > 1 {
                report.classes.push(class);
            } else {
                report.missed.extend(class);
            }
        }
        report.missed.sort();
        report
    }
}
