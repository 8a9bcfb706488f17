#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::fmt;

use crate::configuration::{Configuration, Layout};
use crate::error::RevecError;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConversionPair {
    pub source: Configuration,
    pub target: Configuration,
}

impl ConversionPair {
    pub fn new(source: Configuration, target: Configuration) -> Self {
        Self { source, target }
    }

    pub fn flipped(self) -> Self {
        Self {
            source: self.target,
            target: self.source,
        }
    }
}

impl fmt::Display for ConversionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.source, self.target)
    }
}

/// Replaces each CONSECUTIVE/INTERLEAVED pair sharing `(id, repeat)` with one
/// ANY configuration.
pub fn dedup_layouts(configurations: &BTreeSet<Configuration>) -> BTreeSet<Configuration> {
    configurations
        .iter()
        .map(|config| match config.layout.opposite() {
            Some(opposite) if configurations.contains(&config.with_layout(opposite)) => {
                config.with_layout(Layout::Any)
            }
            _ => config.clone(),
        })
        .collect()
}

/// Parses one finalized equivalence class and applies layout dedup.
pub fn class_configurations(class: &[String]) -> Result<BTreeSet<Configuration>, RevecError> {
    let parsed = class
        .iter()
        .map(|testbed| Configuration::parse_testbed_id(testbed))
        .collect::<Result<BTreeSet<_>, _>>()?;
    Ok(dedup_layouts(&parsed))
}

/// Expands every class into its unordered pairs.
///
/// Each pair is emitted with the higher (or equal) repeat as `source`; no
/// filtering happens here.
pub fn recommend_candidates(classes: &[Vec<String>]) -> Result<Vec<ConversionPair>, RevecError> {
    let mut pairs = Vec::new();
    for class in classes {
        let members: Vec<Configuration> = class_configurations(class)?.into_iter().collect();
        if members.len() < 2 {
            continue;
        }
        for (index, first) in members.iter().enumerate() {
            for second in &members[index + 1..] {
                pairs.push(candidate(first, second));
            }
        }
    }
    Ok(pairs)
}

fn candidate(first: &Configuration, second: &Configuration) -> ConversionPair {
    if second.repeat > first.repeat {
        ConversionPair::new(second.clone(), first.clone())
    } else {
        ConversionPair::new(first.clone(), second.clone())
    }
}
