#![forbid(unsafe_code)]

//! Groups testbeds by the output they printed in one execution log.
//!
//! A log is a sequence of `TEST START <testbed>` / output lines / `TEST STOP`
//! brackets. The output signature of a bracket is the concatenation of its
//! right-trimmed lines, kept as a SHA-256 digest that is fed line by line.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::RevecError;

const START_MARKER: &[u8] = b"TEST START";
const STOP_MARKER: &[u8] = b"TEST STOP";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputGroup {
    pub signature: String,
    pub testbeds: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogParseStats {
    pub lines: u64,
    pub brackets: u64,
    pub ignored_stops: u64,
    pub abandoned_brackets: u64,
    pub unterminated_brackets: u64,
    /// `TEST START` lines without a testbed path.
    pub unnamed_brackets: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEquivalences {
    pub source: String,
    /// First-encounter order.
    pub groups: Vec<OutputGroup>,
    pub stats: LogParseStats,
}

impl LogEquivalences {
    pub fn candidate_groups(&self) -> impl Iterator<Item = &[String]> {
        self.groups.iter().map(|group| group.testbeds.as_slice())
    }

    pub fn testbed_count(&self) -> usize {
        self.groups.iter().map(|group| group.testbeds.len()).sum()
    }
}

struct OpenBracket {
    testbed: String,
    hasher: Sha256,
}

pub fn parse_log<R: BufRead>(mut reader: R, source: &str) -> Result<LogEquivalences, RevecError> {
    let mut stats = LogParseStats::default();
    let mut groups: Vec<OutputGroup> = Vec::new();
    let mut group_index: BTreeMap<String, usize> = BTreeMap::new();
    let mut open: Option<OpenBracket> = None;
    let mut raw = Vec::new();

    loop {
        raw.clear();
        let read = reader
            .read_until(b'\n', &mut raw)
            .map_err(|source_err| RevecError::ReadFile {
                path: source.to_string(),
                source: source_err,
            })?;
        if read == 0 {
            break;
        }
        stats.lines += 1;
        let line = raw.trim_ascii_end();

        if let Some(rest) = line.strip_prefix(START_MARKER) {
            if open.is_some() {
                stats.abandoned_brackets += 1;
            }
            let testbed = String::from_utf8_lossy(rest).trim().to_string();
            if testbed.is_empty() {
                stats.unnamed_brackets += 1;
            }
            open = Some(OpenBracket {
                testbed,
                hasher: Sha256::new(),
            });
        } else if line.starts_with(STOP_MARKER) {
            let Some(bracket) = open.take() else {
                stats.ignored_stops += 1;
                continue;
            };
            // Unnamed brackets are consumed but never grouped.
            if bracket.testbed.is_empty() {
                continue;
            }
            stats.brackets += 1;
            let signature = format!("sha256:{}", hex::encode(bracket.hasher.finalize()));
            match group_index.get(&signature) {
                Some(&index) => groups[index].testbeds.push(bracket.testbed),
                None => {
                    group_index.insert(signature.clone(), groups.len());
                    groups.push(OutputGroup {
                        signature,
                        testbeds: vec![bracket.testbed],
                    });
                }
            }
        } else if let Some(bracket) = open.as_mut() {
            bracket.hasher.update(line);
        }
    }

    if open.is_some() {
        stats.unterminated_brackets += 1;
    }

    Ok(LogEquivalences {
        source: source.to_string(),
        groups,
        stats,
    })
}

pub fn parse_log_file(path: &Path) -> Result<LogEquivalences, RevecError> {
    let file = File::open(path).map_err(|source| RevecError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    parse_log(BufReader::new(file), &path.display().to_string())
}

/// Parses every log; the result is in `paths` order regardless of `parallel`.
pub fn parse_log_files(
    paths: &[PathBuf],
    parallel: bool,
) -> Result<Vec<LogEquivalences>, RevecError> {
    if parallel {
        paths
            .par_iter()
            .map(|path| parse_log_file(path))
            .collect()
    } else {
        paths.iter().map(|path| parse_log_file(path)).collect()
    }
}
