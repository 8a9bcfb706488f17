#![forbid(unsafe_code)]

//! Testbed configurations: which intrinsic, how its parameters were filled,
//! and how many calls were packed into the testbed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RevecError;

const TESTBED_FIELD_COUNT: usize = 5;

/// Parameter-layout policy used when the testbed distributed its input bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Layout {
    /// Every parameter of call `i` is filled before call `i + 1`.
    Consecutive,
    /// Parameter slot `j` is filled across all calls before slot `j + 1`.
    Interleaved,
    /// Both layouts were observed to be equivalent. Only produced by dedup.
    Any,
}

impl Layout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consecutive => "CONSECUTIVE",
            Self::Interleaved => "INTERLEAVED",
            Self::Any => "ANY",
        }
    }

    /// The other concrete layout. `Any` has no opposite.
    pub fn opposite(&self) -> Option<Self> {
        match self {
            Self::Consecutive => Some(Self::Interleaved),
            Self::Interleaved => Some(Self::Consecutive),
            Self::Any => None,
        }
    }

    /// Parses a layout token as written by the testbed generator.
    ///
    /// `HORIZONTAL` and `VERTICAL` are the generator's row-first and
    /// column-first spellings. `ANY` is rejected: it never comes from a
    /// testbed directory.
    pub fn from_testbed_token(token: &str) -> Option<Self> {
        match token {
            "CONSECUTIVE" | "HORIZONTAL" => Some(Self::Consecutive),
            "INTERLEAVED" | "VERTICAL" => Some(Self::Interleaved),
            _ => None,
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "CONSECUTIVE" => Ok(Self::Consecutive),
            "INTERLEAVED" => Ok(Self::Interleaved),
            "ANY" => Ok(Self::Any),
            other => Err(format!("unrecognized layout `{other}`")),
        }
    }
}

/// One measured testbed variant.
///
/// Equality, hashing and ordering cover `(id, layout, repeat)` and nothing
/// else, so every set and map keyed by a configuration iterates in the same
/// order on every run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Configuration {
    pub id: String,
    pub layout: Layout,
    pub repeat: u32,
}

impl Configuration {
    pub fn new(id: impl Into<String>, layout: Layout, repeat: u32) -> Self {
        Self {
            id: id.into(),
            layout,
            repeat,
        }
    }

    /// Parses `<ignored>/<intrinsic-id>/<ignored>_<LAYOUT>/<ignored>_<repeat>/<ignored>`.
    pub fn parse_testbed_id(testbed_id: &str) -> Result<Self, RevecError> {
        let fields: Vec<&str> = testbed_id.split('/').collect();
        if fields.len() != TESTBED_FIELD_COUNT {
            return Err(malformed(
                testbed_id,
                format!(
                    "expected {TESTBED_FIELD_COUNT} `/`-separated fields, found {}",
                    fields.len()
                ),
            ));
        }

        let id = fields[1].trim();
        if id.is_empty() {
            return Err(malformed(testbed_id, "intrinsic id is empty".to_string()));
        }

        let Some((_, layout_token)) = fields[2].split_once('_') else {
            return Err(malformed(
                testbed_id,
                format!("layout field `{}` has no `_` separator", fields[2]),
            ));
        };
        let layout = Layout::from_testbed_token(layout_token).ok_or_else(|| {
            RevecError::UnrecognizedLayout {
                id: testbed_id.to_string(),
                token: layout_token.to_string(),
            }
        })?;

        let Some((_, repeat_token)) = fields[3].split_once('_') else {
            return Err(malformed(
                testbed_id,
                format!("repeat field `{}` has no `_` separator", fields[3]),
            ));
        };
        let repeat = repeat_token.parse::<u32>().map_err(|err| {
            malformed(
                testbed_id,
                format!("repeat `{repeat_token}` is not an integer: {err}"),
            )
        })?;
        if repeat == 0 {
            return Err(malformed(testbed_id, "repeat must be positive".to_string()));
        }

        Ok(Self::new(id, layout, repeat))
    }

    pub fn architecture(&self) -> &str {
        self.id.split('_').nth(1).unwrap_or_default()
    }

    /// Instruction-set family, e.g. `sse2` for `int_x86_sse2_pavg_b`.
    pub fn instruction_set(&self) -> &str {
        self.id.split('_').nth(2).unwrap_or_default()
    }

    /// Everything after the family, e.g. `pavg_b`.
    pub fn operation(&self) -> &str {
        self.id.splitn(4, '_').nth(3).unwrap_or_default()
    }

    pub fn with_repeat(&self, repeat: u32) -> Self {
        Self::new(self.id.clone(), self.layout, repeat)
    }

    pub fn with_layout(&self, layout: Layout) -> Self {
        Self::new(self.id.clone(), layout, self.repeat)
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Configuration({}, {}, {})",
            self.id, self.layout, self.repeat
        )
    }
}

fn malformed(testbed_id: &str, reason: String) -> RevecError {
    RevecError::MalformedTestbedId {
        id: testbed_id.to_string(),
        reason,
    }
}
