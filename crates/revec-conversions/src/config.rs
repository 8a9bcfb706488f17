#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RevecError;

pub const DEFAULT_INTRINSICS_PATH: &str = "intrinsics_all.json";

/// Legacy to wide. Families outside this list are never ranked.
pub const DEFAULT_FAMILY_ORDER: &[&str] = &[
    "sse", "sse2", "sse3", "ssse3", "sse41", "sse42", "avx", "avx2", "fma", "avx512",
];

/// How equal-repeat pairs get a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationPolicy {
    /// Older family becomes the source; same-family pairs are ambiguous.
    #[default]
    GenerationalOrder,
    /// Every equal-repeat pair is reported as ambiguous.
    ReportOnly,
}

impl OrientationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GenerationalOrder => "generational_order",
            Self::ReportOnly => "report_only",
        }
    }
}

impl fmt::Display for OrientationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrientationPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "generational_order" => Ok(Self::GenerationalOrder),
            "report_only" => Ok(Self::ReportOnly),
            other => Err(format!(
                "unknown orientation policy `{other}` (expected generational_order|report_only)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub logs: Vec<PathBuf>,
    pub output_folder: PathBuf,
    pub intrinsics_path: PathBuf,
    pub family_order: Vec<String>,
    pub orientation_policy: OrientationPolicy,
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl PipelineConfig {
    pub fn with_defaults() -> Self {
        Self {
            logs: Vec::new(),
            output_folder: PathBuf::from("."),
            intrinsics_path: PathBuf::from(DEFAULT_INTRINSICS_PATH),
            family_order: DEFAULT_FAMILY_ORDER
                .iter()
                .map(|family| (*family).to_string())
                .collect(),
            orientation_policy: OrientationPolicy::default(),
            parallel: true,
        }
    }

    pub fn load(path: &Path) -> Result<Self, RevecError> {
        let raw = fs::read_to_string(path).map_err(|source| RevecError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        let config =
            serde_json::from_str::<Self>(&raw).map_err(|source| RevecError::ParseJson {
                path: path.display().to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RevecError> {
        if self.family_order.is_empty() {
            return Err(RevecError::InvalidConfig(
                "family_order must not be empty".to_string(),
            ));
        }
        let mut seen = BTreeSet::new();
        for family in &self.family_order {
            if family.trim().is_empty() {
                return Err(RevecError::InvalidConfig(
                    "family_order entries must not be empty".to_string(),
                ));
            }
            if !seen.insert(family.as_str()) {
                return Err(RevecError::InvalidConfig(format!(
                    "family_order lists `{family}` more than once"
                )));
            }
        }
        Ok(())
    }
}
