#![forbid(unsafe_code)]

//! Intrinsic metadata as exported from the instruction-set records:
//! `{"int_x86_sse2_pavg_b": {"ParamTypes": [...], "RetTypes": [...]}, ...}`.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RevecError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrinsicRecord {
    #[serde(rename = "ParamTypes", default)]
    pub param_types: Vec<String>,
    #[serde(rename = "RetTypes", default)]
    pub ret_types: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Int,
    Float,
}

/// Element of a vector, or the scalar itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementType {
    pub kind: ElementKind,
    pub bits: u32,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            ElementKind::Int => 'i',
            ElementKind::Float => 'f',
        };
        write!(f, "{prefix}{}", self.bits)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlvmType {
    /// `None` for scalars. `llvm_v1i64_ty` is still a vector.
    pub lanes: Option<u32>,
    pub element: ElementType,
}

/// What a parameter must agree on across a widening: scalar versus vector
/// and the element type. Vector length is not part of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParameterShape {
    pub vector: bool,
    pub element: ElementType,
}

impl LlvmType {
    /// Decodes `llvm_v<lanes><i|f><bits>_ty` and `llvm_<i|f><bits>_ty`.
    pub fn parse(identifier: &str) -> Option<Self> {
        if let Some(caps) = vector_type_regex().captures(identifier) {
            return Some(Self {
                lanes: Some(caps[1].parse().ok()?),
                element: ElementType {
                    kind: element_kind(&caps[2])?,
                    bits: caps[3].parse().ok()?,
                },
            });
        }
        let caps = scalar_type_regex().captures(identifier)?;
        Some(Self {
            lanes: None,
            element: ElementType {
                kind: element_kind(&caps[1])?,
                bits: caps[2].parse().ok()?,
            },
        })
    }

    pub fn shape(&self) -> ParameterShape {
        ParameterShape {
            vector: self.lanes.is_some(),
            element: self.element,
        }
    }
}

fn vector_type_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^llvm_v([0-9]+)([if])([0-9]+)_ty$").expect("vector type regex"))
}

fn scalar_type_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^llvm_([if])([0-9]+)_ty$").expect("scalar type regex"))
}

fn element_kind(token: &str) -> Option<ElementKind> {
    match token {
        "i" => Some(ElementKind::Int),
        "f" => Some(ElementKind::Float),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntrinsicCatalog {
    records: BTreeMap<String, IntrinsicRecord>,
}

impl IntrinsicCatalog {
    pub fn new(records: BTreeMap<String, IntrinsicRecord>) -> Self {
        Self { records }
    }

    pub fn load(path: &Path) -> Result<Self, RevecError> {
        let raw = fs::read_to_string(path).map_err(|source| RevecError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        let records = serde_json::from_str::<BTreeMap<String, IntrinsicRecord>>(&raw).map_err(
            |source| RevecError::ParseJson {
                path: path.display().to_string(),
                source,
            },
        )?;
        Ok(Self { records })
    }

    pub fn get(&self, id: &str) -> Option<&IntrinsicRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Per-parameter shapes, or `None` if the intrinsic is unknown or any
    /// parameter type cannot be decoded.
    pub fn parameter_shapes(&self, id: &str) -> Option<Vec<ParameterShape>> {
        self.get(id)?
            .param_types
            .iter()
            .map(|ty| LlvmType::parse(ty).as_ref().map(LlvmType::shape))
            .collect()
    }
}
