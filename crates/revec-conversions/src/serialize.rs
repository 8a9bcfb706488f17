#![forbid(unsafe_code)]

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::configuration::{Configuration, Layout};
use crate::error::RevecError;
use crate::generator::ConversionPair;

/// `{id, layout, repeat}` in that field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationRecord {
    pub id: String,
    pub layout: Layout,
    pub repeat: u32,
}

/// Serialized as a two-element array `[source, target]`.
pub type ConversionRecord = (ConfigurationRecord, ConfigurationRecord);

impl From<&Configuration> for ConfigurationRecord {
    fn from(config: &Configuration) -> Self {
        Self {
            id: config.id.clone(),
            layout: config.layout,
            repeat: config.repeat,
        }
    }
}

impl From<ConfigurationRecord> for Configuration {
    fn from(record: ConfigurationRecord) -> Self {
        Configuration::new(record.id, record.layout, record.repeat)
    }
}

pub fn conversion_records(pairs: &[ConversionPair]) -> Vec<ConversionRecord> {
    pairs
        .iter()
        .map(|pair| {
            (
                ConfigurationRecord::from(&pair.source),
                ConfigurationRecord::from(&pair.target),
            )
        })
        .collect()
}

pub fn pairs_from_records(records: Vec<ConversionRecord>) -> Vec<ConversionPair> {
    records
        .into_iter()
        .map(|(source, target)| ConversionPair::new(source.into(), target.into()))
        .collect()
}

pub fn conversions_to_json(pairs: &[ConversionPair]) -> Result<String, RevecError> {
    Ok(serde_json::to_string(&conversion_records(pairs))?)
}

pub fn load_conversions(path: &Path) -> Result<Vec<ConversionPair>, RevecError> {
    let raw = fs::read_to_string(path).map_err(|source| RevecError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    let records = serde_json::from_str::<Vec<ConversionRecord>>(&raw).map_err(|source| {
        RevecError::ParseJson {
            path: path.display().to_string(),
            source,
        }
    })?;
    Ok(pairs_from_records(records))
}

/// Writes `value` as JSON, creating parent directories.
pub fn write_json<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    pretty: bool,
) -> Result<(), RevecError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| RevecError::WriteFile {
            path: parent.display().to_string(),
            source,
        })?;
    }
    fs::write(path, json.as_bytes()).map_err(|source| RevecError::WriteFile {
        path: path.display().to_string(),
        source,
    })
}
