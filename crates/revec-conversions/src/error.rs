#![forbid(unsafe_code)]

use thiserror::Error;

/// Stable codes attached to structured events.
pub const ERROR_CODE_MALFORMED_TESTBED: &str = "RC-PARSE-0001";
pub const ERROR_CODE_UNRECOGNIZED_LAYOUT: &str = "RC-PARSE-0002";
pub const ERROR_CODE_IO: &str = "RC-IO-0001";
pub const ERROR_CODE_JSON: &str = "RC-JSON-0001";
pub const ERROR_CODE_CONFIG: &str = "RC-CONFIG-0001";
pub const ERROR_CODE_AMBIGUOUS_ORIENTATION: &str = "RC-ORIENT-0001";
pub const ERROR_CODE_UNVERIFIABLE_SHAPE: &str = "RC-SHAPE-0001";
pub const ERROR_CODE_AMBIGUOUS_TARGET: &str = "RC-TARGET-0001";

#[derive(Debug, Error)]
pub enum RevecError {
    #[error("malformed testbed identifier `{id}`: {reason}")]
    MalformedTestbedId { id: String, reason: String },
    #[error("unrecognized layout `{token}` in testbed identifier `{id}`")]
    UnrecognizedLayout { id: String, token: String },
    #[error("failed to read `{path}`: {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to write `{path}`: {source}")]
    WriteFile {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse JSON `{path}`: {source}")]
    ParseJson {
        path: String,
        source: serde_json::Error,
    },
    #[error("failed to serialize artifact: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid pipeline config: {0}")]
    InvalidConfig(String),
}

impl RevecError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedTestbedId { .. } => ERROR_CODE_MALFORMED_TESTBED,
            Self::UnrecognizedLayout { .. } => ERROR_CODE_UNRECOGNIZED_LAYOUT,
            Self::ReadFile { .. } | Self::WriteFile { .. } => ERROR_CODE_IO,
            Self::ParseJson { .. } | Self::Serialize(_) => ERROR_CODE_JSON,
            Self::InvalidConfig(_) => ERROR_CODE_CONFIG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_testbed_names_the_identifier() {
        let err = RevecError::MalformedTestbedId {
            id: "tests/int_x86_sse2_foo".into(),
            reason: "expected 5 fields, found 2".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("tests/int_x86_sse2_foo"));
        assert!(msg.contains("expected 5 fields"));
        assert_eq!(err.error_code(), ERROR_CODE_MALFORMED_TESTBED);
    }

    #[test]
    fn unrecognized_layout_message() {
        let err = RevecError::UnrecognizedLayout {
            id: "a/b/combo_DIAGONAL/repeat_1/testbed".into(),
            token: "DIAGONAL".into(),
        };
        assert!(err.to_string().contains("unrecognized layout `DIAGONAL`"));
        assert_eq!(err.error_code(), ERROR_CODE_UNRECOGNIZED_LAYOUT);
    }

    #[test]
    fn error_display_all_variants_distinct() {
        let errors: Vec<RevecError> = vec![
            RevecError::MalformedTestbedId {
                id: "x".into(),
                reason: "r".into(),
            },
            RevecError::UnrecognizedLayout {
                id: "x".into(),
                token: "t".into(),
            },
            RevecError::ReadFile {
                path: "/r".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            },
            RevecError::WriteFile {
                path: "/w".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            },
            RevecError::ParseJson {
                path: "/j".into(),
                source: serde_json::from_str::<String>("bad").unwrap_err(),
            },
            RevecError::Serialize(serde_json::from_str::<String>("bad").unwrap_err()),
            RevecError::InvalidConfig("empty".into()),
        ];
        let msgs: std::collections::BTreeSet<String> =
            errors.iter().map(ToString::to_string).collect();
        assert_eq!(msgs.len(), errors.len());
    }
}
