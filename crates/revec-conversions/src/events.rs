#![forbid(unsafe_code)]

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::RevecError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineContext {
    pub trace_id: String,
    pub decision_id: String,
    pub policy_id: String,
}

impl PipelineContext {
    pub fn new(
        trace_id: impl Into<String>,
        decision_id: impl Into<String>,
        policy_id: impl Into<String>,
    ) -> Self {
        Self {
            trace_id: trace_id.into(),
            decision_id: decision_id.into(),
            policy_id: policy_id.into(),
        }
    }

    pub fn with_defaults() -> Self {
        let timestamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        Self {
            trace_id: format!("trace-revec-conversions-{timestamp}"),
            decision_id: format!("decision-revec-conversions-{timestamp}"),
            policy_id: "policy-revec-conversions-v1".to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), RevecError> {
        if self.trace_id.trim().is_empty() {
            return Err(RevecError::InvalidConfig(
                "run context trace_id must not be empty".to_string(),
            ));
        }
        if self.decision_id.trim().is_empty() {
            return Err(RevecError::InvalidConfig(
                "run context decision_id must not be empty".to_string(),
            ));
        }
        if self.policy_id.trim().is_empty() {
            return Err(RevecError::InvalidConfig(
                "run context policy_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub trace_id: String,
    pub decision_id: String,
    pub policy_id: String,
    pub component: String,
    pub event: String,
    pub outcome: String,
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl PipelineEvent {
    pub fn is_warning(&self) -> bool {
        self.outcome == "warn"
    }
}

pub fn success_event(
    context: &PipelineContext,
    component: &str,
    event: &str,
    detail: impl Into<String>,
) -> PipelineEvent {
    PipelineEvent {
        trace_id: context.trace_id.clone(),
        decision_id: context.decision_id.clone(),
        policy_id: context.policy_id.clone(),
        component: component.to_string(),
        event: event.to_string(),
        outcome: "pass".to_string(),
        error_code: None,
        detail: Some(detail.into()),
    }
}

pub fn warn_event(
    context: &PipelineContext,
    component: &str,
    event: &str,
    error_code: &str,
    detail: impl Into<String>,
) -> PipelineEvent {
    PipelineEvent {
        trace_id: context.trace_id.clone(),
        decision_id: context.decision_id.clone(),
        policy_id: context.policy_id.clone(),
        component: component.to_string(),
        event: event.to_string(),
        outcome: "warn".to_string(),
        error_code: Some(error_code.to_string()),
        detail: Some(detail.into()),
    }
}

pub fn failure_event(
    context: &PipelineContext,
    component: &str,
    event: &str,
    error: &RevecError,
) -> PipelineEvent {
    PipelineEvent {
        trace_id: context.trace_id.clone(),
        decision_id: context.decision_id.clone(),
        policy_id: context.policy_id.clone(),
        component: component.to_string(),
        event: event.to_string(),
        outcome: "fail".to_string(),
        error_code: Some(error.error_code().to_string()),
        detail: Some(error.to_string()),
    }
}
