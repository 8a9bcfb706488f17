#![forbid(unsafe_code)]

//! Ordered stages that turn raw candidate pairs into the conversion table.
//!
//! Every stage consumes the whole collection and returns a new one. The
//! pipeline is a plain list of stages applied in sequence; counts before and
//! after each stage are recorded.

pub mod duplicate_targets;
pub mod exception_semantics;
pub mod orientation;
pub mod parameter_shape;
pub mod redundant_repetition;

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::events::{PipelineContext, PipelineEvent, success_event, warn_event};
use crate::generator::ConversionPair;
use crate::intrinsics::IntrinsicCatalog;

pub use duplicate_targets::DuplicateTargetFilter;
pub use exception_semantics::ExceptionSemanticsFilter;
pub use orientation::OrientationStage;
pub use parameter_shape::ParameterShapeFilter;
pub use redundant_repetition::RedundantRepetitionFilter;

pub const COMPONENT: &str = "filter_pipeline";

/// Collects warnings raised while a stage runs.
#[derive(Debug)]
pub struct StageContext<'a> {
    context: &'a PipelineContext,
    stage: &'static str,
    events: Vec<PipelineEvent>,
}

impl<'a> StageContext<'a> {
    pub fn new(context: &'a PipelineContext, stage: &'static str) -> Self {
        Self {
            context,
            stage,
            events: Vec::new(),
        }
    }

    pub fn warn(&mut self, event: &str, error_code: &str, detail: impl Into<String>) {
        let component = format!("{COMPONENT}.{}", self.stage);
        self.events
            .push(warn_event(self.context, &component, event, error_code, detail));
    }

    pub fn warning_count(&self) -> usize {
        self.events.len()
    }

    pub fn into_events(self) -> Vec<PipelineEvent> {
        self.events
    }
}

pub trait ConversionStage: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, pairs: Vec<ConversionPair>, cx: &mut StageContext<'_>) -> Vec<ConversionPair>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: String,
    pub pairs_in: u64,
    pub pairs_out: u64,
    pub warnings: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    pub pairs: Vec<ConversionPair>,
    pub stage_reports: Vec<StageReport>,
    pub events: Vec<PipelineEvent>,
}

pub struct FilterPipeline {
    stages: Vec<Box<dyn ConversionStage>>,
}

impl FilterPipeline {
    pub fn new(stages: Vec<Box<dyn ConversionStage>>) -> Self {
        Self { stages }
    }

    /// exception_semantics → orientation → redundant_repetition →
    /// parameter_shape → duplicate_targets.
    pub fn standard(config: &PipelineConfig, catalog: IntrinsicCatalog) -> Self {
        Self::new(vec![
            Box::new(ExceptionSemanticsFilter),
            Box::new(OrientationStage::new(
                config.family_order.clone(),
                config.orientation_policy,
            )),
            Box::new(RedundantRepetitionFilter),
            Box::new(ParameterShapeFilter::new(catalog)),
            Box::new(DuplicateTargetFilter),
        ])
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn run(&self, mut pairs: Vec<ConversionPair>, context: &PipelineContext) -> FilterOutcome {
        let mut stage_reports = Vec::with_capacity(self.stages.len());
        let mut events = Vec::new();

        for stage in &self.stages {
            let pairs_in = pairs.len() as u64;
            let mut cx = StageContext::new(context, stage.name());
            pairs = stage.apply(pairs, &mut cx);
            let pairs_out = pairs.len() as u64;
            let warnings = cx.warning_count() as u64;

            events.extend(cx.into_events());
            events.push(success_event(
                context,
                COMPONENT,
                stage.name(),
                format!("FILTER ({}): {pairs_in} => {pairs_out} conversion pairs", stage.name()),
            ));
            stage_reports.push(StageReport {
                stage: stage.name().to_string(),
                pairs_in,
                pairs_out,
                warnings,
            });
        }

        FilterOutcome {
            pairs,
            stage_reports,
            events,
        }
    }
}

impl std::fmt::Debug for FilterPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterPipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}
