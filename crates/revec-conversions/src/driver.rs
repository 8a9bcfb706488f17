#![forbid(unsafe_code)]

//! parse → refine → generate → filter → serialize.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{OrientationPolicy, PipelineConfig};
use crate::error::{ERROR_CODE_UNVERIFIABLE_SHAPE, RevecError};
use crate::events::{PipelineContext, PipelineEvent, success_event, warn_event};
use crate::filters::{FilterPipeline, StageReport};
use crate::generator::{ConversionPair, recommend_candidates};
use crate::intrinsics::IntrinsicCatalog;
use crate::log_parser::{LogEquivalences, LogParseStats, parse_log_files};
use crate::refiner::{EquivalenceMap, EquivalenceReport};
use crate::serialize::{conversion_records, write_json};

pub const RUN_REPORT_SCHEMA_VERSION: &str = "revec.conversions.run.report.v1";
pub const COMPONENT: &str = "revec_conversions_driver";

pub const EQUIVALENCES_FILE: &str = "test_equivalences.json";
pub const MISSED_FILE: &str = "test_missed.json";
pub const CONVERSIONS_FILE: &str = "test_conversions.json";
pub const RUN_REPORT_FILE: &str = "run_report.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSummary {
    pub source: String,
    pub groups: u64,
    pub testbeds: u64,
    pub stats: LogParseStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub logs: u64,
    pub refined_equivalences: u64,
    pub equivalence_classes: u64,
    pub missed: u64,
    pub candidate_pairs: u64,
    pub conversions: u64,
    pub warnings: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub schema_version: String,
    pub generated_at_utc: String,
    pub trace_id: String,
    pub decision_id: String,
    pub policy_id: String,
    pub component: String,
    pub orientation_policy: OrientationPolicy,
    pub family_order: Vec<String>,
    pub summary: RunSummary,
    pub logs: Vec<LogSummary>,
    pub stages: Vec<StageReport>,
    pub events: Vec<PipelineEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    pub equivalences: EquivalenceReport,
    pub conversions: Vec<ConversionPair>,
    pub report: RunReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub equivalences: PathBuf,
    pub missed: PathBuf,
    pub conversions: PathBuf,
    pub run_report: PathBuf,
}

/// Refines every parsed log into one equivalence map, in input order.
pub fn refine_logs(logs: &[LogEquivalences]) -> EquivalenceMap {
    let mut equivalences = EquivalenceMap::new();
    for log in logs {
        equivalences.refine(log.candidate_groups());
    }
    equivalences
}

/// Full run without touching the output folder.
///
/// The intrinsic catalog is only read when there is at least one candidate
/// pair, so an empty run needs no metadata.
pub fn run_pipeline(
    config: &PipelineConfig,
    context: &PipelineContext,
) -> Result<PipelineOutput, RevecError> {
    run_pipeline_with(config, context, |config| {
        IntrinsicCatalog::load(&config.intrinsics_path)
    })
}

pub fn run_pipeline_with_catalog(
    config: &PipelineConfig,
    context: &PipelineContext,
    catalog: IntrinsicCatalog,
) -> Result<PipelineOutput, RevecError> {
    run_pipeline_with(config, context, move |_| Ok(catalog))
}

fn run_pipeline_with<F>(
    config: &PipelineConfig,
    context: &PipelineContext,
    load_catalog: F,
) -> Result<PipelineOutput, RevecError>
where
    F: FnOnce(&PipelineConfig) -> Result<IntrinsicCatalog, RevecError>,
{
    config.validate()?;
    context.validate()?;
    let mut events = Vec::new();

    let parsed = parse_log_files(&config.logs, config.parallel)?;
    let logs: Vec<LogSummary> = parsed
        .iter()
        .map(|log| LogSummary {
            source: log.source.clone(),
            groups: log.groups.len() as u64,
            testbeds: log.testbed_count() as u64,
            stats: log.stats.clone(),
        })
        .collect();
    events.push(success_event(
        context,
        COMPONENT,
        "logs_parsed",
        format!("{} logs parsed", parsed.len()),
    ));

    let equivalence_map = refine_logs(&parsed);
    let refined_equivalences = equivalence_map.refined_count() as u64;
    events.push(success_event(
        context,
        COMPONENT,
        "equivalences_refined",
        format!("REFINED equivalences {refined_equivalences:6}"),
    ));

    let equivalences = equivalence_map.finalize();
    events.push(success_event(
        context,
        COMPONENT,
        "equivalences_finalized",
        format!(
            "{} equivalence classes, {} missed",
            equivalences.classes.len(),
            equivalences.missed.len()
        ),
    ));

    let candidates = recommend_candidates(&equivalences.classes)?;
    let candidate_pairs = candidates.len() as u64;
    events.push(success_event(
        context,
        COMPONENT,
        "candidates_generated",
        format!("{candidate_pairs} candidate conversion pairs"),
    ));

    let (conversions, stages) = if candidates.is_empty() {
        (Vec::new(), Vec::new())
    } else {
        let catalog = load_catalog(config)?;
        if catalog.is_empty() {
            events.push(warn_event(
                context,
                COMPONENT,
                "intrinsic_catalog_empty",
                ERROR_CODE_UNVERIFIABLE_SHAPE,
                "intrinsic catalog has no records; every candidate pair is unverifiable",
            ));
        } else {
            events.push(success_event(
                context,
                COMPONENT,
                "intrinsic_catalog_loaded",
                format!("{} intrinsics", catalog.len()),
            ));
        }
        let pipeline = FilterPipeline::standard(config, catalog);
        let outcome = pipeline.run(candidates, context);
        events.extend(outcome.events);
        (outcome.pairs, outcome.stage_reports)
    };
    events.push(success_event(
        context,
        COMPONENT,
        "conversions_recommended",
        format!("Found {} conversions", conversions.len()),
    ));

    let summary = RunSummary {
        logs: parsed.len() as u64,
        refined_equivalences,
        equivalence_classes: equivalences.classes.len() as u64,
        missed: equivalences.missed.len() as u64,
        candidate_pairs,
        conversions: conversions.len() as u64,
        warnings: events.iter().filter(|event| event.is_warning()).count() as u64,
    };

    let report = RunReport {
        schema_version: RUN_REPORT_SCHEMA_VERSION.to_string(),
        generated_at_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        trace_id: context.trace_id.clone(),
        decision_id: context.decision_id.clone(),
        policy_id: context.policy_id.clone(),
        component: COMPONENT.to_string(),
        orientation_policy: config.orientation_policy,
        family_order: config.family_order.clone(),
        summary,
        logs,
        stages,
        events,
    };

    Ok(PipelineOutput {
        equivalences,
        conversions,
        report,
    })
}

pub fn write_artifacts(
    output: &PipelineOutput,
    output_folder: &Path,
) -> Result<ArtifactPaths, RevecError> {
    let paths = ArtifactPaths {
        equivalences: output_folder.join(EQUIVALENCES_FILE),
        missed: output_folder.join(MISSED_FILE),
        conversions: output_folder.join(CONVERSIONS_FILE),
        run_report: output_folder.join(RUN_REPORT_FILE),
    };
    write_json(&paths.equivalences, &output.equivalences.classes, false)?;
    write_json(&paths.missed, &output.equivalences.missed, false)?;
    write_json(&paths.conversions, &conversion_records(&output.conversions), false)?;
    write_json(&paths.run_report, &output.report, true)?;
    Ok(paths)
}
