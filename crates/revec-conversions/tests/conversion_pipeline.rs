use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use revec_conversions::config::{OrientationPolicy, PipelineConfig};
use revec_conversions::configuration::{Configuration, Layout};
use revec_conversions::driver::{
    CONVERSIONS_FILE, PipelineOutput, refine_logs, run_pipeline, run_pipeline_with_catalog,
    write_artifacts,
};
use revec_conversions::events::PipelineContext;
use revec_conversions::filters::{ExceptionSemanticsFilter, FilterPipeline};
use revec_conversions::generator::{ConversionPair, recommend_candidates};
use revec_conversions::intrinsics::{IntrinsicCatalog, IntrinsicRecord};
use revec_conversions::log_parser::parse_log;
use revec_conversions::serialize::load_conversions;

fn testbed(id: &str, layout: &str, repeat: u32) -> String {
    format!("tests/{id}/combo_{layout}/repeat_{repeat}/testbed")
}

fn log_text(entries: &[(&str, &str, u32, &str)]) -> String {
    let mut text = String::new();
    for (id, layout, repeat, output) in entries {
        text.push_str(&format!("TEST START {}\n", testbed(id, layout, *repeat)));
        for line in output.lines() {
            text.push_str(line);
            text.push('\n');
        }
        text.push_str("TEST STOP\n");
    }
    text
}

fn context() -> PipelineContext {
    PipelineContext::new(
        "trace-revec-test",
        "decision-revec-test",
        "policy-revec-test",
    )
}

fn catalog(entries: &[(&str, &[&str])]) -> IntrinsicCatalog {
    let mut records = BTreeMap::new();
    for (id, params) in entries {
        records.insert(
            (*id).to_string(),
            IntrinsicRecord {
                param_types: params.iter().map(|p| (*p).to_string()).collect(),
                ret_types: Vec::new(),
            },
        );
    }
    IntrinsicCatalog::new(records)
}

fn write_logs(dir: &Path, logs: &[String]) -> Vec<PathBuf> {
    logs.iter()
        .enumerate()
        .map(|(index, text)| {
            let path = dir.join(format!("log_{index}.txt"));
            fs::write(&path, text).expect("log should be writable");
            path
        })
        .collect()
}

fn run_with(logs: &[String], catalog: IntrinsicCatalog) -> PipelineOutput {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = PipelineConfig::with_defaults();
    config.logs = write_logs(dir.path(), logs);
    config.output_folder = dir.path().join("out");
    run_pipeline_with_catalog(&config, &context(), catalog).expect("pipeline should succeed")
}

// ============================================================================
// Worked scenarios
// ============================================================================

#[test]
fn matching_testbeds_across_two_logs_yield_one_candidate() {
    let first = log_text(&[
        ("int_x86_sse2_pavg_b", "VERTICAL", 1, "01 02\n03"),
        ("int_x86_avx2_pavg_b", "VERTICAL", 1, "01 02\n03"),
    ]);
    let second = log_text(&[
        ("int_x86_avx2_pavg_b", "VERTICAL", 1, "ff"),
        ("int_x86_sse2_pavg_b", "VERTICAL", 1, "ff"),
    ]);
    let logs = [
        parse_log(Cursor::new(first), "first").expect("first log parses"),
        parse_log(Cursor::new(second), "second").expect("second log parses"),
    ];

    let report = refine_logs(&logs).finalize();
    assert_eq!(
        report.classes,
        vec![vec![
            testbed("int_x86_avx2_pavg_b", "VERTICAL", 1),
            testbed("int_x86_sse2_pavg_b", "VERTICAL", 1),
        ]]
    );
    assert!(report.missed.is_empty());

    let candidates = recommend_candidates(&report.classes).expect("ids parse");
    assert_eq!(candidates.len(), 1);
    let ids: BTreeSet<&str> = [
        candidates[0].source.id.as_str(),
        candidates[0].target.id.as_str(),
    ]
    .into_iter()
    .collect();
    assert_eq!(
        ids,
        BTreeSet::from(["int_x86_avx2_pavg_b", "int_x86_sse2_pavg_b"])
    );
}

#[test]
fn scaled_pair_is_dropped_when_its_reduction_is_present() {
    let log = log_text(&[
        ("int_x86_sse2_pavg_b", "VERTICAL", 4, "aa"),
        ("int_x86_avx2_pavg_b", "VERTICAL", 2, "aa"),
        ("int_x86_sse2_pavg_b", "VERTICAL", 2, "bb"),
        ("int_x86_avx2_pavg_b", "VERTICAL", 1, "bb"),
    ]);
    let output = run_with(
        &[log],
        catalog(&[
            ("int_x86_sse2_pavg_b", &["llvm_v16i8_ty", "llvm_v16i8_ty"]),
            ("int_x86_avx2_pavg_b", &["llvm_v32i8_ty", "llvm_v32i8_ty"]),
        ]),
    );

    assert_eq!(output.report.summary.candidate_pairs, 2);
    assert_eq!(
        output.conversions,
        vec![ConversionPair::new(
            Configuration::new("int_x86_sse2_pavg_b", Layout::Interleaved, 2),
            Configuration::new("int_x86_avx2_pavg_b", Layout::Interleaved, 1),
        )]
    );
    let redundant = output
        .report
        .stages
        .iter()
        .find(|stage| stage.stage == "redundant_repetition")
        .expect("stage report");
    assert_eq!((redundant.pairs_in, redundant.pairs_out), (2, 1));
}

#[test]
fn comi_ucomi_cross_pair_is_removed_and_other_pairs_survive() {
    let class = vec![
        testbed("int_x86_sse_comieq_ss", "VERTICAL", 2),
        testbed("int_x86_sse_ucomieq_ss", "VERTICAL", 2),
        testbed("int_x86_sse2_comieq_sd", "VERTICAL", 1),
    ];
    let candidates = recommend_candidates(&[class]).expect("ids parse");
    assert_eq!(candidates.len(), 3);

    let pipeline = FilterPipeline::new(vec![Box::new(ExceptionSemanticsFilter)]);
    let outcome = pipeline.run(candidates, &context());
    assert_eq!(outcome.pairs.len(), 2);
    for pair in &outcome.pairs {
        assert_eq!(pair.target.id, "int_x86_sse2_comieq_sd");
    }
}

#[test]
fn both_layouts_of_one_configuration_collapse_to_any() {
    let class = vec![
        testbed("int_x86_sse2_pavg_b", "HORIZONTAL", 2),
        testbed("int_x86_sse2_pavg_b", "VERTICAL", 2),
        testbed("int_x86_avx2_pavg_b", "VERTICAL", 1),
    ];
    let candidates = recommend_candidates(&[class]).expect("ids parse");
    assert_eq!(
        candidates,
        vec![ConversionPair::new(
            Configuration::new("int_x86_sse2_pavg_b", Layout::Any, 2),
            Configuration::new("int_x86_avx2_pavg_b", Layout::Interleaved, 1),
        )]
    );
}

// ============================================================================
// Invariants over a realistic run
// ============================================================================

fn mixed_logs() -> Vec<String> {
    let common = [
        ("int_x86_sse2_pavg_b", "VERTICAL", 2, "10 20"),
        ("int_x86_sse2_pavg_b", "HORIZONTAL", 2, "10 20"),
        ("int_x86_avx2_pavg_b", "VERTICAL", 1, "10 20"),
        ("int_x86_avx512_pavg_b", "VERTICAL", 1, "10 20"),
        ("int_x86_sse2_psll_q", "VERTICAL", 1, "3"),
        ("int_x86_sse2_pslli_q", "VERTICAL", 1, "3"),
        ("int_x86_sse_max_ps", "VERTICAL", 1, "7"),
        ("int_x86_avx_max_ps", "VERTICAL", 1, "7"),
        ("int_x86_sse_comilt_ss", "VERTICAL", 1, "1"),
        ("int_x86_sse_ucomilt_ss", "VERTICAL", 1, "1"),
    ];
    let mut second = common.to_vec();
    second.reverse();
    // psll_q and pslli_q diverge on the second input.
    for entry in &mut second {
        if entry.0 == "int_x86_sse2_pslli_q" {
            entry.3 = "4";
        }
    }
    vec![log_text(&common), log_text(&second)]
}

fn mixed_catalog() -> IntrinsicCatalog {
    catalog(&[
        ("int_x86_sse2_pavg_b", &["llvm_v16i8_ty", "llvm_v16i8_ty"]),
        ("int_x86_avx2_pavg_b", &["llvm_v32i8_ty", "llvm_v32i8_ty"]),
        ("int_x86_avx512_pavg_b", &["llvm_v64i8_ty", "llvm_v64i8_ty"]),
        ("int_x86_sse_max_ps", &["llvm_v4f32_ty", "llvm_v4f32_ty"]),
        ("int_x86_avx_max_ps", &["llvm_v8f32_ty", "llvm_v8f32_ty"]),
        ("int_x86_sse_comilt_ss", &["llvm_v4f32_ty", "llvm_v4f32_ty"]),
        ("int_x86_sse_ucomilt_ss", &["llvm_v4f32_ty", "llvm_v4f32_ty"]),
    ])
}

#[test]
fn every_conversion_widens_or_keeps_repeat() {
    let output = run_with(&mixed_logs(), mixed_catalog());
    assert!(!output.conversions.is_empty());
    for pair in &output.conversions {
        assert!(pair.source.repeat >= pair.target.repeat, "{pair}");
    }
}

#[test]
fn no_source_has_two_targets_in_one_family() {
    let output = run_with(&mixed_logs(), mixed_catalog());
    let mut seen = BTreeSet::new();
    for pair in &output.conversions {
        let key = (pair.source.clone(), pair.target.instruction_set().to_string());
        assert!(seen.insert(key), "duplicate family target for {pair}");
    }
}

#[test]
fn mixed_run_recommends_expected_table() {
    let output = run_with(&mixed_logs(), mixed_catalog());
    let pavg_any = Configuration::new("int_x86_sse2_pavg_b", Layout::Any, 2);
    let avx2_pavg = Configuration::new("int_x86_avx2_pavg_b", Layout::Interleaved, 1);
    let avx512_pavg = Configuration::new("int_x86_avx512_pavg_b", Layout::Interleaved, 1);
    assert_eq!(
        output.conversions,
        vec![
            ConversionPair::new(avx2_pavg.clone(), avx512_pavg.clone()),
            ConversionPair::new(pavg_any.clone(), avx2_pavg),
            ConversionPair::new(pavg_any, avx512_pavg),
            ConversionPair::new(
                Configuration::new("int_x86_sse_max_ps", Layout::Interleaved, 1),
                Configuration::new("int_x86_avx_max_ps", Layout::Interleaved, 1),
            ),
        ]
    );
    // psll_q and pslli_q split on the second log.
    assert!(
        output
            .equivalences
            .missed
            .contains(&testbed("int_x86_sse2_psll_q", "VERTICAL", 1))
    );
}

#[test]
fn equal_repeat_pairs_warn_and_drop_under_report_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = PipelineConfig::with_defaults();
    config.logs = write_logs(dir.path(), &mixed_logs());
    config.orientation_policy = OrientationPolicy::ReportOnly;
    let output = run_pipeline_with_catalog(&config, &context(), mixed_catalog())
        .expect("pipeline should succeed");

    assert!(
        output
            .conversions
            .iter()
            .all(|pair| pair.source.repeat > pair.target.repeat)
    );
    let orientation_warnings = output
        .report
        .events
        .iter()
        .filter(|event| event.is_warning() && event.event == "unclear_conversion_direction")
        .count();
    assert!(orientation_warnings >= 2);
    assert!(output.report.summary.warnings >= orientation_warnings as u64);
}

#[test]
fn stage_events_carry_the_run_context() {
    let output = run_with(&mixed_logs(), mixed_catalog());
    let stage_lines: Vec<&str> = output
        .report
        .events
        .iter()
        .filter(|event| event.component == "filter_pipeline")
        .filter_map(|event| event.detail.as_deref())
        .collect();
    assert_eq!(stage_lines.len(), 5);
    assert!(stage_lines[0].starts_with("FILTER (exception_semantics): "));
    assert!(stage_lines[4].starts_with("FILTER (duplicate_targets): "));
    for event in &output.report.events {
        assert_eq!(event.trace_id, "trace-revec-test");
        assert_eq!(event.decision_id, "decision-revec-test");
        assert_eq!(event.policy_id, "policy-revec-test");
    }
}

#[test]
fn written_table_reloads_to_the_same_pairs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = run_with(&mixed_logs(), mixed_catalog());
    write_artifacts(&output, dir.path()).expect("artifacts should be written");
    let reloaded = load_conversions(&dir.path().join(CONVERSIONS_FILE)).expect("table reloads");
    assert_eq!(reloaded, output.conversions);
}

#[test]
fn missing_catalog_fails_only_when_pairs_need_it() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = PipelineConfig::with_defaults();
    config.logs = write_logs(dir.path(), &mixed_logs());
    config.intrinsics_path = dir.path().join("absent.json");
    let err = run_pipeline(&config, &context()).expect_err("catalog is required");
    assert_eq!(err.error_code(), "RC-IO-0001");

    config.logs.clear();
    let output = run_pipeline(&config, &context()).expect("empty run needs no catalog");
    assert!(output.conversions.is_empty());
}
