#![forbid(unsafe_code)]

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use revec_conversions::config::{OrientationPolicy, PipelineConfig};
use revec_conversions::driver::{PipelineOutput, run_pipeline, write_artifacts};
use revec_conversions::events::{PipelineContext, failure_event};

/// Recommend intrinsic widening conversions from testbed execution logs.
#[derive(Parser, Debug)]
#[command(name = "revec_find_conversions")]
#[command(version, about, long_about = None)]
#[command(after_help = "Examples:
  revec_find_conversions --log run1.log --log run2.log --output-folder out
  revec_find_conversions --config pipeline.json --json
")]
struct Cli {
    /// Execution logs to refine against (`--log a.log b.log` or repeated)
    #[arg(long = "log", value_name = "PATH", num_args = 1..)]
    logs: Vec<PathBuf>,

    /// Folder receiving test_equivalences.json, test_missed.json,
    /// test_conversions.json and run_report.json
    #[arg(long, value_name = "DIR")]
    output_folder: Option<PathBuf>,

    /// Intrinsic catalog (ParamTypes/RetTypes per intrinsic id)
    #[arg(long, value_name = "PATH")]
    intrinsics: Option<PathBuf>,

    /// JSON pipeline config; flags override its values
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Direction rule for equal-repeat pairs
    #[arg(long, value_parser = ["generational_order", "report_only"])]
    orientation_policy: Option<String>,

    /// Instruction-set families, legacy first (comma-separated)
    #[arg(long, value_delimiter = ',')]
    family_order: Option<Vec<String>>,

    /// Parse logs one at a time
    #[arg(long)]
    sequential: bool,

    #[arg(long)]
    trace_id: Option<String>,

    #[arg(long)]
    decision_id: Option<String>,

    #[arg(long)]
    policy_id: Option<String>,

    /// Print the run report instead of the summary
    #[arg(long)]
    json: bool,

    /// Echo structured events to stderr as JSON lines
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::with_defaults(),
        };
        if !self.logs.is_empty() {
            config.logs = self.logs.clone();
        }
        if let Some(folder) = &self.output_folder {
            config.output_folder = folder.clone();
        }
        if let Some(path) = &self.intrinsics {
            config.intrinsics_path = path.clone();
        }
        if let Some(policy) = &self.orientation_policy {
            config.orientation_policy = policy.parse::<OrientationPolicy>()?;
        }
        if let Some(order) = &self.family_order {
            config.family_order = order.clone();
        }
        if self.sequential {
            config.parallel = false;
        }
        config.validate()?;
        Ok(config)
    }

    fn context(&self) -> PipelineContext {
        let mut context = PipelineContext::with_defaults();
        if let Some(value) = &self.trace_id {
            context.trace_id = value.clone();
        }
        if let Some(value) = &self.decision_id {
            context.decision_id = value.clone();
        }
        if let Some(value) = &self.policy_id {
            context.policy_id = value.clone();
        }
        context
    }
}

fn main() {
    match run() {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(error) => {
            eprintln!("{error}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32, Box<dyn Error>> {
    let cli = Cli::parse();
    let config = cli.pipeline_config()?;
    let context = cli.context();

    let output = match run_pipeline(&config, &context) {
        Ok(output) => output,
        Err(error) => {
            if cli.verbose {
                let event = failure_event(&context, "revec_find_conversions", "run_failed", &error);
                eprintln!("{}", serde_json::to_string(&event)?);
            }
            return Err(error.into());
        }
    };
    if cli.verbose {
        for event in &output.report.events {
            eprintln!("{}", serde_json::to_string(event)?);
        }
    }

    let paths = write_artifacts(&output, &config.output_folder)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&output.report)?);
    } else {
        print_summary(&output);
        println!("artifacts: {}", paths.run_report.display());
    }
    Ok(0)
}

fn print_summary(output: &PipelineOutput) {
    let summary = &output.report.summary;
    println!("revec_find_conversions");
    println!("  trace_id:              {}", output.report.trace_id);
    println!("  logs:                  {}", summary.logs);
    println!("  refined equivalences:  {}", summary.refined_equivalences);
    println!("  equivalence classes:   {}", summary.equivalence_classes);
    println!("  missed testbeds:       {}", summary.missed);
    println!("  candidate pairs:       {}", summary.candidate_pairs);
    for stage in &output.report.stages {
        println!(
            "  FILTER ({}): {} => {} conversion pairs",
            stage.stage, stage.pairs_in, stage.pairs_out
        );
    }
    println!("  warnings:              {}", summary.warnings);
    println!("Found {} conversions", summary.conversions);
    for pair in &output.conversions {
        println!("    {pair}");
    }
}
