#![forbid(unsafe_code)]

//! Discovers intrinsic widening conversions from differential-testing logs.
//!
//! Testbeds that print identical output on every log are grouped into
//! equivalence classes; pairs inside a class become candidate conversions,
//! which a fixed sequence of filter stages narrows to one recommended target
//! per source and instruction-set family.

pub mod config;
pub mod configuration;
pub mod driver;
pub mod error;
pub mod events;
pub mod filters;
pub mod generator;
pub mod intrinsics;
pub mod log_parser;
pub mod refiner;
pub mod serialize;

pub use config::{OrientationPolicy, PipelineConfig};
pub use configuration::{Configuration, Layout};
pub use driver::{PipelineOutput, RunReport, run_pipeline, write_artifacts};
pub use error::RevecError;
pub use events::{PipelineContext, PipelineEvent};
pub use generator::ConversionPair;
pub use refiner::{EquivalenceMap, EquivalenceReport};
