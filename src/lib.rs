use thiserror::Error;

pub use onnx_pipeline::{ClassifyOptions, Hub, Label, Source, TranslateOptions};
pub use preset::{Preset, Variant};
pub use provider::{HubProvider, Output, Pipeline, Provider};
pub use runner::{Runner, Timing};
pub use sample::SAMPLE_SENTENCES;
pub use settings::Settings;
pub use task::{Invocation, LabelMap, Task, TaskKind};

pub mod cli;
mod preset;
mod provider;
mod runner;
mod sample;
mod settings;
mod task;
pub mod telemetry;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Pipeline(#[from] onnx_pipeline::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{pipeline} pipeline cannot run a {invocation} invocation")]
    InvocationMismatch {
        pipeline: &'static str,
        invocation: &'static str,
    },
    #[error("invalid {key} entry `{value}`")]
    Settings { key: &'static str, value: String },
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
