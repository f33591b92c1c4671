use onnx_pipeline::{ClassificationPipeline, Hub, Label, TranslationPipeline};
use tracing::info;

use crate::{
    task::{Invocation, Task, TaskKind},
    Error, Result,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Best first.
    Labels(Vec<Label>),
    Translation(String),
}

/// An acquired, ready to run inference pipeline.
pub trait Pipeline {
    fn run(&mut self, input: &str, invocation: &Invocation) -> Result<Output>;
}

/// Materialises the pipeline a task names. Acquisition is what the loading
/// time measures: download, deserialisation and graph optimisation.
pub trait Provider {
    fn acquire(&mut self, task: &Task) -> Result<Box<dyn Pipeline>>;
}

/// Fetches each task's ONNX export from the model hub, from `Task::source`.
#[derive(Debug, Clone, Default)]
pub struct HubProvider {
    hub: Hub,
}

impl HubProvider {
    pub const fn new(hub: Hub) -> Self {
        Self { hub }
    }
}

impl Provider for HubProvider {
    fn acquire(&mut self, task: &Task) -> Result<Box<dyn Pipeline>> {
        info!(model = %task.model, repo = %task.source.repo, kind = %task.kind, "acquiring pipeline");

        let pipeline: Box<dyn Pipeline> = match task.kind {
            TaskKind::Sentiment | TaskKind::LanguageId => {
                Box::new(ClassificationPipeline::from_source(&self.hub, &task.source)?)
            }
            TaskKind::Translation => {
                Box::new(TranslationPipeline::from_source(&self.hub, &task.source)?)
            }
        };
        Ok(pipeline)
    }
}

impl Pipeline for ClassificationPipeline {
    fn run(&mut self, input: &str, invocation: &Invocation) -> Result<Output> {
        match invocation {
            Invocation::Classify(options) => Ok(Output::Labels(self.predict(input, *options)?)),
            other => Err(Error::InvocationMismatch {
                pipeline: "classification",
                invocation: other.name(),
            }),
        }
    }
}

impl Pipeline for TranslationPipeline {
    fn run(&mut self, input: &str, invocation: &Invocation) -> Result<Output> {
        match invocation {
            Invocation::Translate(options) => Ok(Output::Translation(self.translate(input, options)?)),
            other => Err(Error::InvocationMismatch {
                pipeline: "translation",
                invocation: other.name(),
            }),
        }
    }
}
