use thiserror::Error;
use tract_onnx::tract_hir::tract_ndarray::ShapeError;

pub use classification::{ClassificationPipeline, ClassifyOptions, Label};
#[cfg(feature = "remote")]
pub use remote::{Hub, Source};
pub use translation::{TranslateOptions, TranslationPipeline};

mod classification;
mod graph;
#[cfg(feature = "remote")]
mod remote;
mod translation;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "remote")]
    #[cfg_attr(feature = "remote", error("download failed: {0}"))]
    Download(#[from] cached_path::Error),
    #[error("invalid model config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("onnx graph error: {0}")]
    Graph(#[from] tract_onnx::tract_core::anyhow::Error),
    #[error("tokenizer error: {0}")]
    Tokenizer(String),
    #[error("shape error: {0}")]
    Shape(#[from] ShapeError),
    #[error("graph expects input `{0}` which the pipeline does not provide")]
    MissingInput(String),
    #[error("token `{0}` is not in the vocabulary")]
    UnknownToken(String),
    #[error("model produced no output")]
    EmptyOutput,
    #[error("unexpected output shape {0:?}")]
    UnexpectedShape(Vec<usize>),
}

impl From<Box<dyn std::error::Error + Send + Sync>> for Error {
    fn from(e: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Tokenizer(e.to_string())
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
