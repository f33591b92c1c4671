use std::path::PathBuf;

use cached_path::Cache;

use crate::Result;

pub const DEFAULT_ENDPOINT: &str = "https://huggingface.co";
pub const DEFAULT_REVISION: &str = "main";

/// Where pretrained files are fetched from and cached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hub {
    pub endpoint: String,
    pub revision: String,
    /// Defaults to `<user cache dir>/pipebench`.
    pub cache_dir: Option<PathBuf>,
}

impl Default for Hub {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            revision: DEFAULT_REVISION.to_owned(),
            cache_dir: None,
        }
    }
}

/// A hub repo holding an ONNX export, and the directory its graphs sit in.
///
/// The repo is often a converted mirror of the checkpoint a task names, since
/// most original repos ship only PyTorch weights and no `tokenizer.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub repo: String,
    /// Empty when the graphs sit at the repo root.
    pub onnx_dir: String,
}

impl Source {
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            onnx_dir: "onnx".to_owned(),
        }
    }

    #[must_use]
    pub fn with_onnx_dir(mut self, onnx_dir: impl Into<String>) -> Self {
        self.onnx_dir = onnx_dir.into();
        self
    }

    pub fn graph(&self, file: &str) -> String {
        match self.onnx_dir.trim_matches('/') {
            "" => file.to_owned(),
            dir => format!("{dir}/{file}"),
        }
    }
}

impl Hub {
    pub fn url(&self, model: &str, file: &str) -> String {
        format!(
            "{}/{model}/resolve/{}/{file}",
            self.endpoint.trim_end_matches('/'),
            self.revision
        )
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub fn download(&self, model: &str, file: &str) -> Result<PathBuf> {
        let dir = self.ensure_cache_dir()?;
        let cache = Cache::builder().dir(dir).build()?;

        Ok(cache.cached_path(&self.url(model, file))?)
    }

    fn ensure_cache_dir(&self) -> std::io::Result<PathBuf> {
        let dir = match &self.cache_dir {
            Some(dir) => dir.clone(),
            None => {
                let mut dir = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
                dir.push("pipebench");
                dir
            }
        };
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}
