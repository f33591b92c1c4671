use std::{env, path::PathBuf};

use onnx_pipeline::{Hub, Source};

use crate::{Error, Preset, Result};

pub const HUB_ENDPOINT: &str = "PIPEBENCH_HUB_ENDPOINT";
pub const REVISION: &str = "PIPEBENCH_REVISION";
pub const CACHE_DIR: &str = "PIPEBENCH_CACHE_DIR";
/// Comma separated `model=repo` or `model=repo#onnx_dir` entries.
pub const SOURCES: &str = "PIPEBENCH_SOURCES";

/// Environment overrides. Unset or empty variables keep the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub hub: Hub,
    /// Artifact repos replacing a preset's, keyed by benchmarked model id.
    pub sources: Vec<(String, Source)>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let mut hub = Hub::default();

        if let Some(endpoint) = var(HUB_ENDPOINT) {
            hub.endpoint = endpoint;
        }
        if let Some(revision) = var(REVISION) {
            hub.revision = revision;
        }
        hub.cache_dir = var(CACHE_DIR).map(PathBuf::from);

        let sources = match var(SOURCES) {
            Some(sources) => parse_sources(&sources)?,
            None => Vec::new(),
        };

        Ok(Self { hub, sources })
    }

    /// Redirects `preset`'s tasks to the configured sources. Returns the
    /// models that no task of the preset names.
    pub fn apply(&self, preset: &mut Preset) -> Vec<&str> {
        let mut unused = Vec::new();
        for (model, source) in &self.sources {
            if !preset.redirect(model, source) {
                unused.push(model.as_str());
            }
        }
        unused
    }
}

fn parse_sources(value: &str) -> Result<Vec<(String, Source)>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let invalid = || Error::Settings {
                key: SOURCES,
                value: entry.to_owned(),
            };
            let (model, target) = entry.split_once('=').ok_or_else(invalid)?;
            let (repo, onnx_dir) = match target.split_once('#') {
                Some((repo, dir)) => (repo, Some(dir)),
                None => (target, None),
            };
            if model.trim().is_empty() || repo.trim().is_empty() {
                return Err(invalid());
            }

            let source = Source::new(repo.trim());
            let source = match onnx_dir {
                Some(dir) => source.with_onnx_dir(dir.trim()),
                None => source,
            };
            Ok((model.trim().to_owned(), source))
        })
        .collect()
}
