use std::fmt;

use onnx_pipeline::{
    ClassificationPipeline, ClassifyOptions, Source, TranslateOptions, TranslationPipeline,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Sentiment,
    LanguageId,
    Translation,
}

impl TaskKind {
    pub const fn title(self) -> &'static str {
        match self {
            Self::Sentiment => "Sentiment Analysis",
            Self::LanguageId => "Language Classification",
            Self::Translation => "Translation",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Options passed along with every input of a routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Classify(ClassifyOptions),
    Translate(TranslateOptions),
}

impl Invocation {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Classify(_) => "classification",
            Self::Translate(_) => "translation",
        }
    }
}

/// Fixed table from raw classifier label codes to readable codes. Labels
/// missing from the table pass through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelMap {
    entries: &'static [(&'static str, &'static str)],
}

impl LabelMap {
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    pub fn remap<'a>(&self, raw: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|(code, _)| *code == raw)
            .map_or(raw, |&(_, readable)| readable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub kind: TaskKind,
    /// Checkpoint being benchmarked, e.g. `facebook/nllb-200-distilled-600M`.
    pub model: String,
    /// Where the ONNX export of `model` is downloaded from. Defaults to `model` itself.
    pub source: Source,
    pub invocation: Invocation,
    pub label_map: Option<LabelMap>,
}

impl Task {
    fn new(kind: TaskKind, model: impl Into<String>, invocation: Invocation) -> Self {
        let model = model.into();
        Self {
            kind,
            source: Source::new(model.as_str()),
            model,
            invocation,
            label_map: None,
        }
    }

    pub fn sentiment(model: impl Into<String>) -> Self {
        Self::new(
            TaskKind::Sentiment,
            model,
            Invocation::Classify(ClassifyOptions::default()),
        )
    }

    /// Top label only, long inputs truncated.
    pub fn language_id(model: impl Into<String>) -> Self {
        Self::new(
            TaskKind::LanguageId,
            model,
            Invocation::Classify(ClassifyOptions {
                top_k: Some(1),
                truncation: true,
            }),
        )
    }

    pub fn translation(model: impl Into<String>, options: TranslateOptions) -> Self {
        Self::new(TaskKind::Translation, model, Invocation::Translate(options))
    }

    #[must_use]
    pub fn with_source(mut self, source: Source) -> Self {
        self.source = source;
        self
    }

    /// Hub files this task's pipeline is built from, relative to `source.repo`.
    pub fn files(&self) -> Vec<String> {
        match self.kind {
            TaskKind::Sentiment | TaskKind::LanguageId => {
                ClassificationPipeline::files(&self.source).to_vec()
            }
            TaskKind::Translation => TranslationPipeline::files(&self.source).to_vec(),
        }
    }

    #[must_use]
    pub fn with_label_map(mut self, label_map: LabelMap) -> Self {
        self.label_map = Some(label_map);
        self
    }

    pub fn label<'a>(&self, raw: &'a str) -> &'a str {
        self.label_map.map_or(raw, |map| map.remap(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: LabelMap = LabelMap::new(&[("LABEL_4", "en"), ("LABEL_7", "hi")]);

    #[test]
    fn remaps_known_codes() {
        assert_eq!(MAP.remap("LABEL_4"), "en");
        assert_eq!(MAP.remap("LABEL_7"), "hi");
    }

    #[test]
    fn unknown_codes_pass_through() {
        assert_eq!(MAP.remap("LABEL_0"), "LABEL_0");
        assert_eq!(MAP.remap("LABEL_44"), "LABEL_44");
        assert_eq!(MAP.remap(""), "");
    }

    #[test]
    fn task_without_map_keeps_raw_labels() {
        let task = Task::language_id("org/model");
        assert_eq!(task.label("LABEL_4"), "LABEL_4");
        assert_eq!(task.with_label_map(MAP).label("LABEL_4"), "en");
    }

    #[test]
    fn source_defaults_to_model_and_can_be_redirected() {
        let task = Task::sentiment("org/model");
        assert_eq!(task.source, Source::new("org/model"));

        let task = task.with_source(Source::new("mirror/model-onnx").with_onnx_dir(""));
        assert_eq!(task.model, "org/model");
        assert_eq!(task.files(), ["config.json", "tokenizer.json", "model.onnx"]);
    }

    #[test]
    fn language_id_requests_top_label_with_truncation() {
        let task = Task::language_id("org/model");
        assert_eq!(
            task.invocation,
            Invocation::Classify(ClassifyOptions {
                top_k: Some(1),
                truncation: true
            })
        );
    }
}
