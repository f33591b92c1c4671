use std::fmt;

use onnx_pipeline::{Source, TranslateOptions};

use crate::task::{LabelMap, Task};

/// Raw codes of the light language classifier that have a readable name.
pub const LIGHT_LANGUAGE_LABELS: LabelMap = LabelMap::new(&[("LABEL_4", "en"), ("LABEL_7", "hi")]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Larger, more accurate models.
    Heavy,
    /// Smaller, faster models.
    Light,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Heavy => "Heavy",
            Self::Light => "Light",
        })
    }
}

/// The routines one benchmark run executes, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    variant: Variant,
    tasks: Vec<Task>,
}

impl Preset {
    pub const fn new(variant: Variant, tasks: Vec<Task>) -> Self {
        Self { variant, tasks }
    }

    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Heavy => Self::heavy(),
            Variant::Light => Self::light(),
        }
    }

    pub fn heavy() -> Self {
        Self::new(
            Variant::Heavy,
            vec![
                Task::sentiment("cardiffnlp/twitter-roberta-base-sentiment")
                    .with_source(Source::new("Xenova/twitter-roberta-base-sentiment")),
                Task::language_id("papluca/xlm-roberta-base-language-detection").with_source(
                    Source::new("protectai/xlm-roberta-base-language-detection-onnx").with_onnx_dir(""),
                ),
                // Every input is read as Hindi, the English samples included.
                Task::translation(
                    "facebook/nllb-200-distilled-600M",
                    TranslateOptions {
                        src_lang: Some("hin_Deva".to_owned()),
                        tgt_lang: Some("eng_Latn".to_owned()),
                        max_length: Some(128),
                    },
                )
                .with_source(Source::new("Xenova/nllb-200-distilled-600M")),
            ],
        )
    }

    pub fn light() -> Self {
        Self::new(
            Variant::Light,
            vec![
                Task::sentiment("distilbert-base-uncased-finetuned-sst-2-english")
                    .with_source(Source::new("Xenova/distilbert-base-uncased-finetuned-sst-2-english")),
                // Fetched from the checkpoint repo itself unless PIPEBENCH_SOURCES redirects it.
                Task::language_id(
                    "niharrp9/distilbert-base-multilingual-cased-finetuned-language-identification",
                )
                .with_label_map(LIGHT_LANGUAGE_LABELS),
                Task::translation("Helsinki-NLP/opus-mt-mul-en", TranslateOptions::default())
                    .with_source(Source::new("Xenova/opus-mt-mul-en")),
            ],
        )
    }

    /// Downloads `model`'s artifacts from `source` instead. Returns whether any task names `model`.
    pub fn redirect(&mut self, model: &str, source: &Source) -> bool {
        let mut found = false;
        for task in self.tasks.iter_mut().filter(|task| task.model == model) {
            task.source = source.clone();
            found = true;
        }
        found
    }

    pub const fn variant(&self) -> Variant {
        self.variant
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }
}
