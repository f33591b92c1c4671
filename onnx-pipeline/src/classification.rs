use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};
use tokenizers::{EncodeInput, Encoding, Tokenizer, TruncationParams};

use crate::{
    graph::{self, Model},
    Error, Result,
};

/// Longest input any of the supported encoders accept, special tokens included.
const MAX_INPUT_TOKENS: usize = 512;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub label: String,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyOptions {
    /// Number of labels to return, best first. `None` returns the single best label.
    pub top_k: Option<usize>,
    /// Cut inputs down to the model's maximum length instead of failing on them.
    pub truncation: bool,
}

#[derive(Debug, Deserialize)]
struct Config {
    id2label: HashMap<i64, String>,
    #[serde(default = "default_max_position_embeddings")]
    max_position_embeddings: usize,
}

const fn default_max_position_embeddings() -> usize {
    MAX_INPUT_TOKENS
}

/// RoBERTa-style configs count two offset positions, so the cap stays at 512.
const fn truncation_length(max_position_embeddings: usize) -> usize {
    if max_position_embeddings < MAX_INPUT_TOKENS {
        max_position_embeddings
    } else {
        MAX_INPUT_TOKENS
    }
}

/// The same tokenizer twice: as shipped, and capped at the model's input length.
struct Encoder {
    plain: Tokenizer,
    truncating: Tokenizer,
}

impl Encoder {
    fn new(mut tokenizer: Tokenizer, max_length: usize) -> Self {
        tokenizer.with_truncation(None);
        let mut truncating = tokenizer.clone();
        truncating.with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }));

        Self {
            plain: tokenizer,
            truncating,
        }
    }

    fn encode(&self, sentence: &str, truncation: bool) -> Result<Encoding> {
        let tokenizer = if truncation {
            &self.truncating
        } else {
            &self.plain
        };
        Ok(tokenizer.encode(EncodeInput::Single(sentence.into()), true)?)
    }
}

/// Sequence classification over an ONNX export, e.g. sentiment or language identification.
pub struct ClassificationPipeline {
    encoder: Encoder,
    config: Config,
    model: Model,
}

impl ClassificationPipeline {
    /// Hub files a classifier is built from: config, tokenizer, graph.
    #[cfg(feature = "remote")]
    pub fn files(source: &crate::Source) -> [String; 3] {
        [
            "config.json".to_owned(),
            "tokenizer.json".to_owned(),
            source.graph("model.onnx"),
        ]
    }

    pub fn from_files(
        config: impl AsRef<Path>,
        tokenizer: impl AsRef<Path>,
        model: impl AsRef<Path>,
    ) -> Result<Self> {
        let config: Config = serde_json::from_reader(BufReader::new(File::open(config)?))?;
        let encoder = Encoder::new(
            Tokenizer::from_file(tokenizer)?,
            truncation_length(config.max_position_embeddings),
        );

        Ok(Self {
            encoder,
            config,
            model: graph::load(model)?,
        })
    }

    #[cfg(feature = "remote")]
    pub fn from_pretrained(model: impl AsRef<str>) -> Result<Self> {
        Self::from_source(&crate::Hub::default(), &crate::Source::new(model.as_ref()))
    }

    #[cfg(feature = "remote")]
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(hub), fields(repo = %source.repo)))]
    pub fn from_source(hub: &crate::Hub, source: &crate::Source) -> Result<Self> {
        let [config, tokenizer, model] = Self::files(source);

        Self::from_files(
            hub.download(&source.repo, &config)?,
            hub.download(&source.repo, &tokenizer)?,
            hub.download(&source.repo, &model)?,
        )
    }

    pub fn predict(&self, sentence: impl AsRef<str>, options: ClassifyOptions) -> Result<Vec<Label>> {
        let input = self.encoder.encode(sentence.as_ref(), options.truncation)?;

        let outputs = graph::run_named(
            &self.model,
            vec![
                ("input_ids", graph::row(input.get_ids().iter().map(|&x| x as i64))?),
                (
                    "attention_mask",
                    graph::row(input.get_attention_mask().iter().map(|&x| x as i64))?,
                ),
                (
                    "token_type_ids",
                    graph::row(input.get_type_ids().iter().map(|&x| x as i64))?,
                ),
            ],
        )?;

        let logits = outputs.first().ok_or(Error::EmptyOutput)?.to_array_view::<f32>()?;
        let labels = rank(logits.iter().copied(), options.top_k.unwrap_or(1))
            .into_iter()
            .map(|(id, score)| Label {
                label: self.label(id),
                score,
            })
            .collect();

        Ok(labels)
    }

    fn label(&self, id: i64) -> String {
        self.config
            .id2label
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("LABEL_{id}"))
    }
}

/// Softmax over `logits`, returning the `top_k` best `(class id, probability)` pairs.
fn rank(logits: impl IntoIterator<Item = f32>, top_k: usize) -> Vec<(i64, f32)> {
    let logits: Vec<f32> = logits.into_iter().collect();
    let max = logits.iter().copied().fold(f32::MIN, f32::max);

    let mut sum = 0.;
    let mut scores: Vec<(i64, f32)> = logits
        .iter()
        .enumerate()
        .map(|(i, z)| {
            let z = (z - max).exp();
            sum += z;
            (i as i64, z)
        })
        .collect();

    for (_, score) in &mut scores {
        *score /= sum;
    }

    // stable, so ties keep class order
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));
    scores.truncate(top_k);
    scores
}
