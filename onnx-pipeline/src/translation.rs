use std::{fs::File, io::BufReader, path::Path};

use serde::Deserialize;
use tokenizers::{EncodeInput, Tokenizer};
use tract_onnx::tract_hir::tract_ndarray::{ArrayViewD, Axis};

use crate::{
    graph::{self, Model},
    Error, Result,
};

const DEFAULT_MAX_LENGTH: usize = 512;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Language token prepended to the source, e.g. `hin_Deva`. Multilingual
    /// models without language tokens leave this unset.
    pub src_lang: Option<String>,
    /// Language token forced as the first generated token, e.g. `eng_Latn`.
    pub tgt_lang: Option<String>,
    /// Cap on the generated sequence, decoder start token included.
    pub max_length: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct Config {
    decoder_start_token_id: i64,
    eos_token_id: i64,
    pad_token_id: i64,
    #[serde(default)]
    max_length: Option<usize>,
}

/// Greedy encoder/decoder translation over an `optimum`-style ONNX export
/// (`encoder_model.onnx` + `decoder_model.onnx`, no past key values).
pub struct TranslationPipeline {
    tokenizer: Tokenizer,
    config: Config,
    encoder: Model,
    decoder: Model,
}

impl TranslationPipeline {
    pub fn from_files(
        config: impl AsRef<Path>,
        tokenizer: impl AsRef<Path>,
        encoder: impl AsRef<Path>,
        decoder: impl AsRef<Path>,
    ) -> Result<Self> {
        let config: Config = serde_json::from_reader(BufReader::new(File::open(config)?))?;
        let tokenizer = Tokenizer::from_file(tokenizer)?;

        Ok(Self {
            tokenizer,
            config,
            encoder: graph::load(encoder)?,
            decoder: graph::load(decoder)?,
        })
    }

    /// Hub files a translator is built from: config, tokenizer, encoder, decoder.
    #[cfg(feature = "remote")]
    pub fn files(source: &crate::Source) -> [String; 4] {
        [
            "config.json".to_owned(),
            "tokenizer.json".to_owned(),
            source.graph("encoder_model.onnx"),
            source.graph("decoder_model.onnx"),
        ]
    }

    #[cfg(feature = "remote")]
    pub fn from_pretrained(model: impl AsRef<str>) -> Result<Self> {
        Self::from_source(&crate::Hub::default(), &crate::Source::new(model.as_ref()))
    }

    #[cfg(feature = "remote")]
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(hub), fields(repo = %source.repo)))]
    pub fn from_source(hub: &crate::Hub, source: &crate::Source) -> Result<Self> {
        let [config, tokenizer, encoder, decoder] = Self::files(source);

        Self::from_files(
            hub.download(&source.repo, &config)?,
            hub.download(&source.repo, &tokenizer)?,
            hub.download(&source.repo, &encoder)?,
            hub.download(&source.repo, &decoder)?,
        )
    }

    pub fn translate(&self, sentence: impl AsRef<str>, options: &TranslateOptions) -> Result<String> {
        let source = self.source_ids(sentence.as_ref(), options.src_lang.as_deref())?;
        let mask = vec![1_i64; source.len()];

        let encoded = graph::run_named(
            &self.encoder,
            vec![
                ("input_ids", graph::row(source)?),
                ("attention_mask", graph::row(mask.iter().copied())?),
            ],
        )?;
        let hidden = encoded.into_iter().next().ok_or(Error::EmptyOutput)?;

        let forced = options
            .tgt_lang
            .as_deref()
            .map(|lang| self.token_id(lang))
            .transpose()?;
        let limits = Limits {
            max_length: max_length(options.max_length, self.config.max_length),
            eos: self.config.eos_token_id,
            pad: self.config.pad_token_id,
        };

        let output = generate(
            decoder_prefix(self.config.decoder_start_token_id, forced),
            &limits,
            |tokens| {
                let outputs = graph::run_named(
                    &self.decoder,
                    vec![
                        ("input_ids", graph::row(tokens.iter().copied())?),
                        ("encoder_attention_mask", graph::row(mask.iter().copied())?),
                        ("encoder_hidden_states", hidden.clone()),
                    ],
                )?;
                let logits = outputs.first().ok_or(Error::EmptyOutput)?.to_array_view::<f32>()?;
                last_position(logits)
            },
        )?;

        Ok(self
            .tokenizer
            .decode(&output.iter().map(|&id| id as u32).collect::<Vec<u32>>(), true)?)
    }

    fn source_ids(&self, sentence: &str, src_lang: Option<&str>) -> Result<Vec<i64>> {
        let Some(lang) = src_lang else {
            let input = self.tokenizer.encode(EncodeInput::Single(sentence.into()), true)?;
            return Ok(input.get_ids().iter().map(|&x| x as i64).collect());
        };

        let lang = self.token_id(lang)?;
        let input = self.tokenizer.encode(EncodeInput::Single(sentence.into()), false)?;
        Ok(frame_source(lang, input.get_ids(), self.config.eos_token_id))
    }

    fn token_id(&self, token: &str) -> Result<i64> {
        self.tokenizer
            .token_to_id(token)
            .map(i64::from)
            .ok_or_else(|| Error::UnknownToken(token.to_owned()))
    }
}

/// `[lang] tokens </s>`
fn frame_source(lang: i64, tokens: &[u32], eos: i64) -> Vec<i64> {
    std::iter::once(lang)
        .chain(tokens.iter().map(|&x| x as i64))
        .chain(std::iter::once(eos))
        .collect()
}

fn decoder_prefix(start: i64, forced_bos: Option<i64>) -> Vec<i64> {
    std::iter::once(start).chain(forced_bos).collect()
}

/// The invocation's cap wins over the model's, then the crate default.
fn max_length(requested: Option<usize>, configured: Option<usize>) -> usize {
    requested.or(configured).unwrap_or(DEFAULT_MAX_LENGTH)
}

struct Limits {
    /// Whole sequence, prefix included.
    max_length: usize,
    eos: i64,
    /// Never generated.
    pad: i64,
}

/// Greedy decoding from `prefix`. `step` maps the sequence so far to the
/// scores of the next token.
fn generate(
    prefix: Vec<i64>,
    limits: &Limits,
    mut step: impl FnMut(&[i64]) -> Result<Vec<f32>>,
) -> Result<Vec<i64>> {
    let mut output = prefix;

    while output.len() < limits.max_length {
        let next = greedy_pick(step(&output)?, limits.pad).ok_or(Error::EmptyOutput)?;
        output.push(next);

        if next == limits.eos {
            break;
        }
    }

    Ok(output)
}

/// Scores at the last decoded position of `[batch, position, vocab]` logits.
fn last_position(logits: ArrayViewD<'_, f32>) -> Result<Vec<f32>> {
    match *logits.shape() {
        [batch, positions, _] if batch > 0 && positions > 0 => Ok(logits
            .index_axis(Axis(0), 0)
            .index_axis(Axis(0), positions - 1)
            .iter()
            .copied()
            .collect()),
        [_, _, _] => Err(Error::EmptyOutput),
        _ => Err(Error::UnexpectedShape(logits.shape().to_vec())),
    }
}

/// Index of the highest score, never `banned`. Ties go to the lower index.
fn greedy_pick(scores: impl IntoIterator<Item = f32>, banned: i64) -> Option<i64> {
    scores
        .into_iter()
        .enumerate()
        .map(|(i, z)| (i as i64, z))
        .filter(|&(i, _)| i != banned)
        .fold(None, |best: Option<(i64, f32)>, (i, z)| match best {
            Some((_, b)) if b >= z => best,
            _ => Some((i, z)),
        })
        .map(|(i, _)| i)
}
