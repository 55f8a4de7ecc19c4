// MKAI Sentiment Cortex
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Arabic BERT sequence classifier (CAMeLBERT sentiment head) running on Candle.

use anyhow::{Context, Result};
use async_trait::async_trait;
use candle_core::{DType, Device, IndexOp, Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use hf_hub::api::sync::Api;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tokenizers::models::wordpiece::WordPiece;
use tokenizers::normalizers::{bert::BertNormalizer, NormalizerWrapper};
use tokenizers::pre_tokenizers::{bert::BertPreTokenizer, PreTokenizerWrapper};
use tokenizers::processors::{bert::BertProcessing, PostProcessorWrapper};
use tokenizers::{Model, Tokenizer};
use tracing::info;

use crate::error::MkaiError;

/// Closed emotion vocabulary the response table is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emotion {
    Positive,
    Negative,
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; 3] = [Emotion::Positive, Emotion::Negative, Emotion::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Positive => "positive",
            Emotion::Negative => "negative",
            Emotion::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = MkaiError;

    /// Labels are matched case-insensitively; anything else is a contract mismatch.
    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label.trim().to_lowercase().as_str() {
            "positive" => Ok(Emotion::Positive),
            "negative" => Ok(Emotion::Negative),
            "neutral" => Ok(Emotion::Neutral),
            _ => Err(MkaiError::UnknownEmotionCategory(label.to_string())),
        }
    }
}

/// Raw classifier verdict before it is mapped onto [`Emotion`].
#[derive(Debug, Clone, PartialEq)]
pub struct Sentiment {
    pub label: String,
    pub confidence: f32,
}

#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Sentiment>;
}

/// The subset of a HuggingFace `config.json` the classification head needs.
#[derive(Debug, Deserialize)]
struct HeadConfig {
    hidden_size: usize,
    #[serde(default)]
    id2label: HashMap<String, String>,
    #[serde(default = "default_max_positions")]
    max_position_embeddings: usize,
}

fn default_max_positions() -> usize {
    512
}

struct ClassifierModel {
    bert: BertModel,
    pooler: Linear,
    classifier: Linear,
    tokenizer: Tokenizer,
    labels: Vec<String>,
    max_tokens: usize,
    device: Device,
}

pub struct CamelBertClassifier {
    model: Arc<ClassifierModel>,
}

impl CamelBertClassifier {
    /// Fetch (or reuse cached) weights for `model_id` and build the classifier.
    pub async fn load(model_id: &str) -> Result<Self> {
        let model_id = model_id.to_string();
        let model = tokio::task::spawn_blocking(move || Self::load_blocking(&model_id)).await??;
        Ok(Self {
            model: Arc::new(model),
        })
    }

    fn load_blocking(model_id: &str) -> Result<ClassifierModel> {
        info!("[SENTIMENT] Loading classifier: {}", model_id);

        let api = Api::new()?;
        let repo = api.model(model_id.to_string());

        let config_path = repo.get("config.json").context("Fetch config.json")?;
        let weights_path = match repo.get("model.safetensors") {
            Ok(path) => path,
            Err(_) => repo
                .get("pytorch_model.bin")
                .context("Fetch classifier weights")?,
        };

        let raw_config = std::fs::read_to_string(&config_path)?;
        let bert_config: BertConfig = serde_json::from_str(&raw_config).context("Parse BERT config")?;
        let head: HeadConfig = serde_json::from_str(&raw_config).context("Parse classifier head")?;
        let labels = ordered_labels(&head.id2label)?;

        let tokenizer = match repo.get("tokenizer.json") {
            Ok(path) => Tokenizer::from_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?,
            Err(_) => {
                // Slow-tokenizer repos only ship vocab.txt.
                info!("[SENTIMENT] No tokenizer.json, building WordPiece from vocab.txt");
                let vocab_path = repo.get("vocab.txt").context("Fetch vocab.txt")?;
                let lowercase = repo
                    .get("tokenizer_config.json")
                    .ok()
                    .and_then(|path| std::fs::read_to_string(path).ok())
                    .map(|raw| lowercase_from_config(&raw))
                    .unwrap_or(true);
                bert_tokenizer_from_vocab(&vocab_path, lowercase)?
            }
        };

        let device = Device::Cpu;
        let vb = Self::var_builder(&weights_path, &device)?;

        let bert = BertModel::load(vb.pp("bert"), &bert_config).context("Load BERT encoder")?;
        let pooler = candle_nn::linear(head.hidden_size, head.hidden_size, vb.pp("bert.pooler.dense"))
            .context("Load pooler")?;
        let classifier = candle_nn::linear(head.hidden_size, labels.len(), vb.pp("classifier"))
            .context("Load classification head")?;

        info!("[SENTIMENT] Classifier ready. Labels: {:?}", labels);
        Ok(ClassifierModel {
            bert,
            pooler,
            classifier,
            tokenizer,
            labels,
            max_tokens: head.max_position_embeddings,
            device,
        })
    }

    fn var_builder(weights_path: &Path, device: &Device) -> Result<VarBuilder<'static>> {
        let is_safetensors = weights_path
            .extension()
            .map(|ext| ext == "safetensors")
            .unwrap_or(false);

        let vb = if is_safetensors {
            // SAFETY: the file is owned by the hf-hub cache and not mutated while mapped.
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? }
        } else {
            VarBuilder::from_pth(weights_path, DType::F32, device)?
        };
        Ok(vb)
    }

    fn classify_blocking(model: &ClassifierModel, text: &str) -> Result<Sentiment> {
        let encoding = model
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let mut ids = encoding.get_ids().to_vec();
        if ids.len() > model.max_tokens {
            let sep = ids[ids.len() - 1];
            ids.truncate(model.max_tokens - 1);
            ids.push(sep);
        }
        let len = ids.len();

        let input_ids = Tensor::new(ids.as_slice(), &model.device)?.unsqueeze(0)?;
        let token_type_ids = Tensor::zeros((1, len), DType::U32, &model.device)?;
        let attention_mask = Tensor::ones((1, len), DType::U32, &model.device)?;

        let hidden = model
            .bert
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let cls = hidden.i((.., 0))?;
        let pooled = model.pooler.forward(&cls)?.tanh()?;
        let logits = model.classifier.forward(&pooled)?;
        let probs = candle_nn::ops::softmax(&logits, D::Minus1)?
            .squeeze(0)?
            .to_vec1::<f32>()?;

        let (best, confidence) = probs
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::MIN), |acc, (i, p)| if p > acc.1 { (i, p) } else { acc });

        let label = model
            .labels
            .get(best)
            .cloned()
            .with_context(|| format!("Classifier produced index {} outside its label set", best))?;

        Ok(Sentiment { label, confidence })
    }
}

#[async_trait]
impl SentimentClassifier for CamelBertClassifier {
    async fn classify(&self, text: &str) -> Result<Sentiment> {
        let model = self.model.clone();
        let text = text.to_string();
        let sentiment =
            tokio::task::spawn_blocking(move || Self::classify_blocking(&model, &text)).await??;
        info!(
            "[SENTIMENT] {} ({:.2})",
            sentiment.label, sentiment.confidence
        );
        Ok(sentiment)
    }
}

#[derive(Debug, Deserialize)]
struct TokenizerConfig {
    #[serde(default = "default_lowercase")]
    do_lower_case: bool,
}

fn default_lowercase() -> bool {
    true
}

fn lowercase_from_config(raw: &str) -> bool {
    serde_json::from_str::<TokenizerConfig>(raw)
        .map(|c| c.do_lower_case)
        .unwrap_or(true)
}

/// BERT WordPiece pipeline equivalent to the HF `BertTokenizer`: clean/normalize,
/// split on whitespace and punctuation, wrap in `[CLS] ... [SEP]`.
fn bert_tokenizer_from_vocab(vocab_path: &Path, lowercase: bool) -> Result<Tokenizer> {
    let vocab = vocab_path
        .to_str()
        .with_context(|| format!("Non UTF-8 vocab path {:?}", vocab_path))?;
    let wordpiece = WordPiece::from_file(vocab)
        .unk_token("[UNK]".to_string())
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", vocab, e))?;

    let cls = wordpiece.token_to_id("[CLS]").context("vocab.txt has no [CLS]")?;
    let sep = wordpiece.token_to_id("[SEP]").context("vocab.txt has no [SEP]")?;

    let mut tokenizer = Tokenizer::new(wordpiece);
    tokenizer.with_normalizer(NormalizerWrapper::from(BertNormalizer::new(true, true, None, lowercase)));
    tokenizer.with_pre_tokenizer(PreTokenizerWrapper::from(BertPreTokenizer));
    tokenizer.with_post_processor(PostProcessorWrapper::from(BertProcessing::new(
        ("[SEP]".to_string(), sep),
        ("[CLS]".to_string(), cls),
    )));
    Ok(tokenizer)
}

/// Turn `{"0": "negative", "1": "neutral", ...}` into an index-ordered list.
fn ordered_labels(id2label: &HashMap<String, String>) -> Result<Vec<String>> {
    if id2label.is_empty() {
        anyhow::bail!("Model config has no id2label mapping");
    }

    let mut indexed = id2label
        .iter()
        .map(|(id, label)| {
            id.parse::<usize>()
                .map(|i| (i, label.clone()))
                .with_context(|| format!("Non-numeric label id '{}'", id))
        })
        .collect::<Result<Vec<_>>>()?;
    indexed.sort_by_key(|(i, _)| *i);

    for (expected, (i, _)) in indexed.iter().enumerate() {
        if *i != expected {
            anyhow::bail!("Label ids are not contiguous (missing {})", expected);
        }
    }

    Ok(indexed.into_iter().map(|(_, label)| label).collect())
}
