//! Candle BERT sentence embedder.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Repo, RepoType};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use super::{EmbedError, Embedder};
use crate::config::EmbeddingConfig;

/// BERT's position embedding table size
const MAX_POSITIONS: usize = 512;

/// Sentence embedder backed by a BERT checkpoint on the Hugging Face Hub
///
/// Embeddings are the attention-masked mean of the last hidden layer. Model
/// inference is CPU/GPU bound and runs on the blocking thread pool.
#[derive(Clone)]
pub struct BertEmbedder {
    inner: Arc<Inner>,
    model_name: String,
}

struct Inner {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    max_length: usize,
    batch_size: usize,
}

impl BertEmbedder {
    /// Download (or reuse the cached copy of) the model and load it
    pub async fn load(config: &EmbeddingConfig) -> Result<Self, EmbedError> {
        let start = Instant::now();
        info!("Loading embedding model: {}", config.model_id);

        let config = config.clone();
        let model_name = config.model_id.clone();

        let inner = tokio::task::spawn_blocking(move || Inner::load(&config))
            .await
            .map_err(|e| EmbedError::ModelLoad(format!("loader task failed: {}", e)))??;

        info!(
            "Embedding model loaded in {:.2}s on {:?}",
            start.elapsed().as_secs_f32(),
            inner.device
        );

        Ok(Self {
            inner: Arc::new(inner),
            model_name,
        })
    }
}

impl std::fmt::Debug for BertEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertEmbedder")
            .field("model_name", &self.model_name)
            .field("device", &self.inner.device)
            .finish()
    }
}

#[async_trait]
impl Embedder for BertEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let inner = Arc::clone(&self.inner);
        let texts = texts.to_vec();
        let count = texts.len();

        let embeddings = tokio::task::spawn_blocking(move || inner.encode(&texts))
            .await
            .map_err(|e| EmbedError::Inference(format!("inference task failed: {}", e)))??;

        debug!(
            "Embedded {} texts in {:.2}ms",
            count,
            start.elapsed().as_secs_f32() * 1000.0
        );
        Ok(embeddings)
    }
}

impl Inner {
    fn load(config: &EmbeddingConfig) -> Result<Self, EmbedError> {
        let device = select_device(config.use_gpu);
        debug!("Using device: {:?}", device);

        let mut builder = ApiBuilder::new().with_progress(false);
        if let Some(dir) = &config.cache_dir {
            builder = builder.with_cache_dir(dir.clone());
        }
        let api = builder.build()?;
        let repo = api.repo(Repo::with_revision(
            config.model_id.clone(),
            RepoType::Model,
            config.revision.clone(),
        ));

        let config_path = repo
            .get("config.json")
            .map_err(|e| EmbedError::Download(format!("config.json: {}", e)))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| EmbedError::Download(format!("tokenizer.json: {}", e)))?;
        let weights_path = repo
            .get("model.safetensors")
            .or_else(|_| repo.get("pytorch_model.bin"))
            .map_err(|e| EmbedError::Download(format!("model weights: {}", e)))?;
        debug!("Weights at: {:?}", weights_path);

        let bert_config = read_bert_config(&config_path)?;
        let max_length = config
            .max_length
            .min(bert_config.max_position_embeddings)
            .min(MAX_POSITIONS)
            .max(1);

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)?;
        tokenizer
            .with_padding(None)
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))?;

        let vb = if weights_path
            .extension()
            .is_some_and(|ext| ext == "safetensors")
        {
            // SAFETY: the file is in the hub cache and not modified while mapped
            unsafe { VarBuilder::from_mmaped_safetensors(&[&weights_path], DType::F32, &device)? }
        } else {
            VarBuilder::from_pth(&weights_path, DType::F32, &device)?
        };

        // Sentence-transformers checkpoints store the encoder at the root,
        // plain BERT checkpoints under `bert.`
        let model = BertModel::load(vb.clone(), &bert_config)
            .or_else(|_| BertModel::load(vb.pp("bert"), &bert_config))
            .map_err(|e| EmbedError::ModelLoad(e.to_string()))?;

        Ok(Self {
            model,
            tokenizer,
            device,
            max_length,
            batch_size: config.batch_size.max(1),
        })
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            embeddings.extend(self.encode_chunk(chunk)?);
        }
        Ok(embeddings)
    }

    /// One forward pass over a right-padded batch
    fn encode_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let encodings = self.tokenizer.encode_batch(text_refs, true)?;

        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len().min(self.max_length))
            .max()
            .unwrap_or(0)
            .max(1);
        let batch = encodings.len();

        let mut input_ids = Vec::with_capacity(batch * seq_len);
        let mut type_ids = Vec::with_capacity(batch * seq_len);
        let mut mask = Vec::with_capacity(batch * seq_len);

        for encoding in &encodings {
            let len = encoding.get_ids().len().min(seq_len);
            let pad = seq_len - len;

            input_ids.extend_from_slice(&encoding.get_ids()[..len]);
            input_ids.extend(std::iter::repeat_n(0u32, pad));
            type_ids.extend_from_slice(&encoding.get_type_ids()[..len]);
            type_ids.extend(std::iter::repeat_n(0u32, pad));
            mask.extend_from_slice(&encoding.get_attention_mask()[..len]);
            mask.extend(std::iter::repeat_n(0u32, pad));
        }

        let input_ids = Tensor::from_vec(input_ids, (batch, seq_len), &self.device)?;
        let token_type_ids = Tensor::from_vec(type_ids, (batch, seq_len), &self.device)?;
        let attention_mask =
            Tensor::from_vec(mask, (batch, seq_len), &self.device)?.to_dtype(DType::F32)?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = mean_pool(&hidden, &attention_mask)?;

        Ok(pooled.to_vec2::<f32>()?)
    }
}

/// Select the best available device
fn select_device(use_gpu: bool) -> Device {
    if !use_gpu {
        return Device::Cpu;
    }

    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(0) {
            Ok(device) => return device,
            Err(e) => debug!("CUDA not available: {}, falling back to CPU", e),
        }
    }

    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => return device,
            Err(e) => debug!("Metal not available: {}, falling back to CPU", e),
        }
    }

    Device::Cpu
}

fn read_bert_config(path: &Path) -> Result<BertConfig, EmbedError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| EmbedError::ModelLoad(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| EmbedError::ModelLoad(format!("invalid config.json: {}", e)))
}

/// Mean pooling over non-padding tokens
///
/// `hidden` is `(batch, seq_len, dim)`, `attention_mask` is `(batch, seq_len)`
/// as F32. Returns `(batch, dim)`.
fn mean_pool(hidden: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
    let mask = attention_mask.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.clamp(1e-9f32, f32::MAX)?;
    summed.broadcast_div(&counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::cosine_similarity;

    #[test]
    fn test_mean_pool_ignores_padding() {
        let device = Device::Cpu;
        // batch 1, seq 3, dim 2; last token is padding
        let hidden = Tensor::new(&[[[1.0f32, 2.0], [3.0, 4.0], [100.0, 100.0]]], &device).unwrap();
        let mask = Tensor::new(&[[1.0f32, 1.0, 0.0]], &device).unwrap();

        let pooled = mean_pool(&hidden, &mask).unwrap().to_vec2::<f32>().unwrap();
        assert_eq!(pooled, vec![vec![2.0, 3.0]]);
    }

    #[test]
    fn test_mean_pool_all_masked_is_zero() {
        let device = Device::Cpu;
        let hidden = Tensor::new(&[[[5.0f32, 5.0]]], &device).unwrap();
        let mask = Tensor::new(&[[0.0f32]], &device).unwrap();

        let pooled = mean_pool(&hidden, &mask).unwrap().to_vec2::<f32>().unwrap();
        assert_eq!(pooled, vec![vec![0.0, 0.0]]);
    }

    #[test]
    fn test_cpu_when_gpu_not_requested() {
        assert!(matches!(select_device(false), Device::Cpu));
    }

    #[tokio::test]
    #[ignore] // Requires network + model download (~400 MB)
    async fn test_related_texts_score_higher() {
        let embedder = BertEmbedder::load(&EmbeddingConfig::default()).await.unwrap();
        let query = embedder.embed("obesity and type 2 diabetes").await.unwrap();
        let texts = vec![
            "Adiposity is a major risk factor for insulin resistance.".to_string(),
            "Superconductivity in layered cuprates.".to_string(),
        ];
        let vectors = embedder.embed_batch(&texts).await.unwrap();

        let related = cosine_similarity(&query, &vectors[0]);
        let unrelated = cosine_similarity(&query, &vectors[1]);
        assert!(related > unrelated);
    }
}
