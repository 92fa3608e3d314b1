//! Sentence embedding backends.
//!
//! The evaluator only sees the [`Embedder`] trait. Two backends exist:
//! a pure-Rust feature-hashing embedder (default, no model files, fully
//! deterministic) and a sentence-transformer backend on ONNX runtime via
//! `fastembed`, compiled in with the `onnx` feature.
//!
//! Hashing vectors are built from words and character trigrams, so with the
//! default backend the semantic score measures lexical overlap. Paraphrase
//! similarity needs the `onnx` backend.

use std::sync::Arc;

use crate::config::{EmbeddingBackend, EmbeddingConfig};
use crate::error::ModelError;
use crate::text;

/// Trait for text embedding models. Implementations must be safe to share
/// read-only across threads; the evaluator holds one instance per process.
pub trait Embedder: Send + Sync {
    /// Human-readable backend name (e.g. "hashing").
    fn name(&self) -> &str;

    /// Length of every vector this embedder returns.
    fn dimensions(&self) -> usize;

    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError>;
}

/// Build the embedder selected by the configuration. This is the only place
/// model weights are loaded.
pub fn load_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, ModelError> {
    match config.backend {
        EmbeddingBackend::Hashing => Ok(Arc::new(HashingEmbedder::new(config.dimensions))),
        #[cfg(feature = "onnx")]
        EmbeddingBackend::Onnx => Ok(Arc::new(onnx::OnnxEmbedder::load(config)?)),
        #[cfg(not(feature = "onnx"))]
        EmbeddingBackend::Onnx => Err(ModelError::UnsupportedBackend("onnx".into())),
    }
}

/// Cosine similarity in [-1, 1]. Zero-length or zero vectors give 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

// ---------------------------------------------------------------------------
// Feature-hashing embedder
// ---------------------------------------------------------------------------

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Hashes folded word unigrams and padded character trigrams into a signed,
/// L2-normalised vector. Morphological variants ("probabilidad",
/// "probabilidades") share most trigrams and therefore land close together.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn accumulate(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv1a(feature.as_bytes());
        let index = (hash % self.dimensions as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[index] += sign * weight;
    }
}

impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, input: &str) -> Result<Vec<f32>, ModelError> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in text::tokenize(input) {
            self.accumulate(&mut vector, &format!("w:{token}"), WORD_WEIGHT);

            let padded: Vec<char> = format!("#{token}#").chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                self.accumulate(&mut vector, &format!("c:{trigram}"), TRIGRAM_WEIGHT);
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(vector)
    }
}

/// 64-bit FNV-1a. Stable across builds and platforms, unlike `DefaultHasher`.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes.iter().fold(OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(PRIME)
    })
}

// ---------------------------------------------------------------------------
// ONNX sentence-transformer embedder
// ---------------------------------------------------------------------------

#[cfg(feature = "onnx")]
mod onnx {
    use std::sync::Mutex;

    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

    use super::Embedder;
    use crate::config::EmbeddingConfig;
    use crate::error::ModelError;

    /// Sentence-transformer embeddings (MiniLM family) through `fastembed`.
    pub struct OnnxEmbedder {
        model_name: String,
        dimensions: usize,
        model: Mutex<TextEmbedding>,
    }

    impl OnnxEmbedder {
        pub fn load(config: &EmbeddingConfig) -> Result<Self, ModelError> {
            let model_name = config.model.clone();
            let kind = match model_name.to_lowercase().as_str() {
                "all-minilm-l6-v2" => EmbeddingModel::AllMiniLML6V2,
                "paraphrase-multilingual-minilm-l12-v2" => EmbeddingModel::ParaphraseMLMiniLML12V2,
                other => {
                    return Err(ModelError::Load {
                        model: other.to_string(),
                        message: "unknown sentence-transformer model".into(),
                    })
                }
            };

            let mut options = InitOptions::new(kind).with_show_download_progress(false);
            if let Some(dir) = &config.cache_dir {
                options = options.with_cache_dir(dir.clone());
            }

            tracing::info!("loading sentence-transformer '{model_name}'");
            let model = TextEmbedding::try_new(options).map_err(|e| ModelError::Load {
                model: model_name.clone(),
                message: format!("{e:#}"),
            })?;

            Ok(Self {
                model_name,
                dimensions: config.dimensions,
                model: Mutex::new(model),
            })
        }
    }

    impl Embedder for OnnxEmbedder {
        fn name(&self) -> &str {
            &self.model_name
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }

        fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
            let model = self
                .model
                .lock()
                .map_err(|_| ModelError::Inference("model lock poisoned".into()))?;
            let mut vectors = model
                .embed(vec![text], None)
                .map_err(|e| ModelError::Inference(format!("{e:#}")))?;
            let vector = vectors
                .pop()
                .ok_or_else(|| ModelError::Inference("empty embedding batch".into()))?;
            if vector.len() != self.dimensions {
                return Err(ModelError::DimensionMismatch {
                    expected: self.dimensions,
                    actual: vector.len(),
                });
            }
            Ok(vector)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashing_embedder_is_deterministic() {
        let embedder = HashingEmbedder::new(128);
        let a = embedder.embed("La varianza de la suma").unwrap();
        let b = embedder.embed("La varianza de la suma").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 128);
    }

    #[test]
    fn hashing_embedder_normalises() {
        let embedder = HashingEmbedder::new(64);
        let v = embedder.embed("esperanza condicional").unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "norm was {norm}");
    }

    #[test]
    fn empty_text_embeds_to_zero_vector() {
        let embedder = HashingEmbedder::new(32);
        let v = embedder.embed("").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
        assert_eq!(cosine_similarity(&v, &v), 0.0);
    }

    #[test]
    fn related_texts_are_closer_than_unrelated() {
        let embedder = HashingEmbedder::new(384);
        let base = embedder.embed("probabilidad de obtener cara").unwrap();
        let close = embedder.embed("la probabilidad de sacar cara").unwrap();
        let far = embedder.embed("compilador de rust").unwrap();
        assert!(cosine_similarity(&base, &close) > cosine_similarity(&base, &far));
    }

    #[test]
    fn cosine_of_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-12);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn fnv_matches_reference_vector() {
        assert_eq!(fnv1a(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn onnx_backend_unavailable_without_feature() {
        let config = EmbeddingConfig {
            backend: EmbeddingBackend::Onnx,
            ..EmbeddingConfig::default()
        };
        let err = load_embedder(&config).err().expect("onnx should be unavailable");
        assert!(matches!(err, ModelError::UnsupportedBackend(_)));
    }

    #[cfg(feature = "onnx")]
    #[test]
    fn unknown_sentence_model_is_a_load_error() {
        let config = EmbeddingConfig {
            backend: EmbeddingBackend::Onnx,
            model: "bert-base-uncased".into(),
            ..EmbeddingConfig::default()
        };
        let err = load_embedder(&config).err().expect("unknown model should not load");
        assert!(matches!(err, ModelError::Load { .. }));
    }

    #[cfg(feature = "onnx")]
    #[test]
    #[ignore = "downloads all-MiniLM-L6-v2 on first run"]
    fn onnx_embedder_captures_meaning() {
        let config = EmbeddingConfig {
            backend: EmbeddingBackend::Onnx,
            ..EmbeddingConfig::default()
        };
        let embedder = load_embedder(&config).unwrap();
        assert_eq!(embedder.name(), "all-MiniLM-L6-v2");
        assert_eq!(embedder.dimensions(), 384);

        let base = embedder.embed("The expected value of a fair die is 3.5").unwrap();
        assert_eq!(base.len(), 384);
        let paraphrase = embedder.embed("On average a fair die roll gives 3.5").unwrap();
        let unrelated = embedder.embed("The compiler rejected the borrow").unwrap();
        assert!(cosine_similarity(&base, &paraphrase) > cosine_similarity(&base, &unrelated));

        let wrong = EmbeddingConfig {
            dimensions: 128,
            ..config
        };
        let err = load_embedder(&wrong).unwrap().embed("varianza").unwrap_err();
        assert!(matches!(
            err,
            ModelError::DimensionMismatch {
                expected: 128,
                actual: 384
            }
        ));
    }
}
