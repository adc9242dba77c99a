//! ONNX inference provider for the emotion classifier.
//!
//! The model takes `input_ids` and `attention_mask` tensors of shape
//! [batch, seq_len] and returns logits of shape [batch, 8]. Sigmoid is
//! applied here so callers only ever see per-class probabilities in [0, 1].

#[cfg(feature = "onnx")]
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Value,
};
use thiserror::Error;
#[cfg(feature = "onnx")]
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};

#[cfg(feature = "onnx")]
use crate::labels::NUM_CLASSES;

/// Errors that can occur during emotion classification
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Failed to load model: {0}")]
    ModelLoadError(String),

    #[error("Failed to load tokenizer: {0}")]
    TokenizerError(String),

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("Feature not enabled")]
    FeatureNotEnabled,
}

/// Configuration for the emotion classifier
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Path to the ONNX model
    pub model_path: std::path::PathBuf,
    /// Path to the HuggingFace tokenizer.json
    pub tokenizer_path: std::path::PathBuf,
    /// Number of threads for ONNX inference
    pub n_threads: i32,
    /// Maximum token length per input (longer texts are truncated)
    pub max_length: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: std::path::PathBuf::new(),
            tokenizer_path: std::path::PathBuf::new(),
            n_threads: 1,
            max_length: 64,
        }
    }
}

/// Emotion classifier backed by an ONNX session
#[cfg(feature = "onnx")]
pub struct EmotionClassifier {
    session: Session,
    tokenizer: Tokenizer,
}

#[cfg(feature = "onnx")]
impl EmotionClassifier {
    /// Load the model and tokenizer
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassifierError> {
        if !config.model_path.exists() {
            return Err(ClassifierError::ModelLoadError(format!(
                "Model not found at {:?}",
                config.model_path
            )));
        }
        if !config.tokenizer_path.exists() {
            return Err(ClassifierError::TokenizerError(format!(
                "Tokenizer not found at {:?}",
                config.tokenizer_path
            )));
        }

        let session = Session::builder()
            .map_err(|e: ort::Error| ClassifierError::ModelLoadError(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e: ort::Error| ClassifierError::ModelLoadError(e.to_string()))?
            .with_intra_threads(config.n_threads as usize)
            .map_err(|e: ort::Error| ClassifierError::ModelLoadError(e.to_string()))?
            .commit_from_file(&config.model_path)
            .map_err(|e: ort::Error| ClassifierError::ModelLoadError(e.to_string()))?;

        let mut tokenizer = Tokenizer::from_file(&config.tokenizer_path)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_length,
                ..Default::default()
            }))
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))?;
        tokenizer.with_padding(Some(PaddingParams::default()));

        tracing::info!(
            "Emotion classifier initialized with model: {:?}",
            config.model_path
        );

        Ok(Self { session, tokenizer })
    }

    /// Predict per-class emotion probabilities for a batch of texts.
    ///
    /// Returns one probability row per input text, each of length 8, in
    /// input order. Rows are independent sigmoid outputs and do not sum
    /// to 1.
    pub fn predict(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, ClassifierError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))?;

        let batch = encodings.len();
        // Padding is enabled, so all encodings share the longest length
        let seq_len = encodings[0].get_ids().len();

        let mut input_ids = Vec::with_capacity(batch * seq_len);
        let mut attention_mask = Vec::with_capacity(batch * seq_len);
        for encoding in &encodings {
            input_ids.extend(encoding.get_ids().iter().map(|&id| id as i64));
            attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
        }

        let shape = [batch, seq_len];
        let ids_tensor = Value::from_array((shape, input_ids))
            .map_err(|e: ort::Error| ClassifierError::InferenceError(e.to_string()))?;
        let mask_tensor = Value::from_array((shape, attention_mask))
            .map_err(|e: ort::Error| ClassifierError::InferenceError(e.to_string()))?;

        let outputs = self
            .session
            .run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
            ])
            .map_err(|e: ort::Error| ClassifierError::InferenceError(e.to_string()))?;

        let output = outputs
            .iter()
            .next()
            .ok_or_else(|| ClassifierError::InferenceError("No output from model".to_string()))?;

        let logits = output
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e: ort::Error| ClassifierError::InferenceError(e.to_string()))?;

        let values: Vec<f32> = logits.1.to_vec();
        if values.len() != batch * NUM_CLASSES {
            return Err(ClassifierError::InferenceError(format!(
                "Unexpected logits length {} for batch of {}",
                values.len(),
                batch
            )));
        }

        let rows: Vec<Vec<f32>> = values
            .chunks(NUM_CLASSES)
            .map(|row| row.iter().map(|&logit| sigmoid(logit)).collect())
            .collect();

        tracing::debug!("Classified {} texts (seq_len {})", batch, seq_len);
        Ok(rows)
    }
}

#[cfg(feature = "onnx")]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

// Stub implementation when the onnx feature is not enabled. The service
// still boots; /predict reports the missing feature.
#[cfg(not(feature = "onnx"))]
pub struct EmotionClassifier;

#[cfg(not(feature = "onnx"))]
impl EmotionClassifier {
    pub fn new(_config: ClassifierConfig) -> Result<Self, ClassifierError> {
        Ok(Self)
    }

    pub fn predict(&mut self, _texts: &[String]) -> Result<Vec<Vec<f32>>, ClassifierError> {
        Err(ClassifierError::FeatureNotEnabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClassifierConfig::default();
        assert_eq!(config.n_threads, 1);
        assert_eq!(config.max_length, 64);
    }

    #[cfg(feature = "onnx")]
    #[test]
    fn test_missing_model_path() {
        let config = ClassifierConfig {
            model_path: std::path::PathBuf::from("/nonexistent/model.onnx"),
            ..Default::default()
        };
        let result = EmotionClassifier::new(config);
        assert!(matches!(result, Err(ClassifierError::ModelLoadError(_))));
    }

    #[cfg(feature = "onnx")]
    #[test]
    fn test_sigmoid_range() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
        for logit in [-50.0, -1.0, 0.0, 1.0, 50.0] {
            let p = sigmoid(logit);
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn test_stub_predict() {
        let mut classifier = EmotionClassifier::new(ClassifierConfig::default()).unwrap();
        let result = classifier.predict(&["hello".to_string()]);
        assert!(matches!(result, Err(ClassifierError::FeatureNotEnabled)));
    }
}
