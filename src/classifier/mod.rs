//! Multi-label emotion classifier.
//!
//! Wraps an ONNX export of a DeBERTa-v3-small sequence classification
//! fine-tune (8 emotion classes, independent sigmoid outputs). Tokenization
//! uses the HuggingFace tokenizer.json shipped alongside the model.

mod provider;

pub use provider::{ClassifierConfig, ClassifierError, EmotionClassifier};
