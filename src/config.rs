use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::labels::{EMOTION_CLASSES, NUM_CLASSES};

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub schema_version: u32,

    // Listen address
    pub host: String,
    pub port: u16,

    // Model assets
    pub model_path: Option<PathBuf>,
    pub tokenizer_path: Option<PathBuf>,
    pub thresholds_path: Option<PathBuf>,

    // Inference tuning
    pub n_threads: i32,
    pub max_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: 1,
            host: "0.0.0.0".to_string(),
            port: 5000,
            model_path: None,
            tokenizer_path: None,
            thresholds_path: None,
            n_threads: 1,
            max_length: 64,
        }
    }
}

impl Config {
    /// Load config from file, or create default
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).context("Failed to read config file")?;
            serde_json::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")
    }

    /// Get the default config directory
    pub fn default_config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".emotion-service"))
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("config.json"))
    }

    /// Get the default models directory
    pub fn default_models_dir() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("models"))
    }

    /// Get the ONNX model file path
    pub fn get_model_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.model_path {
            Ok(path.clone())
        } else {
            Ok(Self::default_models_dir()?.join("deberta_emotion.onnx"))
        }
    }

    /// Get the tokenizer file path
    pub fn get_tokenizer_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.tokenizer_path {
            Ok(path.clone())
        } else {
            Ok(Self::default_models_dir()?.join("tokenizer.json"))
        }
    }

    /// Get the tuned thresholds file path
    pub fn get_thresholds_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.thresholds_path {
            Ok(path.clone())
        } else {
            Ok(Self::default_models_dir()?.join("tuned_thresholds.json"))
        }
    }
}

/// Load the calibrated per-class thresholds from a JSON array.
///
/// Validated against the class registry at load time so the server never
/// starts with a malformed threshold vector.
pub fn load_thresholds(path: &Path) -> Result<Vec<f32>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read thresholds file {:?}", path))?;
    let thresholds: Vec<f32> =
        serde_json::from_str(&content).context("Failed to parse thresholds file")?;

    if thresholds.len() != NUM_CLASSES {
        anyhow::bail!(
            "Expected {} thresholds (one per emotion class), found {}",
            NUM_CLASSES,
            thresholds.len()
        );
    }
    for (i, &t) in thresholds.iter().enumerate() {
        if !t.is_finite() || !(0.0..=1.0).contains(&t) {
            anyhow::bail!(
                "Threshold for '{}' is not a finite value in [0, 1]: {}",
                EMOTION_CLASSES[i],
                t
            );
        }
    }

    Ok(thresholds)
}
