//! Configuration management for docverify using the prefer crate.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default PaddleOCR serving endpoint.
pub const DEFAULT_PADDLE_URL: &str = "http://localhost:8866/predict/ocr_system";

/// Recognition engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Tesseract language(s), e.g. "eng" or "eng+hin".
    pub tesseract_language: String,
    /// Directory holding Tesseract traineddata files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tessdata_prefix: Option<PathBuf>,
    /// Engines in the order they are tried. The first available one is primary.
    pub engine_order: Vec<String>,
    /// Text with fewer non-whitespace characters sends the page to the next engine.
    pub min_engine_chars: usize,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            tesseract_language: "eng".to_string(),
            tessdata_prefix: None,
            engine_order: vec!["paddle".to_string(), "tesseract".to_string()],
            min_engine_chars: 10,
        }
    }
}

/// PaddleOCR serving settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaddleSettings {
    pub enabled: bool,
    /// Serving endpoint per language model, e.g. `en` and `hi`.
    pub endpoints: BTreeMap<String, String>,
    pub timeout_secs: u64,
}

impl Default for PaddleSettings {
    fn default() -> Self {
        let mut endpoints = BTreeMap::new();
        endpoints.insert("en".to_string(), DEFAULT_PADDLE_URL.to_string());
        Self {
            enabled: true,
            endpoints,
            timeout_secs: 60,
        }
    }
}

/// Cascade thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Minimum trimmed text-layer length accepted without OCR.
    pub min_text_layer_chars: usize,
    /// Minimum text-layer quality score accepted for tax returns.
    pub tax_return_min_text_score: f64,
    /// Composite quality below this is flagged as low quality.
    pub quality_floor: f64,
    /// Resolution score blended with OCR confidence.
    pub resolution_placeholder: f64,
    /// Confidence assumed for engines that report none.
    pub default_engine_confidence: f64,
    /// Page that holds the identity face in multi-page scans.
    pub identity_page_index: usize,
    /// Rasterization resolution in DPI.
    pub raster_dpi: u32,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            min_text_layer_chars: 20,
            tax_return_min_text_score: 50.0,
            quality_floor: 60.0,
            resolution_placeholder: 80.0,
            default_engine_confidence: 75.0,
            identity_page_index: 1,
            raster_dpi: 300,
        }
    }
}

/// What a batch does when one document fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultPolicy {
    /// Return every record that succeeded plus per-document failure annotations.
    #[default]
    Partial,
    /// Fail the whole batch on the first failed document.
    Abort,
}

impl FaultPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "partial" => Some(Self::Partial),
            "abort" | "abort_on_first_error" => Some(Self::Abort),
            _ => None,
        }
    }
}

/// Batch orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Maximum documents extracted at once.
    pub workers: usize,
    pub fault_policy: FaultPolicy,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            workers: 4,
            fault_policy: FaultPolicy::Partial,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ocr: OcrSettings,
    pub paddle: PaddleSettings,
    pub extraction: ExtractionSettings,
    pub batch: BatchSettings,
    /// Path the config was loaded from, if any.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers docverify config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("docverify").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config {}: {}", path.display(), e);
                            Self::default_with_env()
                        }
                    }
                } else {
                    Self::default_with_env()
                }
            }
            Err(_) => Self::default_with_env(),
        }
    }

    /// Create a default config with environment variable overrides applied.
    pub fn default_with_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config.with_env_overrides())
    }

    fn parse(contents: &str, ext: &str) -> Result<Self, String> {
        match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e)),
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    /// Apply environment variable overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(prefix) = env_var("TESSDATA_PREFIX") {
            tracing::debug!("Using TESSDATA_PREFIX={}", prefix);
            self.ocr.tessdata_prefix = Some(PathBuf::from(prefix));
        }
        if let Some(url) = env_var("PADDLEOCR_API_URL") {
            tracing::debug!("Using PADDLEOCR_API_URL={}", url);
            self.paddle.endpoints.insert("en".to_string(), url);
        }
        if let Some(policy) = env_var("DOCVERIFY_FAULT_POLICY") {
            match FaultPolicy::from_str(&policy) {
                Some(p) => self.batch.fault_policy = p,
                None => tracing::warn!("Unknown DOCVERIFY_FAULT_POLICY '{}', ignoring", policy),
            }
        }
        if let Some(workers) = env_var("DOCVERIFY_WORKERS") {
            match workers.parse::<usize>() {
                Ok(n) if n > 0 => self.batch.workers = n,
                _ => tracing::warn!("Invalid DOCVERIFY_WORKERS '{}', ignoring", workers),
            }
        }
        self
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}
