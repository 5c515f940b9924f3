//! PaddleOCR backend implementation.
//!
//! Talks to PaddleOCR serving endpoints over HTTP, one endpoint per
//! language model. Results from several models are merged line by line.

use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::backend::{OcrBackend, OcrBackendType, OcrError, OcrResult};
use super::utils::{block_on_async, encode_image_base64};
use crate::config::PaddleSettings;

#[derive(Serialize)]
struct PredictRequest<'a> {
    images: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    results: Vec<Vec<PredictLine>>,
}

#[derive(Debug, Deserialize)]
struct PredictLine {
    text: String,
    #[serde(default)]
    confidence: Option<f64>,
}

/// One language model served at one URL.
#[derive(Debug, Clone)]
struct Endpoint {
    language: String,
    url: reqwest::Url,
}

/// PaddleOCR serving backend.
pub struct PaddleBackend {
    endpoints: Vec<Endpoint>,
    client: reqwest::Client,
}

impl PaddleBackend {
    /// Build the backend from settings.
    ///
    /// Fails when Paddle is disabled or no endpoint is usable, so callers can
    /// continue with the remaining engines.
    pub fn from_settings(settings: &PaddleSettings) -> Result<Self, OcrError> {
        if !settings.enabled {
            return Err(OcrError::BackendNotAvailable(
                "PaddleOCR disabled in config".to_string(),
            ));
        }

        let mut endpoints: Vec<Endpoint> = Vec::new();
        for (language, url) in &settings.endpoints {
            match reqwest::Url::parse(url) {
                Ok(url) => endpoints.push(Endpoint {
                    language: language.clone(),
                    url,
                }),
                Err(e) => warn!("Ignoring PaddleOCR endpoint '{}' ({}): {}", language, url, e),
            }
        }
        // English results come first so they win de-duplication.
        endpoints.sort_by_key(|e| e.language != "en");

        if endpoints.is_empty() {
            return Err(OcrError::BackendNotAvailable(
                "no PaddleOCR endpoints configured".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| OcrError::BackendNotAvailable(format!("HTTP client: {}", e)))?;

        Ok(Self { endpoints, client })
    }

    async fn predict(&self, endpoint: &Endpoint, image_b64: &str) -> Result<PredictResponse, OcrError> {
        let response = self
            .client
            .post(endpoint.url.clone())
            .json(&PredictRequest { images: [image_b64] })
            .send()
            .await
            .map_err(|e| OcrError::OcrFailed(format!("PaddleOCR request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::OcrFailed(format!(
                "PaddleOCR returned status {}: {}",
                status, body
            )));
        }

        response
            .json::<PredictResponse>()
            .await
            .map_err(|e| OcrError::OcrFailed(format!("Invalid PaddleOCR response: {}", e)))
    }
}

/// Lines and token confidences from one response.
fn response_lines(response: PredictResponse) -> (Vec<String>, Vec<f64>) {
    let mut lines = Vec::new();
    let mut confidences = Vec::new();
    for line in response.results.into_iter().next().unwrap_or_default() {
        if let Some(conf) = line.confidence {
            confidences.push(normalize_confidence(conf));
        }
        lines.push(line.text);
    }
    (lines, confidences)
}

/// Serving endpoints report 0-1; scale to 0-100.
fn normalize_confidence(conf: f64) -> f64 {
    if conf <= 1.0 {
        conf * 100.0
    } else {
        conf
    }
}

/// Merge per-language outputs keeping first-seen order, dropping lines that
/// repeat case-insensitively.
pub fn merge_lines<I, S>(outputs: I) -> String
where
    I: IntoIterator<Item = Vec<S>>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for lines in outputs {
        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }
            if seen.insert(line.to_lowercase()) {
                merged.push(line.to_string());
            }
        }
    }
    merged.join("\n")
}

impl OcrBackend for PaddleBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::PaddleOcr
    }

    fn is_available(&self) -> bool {
        !self.endpoints.is_empty()
    }

    fn availability_hint(&self) -> String {
        format!(
            "PaddleOCR endpoints: {}",
            self.endpoints
                .iter()
                .map(|e| format!("{}={}", e.language, e.url))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }

    fn ocr_image(&self, image_path: &Path) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let image_b64 = encode_image_base64(image_path)?;

        let mut outputs = Vec::new();
        let mut confidences = Vec::new();
        let mut last_error = None;

        for endpoint in &self.endpoints {
            match block_on_async("paddle", self.predict(endpoint, &image_b64)) {
                Ok(response) => {
                    let (lines, confs) = response_lines(response);
                    debug!("PaddleOCR [{}]: {} lines", endpoint.language, lines.len());
                    outputs.push(lines);
                    confidences.extend(confs);
                }
                Err(e) => {
                    warn!("PaddleOCR [{}] failed: {}", endpoint.language, e);
                    last_error = Some(e);
                }
            }
        }

        if outputs.is_empty() {
            return Err(last_error.unwrap_or_else(|| {
                OcrError::BackendNotAvailable("no PaddleOCR endpoints".to_string())
            }));
        }

        let text = merge_lines(outputs);
        if text.is_empty() {
            return Err(OcrError::OcrFailed(
                "PaddleOCR extracted no text from image".to_string(),
            ));
        }

        let confidence = (!confidences.is_empty())
            .then(|| confidences.iter().sum::<f64>() / confidences.len() as f64);

        Ok(OcrResult {
            text,
            confidence,
            backend: OcrBackendType::PaddleOcr,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_merge_lines_dedupes_case_insensitively() {
        let en = vec!["Government of India", "Rahul Sharma", "DOB: 01/02/1990"];
        let hi = vec!["भारत सरकार", "RAHUL SHARMA", "  ", "DOB: 01/02/1990"];
        let merged = merge_lines(vec![en, hi]);
        assert_eq!(
            merged,
            "Government of India\nRahul Sharma\nDOB: 01/02/1990\nभारत सरकार"
        );
    }

    #[test]
    fn test_response_lines_scales_confidence() {
        let response: PredictResponse = serde_json::from_str(
            r#"{"results":[[{"text":"Net Pay","confidence":0.9},{"text":"50,000"}]]}"#,
        )
        .unwrap();
        let (lines, confs) = response_lines(response);
        assert_eq!(lines, vec!["Net Pay", "50,000"]);
        assert_eq!(confs, vec![90.0]);
    }

    #[test]
    fn test_empty_response_has_no_lines() {
        let response: PredictResponse = serde_json::from_str("{}").unwrap();
        let (lines, confs) = response_lines(response);
        assert!(lines.is_empty());
        assert!(confs.is_empty());
    }

    #[test]
    fn test_disabled_is_unavailable() {
        let settings = PaddleSettings {
            enabled: false,
            ..Default::default()
        };
        assert!(matches!(
            PaddleBackend::from_settings(&settings),
            Err(OcrError::BackendNotAvailable(_))
        ));
    }

    #[test]
    fn test_no_valid_endpoint_is_unavailable() {
        let mut endpoints = BTreeMap::new();
        endpoints.insert("en".to_string(), "not a url".to_string());
        let settings = PaddleSettings {
            enabled: true,
            endpoints,
            timeout_secs: 5,
        };
        assert!(PaddleBackend::from_settings(&settings).is_err());
    }

    #[test]
    fn test_english_endpoint_first() {
        let mut endpoints = BTreeMap::new();
        endpoints.insert("en".to_string(), "http://localhost:8866/en".to_string());
        endpoints.insert("ar".to_string(), "http://localhost:8866/ar".to_string());
        let settings = PaddleSettings {
            enabled: true,
            endpoints,
            timeout_secs: 5,
        };
        let backend = PaddleBackend::from_settings(&settings).unwrap();
        assert_eq!(backend.endpoints[0].language, "en");
        assert!(backend.is_available());
    }
}
