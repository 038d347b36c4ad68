use std::collections::BTreeMap;
use std::time::Duration;

use log::{debug, info};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::error::InferenceError;
use crate::models::{ImageRef, PredictionResult, RipenessClass};
use crate::settings::SettingsStore;

const MULTIPART_FIELD: &str = "file";
const UPLOAD_FILENAME: &str = "photo.jpg";
const UPLOAD_MIME: &str = "image/jpeg";

/// Sum tolerance when the service reports a full probability distribution.
const DISTRIBUTION_TOLERANCE: f64 = 1e-3;

/// Wire shape of the grader's response. `all_probs` is optional: the current
/// service reports only the top class, in which case the two-label complement
/// is derived locally.
#[derive(Debug, Deserialize)]
struct RawPrediction {
    class: String,
    confidence: f64,
    #[serde(default)]
    all_probs: Option<BTreeMap<String, f64>>,
}

/// HTTP client for the remote ripeness grader. Stateless besides the reqwest
/// connection pool; the endpoint and timeout are read from settings on every
/// request so edits apply without a restart. No retries happen here.
#[derive(Clone)]
pub struct InferenceClient {
    http: reqwest::Client,
    settings: SettingsStore,
}

impl InferenceClient {
    pub fn new(settings: SettingsStore) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    fn endpoint(&self) -> String {
        std::env::var("POMEGRADE_ENDPOINT")
            .unwrap_or_else(|_| self.settings.inference().endpoint_url)
    }

    /// Sends the image as a single multipart part and returns the typed
    /// prediction. The image bytes are forwarded as-is; the service is the
    /// one that decides whether they decode.
    pub async fn classify(&self, image: &ImageRef) -> Result<PredictionResult, InferenceError> {
        let bytes = tokio::fs::read(image.local_path())
            .await
            .map_err(|err| InferenceError::ImageUnreadable(err.to_string()))?;

        let endpoint = self.endpoint();
        let timeout = Duration::from_secs(self.settings.inference().timeout_secs);
        debug!("submitting {} bytes to {endpoint}", bytes.len());

        let part = Part::bytes(bytes)
            .file_name(UPLOAD_FILENAME)
            .mime_str(UPLOAD_MIME)?;
        let form = Form::new().part(MULTIPART_FIELD, part);

        let response = self
            .http
            .post(&endpoint)
            .multipart(form)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(InferenceError::NonSuccessStatus(status.as_u16()));
        }

        let raw: RawPrediction = response.json().await?;
        let result = prediction_from_raw(raw)?;
        info!(
            "grader predicted {} at {:.1}%",
            result.class.as_str(),
            result.confidence * 100.0
        );
        Ok(result)
    }
}

/// Validates the raw response and builds the typed prediction. When the
/// service omits the full distribution, the remaining probability mass goes
/// to the other label; that derivation only holds for a two-label set.
fn prediction_from_raw(raw: RawPrediction) -> Result<PredictionResult, InferenceError> {
    let class = RipenessClass::from_label(&raw.class)
        .ok_or_else(|| InferenceError::MalformedResponse(format!("unknown class '{}'", raw.class)))?;

    if !(0.0..=1.0).contains(&raw.confidence) || !raw.confidence.is_finite() {
        return Err(InferenceError::MalformedResponse(format!(
            "confidence {} outside [0, 1]",
            raw.confidence
        )));
    }

    let Some(reported) = raw.all_probs else {
        return Ok(PredictionResult::from_top_label(class, raw.confidence));
    };

    let mut all_probs = BTreeMap::new();
    for label in RipenessClass::ALL {
        let prob = reported.get(label.as_str()).copied().ok_or_else(|| {
            InferenceError::MalformedResponse(format!("distribution is missing '{}'", label.as_str()))
        })?;
        if !(0.0..=1.0).contains(&prob) || !prob.is_finite() {
            return Err(InferenceError::MalformedResponse(format!(
                "probability {prob} for '{}' outside [0, 1]",
                label.as_str()
            )));
        }
        all_probs.insert(label, prob);
    }

    let total: f64 = all_probs.values().sum();
    if (total - 1.0).abs() > DISTRIBUTION_TOLERANCE {
        return Err(InferenceError::MalformedResponse(format!(
            "distribution sums to {total}, expected 1.0"
        )));
    }

    Ok(PredictionResult {
        class,
        confidence: raw.confidence,
        all_probs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(class: &str, confidence: f64) -> RawPrediction {
        RawPrediction {
            class: class.to_string(),
            confidence,
            all_probs: None,
        }
    }

    #[test]
    fn top_label_response_derives_the_complement() {
        let result = prediction_from_raw(raw("Ripe", 0.87)).unwrap();
        assert_eq!(result.class, RipenessClass::Ripe);
        assert!((result.probability_of(RipenessClass::Overripe) - 0.13).abs() < 1e-9);
    }

    #[test]
    fn unknown_class_is_malformed() {
        let err = prediction_from_raw(raw("Unripe", 0.5)).unwrap_err();
        assert!(matches!(err, InferenceError::MalformedResponse(_)));
    }

    #[test]
    fn out_of_range_confidence_is_malformed() {
        assert!(matches!(
            prediction_from_raw(raw("Ripe", 1.3)).unwrap_err(),
            InferenceError::MalformedResponse(_)
        ));
        assert!(matches!(
            prediction_from_raw(raw("Ripe", -0.1)).unwrap_err(),
            InferenceError::MalformedResponse(_)
        ));
    }

    #[test]
    fn full_distribution_is_used_verbatim_when_valid() {
        let mut probs = BTreeMap::new();
        probs.insert("Ripe".to_string(), 0.25);
        probs.insert("Overripe".to_string(), 0.75);

        let result = prediction_from_raw(RawPrediction {
            class: "Overripe".to_string(),
            confidence: 0.75,
            all_probs: Some(probs),
        })
        .unwrap();

        assert!((result.probability_of(RipenessClass::Ripe) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn distribution_that_does_not_sum_to_one_is_malformed() {
        let mut probs = BTreeMap::new();
        probs.insert("Ripe".to_string(), 0.5);
        probs.insert("Overripe".to_string(), 0.9);

        let err = prediction_from_raw(RawPrediction {
            class: "Overripe".to_string(),
            confidence: 0.9,
            all_probs: Some(probs),
        })
        .unwrap_err();
        assert!(matches!(err, InferenceError::MalformedResponse(_)));
    }

    #[test]
    fn body_parses_from_the_service_wire_shape() {
        let raw: RawPrediction =
            serde_json::from_str(r#"{"class": "Ripe", "confidence": 0.92}"#).unwrap();
        assert_eq!(raw.class, "Ripe");
        assert!(raw.all_probs.is_none());
    }
}
