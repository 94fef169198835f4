// Translation backend client
// Thin wrapper around the public Google translate endpoint. One attempt per
// call; failures are classified so batch callers can isolate them per target.

use futures::future::BoxFuture;
use serde_json::Value;

use crate::utils::languages;

pub const TRANSLATE_API_BASE: &str = "https://translate.googleapis.com/translate_a/single";

/// Outcome of a single translation call.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationResult {
    pub translated_text: String,
    /// Language the backend detected (or was told) the input is in
    pub detected_source: String,
    /// Backend's detection confidence, 0..=1; 1.0 when not reported
    pub confidence: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("nothing to translate")]
    EmptyInput,
    #[error("unsupported language `{0}`")]
    UnsupportedLanguage(String),
    #[error("translation backend unavailable: {0}")]
    Unavailable(String),
}

/// Seam between the dispatcher and the translation backend.
pub trait Translator: Send + Sync {
    fn translate<'a>(
        &'a self,
        text: &'a str,
        target: &'a str,
        source: Option<&'a str>,
    ) -> BoxFuture<'a, Result<TranslationResult, TranslateError>>;
}

/// Client for the free Google translate web endpoint, the same backend the
/// deep-translator library drives.
pub struct GoogleTranslator {
    client: reqwest::Client,
}

impl GoogleTranslator {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Detect the language of `text` by translating toward English.
    pub async fn detect(&self, text: &str) -> Result<TranslationResult, TranslateError> {
        self.request(text, "en", None).await
    }

    async fn request(
        &self,
        text: &str,
        target: &str,
        source: Option<&str>,
    ) -> Result<TranslationResult, TranslateError> {
        if text.trim().is_empty() {
            return Err(TranslateError::EmptyInput);
        }
        if languages::resolve(target).is_none() {
            return Err(TranslateError::UnsupportedLanguage(target.to_string()));
        }
        if let Some(code) = source {
            if languages::resolve(code).is_none() {
                return Err(TranslateError::UnsupportedLanguage(code.to_string()));
            }
        }

        let source_param = source.unwrap_or("auto");
        let response = self
            .client
            .get(TRANSLATE_API_BASE)
            .query(&[
                ("client", "gtx"),
                ("sl", source_param),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| TranslateError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            // The endpoint rejects unknown sl/tl values with a 4xx
            return Err(TranslateError::UnsupportedLanguage(format!(
                "{} -> {}",
                source_param, target
            )));
        }
        if !status.is_success() {
            return Err(TranslateError::Unavailable(format!(
                "backend returned {}",
                status
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| TranslateError::Unavailable(e.to_string()))?;
        parse_payload(&payload, source)
    }
}

impl Translator for GoogleTranslator {
    fn translate<'a>(
        &'a self,
        text: &'a str,
        target: &'a str,
        source: Option<&'a str>,
    ) -> BoxFuture<'a, Result<TranslationResult, TranslateError>> {
        Box::pin(self.request(text, target, source))
    }
}

/// The gtx payload is a positional JSON array: index 0 holds the translated
/// segments, index 2 the detected source language, index 6 the confidence.
fn parse_payload(
    payload: &Value,
    requested_source: Option<&str>,
) -> Result<TranslationResult, TranslateError> {
    let segments = payload
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslateError::Unavailable("malformed backend response".into()))?;

    let mut translated_text = String::new();
    for segment in segments {
        if let Some(piece) = segment.get(0).and_then(Value::as_str) {
            translated_text.push_str(piece);
        }
    }
    if translated_text.is_empty() {
        return Err(TranslateError::Unavailable("empty backend response".into()));
    }

    let detected_source = payload
        .get(2)
        .and_then(Value::as_str)
        .or(requested_source)
        .unwrap_or("auto")
        .to_string();

    let confidence = payload.get(6).and_then(Value::as_f64).unwrap_or(1.0);

    Ok(TranslationResult {
        translated_text,
        detected_source,
        confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_empty_input_rejected_locally() {
        let translator = GoogleTranslator::new(reqwest::Client::new());
        assert!(matches!(
            translator.translate("   ", "ko", None).await,
            Err(TranslateError::EmptyInput)
        ));
    }

    #[tokio::test]
    async fn test_unknown_code_rejected_locally() {
        let translator = GoogleTranslator::new(reqwest::Client::new());
        assert!(matches!(
            translator.translate("hello", "klingon", None).await,
            Err(TranslateError::UnsupportedLanguage(_))
        ));
        assert!(matches!(
            translator.translate("hello", "ko", Some("klingon")).await,
            Err(TranslateError::UnsupportedLanguage(_))
        ));
    }

    #[test]
    fn test_parse_payload_joins_segments() {
        let payload = json!([
            [["Hello ", "Bonjour ", null], ["world", "le monde", null]],
            null,
            "fr",
            null,
            null,
            null,
            0.97
        ]);
        let result = parse_payload(&payload, None).unwrap();
        assert_eq!(result.translated_text, "Hello world");
        assert_eq!(result.detected_source, "fr");
        assert!((result.confidence - 0.97).abs() < 1e-9);
    }

    #[test]
    fn test_parse_payload_defaults() {
        // No confidence reported, explicit source requested
        let payload = json!([[["Hola", "Hello", null]], null, null]);
        let result = parse_payload(&payload, Some("en")).unwrap();
        assert_eq!(result.detected_source, "en");
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_parse_payload_malformed() {
        assert!(matches!(
            parse_payload(&json!({"unexpected": true}), None),
            Err(TranslateError::Unavailable(_))
        ));
        assert!(matches!(
            parse_payload(&json!([[]]), None),
            Err(TranslateError::Unavailable(_))
        ));
    }
}
