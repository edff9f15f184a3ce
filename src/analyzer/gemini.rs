//! Gemini API連携
//!
//! 画像1枚とプロンプトを generateContent に送信し、
//! 最初の候補のテキストをそのまま返す

use super::{ImagePayload, ProductAnalyzer};
use crate::config::Config;
use crate::error::{DetectError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini APIリクエスト
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

/// Gemini APIレスポンス
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
    }
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, timeout: Duration, temperature: f32) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key,
            model,
            temperature,
        })
    }

    /// 設定からクライアントを作成（APIキー未設定ならMissingApiKey）
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.get_api_key()?;
        Self::new(
            api_key,
            config.model.clone(),
            Duration::from_secs(config.timeout_seconds),
            config.temperature,
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", GEMINI_API_BASE, self.model)
    }

    /// APIキーはURLに載せずヘッダーで渡す
    fn http_request(&self, request: &GeminiRequest) -> reqwest::RequestBuilder {
        self.http
            .post(self.endpoint())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(request)
    }

    fn build_request(&self, prompt: &str, image: &ImagePayload) -> GeminiRequest {
        GeminiRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text: prompt.to_string() },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type.clone(),
                            data: image.data.clone(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl ProductAnalyzer for GeminiClient {
    async fn analyze(&self, prompt: &str, image: &ImagePayload) -> Result<String> {
        let request = self.build_request(prompt, image);

        debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            image_len = image.data.len(),
            "Gemini API呼び出し"
        );

        let response = self.http_request(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DetectError::ApiCall(format!("API error {}: {}", status, body)));
        }

        let payload: GeminiResponse = response
            .json()
            .await
            .map_err(|e| DetectError::ApiCall(format!("レスポンス読み込みエラー: {}", e.without_url())))?;

        let text = payload
            .first_text()
            .ok_or_else(|| DetectError::ApiCall("Empty response".into()))?;

        debug!(response_len = text.len(), "Gemini APIレスポンス受信");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new(
            "test-key".into(),
            "gemini-2.0-flash".into(),
            Duration::from_secs(5),
            0.1,
        )
        .unwrap()
    }

    // =============================================
    // リクエスト シリアライズテスト
    // =============================================

    #[test]
    fn test_endpoint() {
        assert_eq!(
            client().endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_api_key_sent_in_header() {
        let payload = ImagePayload {
            data: "base64data".into(),
            mime_type: "image/jpeg".into(),
        };
        let c = client();
        let request = c.http_request(&c.build_request("p", &payload)).build().unwrap();

        assert!(request.url().query().is_none());
        assert!(!request.url().as_str().contains("test-key"));
        assert_eq!(request.headers()[API_KEY_HEADER], "test-key");
    }

    #[test]
    fn test_request_serialize() {
        let payload = ImagePayload {
            data: "base64data".into(),
            mime_type: "image/jpeg".into(),
        };
        let request = client().build_request("テストプロンプト", &payload);

        let json = serde_json::to_value(&request).expect("シリアライズ失敗");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "テストプロンプト");
        assert_eq!(json["contents"][0]["parts"][1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(json["contents"][0]["parts"][1]["inline_data"]["data"], "base64data");
        assert!(json["generationConfig"]["temperature"].is_number());
    }

    #[test]
    fn test_part_text_serialize() {
        let part = Part::Text { text: "Hello".to_string() };
        let json = serde_json::to_string(&part).expect("シリアライズ失敗");
        assert_eq!(json, r#"{"text":"Hello"}"#);
    }

    // =============================================
    // レスポンス デシリアライズテスト
    // =============================================

    #[test]
    fn test_response_first_text() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [{
                        "text": "{\"products\": []}"
                    }]
                }
            }]
        }"#;

        let response: GeminiResponse = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert_eq!(response.first_text().as_deref(), Some("{\"products\": []}"));
    }

    #[test]
    fn test_response_without_candidates() {
        let json = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;

        let response: GeminiResponse = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert!(response.first_text().is_none());
    }

    #[test]
    fn test_response_candidate_without_content() {
        let json = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;

        let response: GeminiResponse = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert!(response.first_text().is_none());
    }

    #[test]
    fn test_from_config_without_key() {
        // 環境変数が設定されている環境ではスキップ
        if std::env::var(crate::config::API_KEY_ENV).is_ok() {
            return;
        }
        let result = GeminiClient::from_config(&Config::default());
        assert!(matches!(result, Err(DetectError::MissingApiKey)));
    }
}
