//! リモート画像解析（AIサービス）との境界
//!
//! - ProductAnalyzer: 画像+プロンプト → 自由文レスポンス
//! - ImagePayload: Base64エンコード済みの画像
//! - GeminiClient: Gemini API実装

mod gemini;

pub use gemini::GeminiClient;

use crate::error::Result;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// 送信用の画像データ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Base64エンコード済みデータ
    pub data: String,
    pub mime_type: String,
}

impl ImagePayload {
    pub fn encode(bytes: &[u8], mime_type: &str) -> Self {
        Self {
            data: STANDARD.encode(bytes),
            mime_type: mime_type.to_string(),
        }
    }
}

/// リモート解析サービス
///
/// レスポンスの形式は保証されない（JSON抽出は呼び出し側で行う）
#[async_trait]
pub trait ProductAnalyzer: Send + Sync {
    async fn analyze(&self, prompt: &str, image: &ImagePayload) -> Result<String>;
}
