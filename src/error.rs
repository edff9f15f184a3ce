use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`product-detect config --set-api-key YOUR_KEY` または環境変数 GEMINI_API_KEY で設定してください")]
    MissingApiKey,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("画像ファイルではありません: {0}")]
    UnsupportedMediaType(String),

    #[error("API呼び出しエラー: {0}")]
    ApiCall(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("入力エラー: {0}")]
    Prompt(#[from] dialoguer::Error),
}

/// URLはメッセージに含めない
impl From<reqwest::Error> for DetectError {
    fn from(e: reqwest::Error) -> Self {
        DetectError::ApiCall(e.without_url().to_string())
    }
}

pub type Result<T> = std::result::Result<T, DetectError>;
