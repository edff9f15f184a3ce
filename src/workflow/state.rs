//! ワークフローの状態型

use product_detect_common::AnalysisResult;
use std::fmt;

/// 選択中の画像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    /// 表示用のファイル名（任意）
    pub name: Option<String>,
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl ImageAsset {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            name: None,
            bytes,
            media_type: media_type.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(無題)")
    }
}

/// 失敗の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 画像未選択・商品名未入力
    Validation,
    /// APIキー未設定
    Configuration,
    /// リモート呼び出しの失敗（通信・認証・空レスポンス）
    Service,
    /// レスポンスからJSONを取り出せない・形式不正
    Parse,
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Validation => "入力エラー",
            FailureKind::Configuration => "設定エラー",
            FailureKind::Service => "サービスエラー",
            FailureKind::Parse => "解析エラー",
        }
    }
}

/// 表示用の失敗メッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl WorkflowFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for WorkflowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    ImageSelected,
    Analyzing,
    Completed(AnalysisResult),
    Failed(WorkflowFailure),
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "Idle",
            WorkflowState::ImageSelected => "ImageSelected",
            WorkflowState::Analyzing => "Analyzing",
            WorkflowState::Completed(_) => "Completed",
            WorkflowState::Failed(_) => "Failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display() {
        let failure = WorkflowFailure::new(FailureKind::Parse, "JSONが見つかりません");
        assert_eq!(failure.to_string(), "解析エラー: JSONが見つかりません");
    }

    #[test]
    fn test_image_asset_display_name() {
        let image = ImageAsset::new(vec![1, 2, 3], "image/png");
        assert_eq!(image.display_name(), "(無題)");

        let image = image.with_name("shelf.png");
        assert_eq!(image.display_name(), "shelf.png");
    }

    #[test]
    fn test_default_state_is_idle() {
        assert_eq!(WorkflowState::default(), WorkflowState::Idle);
        assert_eq!(WorkflowState::default().name(), "Idle");
    }
}
