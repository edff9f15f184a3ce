//! 商品検出ワークフロー
//!
//! 画像選択 → 商品名入力 → リモート解析 → 結果パース を1つの状態オブジェクトで管理する。
//!
//! 解析は3段階に分かれている:
//! - begin_analysis: 入力チェックと Analyzing への遷移（同期）
//! - PendingAnalysis::execute: リモート呼び出し（唯一の待機点）
//! - complete_analysis: レスポンスを現在の状態に反映
//!
//! 待機中も画像や商品名の編集は受け付ける。画像の差し替え・削除・リセットで
//! 世代番号が進み、古い世代のレスポンスは破棄される。

mod state;

pub use state::{FailureKind, ImageAsset, WorkflowFailure, WorkflowState};

use crate::analyzer::{GeminiClient, ImagePayload, ProductAnalyzer};
use crate::config::Config;
use crate::error::{DetectError, Result};
use crate::image_source::is_image_media_type;
use product_detect_common::{build_detection_prompt, parse_products_response, AnalysisResult, ProductQuery};
use std::sync::Arc;
use tracing::{debug, info, warn};

const NO_IMAGE_MESSAGE: &str = "画像が選択されていません";
const NO_PRODUCTS_MESSAGE: &str = "商品名が入力されていません（1つ以上入力してください）";

/// 送信待ちの解析リクエスト
///
/// コントローラを借用しないので、待機中もコントローラを操作できる
pub struct PendingAnalysis {
    generation: u64,
    analyzer: Arc<dyn ProductAnalyzer>,
    pub prompt: String,
    pub image: ImagePayload,
    pub product_names: Vec<String>,
}

impl PendingAnalysis {
    pub async fn execute(self) -> AnalysisResponse {
        let response = self.analyzer.analyze(&self.prompt, &self.image).await;
        AnalysisResponse {
            generation: self.generation,
            response,
        }
    }
}

/// リモート呼び出しの結果（パース前）
pub struct AnalysisResponse {
    generation: u64,
    pub response: Result<String>,
}

pub struct DetectionWorkflow {
    analyzer: Option<Arc<dyn ProductAnalyzer>>,
    config_notice: Option<String>,
    image: Option<ImageAsset>,
    query: ProductQuery,
    state: WorkflowState,
    generation: u64,
    /// 送信中リクエストの世代（Analyzing に遷移させたもの）
    in_flight: Option<u64>,
}

impl DetectionWorkflow {
    pub fn new(analyzer: Arc<dyn ProductAnalyzer>) -> Self {
        Self::build(Some(analyzer), None)
    }

    /// 解析サービスなしで作成（RunAnalysisは常に設定エラーになる）
    pub fn unconfigured(notice: impl Into<String>) -> Self {
        Self::build(None, Some(notice.into()))
    }

    /// 設定からGeminiクライアントを作成。APIキーがなければ未設定状態で作成
    pub fn from_config(config: &Config) -> Result<Self> {
        match GeminiClient::from_config(config) {
            Ok(client) => Ok(Self::new(Arc::new(client))),
            Err(e @ DetectError::MissingApiKey) => {
                warn!("APIキー未設定のため解析は無効です");
                Ok(Self::unconfigured(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    fn build(analyzer: Option<Arc<dyn ProductAnalyzer>>, config_notice: Option<String>) -> Self {
        Self {
            analyzer,
            config_notice,
            image: None,
            query: ProductQuery::new(),
            state: WorkflowState::Idle,
            generation: 0,
            in_flight: None,
        }
    }

    // =============================================
    // 参照
    // =============================================

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn image(&self) -> Option<&ImageAsset> {
        self.image.as_ref()
    }

    pub fn query(&self) -> &ProductQuery {
        &self.query
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.state {
            WorkflowState::Completed(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&WorkflowFailure> {
        match &self.state {
            WorkflowState::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// APIキー未設定時の常時表示メッセージ
    pub fn configuration_notice(&self) -> Option<&str> {
        self.config_notice.as_deref()
    }

    /// 解析サービスが使えるか確認（未設定なら MissingApiKey）
    pub fn require_configured(&self) -> Result<()> {
        if self.analyzer.is_none() {
            return Err(DetectError::MissingApiKey);
        }
        Ok(())
    }

    pub fn is_analyzing(&self) -> bool {
        matches!(self.state, WorkflowState::Analyzing)
    }

    // =============================================
    // 画像
    // =============================================

    /// 画像を差し替える。画像以外のMIMEタイプは無視（falseを返す）
    pub fn set_image(&mut self, image: ImageAsset) -> bool {
        if !is_image_media_type(&image.media_type) {
            debug!(media_type = %image.media_type, "画像以外のため無視");
            return false;
        }

        info!(
            name = image.display_name(),
            media_type = %image.media_type,
            size = image.bytes.len(),
            "画像を選択"
        );
        self.image = Some(image);
        self.generation += 1;
        if !self.is_analyzing() {
            self.state = WorkflowState::ImageSelected;
        }
        true
    }

    pub fn remove_image(&mut self) {
        self.image = None;
        self.generation += 1;
        self.state = WorkflowState::Idle;
    }

    // =============================================
    // 商品名スロット
    // =============================================

    pub fn set_product(&mut self, index: usize, text: impl Into<String>) -> bool {
        self.query.set(index, text)
    }

    pub fn add_product_slot(&mut self) {
        self.query.add_slot();
    }

    /// 最後の1スロットは削除しない
    pub fn remove_product_slot(&mut self, index: usize) -> bool {
        self.query.remove_slot(index)
    }

    pub fn reset(&mut self) {
        self.image = None;
        self.query.clear();
        self.generation += 1;
        self.state = WorkflowState::Idle;
        info!("リセット");
    }

    // =============================================
    // 解析
    // =============================================

    /// 入力をチェックして Analyzing に遷移する
    ///
    /// - 解析中なら何もしない（None）
    /// - 入力・設定に問題があれば Failed に遷移（None、リモート呼び出しなし）
    pub fn begin_analysis(&mut self) -> Option<PendingAnalysis> {
        if self.is_analyzing() {
            debug!("解析中のため実行要求を無視");
            return None;
        }

        let Some(analyzer) = self.analyzer.clone() else {
            let notice = self
                .config_notice
                .clone()
                .unwrap_or_else(|| DetectError::MissingApiKey.to_string());
            self.fail(FailureKind::Configuration, notice);
            return None;
        };

        let Some(image) = self.image.as_ref() else {
            self.fail(FailureKind::Validation, NO_IMAGE_MESSAGE);
            return None;
        };

        let product_names = self.query.trimmed_names();
        if product_names.is_empty() {
            self.fail(FailureKind::Validation, NO_PRODUCTS_MESSAGE);
            return None;
        }

        let prompt = build_detection_prompt(&product_names);
        let payload = ImagePayload::encode(&image.bytes, &image.media_type);

        info!(
            image = image.display_name(),
            products = product_names.len(),
            "解析開始"
        );
        self.state = WorkflowState::Analyzing;
        self.in_flight = Some(self.generation);

        Some(PendingAnalysis {
            generation: self.generation,
            analyzer,
            prompt,
            image: payload,
            product_names,
        })
    }

    /// リモート呼び出しの結果を反映する
    ///
    /// 古い世代の結果は破棄して false を返す。
    /// Analyzing を抜けるのは、その状態にしたリクエストの結果が届いたときだけ
    pub fn complete_analysis(&mut self, response: AnalysisResponse) -> bool {
        let owns_state = self.in_flight == Some(response.generation);
        if owns_state {
            self.in_flight = None;
        }

        if response.generation != self.generation || !owns_state || !self.is_analyzing() {
            debug!(
                response_generation = response.generation,
                current_generation = self.generation,
                "古い解析結果を破棄"
            );
            // 解析中の画像差し替えで置き換えられたリクエスト
            if owns_state && self.is_analyzing() {
                self.state = if self.image.is_some() {
                    WorkflowState::ImageSelected
                } else {
                    WorkflowState::Idle
                };
            }
            return false;
        }

        let text = match response.response {
            Ok(text) => text,
            Err(e) => {
                self.fail(FailureKind::Service, format!("解析サービスの呼び出しに失敗しました: {}", e));
                return true;
            }
        };

        match parse_products_response(&text) {
            Ok(result) => {
                info!(products = result.len(), "解析完了");
                self.state = WorkflowState::Completed(result);
            }
            Err(e) => {
                let preview: String = text.chars().take(200).collect();
                debug!(response = %preview, "パースできないレスポンス");
                self.fail(FailureKind::Parse, format!("解析結果を読み取れませんでした: {}", e));
            }
        }
        true
    }

    /// begin → execute → complete をまとめて実行
    pub async fn run_analysis(&mut self) -> &WorkflowState {
        if let Some(pending) = self.begin_analysis() {
            let response = pending.execute().await;
            self.complete_analysis(response);
        }
        &self.state
    }

    fn fail(&mut self, kind: FailureKind, message: impl Into<String>) {
        let failure = WorkflowFailure::new(kind, message);
        warn!(kind = kind.label(), message = %failure.message, "解析失敗");
        self.state = WorkflowState::Failed(failure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedAnalyzer {
        response: String,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ProductAnalyzer for FixedAnalyzer {
        async fn analyze(&self, _prompt: &str, _image: &ImagePayload) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }
    }

    fn workflow(response: &str) -> (DetectionWorkflow, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let analyzer = FixedAnalyzer {
            response: response.to_string(),
            calls: calls.clone(),
        };
        (DetectionWorkflow::new(Arc::new(analyzer)), calls)
    }

    fn png() -> ImageAsset {
        ImageAsset::new(vec![0x89, b'P', b'N', b'G'], "image/png")
    }

    const OK_RESPONSE: &str = r#"{"products":[{"name":"Pepsi","score":4,"reasoning":"blue label"}]}"#;

    #[test]
    fn test_set_image_transitions_to_selected() {
        let (mut wf, _) = workflow(OK_RESPONSE);
        assert!(wf.set_image(png()));
        assert_eq!(wf.state(), &WorkflowState::ImageSelected);
        assert!(wf.image().is_some());
    }

    #[test]
    fn test_set_image_non_image_is_noop() {
        let (mut wf, _) = workflow(OK_RESPONSE);
        assert!(!wf.set_image(ImageAsset::new(b"%PDF".to_vec(), "application/pdf")));
        assert_eq!(wf.state(), &WorkflowState::Idle);
        assert!(wf.image().is_none());
    }

    #[test]
    fn test_begin_analysis_builds_prompt_and_payload() {
        let (mut wf, _) = workflow(OK_RESPONSE);
        wf.set_image(png());
        wf.set_product(0, "  Pepsi  ");
        wf.add_product_slot();

        let pending = wf.begin_analysis().unwrap();
        assert_eq!(pending.product_names, vec!["Pepsi"]);
        assert!(pending.prompt.contains("- Pepsi\n"));
        assert_eq!(pending.image.mime_type, "image/png");
        assert_eq!(pending.image.data, "iVBORw==");
        assert!(wf.is_analyzing());
    }

    #[test]
    fn test_begin_analysis_while_analyzing_is_ignored() {
        let (mut wf, _) = workflow(OK_RESPONSE);
        wf.set_image(png());
        wf.set_product(0, "Pepsi");

        assert!(wf.begin_analysis().is_some());
        assert!(wf.begin_analysis().is_none());
        assert!(wf.is_analyzing());
    }

    #[tokio::test]
    async fn test_set_image_during_analysis_discards_response() {
        let (mut wf, _) = workflow(OK_RESPONSE);
        wf.set_image(png());
        wf.set_product(0, "Pepsi");

        let pending = wf.begin_analysis().unwrap();
        wf.set_image(png().with_name("other.png"));
        // 解析中のまま
        assert!(wf.is_analyzing());

        let response = pending.execute().await;
        assert!(!wf.complete_analysis(response));
        assert_eq!(wf.state(), &WorkflowState::ImageSelected);
        assert!(wf.result().is_none());
    }

    #[tokio::test]
    async fn test_product_edit_during_analysis_keeps_response() {
        let (mut wf, _) = workflow(OK_RESPONSE);
        wf.set_image(png());
        wf.set_product(0, "Pepsi");

        let pending = wf.begin_analysis().unwrap();
        wf.set_product(0, "Sprite");

        let response = pending.execute().await;
        assert!(wf.complete_analysis(response));
        assert_eq!(wf.result().unwrap().products[0].name, "Pepsi");
    }

    #[tokio::test]
    async fn test_reset_during_analysis_discards_response() {
        let (mut wf, _) = workflow(OK_RESPONSE);
        wf.set_image(png());
        wf.set_product(0, "Pepsi");

        let pending = wf.begin_analysis().unwrap();
        wf.reset();

        let response = pending.execute().await;
        assert!(!wf.complete_analysis(response));
        assert_eq!(wf.state(), &WorkflowState::Idle);
    }

    #[test]
    fn test_require_configured() {
        let (wf, _) = workflow(OK_RESPONSE);
        assert!(wf.require_configured().is_ok());

        let wf = DetectionWorkflow::unconfigured("APIキーがありません");
        assert!(matches!(wf.require_configured(), Err(DetectError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_unconfigured_fails_without_call() {
        let mut wf = DetectionWorkflow::unconfigured("APIキーがありません");
        wf.set_image(png());
        wf.set_product(0, "Pepsi");

        assert_eq!(wf.configuration_notice(), Some("APIキーがありません"));
        wf.run_analysis().await;

        let failure = wf.error().unwrap();
        assert_eq!(failure.kind, FailureKind::Configuration);
        assert_eq!(failure.message, "APIキーがありません");
    }

    #[tokio::test]
    async fn test_new_image_clears_previous_result() {
        let (mut wf, calls) = workflow(OK_RESPONSE);
        wf.set_image(png());
        wf.set_product(0, "Pepsi");
        wf.run_analysis().await;
        assert!(wf.result().is_some());

        wf.set_image(png());
        assert!(wf.result().is_none());
        assert!(wf.error().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_remove_image_keeps_products() {
        let (mut wf, _) = workflow(OK_RESPONSE);
        wf.set_image(png());
        wf.set_product(0, "Pepsi");
        wf.run_analysis().await;

        wf.remove_image();
        assert_eq!(wf.state(), &WorkflowState::Idle);
        assert!(wf.image().is_none());
        assert_eq!(wf.query().trimmed_names(), vec!["Pepsi"]);
    }
}
