//! 対話式セッション
//!
//! メニューからワークフローの各操作（画像選択・商品名編集・解析・リセット）を実行する

use crate::error::Result;
use crate::image_source::load_image;
use crate::report::render_table;
use crate::workflow::{DetectionWorkflow, ImageAsset, WorkflowState};
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// メニュー操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// 画像を選択
    SelectImage,
    /// 商品名を編集
    EditProduct,
    /// 入力欄を追加
    AddSlot,
    /// 入力欄を削除
    RemoveSlot,
    /// 解析実行
    Analyze,
    /// 画像を外す
    RemoveImage,
    /// 全部リセット
    Reset,
    /// 終了
    Quit,
}

impl SessionAction {
    pub fn label(&self) -> &'static str {
        match self {
            SessionAction::SelectImage => "画像を選択",
            SessionAction::EditProduct => "商品名を編集",
            SessionAction::AddSlot => "入力欄を追加",
            SessionAction::RemoveSlot => "入力欄を削除",
            SessionAction::Analyze => "解析実行",
            SessionAction::RemoveImage => "画像を外す",
            SessionAction::Reset => "リセット",
            SessionAction::Quit => "終了",
        }
    }
}

/// 現在の状態で選べる操作
pub fn available_actions(workflow: &DetectionWorkflow) -> Vec<SessionAction> {
    let mut actions = vec![
        SessionAction::SelectImage,
        SessionAction::EditProduct,
        SessionAction::AddSlot,
    ];
    if workflow.query().len() > 1 {
        actions.push(SessionAction::RemoveSlot);
    }
    if workflow.image().is_some() && workflow.configuration_notice().is_none() {
        actions.push(SessionAction::Analyze);
    }
    if workflow.image().is_some() {
        actions.push(SessionAction::RemoveImage);
    }
    actions.push(SessionAction::Reset);
    actions.push(SessionAction::Quit);
    actions
}

/// 状態の要約（メニューの上に表示）
pub fn describe(workflow: &DetectionWorkflow) -> String {
    let image = workflow
        .image()
        .map(|i| format!("{} ({})", i.display_name(), i.media_type))
        .unwrap_or_else(|| "未選択".to_string());

    let slots = workflow
        .query()
        .slots()
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let text = if s.trim().is_empty() { "(空欄)" } else { s.as_str() };
            format!("  {}. {}", i + 1, text)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut lines = vec![
        format!("状態: {}", workflow.state().name()),
        format!("画像: {}", image),
        format!("商品名:\n{}", slots),
    ];

    match workflow.state() {
        WorkflowState::Completed(result) => lines.push(format!("結果:\n{}", render_table(result))),
        WorkflowState::Failed(failure) => lines.push(format!("✗ {}", failure)),
        _ => {}
    }

    if let Some(notice) = workflow.configuration_notice() {
        lines.push(format!("⚠ {}", notice));
    }

    lines.join("\n")
}

/// スピナーを表示しながら解析を実行
pub async fn run_with_spinner(workflow: &mut DetectionWorkflow, show_spinner: bool) {
    let Some(pending) = workflow.begin_analysis() else {
        return;
    };

    let spinner = if show_spinner {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner());
        pb.set_message(format!("AI解析中... ({}件)", pending.product_names.len()));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let response = pending.execute().await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    workflow.complete_analysis(response);
}

/// 商品名を1つずつ入力（空Enterで終了）
pub fn prompt_product_names() -> Result<Vec<String>> {
    let mut names = Vec::new();
    loop {
        let input: String = Input::new()
            .with_prompt(format!("商品名 {} (空Enterで終了)", names.len() + 1))
            .allow_empty(true)
            .interact_text()?;

        let trimmed = input.trim();
        if trimmed.is_empty() {
            break;
        }
        names.push(trimmed.to_string());
    }
    Ok(names)
}

/// 対話セッションを実行
pub async fn run_interactive_session(workflow: &mut DetectionWorkflow) -> Result<()> {
    println!("🔍 product-detect - 対話モード\n");

    loop {
        println!("{}\n", describe(workflow));

        let actions = available_actions(workflow);
        let labels: Vec<&str> = actions.iter().map(|a| a.label()).collect();
        let selected = Select::new()
            .with_prompt("操作を選択")
            .items(&labels)
            .default(0)
            .interact()?;

        match actions[selected] {
            SessionAction::SelectImage => {
                let path: String = Input::new().with_prompt("画像ファイルのパス").interact_text()?;
                match load_image(Path::new(path.trim())) {
                    Ok(image) => {
                        let asset = ImageAsset::new(image.bytes, image.mime_type).with_name(image.file_name);
                        if !workflow.set_image(asset) {
                            println!("  → 画像ファイルではないため無視しました\n");
                        }
                    }
                    Err(e) => println!("  → {}\n", e),
                }
            }
            SessionAction::EditProduct => {
                let index = prompt_slot_index(workflow.query().len())?;
                let current = workflow.query().slots()[index].clone();
                let text: String = Input::new()
                    .with_prompt(format!("商品名 {}", index + 1))
                    .with_initial_text(current)
                    .allow_empty(true)
                    .interact_text()?;
                workflow.set_product(index, text);
            }
            SessionAction::AddSlot => workflow.add_product_slot(),
            SessionAction::RemoveSlot => {
                let index = prompt_slot_index(workflow.query().len())?;
                workflow.remove_product_slot(index);
            }
            SessionAction::Analyze => run_with_spinner(workflow, true).await,
            SessionAction::RemoveImage => workflow.remove_image(),
            SessionAction::Reset => workflow.reset(),
            SessionAction::Quit => break,
        }
    }

    Ok(())
}

fn prompt_slot_index(len: usize) -> Result<usize> {
    if len <= 1 {
        return Ok(0);
    }
    let items: Vec<String> = (1..=len).map(|i| format!("{}", i)).collect();
    let selected = Select::new()
        .with_prompt("入力欄の番号")
        .items(&items)
        .default(0)
        .interact()?;
    Ok(selected)
}
