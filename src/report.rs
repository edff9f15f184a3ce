//! 解析結果の表示・保存

use crate::error::Result;
use chrono::Local;
use product_detect_common::{AnalysisResult, ProductResult, SCORE_MAX, SCORE_MIN};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// JSONレポート（--output で保存）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    pub image: String,
    pub analyzed_at: String,
    pub products: Vec<ProductResult>,
}

impl DetectionReport {
    pub fn new(image: &str, result: &AnalysisResult) -> Self {
        Self {
            image: image.to_string(),
            analyzed_at: Local::now().format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
            products: result.products.clone(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// スコアバー（表示のみ範囲内に収める）
fn score_bar(score: i64) -> String {
    let filled = score.clamp(SCORE_MIN, SCORE_MAX) as usize;
    let empty = (SCORE_MAX - SCORE_MIN) as usize - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

/// スコア順の表形式テキスト
pub fn render_table(result: &AnalysisResult) -> String {
    if result.is_empty() {
        return "  (結果なし)".to_string();
    }

    let width = result
        .products
        .iter()
        .map(|p| p.name.chars().count())
        .max()
        .unwrap_or(0);

    result
        .ranked()
        .iter()
        .map(|p| {
            let padding = " ".repeat(width - p.name.chars().count());
            format!(
                "  {}{}  {} {:>2}/{}  {}",
                p.name,
                padding,
                score_bar(p.score),
                p.score,
                SCORE_MAX,
                p.reasoning
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> AnalysisResult {
        AnalysisResult {
            products: vec![
                ProductResult {
                    name: "Pepsi".into(),
                    score: 2,
                    reasoning: "no blue can".into(),
                },
                ProductResult {
                    name: "Coca Cola".into(),
                    score: 9,
                    reasoning: "Red can visible on table".into(),
                },
            ],
        }
    }

    #[test]
    fn test_score_bar() {
        assert_eq!(score_bar(3), "███░░░░░░░");
        assert_eq!(score_bar(0), "░░░░░░░░░░");
        // 範囲外は表示のみ丸める
        assert_eq!(score_bar(15), "██████████");
        assert_eq!(score_bar(-1), "░░░░░░░░░░");
    }

    #[test]
    fn test_render_table_ranked() {
        let table = render_table(&sample());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Coca Cola"));
        assert!(lines[0].contains(" 9/10"));
        assert!(lines[1].contains("Pepsi"));
    }

    #[test]
    fn test_render_table_empty() {
        assert_eq!(render_table(&AnalysisResult::default()), "  (結果なし)");
    }

    #[test]
    fn test_report_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");

        DetectionReport::new("shelf.jpg", &sample()).save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: DetectionReport = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.image, "shelf.jpg");
        assert_eq!(loaded.products.len(), 2);
        // 保存時はAIの順序のまま
        assert_eq!(loaded.products[0].name, "Pepsi");
        assert!(content.contains("\"analyzedAt\""));
    }
}
