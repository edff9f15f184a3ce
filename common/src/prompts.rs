//! プロンプト生成モジュール
//!
//! 商品検出用のプロンプトを生成する:
//! - SCORE_MIN / SCORE_MAX: スコアの範囲
//! - build_detection_prompt: 画像と一緒に送る指示文

/// スコアの下限
pub const SCORE_MIN: i64 = 0;

/// スコアの上限
pub const SCORE_MAX: i64 = 10;

/// 商品検出プロンプト生成
///
/// 商品名はそのまま埋め込むので、呼び出し側でトリム・空欄除外を済ませておくこと
///
/// # Arguments
/// * `product_names` - 検出対象の商品名
///
/// # Returns
/// 画像と一緒に送るプロンプト文字列
pub fn build_detection_prompt(product_names: &[String]) -> String {
    let product_list = product_names
        .iter()
        .map(|name| format!("- {}", name))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyze this image and determine whether each of the following products appears in it.

Products to look for:
{product_list}

For each product, give a confidence score from {SCORE_MIN} to {SCORE_MAX}:
- {SCORE_MIN}: definitely not in the image
- 5: uncertain, something similar may be visible
- {SCORE_MAX}: clearly visible and identifiable

Respond ONLY with a JSON object in exactly this format:
{{
  "products": [
    {{
      "name": "product name as given above",
      "score": 0,
      "reasoning": "short explanation of what you see"
    }}
  ]
}}

Include every product listed above, in the same order. Do not add any other text."#
    )
}
