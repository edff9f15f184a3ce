//! APIレスポンスパーサー
//!
//! AIの自由文レスポンスからJSONオブジェクトを抽出し、
//! 商品スコアの結果をパースする

use crate::error::{Error, Result};
use crate::types::AnalysisResult;

/// APIレスポンスからJSONオブジェクト部分を抽出
///
/// 最初の `{` から最後の `}` までを切り出す（貪欲マッチ）。
/// 前後の説明文やコードブロック記号は無視される。
///
/// # Arguments
/// * `response` - APIレスポンス文字列
///
/// # Returns
/// * `Ok(&str)` - 抽出されたJSON文字列
/// * `Err` - `{ ... }` が見つからない場合
///
/// # Examples
/// ```
/// use product_detect_common::extract_json_object;
///
/// let response = "Here you go: {\"products\": []} Thanks.";
/// let json = extract_json_object(response).unwrap();
/// assert_eq!(json, "{\"products\": []}");
/// ```
pub fn extract_json_object(response: &str) -> Result<&str> {
    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if end >= start {
                return Ok(&response[start..=end]);
            }
        }
    }

    Err(Error::Parse("JSONが見つかりません".into()))
}

/// 商品検出レスポンスをパース
///
/// # Arguments
/// * `response` - AIのレスポンス全文
///
/// # Returns
/// * `Ok(AnalysisResult)` - パース成功（商品の順序は保持）
/// * `Err` - JSONが見つからないかパース失敗
pub fn parse_products_response(response: &str) -> Result<AnalysisResult> {
    let json_str = extract_json_object(response)?;
    let result: AnalysisResult = serde_json::from_str(json_str)
        .map_err(|e| Error::Parse(format!("JSONパースエラー: {}", e)))?;
    Ok(result)
}
