//! 検出結果・入力の型定義
//!
//! CLIとセッションUIで共有される型:
//! - ProductResult: 商品ごとのスコア（AIの出力）
//! - AnalysisResult: 1回の解析結果（`{"products": [...]}`）
//! - ProductQuery: ユーザーが入力した商品名スロット

use serde::{Deserialize, Serialize};

/// 商品ごとの検出スコア
///
/// AIが返した値をそのまま保持する（0〜10の範囲チェックはしない）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductResult {
    pub name: String,

    pub score: i64,               // 0〜10

    #[serde(default)]
    pub reasoning: String,        // 判定理由
}

/// AI解析結果
///
/// 商品の順序はAIレスポンスの順序を保持する
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub products: Vec<ProductResult>,
}

impl AnalysisResult {
    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// スコアの高い順に並べた参照（同点は元の順序）
    pub fn ranked(&self) -> Vec<&ProductResult> {
        let mut ranked: Vec<&ProductResult> = self.products.iter().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }
}

/// 商品名の入力スロット
///
/// 常に1つ以上のスロットを持つ。空欄スロットは解析時に除外される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    slots: Vec<String>,
}

impl ProductQuery {
    pub fn new() -> Self {
        Self {
            slots: vec![String::new()],
        }
    }

    /// 既存の名前リストから作成（空リストなら空欄1つ）
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let slots: Vec<String> = names.into_iter().map(Into::into).collect();
        if slots.is_empty() {
            Self::new()
        } else {
            Self { slots }
        }
    }

    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// スロットは最低1つあるので常にfalse
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 指定スロットのテキストを置き換える。範囲外なら何もしない
    pub fn set(&mut self, index: usize, text: impl Into<String>) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = text.into();
                true
            }
            None => false,
        }
    }

    pub fn add_slot(&mut self) {
        self.slots.push(String::new());
    }

    /// スロットを削除する。残り1つ、または範囲外なら何もしない
    pub fn remove_slot(&mut self, index: usize) -> bool {
        if self.slots.len() <= 1 || index >= self.slots.len() {
            return false;
        }
        self.slots.remove(index);
        true
    }

    /// 空欄を除いたトリム済みの商品名
    pub fn trimmed_names(&self) -> Vec<String> {
        self.slots
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn has_names(&self) -> bool {
        self.slots.iter().any(|s| !s.trim().is_empty())
    }

    /// 空欄1つの状態に戻す
    pub fn clear(&mut self) {
        self.slots.clear();
        self.slots.push(String::new());
    }
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self::new()
    }
}
