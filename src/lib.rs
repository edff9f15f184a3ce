//! product-detect
//!
//! 画像1枚と商品名リストをマルチモーダルAIに送り、商品ごとの検出スコアを得る

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod image_source;
pub mod logging;
pub mod report;
pub mod session;
pub mod workflow;
