use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "product-detect")]
#[command(about = "画像内の商品をAIで検出・スコアリングするツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像を解析して商品ごとのスコアを表示
    Detect {
        /// 画像ファイルのパス
        #[arg(required = true)]
        image: PathBuf,

        /// 検出対象の商品名（複数指定可、省略時は対話入力）
        #[arg(short, long = "product")]
        products: Vec<String>,

        /// 結果をJSONレポートとして保存
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 結果をJSONで標準出力に出す
        #[arg(long)]
        json: bool,
    },

    /// 対話モード（画像・商品名を編集しながら解析）
    Session,

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
