//! Product Detect Common Library
//!
//! CLIと対話セッションで共有される型・プロンプト・パーサー（I/Oなし）

pub mod types;
pub mod error;
pub mod parser;
pub mod prompts;

pub use types::{AnalysisResult, ProductQuery, ProductResult};
pub use error::{Error, Result};
pub use parser::{extract_json_object, parse_products_response};
pub use prompts::{build_detection_prompt, SCORE_MAX, SCORE_MIN};
