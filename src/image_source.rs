use crate::error::{DetectError, Result};
use std::path::Path;

/// ファイルから読み込んだ画像
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// 拡張子から推定したMIMEタイプ（画像以外もそのまま返す）
    pub mime_type: String,
}

pub fn load_image(path: &Path) -> Result<LoadedImage> {
    if !path.is_file() {
        return Err(DetectError::FileNotFound(path.display().to_string()));
    }

    let bytes = std::fs::read(path)?;
    let mime_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(LoadedImage {
        file_name,
        bytes,
        mime_type,
    })
}

/// MIMEタイプが画像（image/*）かどうか
pub fn is_image_media_type(media_type: &str) -> bool {
    media_type
        .trim()
        .parse::<mime::Mime>()
        .map(|m| m.type_() == mime::IMAGE)
        .unwrap_or(false)
}
