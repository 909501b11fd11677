//! Image sources as `data:` URLs.
//!
//! Uploads are read once and held as `data:<mime>;base64,<payload>` strings,
//! so the scene store only ever deals in self-contained URLs.

use std::path::Path;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Extensions offered in the file picker.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp", "tif", "tiff"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataUrlError {
    NotDataUrl,
    MissingPayload,
    NotBase64,
    InvalidBase64(String),
}

impl std::fmt::Display for DataUrlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataUrlError::NotDataUrl => write!(f, "Not a data: URL"),
            DataUrlError::MissingPayload => write!(f, "Data URL has no payload"),
            DataUrlError::NotBase64 => write!(f, "Only base64 data URLs are supported"),
            DataUrlError::InvalidBase64(msg) => write!(f, "Invalid base64 payload: {}", msg),
        }
    }
}

impl std::error::Error for DataUrlError {}

/// MIME type guessed from the file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Read a file fully and wrap it as a data URL.
pub fn read_file_as_data_url(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image file: {}", path.display()))?;
    log::debug!("Read {} ({} bytes)", path.display(), bytes.len());
    Ok(encode_data_url(mime_for_path(path), &bytes))
}

/// Extract the raw bytes of a base64 data URL.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, DataUrlError> {
    let rest = url.strip_prefix("data:").ok_or(DataUrlError::NotDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(DataUrlError::MissingPayload)?;
    if !header.ends_with(";base64") {
        return Err(DataUrlError::NotBase64);
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| DataUrlError::InvalidBase64(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("wall.PNG")), "image/png");
        assert_eq!(mime_for_path(Path::new("a/b/pattern.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_decode_known_payload() {
        let url = "data:image/png;base64,aGVsbG8=";
        assert_eq!(decode_data_url(url).unwrap(), b"hello");
        assert_eq!(encode_data_url("image/png", b"hello"), url);
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(decode_data_url("http://x/y.png"), Err(DataUrlError::NotDataUrl));
        assert_eq!(decode_data_url("data:image/png;base64"), Err(DataUrlError::MissingPayload));
        assert_eq!(decode_data_url("data:text/plain,hello"), Err(DataUrlError::NotBase64));
        assert!(matches!(
            decode_data_url("data:image/png;base64,@@@"),
            Err(DataUrlError::InvalidBase64(_))
        ));
    }

    #[test]
    fn test_read_file_as_data_url() {
        let path = std::env::temp_dir().join("lightwall_data_url_test.png");
        std::fs::write(&path, b"hello").unwrap();
        let url = read_file_as_data_url(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(url, "data:image/png;base64,aGVsbG8=");

        assert!(read_file_as_data_url(Path::new("/definitely/missing.png")).is_err());
    }
}
