//! Image → text.
//!
//! The OCR engine sits behind [`OcrEngine`] so handlers and tests can swap
//! in any implementation. [`tesseract::TesseractCli`] is the production one.

pub mod fetch;
pub mod tesseract;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("bytes are not a supported image format")]
    UnsupportedImage,

    #[error("ocr engine unavailable: {0}")]
    Unavailable(String),

    #[error("ocr engine exited with status {status}: {stderr}")]
    Failed { status: i32, stderr: String },

    #[error("ocr engine timed out after {0}s")]
    Timeout(u64),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Extract all readable text from an encoded image.
    async fn read_text(&self, image: &[u8]) -> Result<String, OcrError>;
}

/// Image containers the OCR engine can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
    Webp,
}

impl ImageFormat {
    /// Detect the format from magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";
        match bytes {
            b if b.starts_with(PNG) => Some(ImageFormat::Png),
            [0xFF, 0xD8, 0xFF, ..] => Some(ImageFormat::Jpeg),
            b if b.starts_with(b"GIF87a") || b.starts_with(b"GIF89a") => Some(ImageFormat::Gif),
            [b'B', b'M', ..] => Some(ImageFormat::Bmp),
            [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => Some(ImageFormat::Tiff),
            b if b.len() >= 12 && b.starts_with(b"RIFF") && &b[8..12] == b"WEBP" => {
                Some(ImageFormat::Webp)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_known_formats() {
        assert_eq!(
            ImageFormat::sniff(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"),
            Some(ImageFormat::Png)
        );
        assert_eq!(ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::sniff(b"GIF89a...."), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::sniff(b"BM\0\0"), Some(ImageFormat::Bmp));
        assert_eq!(ImageFormat::sniff(b"II*\0rest"), Some(ImageFormat::Tiff));
        assert_eq!(ImageFormat::sniff(b"RIFF\0\0\0\0WEBPVP8 "), Some(ImageFormat::Webp));
    }

    #[test]
    fn test_sniff_rejects_non_images() {
        assert_eq!(ImageFormat::sniff(b""), None);
        assert_eq!(ImageFormat::sniff(b"<html><body>404</body></html>"), None);
        assert_eq!(ImageFormat::sniff(b"RIFF\0\0\0\0WAVE"), None);
    }
}
