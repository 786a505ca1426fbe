use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;

/// Size of a single QR module, in pixels.
const MODULE_SIZE: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum QrError {
    #[error("content does not fit into a QR code: {0}")]
    Data(#[from] qrcode::types::QrError),
    #[error("failed to encode the PNG: {0}")]
    Png(#[from] image::ImageError),
    #[error("QR worker died: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Render the content as a QR code and encode it as a grayscale PNG.
pub fn encode_png(content: &str) -> Result<Vec<u8>, QrError> {
    let code = QrCode::new(content.as_bytes())?;
    let image = code
        .render::<Luma<u8>>()
        .module_dimensions(MODULE_SIZE, MODULE_SIZE)
        .quiet_zone(true)
        .build();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(image).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

/// [`encode_png`] on the blocking thread pool, to not hold up message handling.
pub async fn encode_png_off_thread(content: String) -> Result<Vec<u8>, QrError> {
    tokio::task::spawn_blocking(move || encode_png(&content)).await?
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    #[test]
    fn produces_a_png() {
        let png = encode_png("https://shorten.asia/AbCd").unwrap();
        assert!(png.starts_with(PNG_MAGIC));

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), decoded.height());
        assert_eq!(decoded.width() % MODULE_SIZE, 0);
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(
            encode_png("hello world").unwrap(),
            encode_png("hello world").unwrap()
        );
        assert_ne!(
            encode_png("hello world").unwrap(),
            encode_png("hello world!").unwrap()
        );
    }

    #[test]
    fn too_much_content_is_an_error() {
        let content = "a".repeat(8000);
        assert!(matches!(encode_png(&content), Err(QrError::Data(_))));
    }

    #[tokio::test]
    async fn off_thread_matches_inline() {
        let content = "Xin chào 👋".to_string();
        let inline = encode_png(&content).unwrap();
        let off_thread = encode_png_off_thread(content).await.unwrap();
        assert_eq!(inline, off_thread);
    }
}
