//! Capture-still: encodes the current frame and writes it out as a download.
//!
//! The frame comes from [`super::SceneGraph::read_frame`]; if the renderer
//! does not retain its drawing buffer the saved image is blank.

use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const SCREENSHOT_PREFIX: &str = "blueprint-3d";

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("frame has no pixels")]
    EmptyFrame,
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CaptureError>;

/// `blueprint-3d-<unix millis>.png`
pub fn screenshot_file_name(at: SystemTime) -> String {
    let millis = at
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    format!("{SCREENSHOT_PREFIX}-{millis}.png")
}

pub fn encode_png(frame: &RgbaImage) -> Result<Vec<u8>> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(CaptureError::EmptyFrame);
    }
    let mut bytes = Cursor::new(Vec::new());
    frame.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

/// True when every pixel is fully transparent, i.e. the buffer was discarded.
pub fn is_blank(frame: &RgbaImage) -> bool {
    frame.pixels().all(|pixel| pixel.0[3] == 0)
}

pub fn save_screenshot(frame: &RgbaImage, dir: &Path, at: SystemTime) -> Result<PathBuf> {
    let png = encode_png(frame)?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(screenshot_file_name(at));
    std::fs::write(&path, png)?;
    if is_blank(frame) {
        log::warn!("Screenshot {} is blank; is the drawing buffer retained?", path.display());
    } else {
        log::info!("Screenshot saved to {}", path.display());
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::time::Duration;

    #[test]
    fn file_name_uses_unix_millis() {
        let at = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        assert_eq!(screenshot_file_name(at), "blueprint-3d-1700000000123.png");
    }

    #[test]
    fn saved_png_decodes_to_same_pixels() {
        let frame = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255]));
        let dir = tempfile::tempdir().unwrap();
        let path = save_screenshot(&frame, dir.path(), UNIX_EPOCH + Duration::from_secs(5)).unwrap();
        assert_eq!(path.file_name().unwrap(), "blueprint-3d-5000.png");

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.get_pixel(3, 2), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn blank_frame_still_saves() {
        let frame = RgbaImage::new(2, 2);
        assert!(is_blank(&frame));
        let dir = tempfile::tempdir().unwrap();
        assert!(save_screenshot(&frame, dir.path(), SystemTime::now()).is_ok());
    }

    #[test]
    fn zero_sized_frame_is_rejected() {
        assert!(matches!(encode_png(&RgbaImage::new(0, 0)), Err(CaptureError::EmptyFrame)));
    }
}
