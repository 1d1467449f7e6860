//! Image file adapter: reads a file from disk into an [`ImagePayload`].

use std::path::Path;

use zeroize::Zeroize;

use crate::domain::{ImageError, ImagePayload};

/// Read and encode an image file.
///
/// The size is checked from metadata before reading so oversized files are
/// never loaded.
///
/// # Errors
/// Returns `ImageError::Read` on IO failure, `ImageError::TooLarge` above
/// `max_bytes`, and the encoding errors of [`ImagePayload::from_bytes`].
pub fn load_image_file(path: &Path, max_bytes: u64) -> Result<ImagePayload, ImageError> {
    let display = path.display().to_string();
    let read_err = |e: std::io::Error| ImageError::Read {
        path: display.clone(),
        message: e.to_string(),
    };

    let metadata = std::fs::metadata(path).map_err(read_err)?;
    if !metadata.is_file() {
        return Err(ImageError::Read {
            path: display.clone(),
            message: "not a regular file".to_string(),
        });
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| display.clone());

    if metadata.len() > max_bytes {
        return Err(ImageError::TooLarge {
            name: file_name,
            size: metadata.len(),
            max: max_bytes,
        });
    }

    let mut bytes = std::fs::read(path).map_err(read_err)?;
    let payload = ImagePayload::from_bytes(file_name, &bytes);
    bytes.zeroize();

    if let Ok(p) = &payload {
        tracing::debug!(mime = p.mime(), bytes = p.byte_len(), "Encoded query image");
    }
    payload
}

/// Expand a leading `~/` to the home directory.
#[must_use]
pub fn expand_home(raw: &str) -> std::path::PathBuf {
    let raw = raw.trim();
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return std::path::PathBuf::from(home).join(rest);
        }
    }
    std::path::PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    const JPEG: [u8; 6] = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

    #[test]
    fn test_load_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knee.jpg");
        std::fs::write(&path, JPEG).unwrap();

        let payload = load_image_file(&path, 1024).unwrap();
        assert_eq!(payload.file_name(), "knee.jpg");
        assert_eq!(payload.mime(), "image/jpeg");
        assert!(payload.data_url().starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_rejects_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.jpg");
        std::fs::write(&path, JPEG).unwrap();

        let err = load_image_file(&path, 4).unwrap_err();
        assert_eq!(
            err,
            ImageError::TooLarge {
                name: "big.jpg".to_string(),
                size: 6,
                max: 4
            }
        );
    }

    #[test]
    fn test_missing_file_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_image_file(&dir.path().join("nope.png"), 1024),
            Err(ImageError::Read { .. })
        ));
        assert!(matches!(
            load_image_file(dir.path(), 1024),
            Err(ImageError::Read { .. })
        ));
    }

    #[test]
    fn test_expand_home_passthrough() {
        assert_eq!(expand_home(" /tmp/a.png "), std::path::PathBuf::from("/tmp/a.png"));
    }
}
