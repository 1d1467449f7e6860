//! Image payloads for image-based search.
//!
//! The backend expects the query image as a base64 `data:` URL. Payloads are
//! wiped from memory when dropped, like any other clinical input.

use base64::engine::general_purpose;
use base64::Engine;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Errors while turning a file into an image payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    #[error("{0} is empty")]
    Empty(String),

    #[error("{0} is not a supported image (png, jpeg, gif, bmp, webp, dicom)")]
    UnsupportedFormat(String),

    #[error("{name} is {size} bytes, larger than the {max} byte limit")]
    TooLarge { name: String, size: u64, max: u64 },

    #[error("cannot read {path}: {message}")]
    Read { path: String, message: String },
}

/// A query image encoded as a data URL.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ImagePayload {
    file_name: String,
    mime: String,
    byte_len: usize,
    data_url: String,
}

impl ImagePayload {
    /// Encode raw file bytes.
    ///
    /// The MIME type comes from the file signature, falling back to the
    /// file extension when the signature is not recognised.
    ///
    /// # Errors
    /// Returns `ImageError::Empty` for empty input and
    /// `ImageError::UnsupportedFormat` when neither check identifies an image.
    pub fn from_bytes(file_name: impl Into<String>, bytes: &[u8]) -> Result<Self, ImageError> {
        let file_name = file_name.into();
        if bytes.is_empty() {
            return Err(ImageError::Empty(file_name));
        }

        let mime = sniff_mime(bytes)
            .or_else(|| mime_from_extension(&file_name))
            .ok_or_else(|| ImageError::UnsupportedFormat(file_name.clone()))?;

        let encoded = general_purpose::STANDARD.encode(bytes);
        let data_url = format!("data:{mime};base64,{encoded}");

        Ok(Self {
            file_name,
            mime: mime.to_string(),
            byte_len: bytes.len(),
            data_url,
        })
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Size of the original file in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// The full `data:<mime>;base64,...` string.
    #[must_use]
    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// Short human summary used as the preview line.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} ({}, {})", self.file_name, self.mime, human_size(self.byte_len))
    }
}

// Never print the encoded image.
impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("byte_len", &self.byte_len)
            .finish_non_exhaustive()
    }
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.starts_with(b"BM") && bytes.len() > 14 {
        Some("image/bmp")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.len() >= 132 && &bytes[128..132] == b"DICM" {
        Some("application/dicom")
    } else {
        None
    }
}

fn mime_from_extension(file_name: &str) -> Option<&'static str> {
    let ext = std::path::Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "webp" => Some("image/webp"),
        "dcm" | "dicom" => Some("application/dicom"),
        _ => None,
    }
}

fn human_size(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KIB {
        format!("{bytes} B")
    } else if b < KIB * KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{:.1} MiB", b / (KIB * KIB))
    }
}
