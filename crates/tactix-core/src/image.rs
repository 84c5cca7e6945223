//! Image validation and base64/data-URL conversion.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;
use thiserror::Error;

/// Largest accepted image, measured on the encoded file.
pub const MAX_IMAGE_BYTES: u64 = 4 * 1024 * 1024;
/// MIME types accepted for upload.
pub const ALLOWED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

const DATA_URL_SCHEME: &[u8] = b"data:";
const BASE64_MARKER: &[u8] = b";base64,";

/// Reasons an image is rejected before upload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    /// MIME type outside the allowed set, or an empty file.
    #[error("unsupported image type {0:?}; use JPEG, PNG, or WebP")]
    UnsupportedType(String),
    /// File exceeds the size limit.
    #[error("image is {size} bytes; the limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
}

/// An image file as selected by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, inferring its MIME type from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let mime_type = mime_type_for_path(path).unwrap_or("application/octet-stream");
        Ok(Self::new(mime_type, bytes))
    }

    /// Encoded size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Check type and size limits.
    pub fn validate(&self) -> Result<(), ImageError> {
        validate(self)
    }

    /// Base64 payload without a data-URL prefix.
    pub fn to_base64(&self) -> String {
        to_base64(&self.bytes)
    }

    /// Data URL suitable for a local preview.
    pub fn to_data_url(&self) -> String {
        to_data_url(&self.bytes, &self.mime_type)
    }
}

/// Infer an image MIME type from a file extension.
pub fn mime_type_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Validate an image against the allowed types and the size limit.
pub fn validate(file: &ImageFile) -> Result<(), ImageError> {
    if !ALLOWED_MIME_TYPES.contains(&file.mime_type.as_str()) || file.bytes.is_empty() {
        return Err(ImageError::UnsupportedType(file.mime_type.clone()));
    }
    if file.size() > MAX_IMAGE_BYTES {
        return Err(ImageError::TooLarge {
            size: file.size(),
            limit: MAX_IMAGE_BYTES,
        });
    }
    Ok(())
}

/// Base64 payload for the input.
///
/// Input that is already a base64 data URL has its `data:<mime>;base64,`
/// prefix stripped; anything else is encoded as raw bytes.
pub fn to_base64(input: &[u8]) -> String {
    match strip_data_url(input) {
        Some(payload) => String::from_utf8_lossy(payload).into_owned(),
        None => STANDARD.encode(input),
    }
}

/// Encode bytes as a `data:<mime>;base64,` URL.
pub fn to_data_url(bytes: &[u8], mime_type: &str) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// Base64 payload of a string that may carry a data-URL prefix.
///
/// Plain payloads are returned unchanged.
pub fn payload_of(input: &str) -> &str {
    match strip_data_url(input.as_bytes()) {
        Some(payload) => &input[input.len() - payload.len()..],
        None => input,
    }
}

fn strip_data_url(input: &[u8]) -> Option<&[u8]> {
    if !input.starts_with(DATA_URL_SCHEME) {
        return None;
    }
    let marker = input
        .windows(BASE64_MARKER.len())
        .position(|window| window == BASE64_MARKER)?;
    Some(&input[marker + BASE64_MARKER.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file_of(mime_type: &str, len: usize) -> ImageFile {
        ImageFile::new(mime_type, vec![0xAB; len])
    }

    #[test]
    fn accepts_allowed_types() {
        for mime_type in ALLOWED_MIME_TYPES {
            assert_eq!(validate(&file_of(mime_type, 16)), Ok(()));
        }
    }

    #[test]
    fn rejects_other_types() {
        for mime_type in ["image/gif", "image/svg+xml", "application/pdf", ""] {
            assert_eq!(
                validate(&file_of(mime_type, 16)),
                Err(ImageError::UnsupportedType(mime_type.to_string()))
            );
        }
    }

    #[test]
    fn size_limit_is_inclusive() {
        let exact = file_of("image/png", MAX_IMAGE_BYTES as usize);
        assert_eq!(validate(&exact), Ok(()));

        let over = file_of("image/png", MAX_IMAGE_BYTES as usize + 1);
        assert_eq!(
            validate(&over),
            Err(ImageError::TooLarge {
                size: MAX_IMAGE_BYTES + 1,
                limit: MAX_IMAGE_BYTES,
            })
        );
    }

    #[test]
    fn rejects_empty_file() {
        assert!(matches!(
            validate(&file_of("image/jpeg", 0)),
            Err(ImageError::UnsupportedType(_))
        ));
    }

    #[test]
    fn data_url_round_trips_to_payload() {
        let bytes = b"\x89PNG\r\n\x1a\nfake".to_vec();
        let data_url = to_data_url(&bytes, "image/png");
        assert!(data_url.starts_with("data:image/png;base64,"));
        assert_eq!(to_base64(data_url.as_bytes()), STANDARD.encode(&bytes));
    }

    #[test]
    fn raw_bytes_are_encoded() {
        assert_eq!(to_base64(b"abc"), "YWJj");
        assert_eq!(ImageFile::new("image/jpeg", b"abc".to_vec()).to_base64(), "YWJj");
    }

    #[test]
    fn payload_of_leaves_plain_base64_alone() {
        assert_eq!(payload_of("QUJD"), "QUJD");
        assert_eq!(payload_of("data:image/webp;base64,QUJD"), "QUJD");
    }

    #[test]
    fn infers_mime_from_extension() {
        assert_eq!(mime_type_for_path(Path::new("a/shot.JPG")), Some("image/jpeg"));
        assert_eq!(mime_type_for_path(Path::new("pitch.webp")), Some("image/webp"));
        assert_eq!(mime_type_for_path(Path::new("notes.txt")), None);
    }
}
