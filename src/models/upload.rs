//! Upload request model

use axum::body::Bytes;
use validator::Validate;

/// Multipart field carrying the package
pub const UPLOAD_FIELD: &str = "apk";

/// Used when the file part carries an empty filename
pub const UNNAMED_UPLOAD: &str = "unnamed.apk";

/// Typed upload, built from the multipart body before anything is analyzed
#[derive(Debug, Clone, Validate)]
pub struct UploadRequest {
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
    pub bytes: Bytes,
}

impl UploadRequest {
    pub fn new(filename: &str, bytes: Bytes) -> Self {
        let filename = if filename.is_empty() { UNNAMED_UPLOAD } else { filename };
        Self {
            filename: filename.to_string(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filename_gets_placeholder() {
        let req = UploadRequest::new("", Bytes::from_static(b"PK"));
        assert_eq!(req.filename, UNNAMED_UPLOAD);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_filename_length_is_validated() {
        let long = "a".repeat(256);
        let too_long = UploadRequest::new(&long, Bytes::new());
        assert!(too_long.validate().is_err());

        let ok = UploadRequest::new("game.apk", Bytes::new());
        assert!(ok.validate().is_ok());
        assert_eq!(ok.size(), 0);
    }
}
