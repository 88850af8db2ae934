//! Files selected for upload.

use std::path::Path;

/// A user-selected file held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Original file name, including extension
    pub name: String,
    /// Declared MIME type
    pub content_type: String,
    /// Raw contents
    pub bytes: Vec<u8>,
}

impl LocalFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Create a file whose MIME type is guessed from its extension.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        let content_type = guess_content_type(&name).to_string();
        Self {
            name,
            content_type,
            bytes: bytes.into(),
        }
    }

    /// Extension of the original file name, if it has one.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Guess a MIME type from a file name.
pub fn guess_content_type(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension() {
        assert_eq!(LocalFile::from_bytes("cat.jpg", vec![1]).extension(), Some("jpg"));
        assert_eq!(LocalFile::from_bytes("a.b.PNG", vec![1]).extension(), Some("PNG"));
        assert_eq!(LocalFile::from_bytes("cat", vec![1]).extension(), None);
        assert_eq!(LocalFile::from_bytes("cat.", vec![1]).extension(), None);
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(LocalFile::from_bytes("cat.JPEG", vec![]).content_type, "image/jpeg");
        assert_eq!(guess_content_type("x.webp"), "image/webp");
        assert_eq!(guess_content_type("clip.mp4"), "video/mp4");
        assert_eq!(guess_content_type("notes"), "application/octet-stream");
    }
}
