//! Result media classification.

use serde::{Deserialize, Serialize};

/// Suffixes that mark a result as video.
const VIDEO_SUFFIXES: [&str; 2] = [".mp4", ".webm"];

/// How a result should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, MediaKind::Video)
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classify a media URL as image or video.
///
/// Only the path is inspected; the query string and fragment are ignored.
/// Anything that is not a known video suffix is treated as an image.
pub fn classify(url: &str) -> MediaKind {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_ascii_lowercase(),
        Err(_) => strip_query(url).to_ascii_lowercase(),
    };

    if VIDEO_SUFFIXES.iter().any(|suffix| path.ends_with(suffix)) {
        MediaKind::Video
    } else {
        MediaKind::Image
    }
}

/// Relative URLs cannot go through `Url::parse`.
fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}
