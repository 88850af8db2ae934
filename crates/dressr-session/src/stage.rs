//! Result presentation surfaces.

use dressr_media::LoadedImage;
use dressr_models::MediaKind;

use crate::state::Phase;

/// Cross-origin mode of the result image, so its pixels stay readable.
pub const CROSS_ORIGIN_ANONYMOUS: &str = "anonymous";

/// The result image surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageElement {
    pub src: Option<String>,
    pub visible: bool,
    pub cross_origin: &'static str,
    decoded: Option<LoadedImage>,
}

impl Default for ImageElement {
    fn default() -> Self {
        Self {
            src: None,
            visible: false,
            cross_origin: CROSS_ORIGIN_ANONYMOUS,
            decoded: None,
        }
    }
}

impl ImageElement {
    /// Decoded pixels for the current `src`, if they finished loading.
    pub fn decoded(&self) -> Option<&LoadedImage> {
        self.decoded.as_ref()
    }
}

/// The result video surface. Created the first time a video is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoElement {
    pub src: String,
    pub visible: bool,
    pub controls: bool,
    pub autoplay: bool,
    pub looped: bool,
}

impl VideoElement {
    fn new(src: &str) -> Self {
        Self {
            src: src.to_string(),
            visible: true,
            controls: true,
            autoplay: true,
            looped: true,
        }
    }
}

/// Holds the image element and the lazily created video element.
#[derive(Debug, Clone, Default)]
pub struct MediaStage {
    image: ImageElement,
    video: Option<VideoElement>,
}

impl MediaStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> &ImageElement {
        &self.image
    }

    pub fn video(&self) -> Option<&VideoElement> {
        self.video.as_ref()
    }

    /// Show a result on the matching surface and hide the other one.
    pub fn present(&mut self, url: &str, kind: MediaKind) {
        match kind {
            MediaKind::Video => {
                self.image.visible = false;
                match self.video.as_mut() {
                    Some(video) => {
                        video.src = url.to_string();
                        video.visible = true;
                    }
                    None => self.video = Some(VideoElement::new(url)),
                }
            }
            MediaKind::Image => {
                if let Some(video) = self.video.as_mut() {
                    video.visible = false;
                }
                if self.image.src.as_deref() != Some(url) {
                    self.image.decoded = None;
                }
                self.image.src = Some(url.to_string());
                self.image.visible = true;
            }
        }
    }

    pub fn hide_all(&mut self) {
        self.image.visible = false;
        if let Some(video) = self.video.as_mut() {
            video.visible = false;
        }
    }

    /// Hide both surfaces and forget the last result.
    pub fn clear(&mut self) {
        self.hide_all();
        self.image.src = None;
        self.image.decoded = None;
    }

    /// Bring the surfaces in line with `phase`.
    pub fn sync(&mut self, phase: &Phase) {
        match phase {
            Phase::Presenting { url, kind } => self.present(url, *kind),
            Phase::Idle => self.clear(),
            _ => self.hide_all(),
        }
    }

    /// Record that the image finished decoding.
    ///
    /// Ignored, returning `false`, when the image element has since moved on
    /// to another source.
    pub fn image_loaded(&mut self, image: LoadedImage) -> bool {
        if self.image.src.as_deref() != Some(image.src.as_str()) {
            return false;
        }
        self.image.decoded = Some(image);
        true
    }

    /// The presented image, when it is visible and fully decoded.
    pub fn canvas_source(&self) -> Option<&LoadedImage> {
        if !self.image.visible {
            return None;
        }
        self.image.decoded.as_ref().filter(|image| image.is_complete())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn loaded(src: &str) -> LoadedImage {
        LoadedImage::new(src, RgbaImage::new(2, 2))
    }

    #[test]
    fn test_image_element_is_cross_origin_anonymous() {
        assert_eq!(MediaStage::new().image().cross_origin, "anonymous");
    }

    #[test]
    fn test_present_image_keeps_video_uncreated() {
        let mut stage = MediaStage::new();
        stage.present("https://cdn.example/a.png", MediaKind::Image);

        assert!(stage.image().visible);
        assert_eq!(stage.image().src.as_deref(), Some("https://cdn.example/a.png"));
        assert!(stage.video().is_none());
    }

    #[test]
    fn test_video_element_created_once_and_reused() {
        let mut stage = MediaStage::new();
        stage.present("https://cdn.example/a.mp4", MediaKind::Video);

        let video = stage.video().unwrap();
        assert!(video.visible && video.controls && video.autoplay && video.looped);
        assert!(!stage.image().visible);

        stage.present("https://cdn.example/b.png", MediaKind::Image);
        assert!(!stage.video().unwrap().visible);
        assert!(stage.image().visible);

        stage.present("https://cdn.example/c.webm", MediaKind::Video);
        assert_eq!(stage.video().unwrap().src, "https://cdn.example/c.webm");
        assert!(stage.video().unwrap().visible);
        assert!(!stage.image().visible);
    }

    #[test]
    fn test_stale_image_load_is_ignored() {
        let mut stage = MediaStage::new();
        stage.present("https://cdn.example/new.png", MediaKind::Image);

        assert!(!stage.image_loaded(loaded("https://cdn.example/old.png")));
        assert!(stage.canvas_source().is_none());

        assert!(stage.image_loaded(loaded("https://cdn.example/new.png")));
        assert_eq!(
            stage.canvas_source().map(|i| i.src.as_str()),
            Some("https://cdn.example/new.png")
        );
    }

    #[test]
    fn test_canvas_source_requires_visible_image() {
        let mut stage = MediaStage::new();
        stage.present("https://cdn.example/a.png", MediaKind::Image);
        stage.image_loaded(loaded("https://cdn.example/a.png"));

        stage.sync(&Phase::Submitting);
        assert!(stage.canvas_source().is_none());
        assert!(stage.image().decoded().is_some());
    }

    #[test]
    fn test_new_source_drops_decoded_pixels() {
        let mut stage = MediaStage::new();
        stage.present("https://cdn.example/a.png", MediaKind::Image);
        stage.image_loaded(loaded("https://cdn.example/a.png"));

        stage.present("https://cdn.example/b.png", MediaKind::Image);
        assert!(stage.image().decoded().is_none());
    }

    #[test]
    fn test_sync_idle_clears_everything() {
        let mut stage = MediaStage::new();
        stage.present("https://cdn.example/a.mp4", MediaKind::Video);
        stage.sync(&Phase::Idle);

        assert!(!stage.image().visible);
        assert!(stage.image().src.is_none());
        assert!(!stage.video().unwrap().visible);
    }
}
