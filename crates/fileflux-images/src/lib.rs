//! # fileflux-images
//!
//! The image processor sits between extraction and refinement: it filters
//! extracted images, writes the survivors into an `images/` directory with
//! stable names, optionally captions them through a vision model, and
//! rewrites body-text placeholders to point at the written files.
//!
//! Inline base64 data URIs are handled the same way; when image extraction
//! is disabled they are stripped from the text entirely.

pub mod sniff;

pub use sniff::{extension_for_mime, mime_from_filename, sniff_mime};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use fileflux_core::{Image, ImageData, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Property key for vision-model captions.
pub const AI_DESCRIPTION: &str = "AIDescription";

static DATA_URI_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"!\[([^\]]*)\]\(data:image/[a-zA-Z+.-]+;base64,([A-Za-z0-9+/=\s]+)\)")
        .expect("data uri image")
});

/// Narrow interface to an external vision model used for captioning.
///
/// Failures are swallowed by the processor; captioning is best-effort.
pub trait VisionEngine: Send + Sync {
    /// Produce a short caption for the image bytes.
    ///
    /// # Errors
    /// Returns a human-readable message when captioning fails.
    fn caption(&self, bytes: &[u8], mime: &str) -> std::result::Result<String, String>;
}

/// Filter thresholds for the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageFilter {
    /// Minimum decoded payload size in bytes.
    pub min_bytes: usize,
    /// Minimum pixel dimension on each side, enforced when dimensions are
    /// known.
    pub min_dimension: u32,
    /// Maximum payload size in bytes.
    pub max_bytes: usize,
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self {
            min_bytes: fileflux_core::options::DEFAULT_MIN_IMAGE_SIZE,
            min_dimension: fileflux_core::options::DEFAULT_MIN_IMAGE_DIMENSION,
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Result of one processing pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessOutcome {
    /// Body text with placeholders rewritten.
    pub text: String,
    /// Images considered.
    pub found: usize,
    /// Images written to disk.
    pub extracted: usize,
    /// Images dropped by a filter or a decode failure.
    pub skipped: usize,
}

/// Rewrites image placeholders and writes image files.
pub struct ImageProcessor {
    filter: ImageFilter,
    vision: Option<Box<dyn VisionEngine>>,
}

impl std::fmt::Debug for ImageProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageProcessor")
            .field("filter", &self.filter)
            .field("vision", &self.vision.is_some())
            .finish()
    }
}

impl ImageProcessor {
    /// Create a processor with the given filter and no vision model.
    pub fn new(filter: ImageFilter) -> Self {
        Self {
            filter,
            vision: None,
        }
    }

    /// Attach a vision model for captioning.
    #[must_use]
    pub fn with_vision(mut self, vision: Box<dyn VisionEngine>) -> Self {
        self.vision = Some(vision);
        self
    }

    /// Process pre-extracted images: filter, write survivors under
    /// `images_dir`, caption when a vision model is attached, and rewrite
    /// each image's position marker in `text` to the on-disk reference.
    ///
    /// Embedded payloads of written images are replaced by external file
    /// references, releasing the bytes.
    ///
    /// # Errors
    /// Returns I/O errors from directory creation or file writes; decode
    /// and filter failures only increment the skip counter.
    pub fn process(
        &self,
        text: &str,
        images: &mut [Image],
        images_dir: &Path,
    ) -> Result<ProcessOutcome> {
        let mut outcome = ProcessOutcome {
            text: text.to_string(),
            ..Default::default()
        };
        let mut written = 0usize;

        for image in images.iter_mut() {
            outcome.found += 1;
            let bytes = match &image.data {
                ImageData::Embedded(bytes) => bytes.clone(),
                // External references stay as they are in the text.
                ImageData::External(_) => continue,
            };

            if !self.passes_filters(&bytes, image) {
                outcome.skipped += 1;
                continue;
            }

            let mime = sniff_mime(&bytes).unwrap_or(image.mime_type.as_str());
            let ext = extension_for_mime(mime);
            let file_name = format!("img_{written:03}.{ext}");
            fs::create_dir_all(images_dir)?;
            fs::write(images_dir.join(&file_name), &bytes)?;
            written += 1;
            outcome.extracted += 1;

            if let Some(vision) = &self.vision {
                match vision.caption(&bytes, mime) {
                    Ok(caption) => {
                        image.properties.insert(AI_DESCRIPTION.to_string(), caption);
                    }
                    Err(err) => {
                        tracing::debug!(id = %image.id, "vision captioning failed: {err}");
                    }
                }
            }

            let reference = format!("images/{file_name}");
            let caption = image
                .properties
                .get(AI_DESCRIPTION)
                .cloned()
                .or_else(|| image.caption.clone())
                .unwrap_or_default();
            let replacement = format!("![{caption}]({reference})");
            if outcome.text.contains(&image.position_marker) {
                outcome.text = outcome.text.replace(&image.position_marker, &replacement);
            }
            image.data = ImageData::External(reference);
        }

        Ok(outcome)
    }

    /// Process inline base64 data URIs in `text`: decode each, apply the
    /// filters, write survivors and rewrite the markdown reference.
    /// Failed or filtered images keep their original placeholder.
    ///
    /// # Errors
    /// Returns I/O errors from file writes only.
    pub fn process_inline(&self, text: &str, images_dir: &Path) -> Result<ProcessOutcome> {
        let mut outcome = ProcessOutcome::default();
        let mut written = 0usize;
        let mut result = String::with_capacity(text.len());
        let mut last_end = 0usize;

        for caps in DATA_URI_IMAGE.captures_iter(text) {
            let whole = caps.get(0).expect("match");
            outcome.found += 1;
            result.push_str(&text[last_end..whole.start()]);
            last_end = whole.end();

            let alt = &caps[1];
            let payload: String = caps[2].chars().filter(|c| !c.is_whitespace()).collect();
            let decoded = match BASE64.decode(payload.as_bytes()) {
                Ok(bytes) => bytes,
                Err(err) => {
                    tracing::debug!("undecodable data URI kept in place: {err}");
                    outcome.skipped += 1;
                    result.push_str(whole.as_str());
                    continue;
                }
            };

            let Some(mime) = sniff_mime(&decoded) else {
                outcome.skipped += 1;
                result.push_str(whole.as_str());
                continue;
            };
            if decoded.len() < self.filter.min_bytes
                || decoded.len() > self.filter.max_bytes
                || !self.dimensions_ok(&decoded)
            {
                outcome.skipped += 1;
                result.push_str(whole.as_str());
                continue;
            }

            let ext = extension_for_mime(mime);
            let file_name = format!("img_{written:03}.{ext}");
            fs::create_dir_all(images_dir)?;
            fs::write(images_dir.join(&file_name), &decoded)?;
            written += 1;
            outcome.extracted += 1;
            result.push_str(&format!("![{alt}](images/{file_name})"));
        }
        result.push_str(&text[last_end..]);
        outcome.text = result;
        Ok(outcome)
    }

    /// Remove all inline base64 image data URIs from `text`, used when
    /// image extraction is disabled.
    pub fn strip_data_uris(text: &str) -> String {
        DATA_URI_IMAGE.replace_all(text, "").into_owned()
    }

    fn passes_filters(&self, bytes: &[u8], image: &Image) -> bool {
        if bytes.len() < self.filter.min_bytes || bytes.len() > self.filter.max_bytes {
            return false;
        }
        if sniff_mime(bytes).is_none() {
            return false;
        }
        if let Some((w, h)) = image.dimensions {
            if w < self.filter.min_dimension || h < self.filter.min_dimension {
                return false;
            }
        } else if !self.dimensions_ok(bytes) {
            return false;
        }
        true
    }

    /// Dimension check via decode; unknown dimensions pass.
    fn dimensions_ok(&self, bytes: &[u8]) -> bool {
        match image::load_from_memory(bytes) {
            Ok(img) => {
                img.width() >= self.filter.min_dimension
                    && img.height() >= self.filter.min_dimension
            }
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A tiny but filter-passing fake: PNG magic followed by padding. It
    /// cannot be decoded by the image crate, so the dimension check passes
    /// through the unknown path.
    fn fake_png(len: usize) -> Vec<u8> {
        let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.resize(len, 0xAB);
        bytes
    }

    fn embedded_image(id: &str, bytes: Vec<u8>) -> Image {
        Image {
            id: id.to_string(),
            caption: Some("figure".to_string()),
            data: ImageData::Embedded(bytes),
            mime_type: "image/png".to_string(),
            position_marker: format!("![figure](embedded:{id})"),
            dimensions: Some((200, 150)),
            properties: Default::default(),
        }
    }

    #[test]
    fn test_process_writes_and_rewrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut images = vec![embedded_image("img_000", fake_png(6000))];
        let text = "before ![figure](embedded:img_000) after";
        let processor = ImageProcessor::new(ImageFilter::default());
        let outcome = processor
            .process(text, &mut images, &dir.path().join("images"))
            .unwrap();
        assert_eq!(outcome.extracted, 1);
        assert_eq!(outcome.text, "before ![figure](images/img_000.png) after");
        assert!(dir.path().join("images/img_000.png").exists());
        assert!(matches!(images[0].data, ImageData::External(_)));
    }

    #[test]
    fn test_small_image_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut images = vec![embedded_image("img_000", fake_png(100))];
        let processor = ImageProcessor::new(ImageFilter::default());
        let outcome = processor
            .process("x ![figure](embedded:img_000)", &mut images, dir.path())
            .unwrap();
        assert_eq!(outcome.extracted, 0);
        assert_eq!(outcome.skipped, 1);
        // Placeholder stays when the image is skipped.
        assert!(outcome.text.contains("embedded:img_000"));
    }

    #[test]
    fn test_small_dimensions_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut img = embedded_image("img_000", fake_png(6000));
        img.dimensions = Some((40, 400));
        let processor = ImageProcessor::new(ImageFilter::default());
        let outcome = processor
            .process("t", &mut [img], dir.path())
            .unwrap();
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn test_inline_data_uri_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let payload = BASE64.encode(fake_png(6000));
        let text = format!("intro ![logo](data:image/png;base64,{payload}) outro");
        let processor = ImageProcessor::new(ImageFilter::default());
        let outcome = processor
            .process_inline(&text, &dir.path().join("images"))
            .unwrap();
        assert_eq!(outcome.extracted, 1);
        assert_eq!(outcome.text, "intro ![logo](images/img_000.png) outro");
    }

    #[test]
    fn test_inline_bad_base64_kept() {
        let dir = tempfile::tempdir().unwrap();
        let text = "x ![a](data:image/png;base64,!!!notbase64) y";
        let processor = ImageProcessor::new(ImageFilter::default());
        let outcome = processor.process_inline(text, dir.path()).unwrap();
        // The regex only matches well-formed base64, so nothing is found
        // and the text is unchanged.
        assert_eq!(outcome.text, text);
        assert_eq!(outcome.extracted, 0);
    }

    #[test]
    fn test_strip_data_uris() {
        let payload = BASE64.encode(fake_png(64));
        let text = format!("keep ![x](data:image/png;base64,{payload}) this");
        assert_eq!(ImageProcessor::strip_data_uris(&text), "keep  this");
    }

    struct FixedVision;
    impl VisionEngine for FixedVision {
        fn caption(&self, _bytes: &[u8], _mime: &str) -> std::result::Result<String, String> {
            Ok("a chart of quarterly results".to_string())
        }
    }

    #[test]
    fn test_vision_caption_stored_and_used() {
        let dir = tempfile::tempdir().unwrap();
        let mut images = vec![embedded_image("img_000", fake_png(6000))];
        let processor = ImageProcessor::new(ImageFilter::default()).with_vision(Box::new(FixedVision));
        let outcome = processor
            .process("![figure](embedded:img_000)", &mut images, dir.path())
            .unwrap();
        assert_eq!(
            images[0].properties.get(AI_DESCRIPTION).unwrap(),
            "a chart of quarterly results"
        );
        assert!(outcome.text.contains("![a chart of quarterly results]"));
    }
}
