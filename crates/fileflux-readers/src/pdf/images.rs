//! Embedded-image collection with size and dimension filters.

use fileflux_core::{Image, ImageData};
use fileflux_images::sniff_mime;

/// Minimum pixel dimension for an embedded PDF image to be kept.
const MIN_DIMENSION: u32 = 50;

/// Minimum payload size in bytes.
const MIN_PAYLOAD: usize = 1000;

/// An image as handed over by the PDF decoder.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedImage {
    /// Raw embedded bytes.
    pub raw_bytes: Vec<u8>,
    /// PNG re-encoding, when the decoder offers one. Preferred over the
    /// raw bytes.
    pub png_bytes: Option<Vec<u8>>,
    /// Pixel width, when known.
    pub width: Option<u32>,
    /// Pixel height, when known.
    pub height: Option<u32>,
}

/// Filter decoder images and convert survivors into [`Image`] records.
///
/// Returns the surviving images and the number skipped. `next_index` is
/// advanced for every survivor so identifiers stay unique across pages.
pub fn collect_page_images(
    decoded: Vec<DecodedImage>,
    page: usize,
    max_image_size: usize,
    next_index: &mut usize,
) -> (Vec<Image>, usize) {
    let mut images = Vec::new();
    let mut skipped = 0usize;

    for item in decoded {
        let too_small_dim = item.width.is_some_and(|w| w < MIN_DIMENSION)
            || item.height.is_some_and(|h| h < MIN_DIMENSION);
        let (bytes, mime) = match item.png_bytes {
            Some(png) => (png, "image/png".to_string()),
            None => {
                let mime = sniff_mime(&item.raw_bytes)
                    .unwrap_or("application/octet-stream")
                    .to_string();
                (item.raw_bytes, mime)
            }
        };
        if too_small_dim || bytes.len() < MIN_PAYLOAD || bytes.len() > max_image_size {
            skipped += 1;
            continue;
        }

        let id = format!("img_{:03}", *next_index);
        *next_index += 1;
        let dimensions = match (item.width, item.height) {
            (Some(w), Some(h)) => Some((w, h)),
            _ => None,
        };
        images.push(Image {
            position_marker: format!("![image](embedded:{id})"),
            id,
            caption: None,
            data: ImageData::Embedded(bytes),
            mime_type: mime,
            dimensions,
            properties: [("page".to_string(), page.to_string())].into(),
        });
    }
    (images, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_payload(len: usize) -> Vec<u8> {
        let mut bytes = vec![0x89, 0x50, 0x4E, 0x47];
        bytes.resize(len, 1);
        bytes
    }

    #[test]
    fn test_survivor_gets_stable_id_and_marker() {
        let decoded = vec![DecodedImage {
            raw_bytes: png_payload(2000),
            png_bytes: None,
            width: Some(300),
            height: Some(200),
        }];
        let mut next = 0;
        let (images, skipped) = collect_page_images(decoded, 3, 10_000_000, &mut next);
        assert_eq!(skipped, 0);
        assert_eq!(images[0].id, "img_000");
        assert_eq!(images[0].position_marker, "![image](embedded:img_000)");
        assert_eq!(images[0].mime_type, "image/png");
        assert_eq!(images[0].properties.get("page").unwrap(), "3");
        assert_eq!(next, 1);
    }

    #[test]
    fn test_png_reencoding_preferred() {
        let decoded = vec![DecodedImage {
            raw_bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
            png_bytes: Some(png_payload(5000)),
            width: Some(100),
            height: Some(100),
        }];
        let mut next = 0;
        let (images, _) = collect_page_images(decoded, 1, 10_000_000, &mut next);
        assert_eq!(images[0].mime_type, "image/png");
        assert!(matches!(&images[0].data, ImageData::Embedded(b) if b.len() == 5000));
    }

    #[test]
    fn test_small_dimension_skipped() {
        let decoded = vec![DecodedImage {
            raw_bytes: png_payload(2000),
            png_bytes: None,
            width: Some(40),
            height: Some(400),
        }];
        let mut next = 0;
        let (images, skipped) = collect_page_images(decoded, 1, 10_000_000, &mut next);
        assert!(images.is_empty());
        assert_eq!(skipped, 1);
        assert_eq!(next, 0);
    }

    #[test]
    fn test_tiny_payload_and_oversize_skipped() {
        let decoded = vec![
            DecodedImage {
                raw_bytes: png_payload(500),
                ..Default::default()
            },
            DecodedImage {
                raw_bytes: png_payload(5000),
                ..Default::default()
            },
        ];
        let mut next = 0;
        let (images, skipped) = collect_page_images(decoded, 1, 4000, &mut next);
        assert!(images.is_empty());
        assert_eq!(skipped, 2);
    }

    #[test]
    fn test_unknown_dimensions_pass_dimension_filter() {
        let decoded = vec![DecodedImage {
            raw_bytes: png_payload(2000),
            ..Default::default()
        }];
        let mut next = 0;
        let (images, _) = collect_page_images(decoded, 1, 10_000_000, &mut next);
        assert_eq!(images.len(), 1);
        assert!(images[0].dimensions.is_none());
    }
}
