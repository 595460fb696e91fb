//! Default decoder built on the `image` crate.

use image::imageops::FilterType;

use crate::domain::entities::ImageSize;
use crate::domain::ports::{CacheError, CacheResult, DataSource, ImageDecoderPort};

/// Decodes PNG, JPEG and WebP and scales large images down.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateDecoder;

impl ImageDecoderPort for ImageCrateDecoder {
    fn decode(
        &self,
        source: &dyn DataSource,
        resize: Option<ImageSize>,
    ) -> CacheResult<image::DynamicImage> {
        let bytes = source
            .read_all()
            .map_err(|e| CacheError::IoError(e.to_string()))?;
        let img = image::load_from_memory(&bytes)
            .map_err(|e| CacheError::DecodeError(format!("Failed to decode image: {e}")))?;

        match resize {
            Some(size) if img.width() > size.width || img.height() > size.height => {
                Ok(img.resize(size.width, size.height, FilterType::Lanczos3))
            }
            _ => Ok(img),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ImageFrom;
    use crate::infrastructure::source::ByteArrayDataSource;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let source = ByteArrayDataSource::new(png_bytes(8, 6), ImageFrom::Memory);
        let img = ImageCrateDecoder.decode(&source, None).unwrap();
        assert_eq!((img.width(), img.height()), (8, 6));
    }

    #[test]
    fn test_decode_scales_down_preserving_aspect() {
        let source = ByteArrayDataSource::new(png_bytes(400, 200), ImageFrom::Memory);
        let img = ImageCrateDecoder
            .decode(&source, Some(ImageSize::new(100, 100)))
            .unwrap();
        assert_eq!((img.width(), img.height()), (100, 50));
    }

    #[test]
    fn test_decode_does_not_upscale() {
        let source = ByteArrayDataSource::new(png_bytes(10, 10), ImageFrom::Memory);
        let img = ImageCrateDecoder
            .decode(&source, Some(ImageSize::new(100, 100)))
            .unwrap();
        assert_eq!(img.width(), 10);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let source = ByteArrayDataSource::new(b"not an image".to_vec(), ImageFrom::Memory);
        assert!(matches!(
            ImageCrateDecoder.decode(&source, None),
            Err(CacheError::DecodeError(_))
        ));
    }
}
