//! Provides the PNG reader.
//!
//! Palette images expand to RGB (RGBA when a tRNS chunk is present) and
//! sub-byte grayscale expands to 8 bits. 16-bit samples come out in host
//! byte order. PNG carries no orientation, so none is attached.

use super::shared::texture::decoded_from_dynamic;
use super::{ImageReader, LoadResult, LoadedImage};

/// The eight-byte PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

/// The PNG format reader.
///
/// # Examples
/// ```
/// use photoquad::formats::{self, ImageReader};
///
/// let reader = formats::png::PngReader;
/// assert!(reader.can_read(b"\x89PNG\r\n\x1a\n", None));
/// assert!(reader.read_from_bytes(b"\x89PNG\r\n\x1a\n").is_err());
/// ```
pub struct PngReader;

impl ImageReader for PngReader {
    fn name(&self) -> &'static str {
        "PNG"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["png"]
    }

    fn can_read(&self, data: &[u8], extension: Option<&str>) -> bool {
        if let Some(ext) = extension {
            if ext.eq_ignore_ascii_case("png") {
                return true;
            }
        }

        data.starts_with(&PNG_SIGNATURE)
    }

    fn read_from_bytes(&self, data: &[u8]) -> LoadResult {
        let decoded = image::load_from_memory_with_format(data, image::ImageFormat::Png)?;
        log::debug!(
            "PNG {}x{} decoded as {:?}",
            decoded.width(),
            decoded.height(),
            decoded.color()
        );
        let image = decoded_from_dynamic(decoded)?;

        Ok(LoadedImage {
            image,
            orientation: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, ImageBuffer, LumaA, Rgba};

    use super::*;
    use crate::formats::{BitDepth, ChannelLayout};

    fn encode_png(img: impl Into<DynamicImage>) -> Vec<u8> {
        let img: DynamicImage = img.into();
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, image::ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_gray_alpha_8() {
        let img: ImageBuffer<LumaA<u8>, Vec<u8>> =
            ImageBuffer::from_fn(3, 2, |x, y| LumaA([(x * 10 + y) as u8, 128]));
        let loaded = PngReader.read_from_bytes(&encode_png(img.clone())).unwrap();

        assert_eq!(loaded.orientation, None);
        assert_eq!(loaded.image.layout, ChannelLayout::GrayAlpha);
        assert_eq!(loaded.image.bit_depth, BitDepth::Eight);
        assert_eq!(loaded.image.data, img.into_raw());
    }

    #[test]
    fn test_rgba_16_in_host_order() {
        let img: ImageBuffer<Rgba<u16>, Vec<u16>> =
            ImageBuffer::from_pixel(2, 2, Rgba([0x1234, 0x5678, 0x9ABC, 0xFFFF]));
        let loaded = PngReader.read_from_bytes(&encode_png(img.clone())).unwrap();

        let image = loaded.image;
        assert_eq!(image.layout, ChannelLayout::Rgba);
        assert_eq!(image.bit_depth, BitDepth::Sixteen);
        assert_eq!(image.data.len(), 2 * 2 * 8);
        assert_eq!(&image.data[..2], &0x1234u16.to_ne_bytes());
        assert_eq!(&image.data[6..8], &0xFFFFu16.to_ne_bytes());
    }

    #[test]
    fn test_rows_are_top_first() {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_fn(1, 2, |_, y| Rgba([y as u8 * 255, 0, 0, 255]));
        let loaded = PngReader.read_from_bytes(&encode_png(img.clone())).unwrap();
        assert_eq!(loaded.image.data, vec![0, 0, 0, 255, 255, 0, 0, 255]);
    }

    #[test]
    fn test_detection() {
        assert!(PngReader.can_read(b"", Some("PNG")));
        assert!(!PngReader.can_read(b"\xFF\xD8\xFF", None));
    }
}
