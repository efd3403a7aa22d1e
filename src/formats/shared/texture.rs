//! Provides conversion of codec output into [`DecodedImage`] and image
//! loading from base64 data URLs.
//!
//! # Examples
//! ```
//! use photoquad::formats::shared::texture::read_image_from_data_url;
//!
//! let data_url = "data:image/png;base64,\
//! iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAAEElEQVR4AQEFAPr/AP////8J+wP9o9FJCgAAAABJRU5ErkJggg==";
//! let loaded = read_image_from_data_url(data_url);
//! assert!(loaded.is_some());
//! ```

use image::DynamicImage;

use crate::formats::{self, BitDepth, ChannelLayout, DecodedImage, LoadError, LoadedImage};

/// Converts a decoded `image` crate buffer into a [`DecodedImage`].
///
/// 16-bit samples are written in host byte order.
///
/// # Errors
/// Returns [`LoadError::InvalidData`] for floating-point or other color
/// types without a [`ChannelLayout`]/[`BitDepth`] equivalent.
pub fn decoded_from_dynamic(img: DynamicImage) -> Result<DecodedImage, LoadError> {
    let (width, height) = (img.width(), img.height());

    let (layout, bit_depth, data) = match img {
        DynamicImage::ImageLuma8(buf) => (ChannelLayout::Gray, BitDepth::Eight, buf.into_raw()),
        DynamicImage::ImageLumaA8(buf) => {
            (ChannelLayout::GrayAlpha, BitDepth::Eight, buf.into_raw())
        }
        DynamicImage::ImageRgb8(buf) => (ChannelLayout::Rgb, BitDepth::Eight, buf.into_raw()),
        DynamicImage::ImageRgba8(buf) => (ChannelLayout::Rgba, BitDepth::Eight, buf.into_raw()),
        DynamicImage::ImageLuma16(buf) => (
            ChannelLayout::Gray,
            BitDepth::Sixteen,
            samples_to_bytes(&buf.into_raw()),
        ),
        DynamicImage::ImageLumaA16(buf) => (
            ChannelLayout::GrayAlpha,
            BitDepth::Sixteen,
            samples_to_bytes(&buf.into_raw()),
        ),
        DynamicImage::ImageRgb16(buf) => (
            ChannelLayout::Rgb,
            BitDepth::Sixteen,
            samples_to_bytes(&buf.into_raw()),
        ),
        DynamicImage::ImageRgba16(buf) => (
            ChannelLayout::Rgba,
            BitDepth::Sixteen,
            samples_to_bytes(&buf.into_raw()),
        ),
        other => {
            return Err(LoadError::InvalidData(format!(
                "Unsupported decoded color type {:?}",
                other.color()
            )))
        }
    };

    DecodedImage::new(width, height, layout, bit_depth, data)
}

fn samples_to_bytes(samples: &[u16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_ne_bytes()).collect()
}

/// Reads an image from a base64-encoded data URL.
///
/// Supports data URLs in the format: `data:image/png;base64,<encoded_data>`.
/// The mime subtype is used as the extension hint for reader lookup.
/// Returns None if the source is empty, not a data URL, or decoding fails.
pub fn read_image_from_data_url(source: &str) -> Option<LoadedImage> {
    let rest = source.strip_prefix("data:")?;

    let comma_pos = rest.find(',')?;
    let (header, encoded) = (&rest[..comma_pos], &rest[(comma_pos + 1)..]);

    let extension = header
        .split(';')
        .next()
        .and_then(|mime| mime.strip_prefix("image/"))
        .filter(|subtype| !subtype.is_empty());

    use base64::Engine;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .ok()?;

    match formats::read_image(&bytes, extension) {
        Ok(loaded) => Some(loaded),
        Err(e) => {
            log::debug!("Data URL image rejected: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source() {
        assert!(read_image_from_data_url("").is_none());
    }

    #[test]
    fn test_non_data_url() {
        assert!(read_image_from_data_url("https://example.com/image.png").is_none());
        assert!(read_image_from_data_url("file:///path/to/image.png").is_none());
    }

    #[test]
    fn test_bad_base64() {
        assert!(read_image_from_data_url("data:image/png;base64,!!!").is_none());
    }

    /// Generate a valid 2x1 RGB PNG as base64 for use in tests
    fn create_test_png_base64() -> String {
        use image::{ImageBuffer, Rgb};
        use std::io::Cursor;

        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_fn(2, 1, |x, _| Rgb([x as u8 * 200, 10, 20]));

        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, image::ImageFormat::Png).unwrap();

        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(buffer.into_inner())
    }

    #[test]
    fn test_valid_png() {
        let data_url = format!("data:image/png;base64,{}", create_test_png_base64());

        let loaded = read_image_from_data_url(&data_url).expect("data URL should decode");
        assert_eq!(loaded.orientation, None);

        let image = loaded.image;
        assert_eq!((image.width, image.height), (2, 1));
        assert_eq!(image.layout, ChannelLayout::Rgb);
        assert_eq!(image.bit_depth, BitDepth::Eight);
        assert_eq!(image.data, vec![0, 10, 20, 200, 10, 20]);
    }

    #[test]
    fn test_sniffs_without_mime() {
        let data_url = format!("data:;base64,{}", create_test_png_base64());
        assert!(read_image_from_data_url(&data_url).is_some());
    }

    #[test]
    fn test_sixteen_bit_samples_use_host_order() {
        use image::{ImageBuffer, Luma};

        let buf: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_raw(2, 1, vec![0x0102, 0xA0B0]).unwrap();
        let image = decoded_from_dynamic(DynamicImage::ImageLuma16(buf)).unwrap();

        assert_eq!(image.layout, ChannelLayout::Gray);
        assert_eq!(image.bit_depth, BitDepth::Sixteen);
        let mut expected = 0x0102u16.to_ne_bytes().to_vec();
        expected.extend_from_slice(&0xA0B0u16.to_ne_bytes());
        assert_eq!(image.data, expected);
    }

    #[test]
    fn test_float_images_are_rejected() {
        let img = DynamicImage::new_rgb32f(1, 1);
        assert!(matches!(
            decoded_from_dynamic(img),
            Err(LoadError::InvalidData(_))
        ));
    }
}
