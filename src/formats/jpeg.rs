//! Provides the JPEG reader.
//!
//! Pixels are decoded by the `image` crate. The Exif APP1 segment is located
//! by walking the marker segments directly, and its Orientation tag is
//! attached to the result.
//!
//! # Examples
//! ```
//! use photoquad::formats::{self, ImageReader};
//!
//! let reader = formats::jpeg::JpegReader;
//! assert!(reader.extensions().contains(&"jpg"));
//! ```

use super::shared::exif::find_orientation;
use super::shared::texture::decoded_from_dynamic;
use super::{ImageReader, LoadResult, LoadedImage};

/// Identification string at the start of an Exif APP1 payload.
pub const EXIF_IDENT: &[u8; 6] = b"Exif\0\0";

const SOI: [u8; 2] = [0xFF, 0xD8];
const APP1: u8 = 0xE1;
const SOS: u8 = 0xDA;
const EOI: u8 = 0xD9;
const TEM: u8 = 0x01;

/// The JPEG format reader.
///
/// # Examples
/// ```
/// use photoquad::formats::{self, ImageReader};
///
/// let reader = formats::jpeg::JpegReader;
/// assert!(reader.can_read(b"\xFF\xD8\xFF\xE0", None));
/// ```
pub struct JpegReader;

impl ImageReader for JpegReader {
    fn name(&self) -> &'static str {
        "JPEG"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["jpg", "jpeg", "jpe", "jfif"]
    }

    fn can_read(&self, data: &[u8], extension: Option<&str>) -> bool {
        if let Some(ext) = extension {
            if self.extensions().contains(&ext.to_lowercase().as_str()) {
                return true;
            }
        }

        data.len() >= 3 && data[..2] == SOI && data[2] == 0xFF
    }

    fn read_from_bytes(&self, data: &[u8]) -> LoadResult {
        let orientation = match exif_marker(data) {
            Some(marker) => find_orientation(marker),
            None => {
                log::debug!("No Exif marker found");
                None
            }
        };

        let decoded = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)?;
        let image = decoded_from_dynamic(decoded)?;

        Ok(LoadedImage { image, orientation })
    }
}

/// Returns the payload of the last Exif APP1 segment, starting at the
/// `Exif\0\0` identifier.
///
/// Segments are walked from SOI up to the first SOS. A broken segment
/// structure ends the walk; whatever was found before it is kept.
///
/// # Examples
/// ```
/// use photoquad::formats::jpeg::exif_marker;
///
/// let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1, 0x00, 0x0A];
/// jpeg.extend_from_slice(b"Exif\0\0MM");
/// jpeg.extend_from_slice(&[0xFF, 0xDA]);
/// assert_eq!(exif_marker(&jpeg), Some(&b"Exif\0\0MM"[..]));
/// ```
pub fn exif_marker(data: &[u8]) -> Option<&[u8]> {
    if !data.starts_with(&SOI) {
        return None;
    }

    let mut found = None;
    let mut pos = SOI.len();
    while pos + 2 <= data.len() {
        if data[pos] != 0xFF {
            log::debug!("Lost JPEG marker sync at offset {}", pos);
            break;
        }
        let marker = data[pos + 1];
        match marker {
            // Fill byte before a marker
            0xFF => {
                pos += 1;
                continue;
            }
            SOS | EOI => break,
            TEM | 0xD0..=0xD7 => {
                pos += 2;
                continue;
            }
            _ => {}
        }

        let Some(len_bytes) = data.get(pos + 2..pos + 4) else {
            break;
        };
        let len = usize::from(u16::from_be_bytes([len_bytes[0], len_bytes[1]]));
        if len < 2 {
            break;
        }
        let start = pos + 4;
        let end = pos + 2 + len;
        let Some(payload) = data.get(start..end) else {
            log::debug!("JPEG segment 0x{:02X} truncated", marker);
            break;
        };

        if marker == APP1 && payload.starts_with(EXIF_IDENT) {
            log::trace!("Exif marker at offset {} ({} bytes)", pos, payload.len());
            found = Some(payload);
        }
        pos = end;
    }

    found
}
