//! Provides the image reader trait and the common decoded-image types.
//!
//! Each reader turns encoded file bytes into a [`DecodedImage`] plus any
//! auxiliary metadata (currently the EXIF orientation) wrapped in a
//! [`LoadedImage`]. Readers are looked up by file extension first and by
//! content sniffing second.
//!
//! # Examples
//! ```
//! use photoquad::formats;
//!
//! let result = formats::read_image(b"invalid", None);
//! assert!(result.is_err());
//! ```

pub mod jpeg;
pub mod png;
pub mod shared;

use std::fmt;
use std::path::Path;

use serde::Serialize;

use shared::exif::OrientationCode;

/// Channel arrangement of a decoded pixel.
///
/// # Examples
/// ```
/// use photoquad::formats::ChannelLayout;
///
/// assert_eq!(ChannelLayout::Rgb.channels(), 3);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelLayout {
    /// Single luminance channel.
    Gray,
    /// Luminance followed by alpha.
    GrayAlpha,
    /// Red, green, blue.
    Rgb,
    /// Red, green, blue, alpha.
    Rgba,
}

impl ChannelLayout {
    /// Number of channels per pixel.
    pub fn channels(self) -> usize {
        match self {
            ChannelLayout::Gray => 1,
            ChannelLayout::GrayAlpha => 2,
            ChannelLayout::Rgb => 3,
            ChannelLayout::Rgba => 4,
        }
    }

    /// Short lowercase name, as used in pixel format strings.
    pub fn short_name(self) -> &'static str {
        match self {
            ChannelLayout::Gray => "gray",
            ChannelLayout::GrayAlpha => "graya",
            ChannelLayout::Rgb => "rgb",
            ChannelLayout::Rgba => "rgba",
        }
    }
}

impl fmt::Display for ChannelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Bits per channel sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
pub enum BitDepth {
    /// One byte per sample.
    Eight,
    /// Two bytes per sample, host byte order.
    Sixteen,
}

impl BitDepth {
    /// Bits per sample.
    pub fn bits(self) -> u8 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
        }
    }

    /// Bytes per sample.
    pub fn bytes(self) -> usize {
        match self {
            BitDepth::Eight => 1,
            BitDepth::Sixteen => 2,
        }
    }
}

impl From<BitDepth> for u8 {
    fn from(depth: BitDepth) -> Self {
        depth.bits()
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// A decoded image, rows stored top row first with no padding.
///
/// # Examples
/// ```
/// use photoquad::formats::{BitDepth, ChannelLayout, DecodedImage};
///
/// let image = DecodedImage::new(1, 1, ChannelLayout::Rgba, BitDepth::Eight, vec![255; 4]).unwrap();
/// assert_eq!(image.width, 1);
/// assert!(DecodedImage::new(2, 2, ChannelLayout::Rgb, BitDepth::Eight, vec![0; 3]).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    /// The image width in pixels.
    pub width: u32,
    /// The image height in pixels.
    pub height: u32,
    /// Channel arrangement of each pixel.
    pub layout: ChannelLayout,
    /// Bits per channel sample.
    pub bit_depth: BitDepth,
    /// Pixel data stored row-major.
    pub data: Vec<u8>,
}

impl DecodedImage {
    /// Creates an image, checking the buffer length against the dimensions.
    ///
    /// # Errors
    /// Returns [`LoadError::InvalidData`] if `data` has the wrong length.
    pub fn new(
        width: u32,
        height: u32,
        layout: ChannelLayout,
        bit_depth: BitDepth,
        data: Vec<u8>,
    ) -> Result<Self, LoadError> {
        let image = Self {
            width,
            height,
            layout,
            bit_depth,
            data,
        };
        image.validate()?;
        Ok(image)
    }

    /// Bytes occupied by one pixel.
    pub fn bytes_per_pixel(&self) -> usize {
        self.layout.channels() * self.bit_depth.bytes()
    }

    /// Buffer length implied by the dimensions and format, or `None` if it
    /// does not fit in `usize`.
    pub fn expected_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.bytes_per_pixel())
    }

    /// Width over height. Zero-height images report 1.0.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Checks the buffer length against the dimensions.
    ///
    /// # Errors
    /// Returns [`LoadError::InvalidData`] on a mismatch.
    pub fn validate(&self) -> Result<(), LoadError> {
        let expected = self.expected_len().ok_or_else(|| {
            LoadError::InvalidData(format!(
                "{}x{} {}{} image is too large to address",
                self.width, self.height, self.layout, self.bit_depth
            ))
        })?;
        if self.data.len() != expected {
            return Err(LoadError::InvalidData(format!(
                "{}x{} {}{} image needs {} bytes, got {}",
                self.width,
                self.height,
                self.layout,
                self.bit_depth,
                expected,
                self.data.len()
            )));
        }
        Ok(())
    }
}

/// A decoded image together with the metadata its reader extracted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedImage {
    /// The decoded pixels.
    pub image: DecodedImage,
    /// EXIF orientation, if the file carried a readable one.
    pub orientation: Option<OrientationCode>,
}

impl LoadedImage {
    /// The orientation to lay the image out with; missing means TopLeft.
    ///
    /// # Examples
    /// ```
    /// use photoquad::formats::shared::exif::OrientationCode;
    /// use photoquad::formats::{BitDepth, ChannelLayout, DecodedImage, LoadedImage};
    ///
    /// let image = DecodedImage::new(1, 1, ChannelLayout::Gray, BitDepth::Eight, vec![0]).unwrap();
    /// let loaded = LoadedImage { image, orientation: None };
    /// assert_eq!(loaded.orientation_or_default(), OrientationCode::TopLeft);
    /// ```
    pub fn orientation_or_default(&self) -> OrientationCode {
        self.orientation.unwrap_or_default()
    }
}

/// The result type for image reading.
pub type LoadResult = Result<LoadedImage, LoadError>;

/// Errors that can occur while reading or converting an image.
///
/// # Examples
/// ```
/// use photoquad::formats::LoadError;
///
/// let err = LoadError::UnrecognizedFormat;
/// assert_eq!(format!("{}", err), "Unrecognized format");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Represents invalid or corrupted image data.
    #[error("Invalid data: {0}")]
    InvalidData(String),
    /// Indicates no reader recognizes the data.
    #[error("Unrecognized format")]
    UnrecognizedFormat,
    /// Represents an IO error reading the file.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    /// Represents a codec failure while decoding pixels.
    #[error("Decode error: {0}")]
    Decode(#[from] image::ImageError),
    /// The pixel format is neither supported by the device nor convertible.
    #[error("Unsupported pixel format: {layout} at {bit_depth} bits per channel")]
    UnsupportedFormat {
        /// Channel layout of the rejected image.
        layout: ChannelLayout,
        /// Bit depth of the rejected image.
        bit_depth: BitDepth,
    },
}

/// A trait for format-specific image readers.
///
/// # Examples
/// ```
/// use photoquad::formats::{self, ImageReader};
///
/// let reader = formats::png::PngReader;
/// assert_eq!(reader.name(), "PNG");
/// ```
pub trait ImageReader: Send + Sync {
    /// Returns the human-readable name for this format.
    fn name(&self) -> &'static str;

    /// Returns the file extensions this reader handles (lowercase, without dot).
    fn extensions(&self) -> &'static [&'static str];

    /// Checks whether this reader can handle the given data.
    ///
    /// This should be a quick check (magic bytes or extension) without
    /// decoding anything.
    fn can_read(&self, data: &[u8], extension: Option<&str>) -> bool;

    /// Reads an image from raw bytes.
    ///
    /// # Errors
    /// Returns an error if the pixel data cannot be decoded.
    fn read_from_bytes(&self, data: &[u8]) -> LoadResult;

    /// Reads an image from a file path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or decoded.
    ///
    /// # Examples
    /// ```
    /// use std::path::Path;
    ///
    /// use photoquad::formats::{self, ImageReader};
    ///
    /// let reader = formats::jpeg::JpegReader;
    /// let result = reader.read_from_path(Path::new("does_not_exist.jpg"));
    /// assert!(result.is_err());
    /// ```
    fn read_from_path(&self, path: &Path) -> LoadResult {
        let data = std::fs::read(path)?;
        self.read_from_bytes(&data)
    }
}

/// Returns all registered image readers.
///
/// # Examples
/// ```
/// use photoquad::formats;
///
/// let readers = formats::get_readers();
/// assert_eq!(readers.len(), 2);
/// ```
pub fn get_readers() -> Vec<Box<dyn ImageReader>> {
    vec![Box::new(jpeg::JpegReader), Box::new(png::PngReader)]
}

/// Finds a reader that can handle the given data and extension.
///
/// A recognized content signature wins over the extension, so a PNG saved
/// as `.jpg` still goes to the PNG reader. The extension decides only when
/// the content matches no known signature.
///
/// # Examples
/// ```
/// use photoquad::formats;
///
/// let reader = formats::find_reader(b"\x89PNG\r\n\x1a\n", None).unwrap();
/// assert_eq!(reader.name(), "PNG");
/// let reader = formats::find_reader(b"\x89PNG\r\n\x1a\n", Some("jpg")).unwrap();
/// assert_eq!(reader.name(), "PNG");
/// assert!(formats::find_reader(b"GIF89a", None).is_none());
/// ```
pub fn find_reader(data: &[u8], extension: Option<&str>) -> Option<Box<dyn ImageReader>> {
    let mut readers = get_readers();

    if let Some(idx) = readers.iter().position(|reader| reader.can_read(data, None)) {
        return Some(readers.swap_remove(idx));
    }

    let ext_lower = extension?.to_lowercase();
    if let Some(idx) = readers.iter().position(|reader| {
        reader.extensions().contains(&ext_lower.as_str())
            && reader.can_read(data, Some(&ext_lower))
    }) {
        log::debug!("No content signature, using .{} extension", ext_lower);
        return Some(readers.swap_remove(idx));
    }

    None
}

/// Reads an image from bytes, auto-detecting the format.
///
/// # Errors
/// Returns an error if no reader recognizes the data or decoding fails.
///
/// # Examples
/// ```
/// use photoquad::formats::{self, LoadError};
///
/// let result = formats::read_image(b"invalid", None);
/// assert!(matches!(result, Err(LoadError::UnrecognizedFormat)));
/// ```
pub fn read_image(data: &[u8], extension: Option<&str>) -> LoadResult {
    let reader = find_reader(data, extension).ok_or(LoadError::UnrecognizedFormat)?;
    log::debug!("Reading {} bytes as {}", data.len(), reader.name());
    reader.read_from_bytes(data)
}

/// Reads an image from a file path, auto-detecting the format.
///
/// # Errors
/// Returns an error if the file cannot be read, the format is unrecognized
/// or decoding fails.
///
/// # Examples
/// ```
/// use std::path::Path;
///
/// use photoquad::formats;
///
/// let result = formats::read_image_from_path(Path::new("does_not_exist.png"));
/// assert!(result.is_err());
/// ```
pub fn read_image_from_path(path: &Path) -> LoadResult {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase());

    let data = std::fs::read(path)?;

    let reader = find_reader(&data, extension.as_deref()).ok_or(LoadError::UnrecognizedFormat)?;
    log::debug!("Reading {} as {}", path.display(), reader.name());
    reader.read_from_path(path)
}
