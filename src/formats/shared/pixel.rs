//! Provides pixel-format normalization for GPU upload.
//!
//! A device samples only some channel layout / bit depth pairs directly.
//! [`normalize`] passes supported images through untouched and widens the
//! common unsupported 8-bit layouts to RGBA with an opaque alpha channel.
//! Anything else is rejected rather than guessed at.
//!
//! # Examples
//! ```
//! use photoquad::formats::shared::pixel::{normalize, SupportedFormats};
//! use photoquad::formats::{BitDepth, ChannelLayout, DecodedImage};
//!
//! let rgb = DecodedImage::new(1, 1, ChannelLayout::Rgb, BitDepth::Eight, vec![1, 2, 3]).unwrap();
//! let formats = SupportedFormats::rgba8_only();
//! let rgba = normalize(rgb, |layout, depth| formats.contains(layout, depth)).unwrap();
//! assert_eq!(rgba.data, vec![1, 2, 3, 255]);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::formats::{BitDepth, ChannelLayout, DecodedImage, LoadError};

/// Alpha value synthesized for layouts without an alpha channel.
pub const OPAQUE: u8 = 255;

/// A channel layout and bit depth pair.
///
/// Parses from and displays as short names such as `rgba8` or `graya16`.
///
/// # Examples
/// ```
/// use photoquad::formats::shared::pixel::PixelFormat;
/// use photoquad::formats::{BitDepth, ChannelLayout};
///
/// let format: PixelFormat = "rgb16".parse().unwrap();
/// assert_eq!(format, PixelFormat::new(ChannelLayout::Rgb, BitDepth::Sixteen));
/// assert_eq!(format.to_string(), "rgb16");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct PixelFormat {
    /// Channel arrangement.
    pub layout: ChannelLayout,
    /// Bits per channel.
    pub bit_depth: BitDepth,
}

impl PixelFormat {
    /// 8-bit RGBA, the one format every device path accepts.
    pub const RGBA8: Self = Self::new(ChannelLayout::Rgba, BitDepth::Eight);

    /// Creates a pixel format.
    pub const fn new(layout: ChannelLayout, bit_depth: BitDepth) -> Self {
        Self { layout, bit_depth }
    }

    /// The format of an image.
    pub fn of(image: &DecodedImage) -> Self {
        Self::new(image.layout, image.bit_depth)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.layout, self.bit_depth)
    }
}

impl From<PixelFormat> for String {
    fn from(format: PixelFormat) -> Self {
        format.to_string()
    }
}

/// Error returned when a pixel format name cannot be parsed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Unknown pixel format '{0}', expected one of gray8, graya8, rgb8, rgba8 or the 16-bit variants")]
pub struct ParseFormatError(pub String);

impl FromStr for PixelFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        let (layout_name, bit_depth) = if let Some(prefix) = name.strip_suffix("16") {
            (prefix, BitDepth::Sixteen)
        } else if let Some(prefix) = name.strip_suffix('8') {
            (prefix, BitDepth::Eight)
        } else {
            return Err(ParseFormatError(s.to_string()));
        };

        let layout = match layout_name {
            "gray" => ChannelLayout::Gray,
            "graya" => ChannelLayout::GrayAlpha,
            "rgb" => ChannelLayout::Rgb,
            "rgba" => ChannelLayout::Rgba,
            _ => return Err(ParseFormatError(s.to_string())),
        };

        Ok(Self::new(layout, bit_depth))
    }
}

/// A concrete set of directly usable pixel formats.
///
/// # Examples
/// ```
/// use photoquad::formats::shared::pixel::SupportedFormats;
/// use photoquad::formats::{BitDepth, ChannelLayout};
///
/// let formats: SupportedFormats = "rgba8,rgb8".parse().unwrap();
/// assert!(formats.contains(ChannelLayout::Rgb, BitDepth::Eight));
/// assert!(!formats.contains(ChannelLayout::Gray, BitDepth::Eight));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupportedFormats {
    formats: Vec<PixelFormat>,
}

impl SupportedFormats {
    /// Creates a set from a list of formats.
    pub fn new(formats: Vec<PixelFormat>) -> Self {
        Self { formats }
    }

    /// A device that samples only 8-bit RGBA.
    pub fn rgba8_only() -> Self {
        Self::new(vec![PixelFormat::RGBA8])
    }

    /// Whether the pair is directly usable.
    pub fn contains(&self, layout: ChannelLayout, bit_depth: BitDepth) -> bool {
        self.formats.contains(&PixelFormat::new(layout, bit_depth))
    }

    /// The formats in the set.
    pub fn formats(&self) -> &[PixelFormat] {
        &self.formats
    }
}

impl Default for SupportedFormats {
    fn default() -> Self {
        Self::rgba8_only()
    }
}

impl FromStr for SupportedFormats {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let formats = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(PixelFormat::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        if formats.is_empty() {
            return Err(ParseFormatError(s.to_string()));
        }
        Ok(Self::new(formats))
    }
}

/// How [`normalize`] will treat an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Conversion {
    /// Already usable; returned as is.
    Identity,
    /// 8-bit RGB widened to RGBA with opaque alpha.
    RgbToRgba,
    /// 8-bit gray broadcast to RGB with opaque alpha.
    GrayToRgba,
}

impl Conversion {
    /// Format of the image after the conversion, given its current format.
    pub fn output_format(self, input: PixelFormat) -> PixelFormat {
        match self {
            Conversion::Identity => input,
            Conversion::RgbToRgba | Conversion::GrayToRgba => PixelFormat::RGBA8,
        }
    }
}

/// Decides which conversion, if any, makes `layout`/`bit_depth` usable.
///
/// # Errors
/// Returns [`LoadError::UnsupportedFormat`] when the pair is unsupported and
/// no conversion rule applies.
///
/// # Examples
/// ```
/// use photoquad::formats::shared::pixel::{plan_conversion, Conversion};
/// use photoquad::formats::{BitDepth, ChannelLayout};
///
/// let rgba_only =
///     |layout: ChannelLayout, depth: BitDepth| layout == ChannelLayout::Rgba && depth == BitDepth::Eight;
/// assert_eq!(
///     plan_conversion(ChannelLayout::Gray, BitDepth::Eight, rgba_only).unwrap(),
///     Conversion::GrayToRgba
/// );
/// assert!(plan_conversion(ChannelLayout::Rgb, BitDepth::Sixteen, rgba_only).is_err());
/// ```
pub fn plan_conversion<F>(
    layout: ChannelLayout,
    bit_depth: BitDepth,
    is_supported: F,
) -> Result<Conversion, LoadError>
where
    F: Fn(ChannelLayout, BitDepth) -> bool,
{
    if is_supported(layout, bit_depth) {
        return Ok(Conversion::Identity);
    }

    match (layout, bit_depth) {
        (ChannelLayout::Rgb, BitDepth::Eight) => Ok(Conversion::RgbToRgba),
        (ChannelLayout::Gray, BitDepth::Eight)
            if is_supported(ChannelLayout::Rgba, BitDepth::Eight) =>
        {
            Ok(Conversion::GrayToRgba)
        }
        _ => Err(LoadError::UnsupportedFormat { layout, bit_depth }),
    }
}

/// Returns `image` in a layout the device can sample.
///
/// Supported images come back unchanged without copying. 8-bit RGB always
/// widens to RGBA; 8-bit gray widens to RGBA when RGBA is supported. Every
/// other unsupported combination, including all 16-bit input, fails.
///
/// # Errors
/// Returns [`LoadError::InvalidData`] when the buffer length disagrees with
/// the dimensions, or [`LoadError::UnsupportedFormat`] when no rule applies.
pub fn normalize<F>(image: DecodedImage, is_supported: F) -> Result<DecodedImage, LoadError>
where
    F: Fn(ChannelLayout, BitDepth) -> bool,
{
    image.validate()?;

    let expand: fn(&[u8]) -> Vec<u8> =
        match plan_conversion(image.layout, image.bit_depth, is_supported)? {
            Conversion::Identity => return Ok(image),
            Conversion::RgbToRgba => rgb_to_rgba,
            Conversion::GrayToRgba => gray_to_rgba,
        };

    log::debug!(
        "Converting {}x{} {} image to {}",
        image.width,
        image.height,
        PixelFormat::of(&image),
        PixelFormat::RGBA8
    );

    DecodedImage::new(
        image.width,
        image.height,
        ChannelLayout::Rgba,
        BitDepth::Eight,
        expand(&image.data),
    )
}

fn rgb_to_rgba(data: &[u8]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(data.len() / 3 * 4);
    for chunk in data.chunks_exact(3) {
        rgba.extend_from_slice(chunk);
        rgba.push(OPAQUE);
    }
    rgba
}

fn gray_to_rgba(data: &[u8]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(data.len() * 4);
    for &gray in data {
        rgba.extend_from_slice(&[gray, gray, gray, OPAQUE]);
    }
    rgba
}
