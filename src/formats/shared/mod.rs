//! Provides shared utilities for image readers.
//!
//! - EXIF orientation extraction
//! - Pixel-format normalization
//! - Codec output conversion and data-URL loading
//!
//! # Examples
//! ```
//! use photoquad::formats::shared::find_orientation;
//!
//! assert_eq!(find_orientation(b"too short"), None);
//! ```

pub mod exif;
pub mod pixel;
pub mod texture;

pub use exif::{find_orientation, parse_orientation, ExifError, OrientationCode};
pub use pixel::{normalize, plan_conversion, Conversion, PixelFormat, SupportedFormats};
pub use texture::{decoded_from_dynamic, read_image_from_data_url};
