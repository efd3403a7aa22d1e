//! Provides photoquad, an image loading library for textured-quad viewers.
//!
//! JPEG and PNG files are decoded to raw pixel buffers. JPEG files also have
//! their EXIF orientation read. Buffers the target device cannot sample are
//! widened to RGBA8 where possible. Quads are then laid out so each image
//! displays upright. A CPU rasterizer draws the result for previews.
//!
//! # Examples
//! ```
//! use photoquad::formats::shared::exif::OrientationCode;
//! use photoquad::quad::QuadGeometry;
//!
//! let quad = QuadGeometry::for_image(640, 480, OrientationCode::RightTop);
//! assert!(quad.vertices[2].y > quad.vertices[2].x);
//! ```

pub mod formats;
pub mod quad;
pub mod renderer;

pub use formats::shared::exif::{find_orientation, OrientationCode};
pub use formats::shared::pixel::{normalize, SupportedFormats};
pub use formats::{read_image, read_image_from_path, DecodedImage, LoadError, LoadedImage};
pub use quad::{apply_exif_orientation, apply_orientation, QuadGeometry};
