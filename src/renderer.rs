//! Provides a software rasterizer that draws loaded images as oriented quads.
//!
//! Images are laid out left to right, one quad per image, under an
//! orthographic camera centred on the first quad. Each image is normalized
//! to RGBA8 before sampling, as a device supporting only that format would
//! require.
//!
//! No GPU is required; it runs entirely on the CPU.
//!
//! # Examples
//! ```
//! use photoquad::renderer;
//!
//! let pixels = renderer::render_images(&[], 8, 4).unwrap();
//! assert_eq!(pixels.len(), 8 * 4 * 4);
//! assert_eq!(&pixels[..4], &[0, 0, 0, 255]);
//! ```

use std::path::Path;

use glam::{Mat4, Vec2, Vec3};

use crate::formats::shared::pixel::{normalize, SupportedFormats};
use crate::formats::{self, DecodedImage, LoadError, LoadedImage};
use crate::quad::QuadGeometry;

/// Horizontal distance between neighbouring quads in world units.
pub const QUAD_SPACING: f32 = 1.1;

const BACKGROUND: [u8; 4] = [0, 0, 0, 255];

/// Renders an image file into an RGBA pixel buffer.
///
/// # Errors
/// Returns the reader's error if the file cannot be loaded, or any error
/// from [`render_images`].
///
/// # Examples
/// ```
/// use std::path::Path;
///
/// use photoquad::renderer::render_image_from_path;
///
/// assert!(render_image_from_path(Path::new("does_not_exist.jpg"), 64, 64).is_err());
/// ```
pub fn render_image_from_path(path: &Path, width: u32, height: u32) -> Result<Vec<u8>, LoadError> {
    let loaded = formats::read_image_from_path(path)?;
    render_image(&loaded, width, height)
}

/// Renders a single loaded image into an RGBA pixel buffer.
///
/// # Errors
/// See [`render_images`].
pub fn render_image(image: &LoadedImage, width: u32, height: u32) -> Result<Vec<u8>, LoadError> {
    render_images(std::slice::from_ref(image), width, height)
}

/// Renders loaded images side by side into a `width` x `height` RGBA8
/// buffer, rows top first.
///
/// # Errors
/// Returns [`LoadError::InvalidData`] for a zero-sized output, or the
/// normalization error of the first image that cannot be shown as RGBA8.
pub fn render_images(
    images: &[LoadedImage],
    width: u32,
    height: u32,
) -> Result<Vec<u8>, LoadError> {
    if width == 0 || height == 0 {
        return Err(LoadError::InvalidData(format!(
            "Output size {}x{} is empty",
            width, height
        )));
    }

    let supported = SupportedFormats::rgba8_only();
    let textures = images
        .iter()
        .map(|loaded| normalize(loaded.image.clone(), |l, d| supported.contains(l, d)))
        .collect::<Result<Vec<_>, _>>()?;

    // ---- Camera ----
    let aspect = width as f32 / height as f32;
    let view = Mat4::look_at_rh(Vec3::Z, Vec3::ZERO, Vec3::Y);
    let proj = Mat4::orthographic_rh_gl(-aspect, aspect, -1.0, 1.0, 0.1, 10.0);
    let view_proj = proj * view;

    // ---- Framebuffer ----
    let w = width as usize;
    let h = height as usize;
    let mut pixels = BACKGROUND.repeat(w * h);

    for (i, (loaded, texture)) in images.iter().zip(&textures).enumerate() {
        let mut quad = QuadGeometry::for_image(
            texture.width,
            texture.height,
            loaded.orientation_or_default(),
        );
        quad.translate(Vec2::new(QUAD_SPACING * i as f32, 0.0));
        log::debug!(
            "Quad {} ({}x{}, {}) at {:?}",
            i,
            texture.width,
            texture.height,
            loaded.orientation_or_default(),
            quad.vertices
        );

        for (positions, uvs) in quad.triangles() {
            let screen = positions.map(|p| {
                let ndc = view_proj.project_point3(p.extend(0.0));
                Vec3::new(
                    (ndc.x * 0.5 + 0.5) * width as f32,
                    (0.5 - ndc.y * 0.5) * height as f32,
                    ndc.z,
                )
            });
            rasterize_triangle(&mut pixels, w, h, screen, uvs, texture);
        }
    }

    Ok(pixels)
}

/// Fills every pixel whose centre lies inside the triangle with the
/// texture sample at the interpolated coordinate.
fn rasterize_triangle(
    pixels: &mut [u8],
    w: usize,
    h: usize,
    screen: [Vec3; 3],
    uvs: [Vec2; 3],
    texture: &DecodedImage,
) {
    // Screen-space bounding box
    let min_x = screen[0].x.min(screen[1].x).min(screen[2].x).max(0.0) as usize;
    let max_x = (screen[0].x.max(screen[1].x).max(screen[2].x).ceil().max(0.0) as usize).min(w);
    let min_y = screen[0].y.min(screen[1].y).min(screen[2].y).max(0.0) as usize;
    let max_y = (screen[0].y.max(screen[1].y).max(screen[2].y).ceil().max(0.0) as usize).min(h);

    for y in min_y..max_y {
        for x in min_x..max_x {
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;

            let (u_bary, v_bary, w_bary) = barycentric(screen, px, py);
            if u_bary < 0.0 || v_bary < 0.0 || w_bary < 0.0 {
                continue;
            }

            let uv = uvs[0] * u_bary + uvs[1] * v_bary + uvs[2] * w_bary;
            let idx = (y * w + x) * 4;
            pixels[idx..idx + 4].copy_from_slice(&sample(texture, uv));
        }
    }
}

/// Nearest-neighbour sample of an RGBA8 texture. `v = 0` is the bottom row.
fn sample(texture: &DecodedImage, uv: Vec2) -> [u8; 4] {
    if texture.width == 0 || texture.height == 0 {
        return BACKGROUND;
    }
    let col = ((uv.x * texture.width as f32) as usize).min(texture.width as usize - 1);
    let row = (((1.0 - uv.y) * texture.height as f32) as usize).min(texture.height as usize - 1);
    let idx = (row * texture.width as usize + col) * 4;

    match texture.data.get(idx..idx + 4) {
        Some(px) => [px[0], px[1], px[2], px[3]],
        None => BACKGROUND,
    }
}

// ===========================================================================
// Rasterization helpers
// ===========================================================================

fn barycentric(tri: [Vec3; 3], px: f32, py: f32) -> (f32, f32, f32) {
    let e0 = tri[1].truncate() - tri[0].truncate();
    let e1 = tri[2].truncate() - tri[0].truncate();
    let ep = Vec2::new(px, py) - tri[0].truncate();

    let d00 = e0.dot(e0);
    let d01 = e0.dot(e1);
    let d11 = e1.dot(e1);
    let d20 = ep.dot(e0);
    let d21 = ep.dot(e1);

    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < 1e-10 {
        return (-1.0, -1.0, -1.0);
    }

    let inv = 1.0 / denom;
    let v = (d11 * d20 - d01 * d21) * inv;
    let w = (d00 * d21 - d01 * d20) * inv;
    let u = 1.0 - v - w;

    (u, v, w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::shared::exif::OrientationCode;
    use crate::formats::{BitDepth, ChannelLayout};

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    /// 4x2 RGB image: top row red, bottom row blue.
    fn red_over_blue(orientation: Option<OrientationCode>) -> LoadedImage {
        let mut data = Vec::new();
        for _ in 0..4 {
            data.extend_from_slice(&[255, 0, 0]);
        }
        for _ in 0..4 {
            data.extend_from_slice(&[0, 0, 255]);
        }
        let image = DecodedImage::new(4, 2, ChannelLayout::Rgb, BitDepth::Eight, data).unwrap();
        LoadedImage { image, orientation }
    }

    fn pixel(buf: &[u8], width: usize, x: usize, y: usize) -> [u8; 4] {
        let i = (y * width + x) * 4;
        [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]
    }

    #[test]
    fn test_output_dimensions() {
        let pixels = render_image(&red_over_blue(None), 128, 32).unwrap();
        assert_eq!(pixels.len(), 128 * 32 * 4);
    }

    #[test]
    fn test_zero_size_is_rejected() {
        assert!(matches!(
            render_images(&[], 0, 16),
            Err(LoadError::InvalidData(_))
        ));
    }

    #[test]
    fn test_upright_image() {
        // 2:1 landscape on a square canvas spans y in [-0.25, 0.25]
        let pixels = render_image(&red_over_blue(None), 64, 64).unwrap();
        assert_eq!(pixel(&pixels, 64, 32, 28), RED);
        assert_eq!(pixel(&pixels, 64, 32, 36), BLUE);
        assert_eq!(pixel(&pixels, 64, 32, 5), BACKGROUND);
        // Quad is one unit wide: x in [16, 48)
        assert_eq!(pixel(&pixels, 64, 10, 30), BACKGROUND);
    }

    #[test]
    fn test_right_top_puts_top_row_on_the_right() {
        let pixels = render_image(&red_over_blue(Some(OrientationCode::RightTop)), 64, 64).unwrap();
        assert_eq!(pixel(&pixels, 64, 20, 32), BLUE);
        assert_eq!(pixel(&pixels, 64, 44, 32), RED);
        assert_eq!(pixel(&pixels, 64, 5, 32), BACKGROUND);
    }

    #[test]
    fn test_left_bottom_puts_top_row_on_the_left() {
        let pixels =
            render_image(&red_over_blue(Some(OrientationCode::LeftBottom)), 64, 64).unwrap();
        assert_eq!(pixel(&pixels, 64, 20, 32), RED);
        assert_eq!(pixel(&pixels, 64, 44, 32), BLUE);
    }

    #[test]
    fn test_bottom_left_flips_vertically() {
        let pixels =
            render_image(&red_over_blue(Some(OrientationCode::BottomLeft)), 64, 64).unwrap();
        assert_eq!(pixel(&pixels, 64, 32, 28), BLUE);
        assert_eq!(pixel(&pixels, 64, 32, 36), RED);
    }

    #[test]
    fn test_second_image_is_offset() {
        let images = [red_over_blue(None), red_over_blue(Some(OrientationCode::BottomRight))];
        // 4:1 canvas shows x in [-4, 4] at 16 pixels per unit; the second
        // quad spans [0.6, 1.6], pixels 73.6 to 89.6
        let pixels = render_images(&images, 128, 32).unwrap();
        assert_eq!(pixel(&pixels, 128, 64, 14), RED);
        assert_eq!(pixel(&pixels, 128, 80, 14), BLUE);
        assert_eq!(pixel(&pixels, 128, 80, 18), RED);
        // Gap between the quads
        assert_eq!(pixel(&pixels, 128, 72, 16), BACKGROUND);
        assert_eq!(pixel(&pixels, 128, 100, 16), BACKGROUND);
    }

    #[test]
    fn test_sixteen_bit_fails() {
        let image = DecodedImage::new(1, 1, ChannelLayout::Rgba, BitDepth::Sixteen, vec![0; 8])
            .unwrap();
        let loaded = LoadedImage {
            image,
            orientation: None,
        };
        assert!(matches!(
            render_image(&loaded, 8, 8),
            Err(LoadError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_barycentric_degenerate() {
        let tri = [Vec3::ZERO, Vec3::X, Vec3::X * 2.0];
        assert_eq!(barycentric(tri, 0.5, 0.0), (-1.0, -1.0, -1.0));
    }
}
