//! Provides textured quad geometry laid out to match an image's EXIF
//! orientation.
//!
//! A quad has four corners in counter-clockwise order starting at the
//! bottom-left, drawn as two triangles through [`QUAD_INDICES`]. Texture
//! coordinates use `v = 0` for the bottom row of the stored image.
//!
//! Orienting a quad is two independent steps:
//! - the vertex Y axis is stretched so the quad reproduces the image's
//!   displayed aspect ratio;
//! - the texture coordinates are permuted so the stored pixels land on the
//!   right corners.
//!
//! # Examples
//! ```
//! use photoquad::formats::shared::exif::OrientationCode;
//! use photoquad::quad::QuadGeometry;
//!
//! // A 4:3 landscape image
//! let quad = QuadGeometry::for_image(400, 300, OrientationCode::TopLeft);
//! assert!((quad.vertices[2].y - 0.375).abs() < 1e-6);
//! ```

use glam::Vec2;

use crate::formats::shared::exif::OrientationCode;

/// Triangle list for a quad: two triangles with consistent winding.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

/// Unit quad centred on the origin.
pub const UNIT_VERTICES: [Vec2; 4] = [
    Vec2::new(-0.5, -0.5),
    Vec2::new(0.5, -0.5),
    Vec2::new(0.5, 0.5),
    Vec2::new(-0.5, 0.5),
];

/// Texture coordinates of the stored image corners, matching
/// [`UNIT_VERTICES`].
pub const UNIT_TEX_COORDS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 1.0),
];

/// Vertex positions and texture coordinates for one image quad.
///
/// # Examples
/// ```
/// use photoquad::quad::{QuadGeometry, UNIT_TEX_COORDS, UNIT_VERTICES};
///
/// let quad = QuadGeometry::unit();
/// assert_eq!(quad.vertices, UNIT_VERTICES);
/// assert_eq!(quad.tex_coords, UNIT_TEX_COORDS);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadGeometry {
    /// Corner positions, counter-clockwise from bottom-left.
    pub vertices: [Vec2; 4],
    /// Texture coordinates for each corner.
    pub tex_coords: [Vec2; 4],
}

impl QuadGeometry {
    /// The unoriented unit quad.
    pub fn unit() -> Self {
        Self {
            vertices: UNIT_VERTICES,
            tex_coords: UNIT_TEX_COORDS,
        }
    }

    /// A unit-width quad for a `width` x `height` stored image, oriented for
    /// display.
    pub fn for_image(width: u32, height: u32, orientation: OrientationCode) -> Self {
        let aspect_ratio = if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        };
        let mut quad = Self::unit();
        quad.orient(orientation, aspect_ratio);
        quad
    }

    /// Applies [`apply_orientation`] in place.
    pub fn orient(&mut self, orientation: OrientationCode, aspect_ratio: f32) {
        let (vertices, tex_coords) =
            apply_orientation(orientation, self.vertices, self.tex_coords, aspect_ratio);
        self.vertices = vertices;
        self.tex_coords = tex_coords;
    }

    /// Moves every vertex by `offset`.
    pub fn translate(&mut self, offset: Vec2) {
        for vertex in &mut self.vertices {
            *vertex += offset;
        }
    }

    /// Index list for drawing the quad.
    pub fn indices(&self) -> &'static [u16; 6] {
        &QUAD_INDICES
    }

    /// The two triangles as `(positions, tex_coords)` pairs.
    pub fn triangles(&self) -> [([Vec2; 3], [Vec2; 3]); 2] {
        let tri = |i: usize| {
            let idx = [
                QUAD_INDICES[i * 3] as usize,
                QUAD_INDICES[i * 3 + 1] as usize,
                QUAD_INDICES[i * 3 + 2] as usize,
            ];
            (
                idx.map(|k| self.vertices[k]),
                idx.map(|k| self.tex_coords[k]),
            )
        };
        [tri(0), tri(1)]
    }
}

/// Lays out quad geometry for an image with the given orientation.
///
/// `aspect_ratio` is the stored image's width over height. Vertex Y
/// coordinates are multiplied by it for the four quarter-turn orientations
/// and divided by it otherwise; texture coordinates are permuted per
/// [`permute_tex_coords`].
///
/// # Examples
/// ```
/// use glam::Vec2;
/// use photoquad::formats::shared::exif::OrientationCode;
/// use photoquad::quad::{apply_orientation, UNIT_TEX_COORDS, UNIT_VERTICES};
///
/// let (verts, tex) = apply_orientation(OrientationCode::RightTop, UNIT_VERTICES, UNIT_TEX_COORDS, 2.0);
/// assert_eq!(verts[0], Vec2::new(-0.5, -1.0));
/// assert_eq!(tex[0], Vec2::new(1.0, 0.0));
/// ```
pub fn apply_orientation(
    orientation: OrientationCode,
    vertices: [Vec2; 4],
    tex_coords: [Vec2; 4],
    aspect_ratio: f32,
) -> ([Vec2; 4], [Vec2; 4]) {
    (
        scale_vertices(orientation, vertices, aspect_ratio),
        permute_tex_coords(orientation, tex_coords),
    )
}

/// Like [`apply_orientation`], but takes a raw EXIF value. Values outside
/// 1-8 are laid out as [`OrientationCode::TopLeft`].
pub fn apply_exif_orientation(
    value: u16,
    vertices: [Vec2; 4],
    tex_coords: [Vec2; 4],
    aspect_ratio: f32,
) -> ([Vec2; 4], [Vec2; 4]) {
    let orientation = OrientationCode::from_exif(value).unwrap_or_default();
    apply_orientation(orientation, vertices, tex_coords, aspect_ratio)
}

/// Stretches the vertex Y axis to the displayed aspect ratio.
pub fn scale_vertices(
    orientation: OrientationCode,
    vertices: [Vec2; 4],
    aspect_ratio: f32,
) -> [Vec2; 4] {
    let scale = if orientation.is_portrait() {
        aspect_ratio
    } else {
        aspect_ratio.recip()
    };
    vertices.map(|v| Vec2::new(v.x, v.y * scale))
}

/// Reorders texture coordinates so the stored image displays upright.
///
/// | Orientation | Transform |
/// |---|---|
/// | TopLeft | none |
/// | TopRight | swap(0,1), swap(2,3) |
/// | BottomRight | rotate left 2 |
/// | BottomLeft | swap(0,3), swap(1,2) |
/// | LeftTop | swap(0,2) |
/// | RightTop | rotate left 1 |
/// | RightBottom | swap(1,3) |
/// | LeftBottom | rotate left 3 |
pub fn permute_tex_coords(orientation: OrientationCode, tex_coords: [Vec2; 4]) -> [Vec2; 4] {
    let mut t = tex_coords;
    match orientation {
        OrientationCode::TopLeft => {}
        // mirror left-right
        OrientationCode::TopRight => {
            t.swap(0, 1);
            t.swap(2, 3);
        }
        // 180
        OrientationCode::BottomRight => t.rotate_left(2),
        // mirror top-bottom
        OrientationCode::BottomLeft => {
            t.swap(0, 3);
            t.swap(1, 2);
        }
        // main diagonal
        OrientationCode::LeftTop => t.swap(0, 2),
        // 90 clockwise
        OrientationCode::RightTop => t.rotate_left(1),
        // anti-diagonal
        OrientationCode::RightBottom => t.swap(1, 3),
        // 90 counter-clockwise
        OrientationCode::LeftBottom => t.rotate_left(3),
    }
    t
}
