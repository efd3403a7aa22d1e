//! Provides EXIF Orientation tag extraction from a JPEG APP1 (Exif) payload.
//!
//! Only IFD0 is examined, and only the Orientation tag (0x0112) is interpreted.
//! Every other entry is skipped without being decoded. Malformed or missing
//! data never raises: [`find_orientation`] reports `None`, which callers treat
//! as [`OrientationCode::TopLeft`].
//!
//! # Examples
//! ```
//! use photoquad::formats::shared::exif::{find_orientation, OrientationCode};
//!
//! let mut marker = b"Exif\0\0".to_vec();
//! marker.extend_from_slice(&[0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00]);
//! marker.extend_from_slice(&[0x01, 0x00]);
//! marker.extend_from_slice(&[0x12, 0x01, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00]);
//! marker.extend_from_slice(&[0x00; 4]);
//!
//! assert_eq!(find_orientation(&marker), Some(OrientationCode::RightTop));
//! ```

use std::fmt;

use serde::Serialize;

/// TIFF tag ID of the Orientation entry.
pub const ORIENTATION_TAG: u16 = 0x0112;

/// Markers shorter than this are rejected before any scanning.
pub const MIN_MARKER_LEN: usize = 32;

/// The TIFF header must start within this many bytes of the marker start.
pub const HEADER_SCAN_WINDOW: usize = 16;

const LITTLE_ENDIAN_HEADER: [u8; 4] = [0x49, 0x49, 0x2A, 0x00];
const BIG_ENDIAN_HEADER: [u8; 4] = [0x4D, 0x4D, 0x00, 0x2A];

const IFD_ENTRY_LEN: usize = 12;
const TYPE_SHORT: u16 = 3;

/// Position of the stored image's 0th row and 0th column, as recorded by
/// the camera. Discriminants are the EXIF tag values.
///
/// ```text
///     How an "F" tagged with each value looks when displayed unrotated:
///
///     1        2       3      4         5            6           7          8
///
///     888888  888888      88  88      8888888888  88                  88  8888888888
///     88          88      88  88      88  88      88  88          88  88      88  88
///     8888      8888    8888  8888    88          8888888888  8888888888          88
///     88          88      88  88
///     88          88  888888  888888
/// ```
///
/// # Examples
/// ```
/// use photoquad::formats::shared::exif::OrientationCode;
///
/// assert_eq!(OrientationCode::from_exif(6), Some(OrientationCode::RightTop));
/// assert_eq!(OrientationCode::from_exif(9), None);
/// assert_eq!(OrientationCode::default(), OrientationCode::TopLeft);
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u16")]
#[repr(u16)]
pub enum OrientationCode {
    /// Stored as displayed.
    #[default]
    TopLeft = 1,
    /// Mirrored left to right.
    TopRight = 2,
    /// Rotated 180 degrees.
    BottomRight = 3,
    /// Mirrored top to bottom.
    BottomLeft = 4,
    /// Reflected over the main diagonal.
    LeftTop = 5,
    /// Needs a 90 degree clockwise rotation to display.
    RightTop = 6,
    /// Reflected over the anti-diagonal.
    RightBottom = 7,
    /// Needs a 90 degree counter-clockwise rotation to display.
    LeftBottom = 8,
}

impl OrientationCode {
    /// All eight codes in EXIF value order.
    pub const ALL: [Self; 8] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomRight,
        Self::BottomLeft,
        Self::LeftTop,
        Self::RightTop,
        Self::RightBottom,
        Self::LeftBottom,
    ];

    /// Maps an EXIF tag value (1-8) to a code. Returns `None` for anything else.
    pub fn from_exif(value: u16) -> Option<Self> {
        if (1..=8).contains(&value) {
            Some(Self::ALL[(value - 1) as usize])
        } else {
            None
        }
    }

    /// The EXIF tag value for this code.
    pub fn to_exif(self) -> u16 {
        self as u16
    }

    /// Whether the stored image is rotated a quarter turn relative to the
    /// display, so its width and height swap on screen.
    ///
    /// # Examples
    /// ```
    /// use photoquad::formats::shared::exif::OrientationCode;
    ///
    /// assert!(OrientationCode::RightTop.is_portrait());
    /// assert!(!OrientationCode::BottomRight.is_portrait());
    /// ```
    pub fn is_portrait(self) -> bool {
        matches!(
            self,
            Self::LeftTop | Self::RightTop | Self::RightBottom | Self::LeftBottom
        )
    }
}

impl From<OrientationCode> for u16 {
    fn from(code: OrientationCode) -> Self {
        code.to_exif()
    }
}

impl fmt::Display for OrientationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TopLeft => "TopLeft",
            Self::TopRight => "TopRight",
            Self::BottomRight => "BottomRight",
            Self::BottomLeft => "BottomLeft",
            Self::LeftTop => "LeftTop",
            Self::RightTop => "RightTop",
            Self::RightBottom => "RightBottom",
            Self::LeftBottom => "LeftBottom",
        };
        write!(f, "{} ({})", name, self.to_exif())
    }
}

/// Reasons an orientation could not be read from a marker.
///
/// These never escape [`find_orientation`]; they are only visible through
/// [`parse_orientation`] and the debug log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExifError {
    /// The marker is shorter than [`MIN_MARKER_LEN`].
    #[error("Exif marker too short: {0} bytes")]
    MarkerTooShort(usize),
    /// No TIFF byte-order signature within [`HEADER_SCAN_WINDOW`] bytes.
    #[error("TIFF header not found")]
    HeaderNotFound,
    /// IFD0 or its entries run past the end of the marker.
    #[error("IFD0 truncated")]
    TruncatedIfd,
    /// IFD0 holds no Orientation entry.
    #[error("Orientation tag not found")]
    TagNotFound,
    /// The Orientation entry is not a single SHORT.
    #[error("Orientation tag has type {ty} and count {count}, expected a single SHORT")]
    MalformedOrientation {
        /// TIFF field type of the entry.
        ty: u16,
        /// Value count of the entry.
        count: u32,
    },
    /// The Orientation value lies outside 1-8.
    #[error("Orientation value {0} out of range")]
    InvalidValue(u16),
}

/// Byte order declared by a TIFF header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    /// `II*\0`
    LittleEndian,
    /// `MM\0*`
    BigEndian,
}

/// Whether this build targets a big-endian host.
pub const fn host_is_big_endian() -> bool {
    cfg!(target_endian = "big")
}

/// Reads a `u16` at `offset`, composing the bytes in host order and then
/// reversing them when `swap` is set. Returns `None` past the end of `buf`.
pub fn read_u16(buf: &[u8], offset: usize, swap: bool) -> Option<u16> {
    let bytes = buf.get(offset..offset.checked_add(2)?)?;
    let (b0, b1) = (u16::from(bytes[0]), u16::from(bytes[1]));
    let host = if host_is_big_endian() {
        (b0 << 8) | b1
    } else {
        b0 | (b1 << 8)
    };
    Some(if swap { host.swap_bytes() } else { host })
}

/// Reads a `u32` at `offset`; see [`read_u16`].
pub fn read_u32(buf: &[u8], offset: usize, swap: bool) -> Option<u32> {
    let bytes = buf.get(offset..offset.checked_add(4)?)?;
    let (b0, b1, b2, b3) = (
        u32::from(bytes[0]),
        u32::from(bytes[1]),
        u32::from(bytes[2]),
        u32::from(bytes[3]),
    );
    let host = if host_is_big_endian() {
        (b0 << 24) | (b1 << 16) | (b2 << 8) | b3
    } else {
        b0 | (b1 << 8) | (b2 << 16) | (b3 << 24)
    };
    Some(if swap { host.swap_bytes() } else { host })
}

/// Locates the first TIFF byte-order signature in the scan window.
///
/// The first 4-byte match wins, even when a later offset would also match.
pub fn find_tiff_header(marker: &[u8]) -> Option<(usize, ByteOrder)> {
    (0..HEADER_SCAN_WINDOW).find_map(|i| {
        let candidate = marker.get(i..i + 4)?;
        if candidate == LITTLE_ENDIAN_HEADER {
            Some((i, ByteOrder::LittleEndian))
        } else if candidate == BIG_ENDIAN_HEADER {
            Some((i, ByteOrder::BigEndian))
        } else {
            None
        }
    })
}

/// Returns the orientation stored in an Exif marker, or `None` when the
/// marker is missing the tag or is malformed in any way.
///
/// `marker` is the APP1 payload starting at the `Exif\0\0` identifier. A
/// payload with the identifier already stripped is accepted too, since the
/// TIFF header is searched for rather than assumed at a fixed offset.
pub fn find_orientation(marker: &[u8]) -> Option<OrientationCode> {
    match parse_orientation(marker) {
        Ok(code) => {
            log::debug!("Found Exif orientation {}", code);
            Some(code)
        }
        Err(e) => {
            log::debug!("No Exif orientation: {}", e);
            None
        }
    }
}

/// Like [`find_orientation`], but reports why the orientation is unavailable.
///
/// # Errors
/// Returns the first structural problem found in the marker.
///
/// # Examples
/// ```
/// use photoquad::formats::shared::exif::{parse_orientation, ExifError};
///
/// assert_eq!(parse_orientation(&[0u8; 8]), Err(ExifError::MarkerTooShort(8)));
/// assert_eq!(parse_orientation(&[0u8; 40]), Err(ExifError::HeaderNotFound));
/// ```
pub fn parse_orientation(marker: &[u8]) -> Result<OrientationCode, ExifError> {
    if marker.len() < MIN_MARKER_LEN {
        return Err(ExifError::MarkerTooShort(marker.len()));
    }

    let (header, order) = find_tiff_header(marker).ok_or(ExifError::HeaderNotFound)?;
    let swap = host_is_big_endian() != (order == ByteOrder::BigEndian);
    log::trace!(
        "TIFF header at {} ({:?}), swap bytes = {}",
        header,
        order,
        swap
    );

    // IFD0 offset is relative to the start of the TIFF header
    let offset = read_u32(marker, header + 4, swap).ok_or(ExifError::TruncatedIfd)?;
    let ifd = usize::try_from(offset)
        .ok()
        .and_then(|o| header.checked_add(o))
        .ok_or(ExifError::TruncatedIfd)?;

    let tags = read_u16(marker, ifd, swap).ok_or(ExifError::TruncatedIfd)?;
    let entries_start = ifd + 2;
    let entries_end = entries_start + usize::from(tags) * IFD_ENTRY_LEN;
    if entries_end > marker.len() {
        return Err(ExifError::TruncatedIfd);
    }
    log::trace!("IFD0 at {} with {} tags", ifd, tags);

    for entry in marker[entries_start..entries_end].chunks_exact(IFD_ENTRY_LEN) {
        let tag = read_u16(entry, 0, swap).ok_or(ExifError::TruncatedIfd)?;
        let ty = read_u16(entry, 2, swap).ok_or(ExifError::TruncatedIfd)?;
        let count = read_u32(entry, 4, swap).ok_or(ExifError::TruncatedIfd)?;
        log::trace!("  tag=0x{:x}, type={}, count={}", tag, ty, count);

        if tag != ORIENTATION_TAG {
            continue;
        }
        if ty != TYPE_SHORT || count != 1 {
            return Err(ExifError::MalformedOrientation { ty, count });
        }

        // A single SHORT is stored inline, left-justified in the value field
        let value = read_u16(entry, 8, swap).ok_or(ExifError::TruncatedIfd)?;
        return OrientationCode::from_exif(value).ok_or(ExifError::InvalidValue(value));
    }

    Err(ExifError::TagNotFound)
}
