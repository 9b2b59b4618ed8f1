//! Pure calculation functions for output geometry.
//!
//! Everything here is pure and testable without any I/O or images: the
//! [`Orientation`] dispatch and the target-size resolver.

use super::backend::Dimensions;
use super::params::FitMode;

/// Rotation needed to display an image upright, derived from its EXIF
/// orientation tag.
///
/// Only the pure rotations are handled. Mirrored codes (2, 4, 5, 7) and
/// anything out of range are drawn as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Identity,
    /// EXIF 6.
    Rotate90Cw,
    /// EXIF 3.
    Rotate180,
    /// EXIF 8.
    Rotate90Ccw,
}

impl Orientation {
    pub fn from_exif(code: u16) -> Self {
        match code {
            6 => Orientation::Rotate90Cw,
            3 => Orientation::Rotate180,
            8 => Orientation::Rotate90Ccw,
            _ => Orientation::Identity,
        }
    }

    /// True for the rotations that exchange the width and height axes.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Orientation::Rotate90Cw | Orientation::Rotate90Ccw)
    }

    /// Clockwise quarter turns applied to the drawing context before the blit.
    pub fn quarter_turns(self) -> u8 {
        match self {
            Orientation::Identity => 0,
            Orientation::Rotate90Cw => 1,
            Orientation::Rotate180 => 2,
            Orientation::Rotate90Ccw => 3,
        }
    }

    /// Size of the drawing surface for an image rendered at `target`.
    pub fn surface_size(self, target: Dimensions) -> Dimensions {
        if self.swaps_axes() {
            target.transposed()
        } else {
            target
        }
    }

    /// Where to draw a `target`-sized image in the rotated coordinate space so
    /// it lands inside the surface.
    ///
    /// Canvas rotations pivot on the origin, so after rotating the image would
    /// fall outside the surface; the offset pulls it back in.
    pub fn draw_offset(self, target: Dimensions) -> (i64, i64) {
        let w = i64::from(target.width);
        let h = i64::from(target.height);
        match self {
            Orientation::Identity => (0, 0),
            Orientation::Rotate90Cw => (0, -h),
            Orientation::Rotate180 => (-w, -h),
            Orientation::Rotate90Ccw => (-w, 0),
        }
    }
}

/// Scale candidate for one axis. An unconstrained request (0) or an empty
/// source axis never shrinks the image.
fn axis_scale(requested: u32, source: u32) -> f64 {
    if requested == 0 || source == 0 {
        1.0
    } else {
        requested as f64 / source as f64
    }
}

/// Compute the output dimensions for a source image.
///
/// - [`FitMode::Fill`] returns `requested` as-is, transposed for 90°-class
///   orientations because the surface itself will be transposed.
/// - [`FitMode::Scale`] shrinks uniformly to fit inside `requested` and never
///   upscales. For 90°-class orientations the requested width bounds the
///   source *height* and vice versa.
///
/// # Examples
/// ```
/// # use img_compress::imaging::{Dimensions, FitMode, Orientation, resolve_target_size};
/// let source = Dimensions::new(800, 600);
/// let target = resolve_target_size(
///     source,
///     Dimensions::new(400, 0),
///     FitMode::Scale,
///     Orientation::Identity,
/// );
/// assert_eq!(target, Dimensions::new(400, 300));
/// ```
pub fn resolve_target_size(
    source: Dimensions,
    requested: Dimensions,
    fit: FitMode,
    orientation: Orientation,
) -> Dimensions {
    match fit {
        FitMode::Fill => {
            if orientation.swaps_axes() {
                requested.transposed()
            } else {
                requested
            }
        }
        FitMode::Scale => {
            let (scale_w, scale_h) = if orientation.swaps_axes() {
                (
                    axis_scale(requested.width, source.height),
                    axis_scale(requested.height, source.width),
                )
            } else {
                (
                    axis_scale(requested.width, source.width),
                    axis_scale(requested.height, source.height),
                )
            };
            let scale = scale_w.min(scale_h).min(1.0);

            Dimensions {
                width: (source.width as f64 * scale).round() as u32,
                height: (source.height as f64 * scale).round() as u32,
            }
        }
    }
}
