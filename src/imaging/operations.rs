//! High-level image operations.
//!
//! These combine the pure [`calculations`](super::calculations) with a
//! backend's drawing surface.

use super::backend::{BackendError, Dimensions, DrawingSurface, ImageBackend};
use super::calculations::Orientation;
use super::params::{OutputFormat, Quality};
use tracing::trace;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Where and how big the image is drawn, and on what size of surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPlan {
    pub surface: Dimensions,
    pub quarter_turns: u8,
    pub offset: (i64, i64),
    pub draw_size: Dimensions,
}

/// Plan a render without executing it.
pub fn plan_render(target: Dimensions, orientation: Orientation) -> RenderPlan {
    RenderPlan {
        surface: orientation.surface_size(target),
        quarter_turns: orientation.quarter_turns(),
        offset: orientation.draw_offset(target),
        draw_size: target,
    }
}

/// Draw `image` at `target` size with its orientation corrected, and encode
/// the result as a data URL.
///
/// The surface lives only for the duration of this call.
pub fn render_and_encode<B: ImageBackend>(
    backend: &B,
    image: &B::Image,
    target: Dimensions,
    format: OutputFormat,
    quality: Quality,
    orientation: Orientation,
) -> Result<String> {
    let plan = plan_render(target, orientation);
    trace!(?plan, "rendering");

    let mut surface = backend.create_surface(plan.surface)?;
    if plan.quarter_turns != 0 {
        surface.rotate(plan.quarter_turns);
    }
    surface.draw_image(image, plan.offset, plan.draw_size)?;
    surface.to_data_url(format, quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    fn render(orientation: Orientation, format: OutputFormat) -> (String, Vec<RecordedOp>) {
        let backend = MockBackend::new();
        let image = Dimensions::new(800, 600);
        let url = render_and_encode(
            &backend,
            &image,
            Dimensions::new(400, 300),
            format,
            Quality::new(0.8),
            orientation,
        )
        .unwrap();
        (url, backend.get_operations())
    }

    #[test]
    fn identity_draws_at_origin_without_rotation() {
        let (url, ops) = render(Orientation::Identity, OutputFormat::Jpg);
        assert_eq!(url, "data:image/jpeg;mock,400x300");
        assert_eq!(
            ops,
            vec![
                RecordedOp::CreateSurface {
                    width: 400,
                    height: 300
                },
                RecordedOp::Draw {
                    x: 0,
                    y: 0,
                    width: 400,
                    height: 300
                },
                RecordedOp::Encode {
                    mime: "image/jpeg",
                    quality: 0.8
                },
            ]
        );
    }

    #[test]
    fn quarter_turn_clockwise_transposes_surface() {
        let (url, ops) = render(Orientation::Rotate90Cw, OutputFormat::Png);
        assert_eq!(url, "data:image/png;mock,300x400");
        assert_eq!(
            &ops[..3],
            &[
                RecordedOp::CreateSurface {
                    width: 300,
                    height: 400
                },
                RecordedOp::Rotate(1),
                RecordedOp::Draw {
                    x: 0,
                    y: -300,
                    width: 400,
                    height: 300
                },
            ]
        );
    }

    #[test]
    fn half_turn_keeps_surface_size() {
        let (_, ops) = render(Orientation::Rotate180, OutputFormat::Jpeg);
        assert_eq!(
            &ops[..3],
            &[
                RecordedOp::CreateSurface {
                    width: 400,
                    height: 300
                },
                RecordedOp::Rotate(2),
                RecordedOp::Draw {
                    x: -400,
                    y: -300,
                    width: 400,
                    height: 300
                },
            ]
        );
    }

    #[test]
    fn quarter_turn_counter_clockwise_transposes_surface() {
        let (_, ops) = render(Orientation::Rotate90Ccw, OutputFormat::Jpg);
        assert_eq!(
            &ops[..3],
            &[
                RecordedOp::CreateSurface {
                    width: 300,
                    height: 400
                },
                RecordedOp::Rotate(3),
                RecordedOp::Draw {
                    x: -400,
                    y: 0,
                    width: 400,
                    height: 300
                },
            ]
        );
    }

    #[test]
    fn plan_render_matches_orientation_rules() {
        let plan = plan_render(Dimensions::new(200, 100), Orientation::Rotate90Ccw);
        assert_eq!(plan.surface, Dimensions::new(100, 200));
        assert_eq!(plan.quarter_turns, 3);
        assert_eq!(plan.offset, (-200, 0));
        assert_eq!(plan.draw_size, Dimensions::new(200, 100));
    }
}
