//! Single-image compression: validate, decode, resolve, render.
//!
//! ```text
//! Created → Validating ─┬─ Rejected (MissingInput | InvalidDimensions | InvalidFormat)
//!                       └─ Decoding ─┬─ Rejected (Decode)
//!                                    └─ Resolving → Encoding ─┬─ Rejected (Encode)
//!                                                             └─ Fulfilled
//! ```
//!
//! Validation happens before the backend is touched, so a bad request never
//! costs a decode. The decode is the only `.await`; everything after it is
//! synchronous. An unreadable EXIF block is not an error: the image is
//! treated as upright.

use crate::imaging::{
    BackendError, Dimensions, FitMode, ImageBackend, Orientation, OutputFormat, Quality,
    render_and_encode, resolve_target_size,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("no image source given")]
    MissingInput,
    #[error("invalid target size {width}x{height}: both must be >= 0 and at least one > 0")]
    InvalidDimensions { width: i64, height: i64 },
    #[error("invalid output type `{0}`: expected one of jpg, jpeg, png")]
    InvalidFormat(String),
    /// The backend could not load or decode the source. Passed through as-is.
    #[error(transparent)]
    Decode(BackendError),
    #[error("failed to render image: {0}")]
    Encode(#[source] BackendError),
}

/// A compression request.
///
/// Field names follow the JSON shape callers send (`type` for the output
/// format). Everything except `img` is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressRequest {
    /// Data URL, `file://` URL or filesystem path.
    pub img: String,
    /// Requested width; 0 leaves the axis unconstrained.
    pub width: i64,
    /// Requested height; 0 leaves the axis unconstrained.
    pub height: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit: Option<FitMode>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl CompressRequest {
    pub fn new(img: impl Into<String>) -> Self {
        Self {
            img: img.into(),
            ..Self::default()
        }
    }
}

/// A request that passed validation, with defaults filled in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressOptions<'a> {
    pub source: &'a str,
    pub requested: Dimensions,
    pub format: OutputFormat,
    pub quality: Quality,
    pub fit: FitMode,
}

/// The compressed image and the size it was resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressResult {
    pub width: u32,
    pub height: u32,
    /// Data URL of the encoded image.
    pub img: String,
}

/// Check a request and apply defaults.
///
/// Checks run in order: source, dimensions, format. An empty `type` counts
/// as absent.
pub fn validate(request: &CompressRequest) -> Result<CompressOptions<'_>, CompressError> {
    if request.img.is_empty() {
        return Err(CompressError::MissingInput);
    }

    let (width, height) = (request.width, request.height);
    let invalid = || CompressError::InvalidDimensions { width, height };
    if width < 0 || height < 0 || width.saturating_add(height) <= 0 {
        return Err(invalid());
    }
    let requested = Dimensions::new(
        u32::try_from(width).map_err(|_| invalid())?,
        u32::try_from(height).map_err(|_| invalid())?,
    );

    let format = match request.format.as_deref() {
        None | Some("") => OutputFormat::default(),
        Some(name) => name
            .parse()
            .map_err(|_| CompressError::InvalidFormat(name.to_string()))?,
    };

    Ok(CompressOptions {
        source: &request.img,
        requested,
        format,
        quality: request.quality.map(Quality::new).unwrap_or_default(),
        fit: request.fit.unwrap_or_default(),
    })
}

/// Shorten a source for log output; data URLs can run to megabytes.
fn describe_source(source: &str) -> &str {
    const MAX: usize = 64;
    match source.char_indices().nth(MAX) {
        Some((end, _)) => &source[..end],
        None => source,
    }
}

fn resolve_orientation<B: ImageBackend>(backend: &B, image: &B::Image) -> Orientation {
    match backend.read_orientation(image) {
        Ok(Some(code)) => {
            trace!(code, "EXIF orientation");
            Orientation::from_exif(code)
        }
        Ok(None) => Orientation::Identity,
        Err(e) => {
            debug!(error = %e, "EXIF unreadable, assuming upright");
            Orientation::Identity
        }
    }
}

/// Resize and re-encode one image.
///
/// Returns the resolved target size alongside the data URL. For 90°-class
/// orientations that size is in the image's stored axes, so the encoded
/// image is its transpose.
pub async fn compress<B: ImageBackend>(
    backend: &B,
    request: &CompressRequest,
) -> Result<CompressResult, CompressError> {
    let options = validate(request).inspect_err(|e| debug!(error = %e, "request rejected"))?;
    if request.quality.is_some() && !options.format.is_lossy() {
        trace!(format = %options.format, "quality ignored by lossless encoder");
    }

    debug!(source = describe_source(options.source), "decoding");
    let image = backend
        .decode(options.source)
        .await
        .map_err(CompressError::Decode)?;

    let orientation = resolve_orientation(backend, &image);
    let source = backend.natural_size(&image);
    let target = resolve_target_size(source, options.requested, options.fit, orientation);
    debug!(
        ?source,
        ?target,
        ?orientation,
        fit = ?options.fit,
        "resolved target size"
    );

    let img = render_and_encode(
        backend,
        &image,
        target,
        options.format,
        options.quality,
        orientation,
    )
    .map_err(CompressError::Encode)?;
    debug!(bytes = img.len(), format = %options.format, "compressed");

    Ok(CompressResult {
        width: target.width,
        height: target.height,
        img,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    fn request(width: i64, height: i64) -> CompressRequest {
        CompressRequest {
            width,
            height,
            ..CompressRequest::new("data:image/jpeg;base64,AAAA")
        }
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[tokio::test]
    async fn empty_source_rejects_before_decode() {
        let backend = MockBackend::with_image(Dimensions::new(800, 600));
        let result = compress(&backend, &CompressRequest::new("")).await;
        assert!(matches!(result, Err(CompressError::MissingInput)));
        assert!(backend.get_operations().is_empty());
    }

    #[tokio::test]
    async fn unknown_type_rejects_before_decode() {
        let backend = MockBackend::with_image(Dimensions::new(800, 600));
        let req = CompressRequest {
            format: Some("gif".into()),
            ..request(100, 0)
        };
        let result = compress(&backend, &req).await;
        assert!(matches!(result, Err(CompressError::InvalidFormat(f)) if f == "gif"));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn type_match_is_case_sensitive() {
        let req = CompressRequest {
            format: Some("PNG".into()),
            ..request(100, 0)
        };
        assert!(matches!(validate(&req), Err(CompressError::InvalidFormat(_))));
    }

    #[test]
    fn invalid_dimensions_are_rejected() {
        for (w, h) in [(-1, 100), (100, -1), (0, 0), (-5, 5), (i64::from(u32::MAX) + 1, 0)] {
            assert!(
                matches!(
                    validate(&request(w, h)),
                    Err(CompressError::InvalidDimensions { width, height }) if width == w && height == h
                ),
                "{w}x{h} should be rejected"
            );
        }
    }

    #[test]
    fn missing_input_wins_over_other_errors() {
        let req = CompressRequest {
            width: -1,
            format: Some("gif".into()),
            ..CompressRequest::new("")
        };
        assert!(matches!(validate(&req), Err(CompressError::MissingInput)));
    }

    #[test]
    fn dimensions_checked_before_format() {
        let req = CompressRequest {
            format: Some("gif".into()),
            ..request(0, 0)
        };
        assert!(matches!(
            validate(&req),
            Err(CompressError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn defaults_applied_after_validation() {
        let req = request(100, 0);
        let options = validate(&req).unwrap();
        assert_eq!(options.format, OutputFormat::Jpg);
        assert_eq!(options.quality, Quality::default());
        assert_eq!(options.fit, FitMode::Scale);
        assert_eq!(options.requested, Dimensions::new(100, 0));
    }

    #[test]
    fn empty_type_means_default() {
        let req = CompressRequest {
            format: Some(String::new()),
            ..request(100, 0)
        };
        assert_eq!(validate(&req).unwrap().format, OutputFormat::Jpg);
    }

    #[test]
    fn request_deserializes_from_json_shape() {
        let req: CompressRequest = serde_json::from_str(
            r#"{"img": "a.jpg", "width": 300, "quality": 0.5, "fit": "fill", "type": "png"}"#,
        )
        .unwrap();
        assert_eq!(req.img, "a.jpg");
        assert_eq!(req.width, 300);
        assert_eq!(req.height, 0);
        assert_eq!(req.quality, Some(0.5));
        assert_eq!(req.fit, Some(FitMode::Fill));
        assert_eq!(req.format.as_deref(), Some("png"));
    }

    #[test]
    fn describe_source_truncates_long_sources() {
        let long = "x".repeat(500);
        assert_eq!(describe_source(&long).len(), 64);
        assert_eq!(describe_source("a.jpg"), "a.jpg");
    }

    // =========================================================================
    // Full flow against the mock backend
    // =========================================================================

    #[tokio::test]
    async fn scale_width_only() {
        let backend = MockBackend::with_image(Dimensions::new(800, 600));
        let result = compress(&backend, &request(400, 0)).await.unwrap();

        assert_eq!((result.width, result.height), (400, 300));
        assert_eq!(result.img, "data:image/jpeg;mock,400x300");
        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::Decode("data:image/jpeg;base64,AAAA".into()),
                RecordedOp::ReadOrientation,
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
                    quality: 0.92
                },
            ]
        );
    }

    #[tokio::test]
    async fn scale_height_only_preserves_aspect() {
        let backend = MockBackend::with_image(Dimensions::new(800, 600));
        let result = compress(&backend, &request(0, 150)).await.unwrap();
        assert_eq!((result.width, result.height), (200, 150));
    }

    #[tokio::test]
    async fn fill_uses_requested_box() {
        let backend = MockBackend::with_image(Dimensions::new(800, 600));
        let req = CompressRequest {
            fit: Some(FitMode::Fill),
            ..request(200, 200)
        };
        let result = compress(&backend, &req).await.unwrap();
        assert_eq!((result.width, result.height), (200, 200));
    }

    #[tokio::test]
    async fn fill_with_quarter_turn_rotates_surface() {
        let backend = MockBackend::with_orientation(Dimensions::new(800, 600), 6);
        let req = CompressRequest {
            fit: Some(FitMode::Fill),
            ..request(200, 200)
        };
        let result = compress(&backend, &req).await.unwrap();

        assert_eq!((result.width, result.height), (200, 200));
        let ops = backend.get_operations();
        assert!(ops.contains(&RecordedOp::Rotate(1)));
        assert!(ops.contains(&RecordedOp::Draw {
            x: 0,
            y: -200,
            width: 200,
            height: 200
        }));
    }

    #[tokio::test]
    async fn fill_with_quarter_turn_swaps_target() {
        let backend = MockBackend::with_orientation(Dimensions::new(800, 600), 8);
        let req = CompressRequest {
            fit: Some(FitMode::Fill),
            ..request(300, 200)
        };
        let result = compress(&backend, &req).await.unwrap();

        assert_eq!((result.width, result.height), (200, 300));
        // Surface is the transpose of the target: the requested box.
        assert_eq!(result.img, "data:image/jpeg;mock,300x200");
    }

    #[tokio::test]
    async fn half_turn_rotates_without_swapping() {
        let backend = MockBackend::with_orientation(Dimensions::new(800, 600), 3);
        let result = compress(&backend, &request(400, 0)).await.unwrap();

        assert_eq!((result.width, result.height), (400, 300));
        assert!(backend.get_operations().contains(&RecordedOp::Rotate(2)));
    }

    #[tokio::test]
    async fn unreadable_exif_falls_back_to_upright() {
        let backend = MockBackend {
            orientation_fails: true,
            ..MockBackend::with_image(Dimensions::new(800, 600))
        };
        let result = compress(&backend, &request(400, 0)).await.unwrap();

        assert_eq!((result.width, result.height), (400, 300));
        assert!(
            !backend
                .get_operations()
                .iter()
                .any(|op| matches!(op, RecordedOp::Rotate(_)))
        );
    }

    #[tokio::test]
    async fn mirrored_orientation_is_drawn_as_is() {
        let backend = MockBackend::with_orientation(Dimensions::new(800, 600), 5);
        let result = compress(&backend, &request(400, 0)).await.unwrap();
        assert_eq!((result.width, result.height), (400, 300));
    }

    #[tokio::test]
    async fn decode_failure_is_passed_through() {
        let backend = MockBackend {
            decode_fails: true,
            ..MockBackend::new()
        };
        let result = compress(&backend, &request(100, 100)).await;

        match result {
            Err(CompressError::Decode(BackendError::ProcessingFailed(msg))) => {
                assert_eq!(msg, "mock decode failure")
            }
            other => panic!("expected decode failure, got {other:?}"),
        }
        // Nothing rendered after a failed decode.
        assert_eq!(backend.get_operations().len(), 1);
    }

    #[tokio::test]
    async fn png_passes_quality_through_unvalidated() {
        let backend = MockBackend::with_image(Dimensions::new(800, 600));
        let req = CompressRequest {
            format: Some("png".into()),
            quality: Some(0.3),
            ..request(400, 0)
        };
        let result = compress(&backend, &req).await.unwrap();

        assert!(result.img.starts_with("data:image/png"));
        assert!(backend.get_operations().contains(&RecordedOp::Encode {
            mime: "image/png",
            quality: 0.3
        }));
    }

    #[tokio::test]
    async fn out_of_range_quality_uses_default() {
        let backend = MockBackend::with_image(Dimensions::new(800, 600));
        let req = CompressRequest {
            quality: Some(7.0),
            ..request(400, 0)
        };
        compress(&backend, &req).await.unwrap();
        assert!(backend.get_operations().contains(&RecordedOp::Encode {
            mime: "image/jpeg",
            quality: 0.92
        }));
    }
}
