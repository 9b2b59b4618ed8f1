//! Image backend traits and shared types.
//!
//! The [`ImageBackend`] trait covers the platform services a compression
//! needs: decode a source, report its natural size, read its EXIF
//! orientation, and hand out a [`DrawingSurface`] to render onto.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests use the recording
//! `MockBackend` defined below so the geometry and orientation logic can be
//! checked without decoding a single pixel.

use super::params::{OutputFormat, Quality};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Unsupported image source: {0}")]
    UnsupportedSource(String),
    #[error("Failed to read EXIF metadata: {0}")]
    Metadata(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions of an image or surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn transposed(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A 2D drawing target with canvas-style transforms.
///
/// Rotations accumulate and pivot on the origin, exactly like a canvas
/// context; [`draw_image`](Self::draw_image) coordinates are in the rotated
/// space.
pub trait DrawingSurface {
    type Image;

    fn size(&self) -> Dimensions;

    /// Rotate the context clockwise by `quarter_turns` × 90°.
    fn rotate(&mut self, quarter_turns: u8);

    /// Draw `image` scaled into the `size` box whose top-left corner is `offset`.
    fn draw_image(
        &mut self,
        image: &Self::Image,
        offset: (i64, i64),
        size: Dimensions,
    ) -> Result<(), BackendError>;

    /// Export the surface as a data URL.
    fn to_data_url(&self, format: OutputFormat, quality: Quality) -> Result<String, BackendError>;
}

/// Platform services used by [`compress`](crate::compress::compress).
pub trait ImageBackend: Sync {
    /// Decoded, renderable image handle.
    type Image: Send;
    type Surface: DrawingSurface<Image = Self::Image>;

    /// Load and decode `source`. This is the only suspension point of a
    /// compression.
    fn decode(
        &self,
        source: &str,
    ) -> impl Future<Output = Result<Self::Image, BackendError>> + Send;

    fn natural_size(&self, image: &Self::Image) -> Dimensions;

    /// Best-effort EXIF orientation tag. `Ok(None)` when the image carries none.
    fn read_orientation(&self, image: &Self::Image) -> Result<Option<u16>, BackendError>;

    /// Allocate a transparent surface of the given size. Fails when the
    /// surface is too large to allocate.
    fn create_surface(&self, size: Dimensions) -> Result<Self::Surface, BackendError>;
}
