//! Image processing: decode, orient, resample, encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (JPEG, PNG, TIFF, WebP) |
//! | **EXIF orientation** | `rexif` |
//! | **Resample** | `DynamicImage::resize_exact` (Triangle by default) |
//! | **Encode** | `JpegEncoder` at the requested quality, `PngEncoder` |
//!
//! The module is split into:
//! - **Calculations**: [`Orientation`] and [`resolve_target_size`], pure and unit testable
//! - **Parameters**: [`Quality`], [`OutputFormat`], [`FitMode`]
//! - **Backend**: [`ImageBackend`] + [`DrawingSurface`] traits, [`RustBackend`]
//! - **Operations**: [`render_and_encode`], combining calculations with a surface

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, DrawingSurface, ImageBackend};
pub use calculations::{Orientation, resolve_target_size};
pub use operations::{RenderPlan, plan_render, render_and_encode};
pub use params::{FitMode, OutputFormat, Quality, UnknownFormat};
pub use rust_backend::{DecodedImage, RasterSurface, RustBackend};
