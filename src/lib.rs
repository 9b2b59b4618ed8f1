//! # img-compress
//!
//! Resize and re-encode a single image into a data URL.
//!
//! Given a source (data URL, `http(s)://` or `file://` URL, or path) and a
//! target box, [`compress`] decodes the image, reads its EXIF orientation,
//! works out the output size, draws the image with its rotation corrected
//! onto an off-screen surface and
//! encodes that surface as JPEG or PNG.
//!
//! ```no_run
//! use img_compress::{CompressRequest, compress, imaging::RustBackend};
//!
//! # async fn run() -> Result<(), img_compress::CompressError> {
//! let request = CompressRequest {
//!     width: 400,
//!     ..CompressRequest::new("photo.jpg")
//! };
//! let result = compress(&RustBackend::new(), &request).await?;
//! println!("{}x{} → {} bytes of data URL", result.width, result.height, result.img.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`compress`](mod@compress) | Request validation and the decode → resolve → render flow |
//! | [`imaging`] | Orientation, target-size math, backend traits, the `image`-crate backend |
//! | [`data_url`] | `data:` URL encoding and parsing |
//! | [`config`] | TOML config for the CLI defaults and resampling filter |
//!
//! # Fit modes
//!
//! - `scale` (default) shrinks uniformly to fit the box and never upscales.
//!   A 0 on either axis leaves that axis unconstrained.
//! - `fill` produces exactly the requested box.
//!
//! # Orientation
//!
//! EXIF orientations 3, 6 and 8 are corrected by rotating the drawing surface;
//! for 6 and 8 the surface is transposed. Mirrored orientations are drawn
//! as stored. Missing or unreadable EXIF never fails a compression.

pub mod compress;
pub mod config;
pub mod data_url;
pub mod imaging;

pub use compress::{CompressError, CompressRequest, CompressResult, compress};
