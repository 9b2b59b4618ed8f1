//! Pure Rust image backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Load `data:` URL | [`crate::data_url`] (`base64`, `urlencoding`) |
//! | Load `http(s)://` URL | `reqwest::get`, non-2xx is an error |
//! | Load `file://` URL / path | `url::Url::to_file_path` + `tokio::fs::read` |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` on a blocking task |
//! | EXIF orientation | `rexif::parse_buffer_quiet`, warnings go to `debug!` |
//! | Resample into the draw box | `DynamicImage::resize_exact` with a configurable filter |
//! | Encode → JPEG / PNG | `image::codecs::jpeg::JpegEncoder` / `image::codecs::png::PngEncoder` |

use super::backend::{BackendError, Dimensions, DrawingSurface, ImageBackend};
use super::params::{OutputFormat, Quality};
use crate::data_url;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader, RgbaImage};
use std::io::Cursor;
use std::path::PathBuf;
use tracing::{debug, trace};

/// A decoded image plus the bytes it came from, kept for metadata reads.
pub struct DecodedImage {
    pixels: DynamicImage,
    encoded: Vec<u8>,
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend {
    filter: FilterType,
}

impl RustBackend {
    pub fn new() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }

    /// Use `filter` when scaling the image into its draw box.
    pub fn with_filter(filter: FilterType) -> Self {
        Self { filter }
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Surfaces above this many pixels are refused, matching the area limit
/// browsers put on a canvas.
pub const MAX_SURFACE_PIXELS: u64 = 1 << 28;

/// Resolve a local source to a filesystem path.
fn source_path(source: &str) -> Result<PathBuf, BackendError> {
    match url::Url::parse(source) {
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map_err(|_| BackendError::UnsupportedSource(source.to_string())),
        // Single-letter schemes are Windows drive letters, not URLs.
        Ok(url) if url.scheme().len() > 1 => {
            Err(BackendError::UnsupportedSource(source.to_string()))
        }
        _ => Ok(PathBuf::from(source)),
    }
}

/// `source` as an `http`/`https` URL, if it is one.
fn remote_url(source: &str) -> Option<url::Url> {
    url::Url::parse(source)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

async fn fetch(url: url::Url) -> Result<Vec<u8>, BackendError> {
    let response = reqwest::get(url.clone())
        .await
        .map_err(|e| BackendError::Network(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(BackendError::Network(format!(
            "failed to fetch {url}: HTTP {status}"
        )));
    }
    let body = response
        .bytes()
        .await
        .map_err(|e| BackendError::Network(e.to_string()))?;
    Ok(body.to_vec())
}

/// Fetch the encoded bytes behind `source`.
async fn load_source(source: &str) -> Result<Vec<u8>, BackendError> {
    if data_url::is_data_url(source) {
        let url =
            data_url::parse(source).map_err(|e| BackendError::InvalidDataUrl(e.to_string()))?;
        trace!(mime = %url.mime, bytes = url.bytes.len(), "loaded data URL");
        return Ok(url.bytes);
    }
    if let Some(url) = remote_url(source) {
        let bytes = fetch(url).await?;
        trace!(bytes = bytes.len(), "fetched remote image");
        return Ok(bytes);
    }
    let path = source_path(source)?;
    let bytes = tokio::fs::read(&path).await?;
    trace!(path = %path.display(), bytes = bytes.len(), "loaded file");
    Ok(bytes)
}

fn decode_bytes(encoded: Vec<u8>) -> Result<DecodedImage, BackendError> {
    let pixels = ImageReader::new(Cursor::new(&encoded))
        .with_guessed_format()?
        .decode()?;
    Ok(DecodedImage { pixels, encoded })
}

/// Read the EXIF orientation tag from JPEG or TIFF bytes.
fn exif_orientation(encoded: &[u8]) -> Result<Option<u16>, BackendError> {
    let (exif, warnings) = rexif::parse_buffer_quiet(encoded);
    for warning in &warnings {
        debug!(warning = %warning, "EXIF");
    }
    let exif = exif.map_err(|e| BackendError::Metadata(e.to_string()))?;
    let code = exif
        .entries
        .iter()
        .find(|entry| entry.tag == rexif::ExifTag::Orientation)
        .and_then(|entry| match &entry.value {
            rexif::TagValue::U16(values) => values.first().copied(),
            _ => None,
        });
    Ok(code)
}

/// RGBA raster with a canvas-like quarter-turn transform.
pub struct RasterSurface {
    canvas: RgbaImage,
    quarter_turns: u8,
    filter: FilterType,
}

impl RasterSurface {
    /// Allocate a transparent surface. Fails when `size` exceeds
    /// [`MAX_SURFACE_PIXELS`].
    pub fn new(size: Dimensions, filter: FilterType) -> Result<Self, BackendError> {
        let area = u64::from(size.width) * u64::from(size.height);
        if area > MAX_SURFACE_PIXELS {
            return Err(BackendError::ProcessingFailed(format!(
                "surface {}x{} exceeds {MAX_SURFACE_PIXELS} pixels",
                size.width, size.height
            )));
        }
        Ok(Self {
            canvas: RgbaImage::new(size.width, size.height),
            quarter_turns: 0,
            filter,
        })
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Map a point from drawing space to surface space. Callers pass doubled
    /// coordinates so pixel centers stay integral.
    fn transform(&self, x: i64, y: i64) -> (i64, i64) {
        match self.quarter_turns {
            0 => (x, y),
            1 => (-y, x),
            2 => (-x, -y),
            _ => (y, -x),
        }
    }

    fn encode(&self, format: OutputFormat, quality: Quality) -> Result<Vec<u8>, BackendError> {
        let (width, height) = self.canvas.dimensions();
        let mut buf = Vec::new();
        match format {
            OutputFormat::Jpg | OutputFormat::Jpeg => {
                // No alpha channel: transparent areas come out black.
                let rgb = DynamicImage::ImageRgba8(self.canvas.clone()).to_rgb8();
                JpegEncoder::new_with_quality(&mut buf, quality.percent())
                    .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                    .map_err(BackendError::Encode)?;
            }
            OutputFormat::Png => {
                PngEncoder::new(&mut buf)
                    .write_image(self.canvas.as_raw(), width, height, ExtendedColorType::Rgba8)
                    .map_err(BackendError::Encode)?;
            }
        }
        Ok(buf)
    }
}

impl DrawingSurface for RasterSurface {
    type Image = DecodedImage;

    fn size(&self) -> Dimensions {
        Dimensions::new(self.canvas.width(), self.canvas.height())
    }

    fn rotate(&mut self, quarter_turns: u8) {
        self.quarter_turns = (self.quarter_turns + quarter_turns % 4) % 4;
    }

    /// Scale `image` into the box and blit it, replacing what is underneath.
    /// Pixels that land outside the surface are clipped.
    fn draw_image(
        &mut self,
        image: &DecodedImage,
        offset: (i64, i64),
        size: Dimensions,
    ) -> Result<(), BackendError> {
        if size.is_empty() || self.size().is_empty() {
            return Ok(());
        }
        let scaled = image
            .pixels
            .resize_exact(size.width, size.height, self.filter)
            .to_rgba8();

        let surface_w = i64::from(self.canvas.width());
        let surface_h = i64::from(self.canvas.height());
        for (u, v, pixel) in scaled.enumerate_pixels() {
            let cx = 2 * (offset.0 + i64::from(u)) + 1;
            let cy = 2 * (offset.1 + i64::from(v)) + 1;
            let (tx, ty) = self.transform(cx, cy);
            let (px, py) = (tx.div_euclid(2), ty.div_euclid(2));
            if (0..surface_w).contains(&px) && (0..surface_h).contains(&py) {
                self.canvas.put_pixel(px as u32, py as u32, *pixel);
            }
        }
        Ok(())
    }

    /// A surface with no area exports as `data:,`, like an empty canvas.
    fn to_data_url(&self, format: OutputFormat, quality: Quality) -> Result<String, BackendError> {
        if self.size().is_empty() {
            return Ok("data:,".to_string());
        }
        let bytes = self.encode(format, quality)?;
        debug!(
            format = %format,
            bytes = bytes.len(),
            width = self.canvas.width(),
            height = self.canvas.height(),
            "encoded surface"
        );
        Ok(data_url::encode(format.mime_type(), &bytes))
    }
}

impl ImageBackend for RustBackend {
    type Image = DecodedImage;
    type Surface = RasterSurface;

    async fn decode(&self, source: &str) -> Result<DecodedImage, BackendError> {
        let encoded = load_source(source).await?;
        tokio::task::spawn_blocking(move || decode_bytes(encoded))
            .await
            .map_err(|e| BackendError::ProcessingFailed(format!("decode task failed: {e}")))?
    }

    fn natural_size(&self, image: &DecodedImage) -> Dimensions {
        Dimensions::new(image.pixels.width(), image.pixels.height())
    }

    fn read_orientation(&self, image: &DecodedImage) -> Result<Option<u16>, BackendError> {
        exif_orientation(&image.encoded)
    }

    fn create_surface(&self, size: Dimensions) -> Result<RasterSurface, BackendError> {
        RasterSurface::new(size, self.filter)
    }
}
