//! Parameter types for image operations.
//!
//! These describe *what* to produce, not *how*. They are shared by the
//! [`calculations`](super::calculations) (which only care about [`FitMode`]),
//! the [`operations`](super::operations) renderer, and the backends that do the
//! pixel work.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality in `[0, 1]`, default 0.92.
//! - [`OutputFormat`]: `jpg`, `jpeg` or `png`, matched case-sensitively.
//! - [`FitMode`]: `scale` (preserve aspect, never upscale) or `fill` (exact box).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality setting for lossy encoding, as a fraction in `[0, 1]`.
///
/// Values outside that range (or NaN) fall back to the default instead of
/// being clamped, which is how canvas encoders treat them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quality(f32);

impl Quality {
    pub const DEFAULT: f32 = 0.92;

    pub fn new(value: f32) -> Self {
        if (0.0..=1.0).contains(&value) {
            Self(value)
        } else {
            Self::default()
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Quality on the 1–100 scale JPEG encoders expect.
    pub fn percent(self) -> u8 {
        ((self.0 * 100.0).round() as u8).clamp(1, 100)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Encoded output format.
///
/// `jpg` and `jpeg` are distinct spellings of the same encoder; both are kept
/// so a round-trip through `Display` gives back what the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpg,
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpg | OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Jpg => "jpg",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
        }
    }

    /// Whether the encoder honors [`Quality`].
    pub fn is_lossy(self) -> bool {
        !matches!(self, OutputFormat::Png)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a format string is not `jpg`, `jpeg` or `png`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormat(pub String);

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jpg" => Ok(OutputFormat::Jpg),
            "jpeg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

/// How the source is mapped into the requested box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Preserve aspect ratio, fit inside the box, never upscale.
    #[default]
    Scale,
    /// Use the requested box exactly.
    Fill,
}

impl FromStr for FitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scale" => Ok(FitMode::Scale),
            "fill" => Ok(FitMode::Fill),
            other => Err(format!("unknown fit mode `{other}` (expected scale or fill)")),
        }
    }
}
