//! `data:` URL encoding and parsing.
//!
//! ```text
//! data:[<mime>][;base64],<payload>
//! ```
//!
//! Output is always base64. Input may be base64 or percent-encoded; a missing
//! MIME type defaults to `text/plain`, as RFC 2397 specifies.

use base64::{Engine, engine::general_purpose};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("not a data URL")]
    MissingScheme,
    #[error("data URL has no `,` separating header and payload")]
    MissingPayload,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A parsed data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Build a base64 data URL.
pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", general_purpose::STANDARD.encode(bytes))
}

/// True when `source` uses the `data:` scheme (case-insensitively).
pub fn is_data_url(source: &str) -> bool {
    source
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

pub fn parse(source: &str) -> Result<DataUrl, DataUrlError> {
    if !is_data_url(source) {
        return Err(DataUrlError::MissingScheme);
    }
    let (header, payload) = source[5..]
        .split_once(',')
        .ok_or(DataUrlError::MissingPayload)?;

    let mut params = header.split(';').map(str::trim);
    let mime = match params.next() {
        Some(m) if !m.is_empty() => m.to_ascii_lowercase(),
        _ => "text/plain".to_string(),
    };
    let is_base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));

    let bytes = if is_base64 {
        let cleaned: String = urlencoding::decode(payload)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| payload.to_string())
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        general_purpose::STANDARD.decode(cleaned)?
    } else {
        urlencoding::decode_binary(payload.as_bytes()).into_owned()
    };

    Ok(DataUrl { mime, bytes })
}
