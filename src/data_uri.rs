//! Self-describing image payloads (`data:<media type>;base64,<payload>`)
//!
//! Every image that crosses the flow boundary travels as one of these, so the
//! same string can be shown, sent back to the model as context, or saved.

use crate::ai::mime;
use crate::{Error, Result};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";

/// A base64 data URI with an optional declared media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataUri {
    mime_type: Option<String>,
    data: String,
}

impl DataUri {
    /// Wrap an already base64-encoded payload.
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        Self {
            mime_type: (!mime_type.is_empty()).then_some(mime_type),
            data: data.into(),
        }
    }

    /// Encode raw image bytes, sniffing the media type from magic bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::new(
            mime::detect_image_mime(bytes),
            base64::engine::general_purpose::STANDARD.encode(bytes),
        )
    }

    pub fn parse(input: &str) -> Result<Self> {
        let rest = input
            .strip_prefix(SCHEME)
            .ok_or_else(|| Error::InvalidDataUri("missing `data:` scheme".to_string()))?;

        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| Error::InvalidDataUri("missing `,` before payload".to_string()))?;

        let media = header.strip_suffix(BASE64_MARKER).ok_or_else(|| {
            Error::InvalidDataUri("only base64-encoded payloads are supported".to_string())
        })?;

        if data.is_empty() {
            return Err(Error::InvalidDataUri("empty payload".to_string()));
        }

        // Parameters such as `;charset=` are not meaningful for images.
        let mime_type = media.split(';').next().unwrap_or_default().trim();

        Ok(Self::new(mime_type, data))
    }

    /// The declared media type, if any.
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// The base64 payload without the header.
    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| Error::InvalidDataUri(format!("payload is not valid base64: {}", e)))
    }

    /// Extension to save this payload under, derived from the declared type.
    pub fn file_extension(&self) -> String {
        mime::extension_for_mime(self.mime_type())
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{},{}",
            SCHEME,
            self.mime_type().unwrap_or_default(),
            BASE64_MARKER,
            self.data
        )
    }
}

impl FromStr for DataUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DataUri {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<DataUri> for String {
    fn from(uri: DataUri) -> Self {
        uri.to_string()
    }
}
