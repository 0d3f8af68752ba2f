//! Data models and structures
//!
//! Defines the request/response contracts of the two image flows and the
//! runtime configuration.

use crate::data_uri::DataUri;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Input of the text-to-image flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageGenerationRequest {
    pub prompt: String,
}

impl ImageGenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Result<Self> {
        let request = Self {
            prompt: prompt.into(),
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<()> {
        require_prompt(&self.prompt)
    }
}

/// Output of the text-to-image flow. `image` is `None` when the model answered
/// without an image part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageGenerationResult {
    #[serde(rename = "imageDataUri", skip_serializing_if = "Option::is_none", default)]
    pub image: Option<DataUri>,
}

/// Input of the variation flow: a prior result plus the prompt guiding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageVariationRequest {
    #[serde(rename = "baseImageDataUri")]
    pub base_image: DataUri,
    pub prompt: String,
}

impl ImageVariationRequest {
    pub fn new(base_image: DataUri, prompt: impl Into<String>) -> Result<Self> {
        let request = Self {
            base_image,
            prompt: prompt.into(),
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_image.mime_type().is_none() {
            return Err(Error::Validation(
                "base image must declare a media type".to_string(),
            ));
        }
        require_prompt(&self.prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageVariationResult {
    #[serde(
        rename = "variedImageDataUri",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub image: Option<DataUri>,
}

fn require_prompt(prompt: &str) -> Result<()> {
    if prompt.trim().is_empty() {
        return Err(Error::Validation("prompt cannot be empty".to_string()));
    }
    Ok(())
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub output_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config("GEMINI_API_KEY not set".to_string()))?;

        Ok(Self {
            gemini_api_key,
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("output")),
        })
    }
}
