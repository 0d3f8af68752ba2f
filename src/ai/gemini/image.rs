use super::client::GeminiHttpClient;
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
};
use crate::ai::ImageFlowService;
use crate::data_uri::DataUri;
use crate::models::{
    ImageGenerationRequest, ImageGenerationResult, ImageVariationRequest, ImageVariationResult,
};
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use base64::Engine as _;
use std::time::Duration;

/// Image-capable Gemini model both flows are pinned to.
pub const IMAGE_MODEL: &str = "gemini-2.0-flash-exp";

/// Gemini must be allowed to answer with text as well as image parts.
const RESPONSE_MODALITIES: [&str; 2] = ["TEXT", "IMAGE"];

pub struct GeminiImageClient {
    http: GeminiHttpClient,
}

impl GeminiImageClient {
    pub fn new(api_key: String) -> Self {
        Self::new_with_client(api_key, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                api_key,
                IMAGE_MODEL.to_string(),
                Duration::from_secs(120),
                client,
            ),
        }
    }

    fn build_request(parts: Vec<Part>) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: GenerationConfig {
                response_modalities: RESPONSE_MODALITIES.iter().map(|m| m.to_string()).collect(),
            },
        }
    }

    /// Send a request and pull the first inline image out of the answer.
    async fn request_image(&self, request: &GenerateContentRequest) -> Result<Option<DataUri>> {
        let response: GenerateContentResponse = self.http.generate_content(request).await?;

        let Some(inline) = response.first_inline_data() else {
            tracing::warn!(
                "Gemini returned no image part (finish reason: {})",
                response.finish_reason().unwrap_or("unknown")
            );
            return Ok(None);
        };

        base64::engine::general_purpose::STANDARD
            .decode(&inline.data)
            .map_err(|e| {
                Error::AiProvider(format!("Failed to decode Gemini base64 image: {}", e))
            })?;

        tracing::debug!("Gemini returned image with mime_type: {}", inline.mime_type);

        Ok(Some(DataUri::new(inline.mime_type.clone(), inline.data.clone())))
    }
}

#[cfg(test)]
super::impl_with_gemini_base_url!(GeminiImageClient);

#[async_trait]
impl ImageFlowService for GeminiImageClient {
    async fn generate_image(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<ImageGenerationResult> {
        request.validate()?;

        tracing::debug!(
            "Requesting image from Gemini ({} chars of prompt)",
            request.prompt.len()
        );

        let body = Self::build_request(vec![Part::Text {
            text: request.prompt.clone(),
        }]);

        Ok(ImageGenerationResult {
            image: self.request_image(&body).await?,
        })
    }

    async fn create_variation(
        &self,
        request: &ImageVariationRequest,
    ) -> Result<ImageVariationResult> {
        request.validate()?;

        let base = &request.base_image;
        tracing::debug!(
            "Requesting variation from Gemini (base image {})",
            base.mime_type().unwrap_or_default()
        );

        let body = Self::build_request(vec![
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: base.mime_type().unwrap_or_default().to_string(),
                    data: base.data().to_string(),
                },
            },
            Part::Text {
                text: prompts::render(prompts::VARIATION, &[("prompt", &request.prompt)]),
            },
        ]);

        Ok(ImageVariationResult {
            image: self.request_image(&body).await?,
        })
    }
}
