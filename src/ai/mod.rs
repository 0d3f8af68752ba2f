//! AI service integration for image generation and variation
//!
//! Provides the two image flows as a trait, a Gemini-backed implementation and
//! a scripted mock for tests.

pub mod gemini;
pub mod mime;
pub mod mock;

pub use gemini::GeminiImageClient;
pub use mock::MockImageFlowClient;

use crate::models::{
    ImageGenerationRequest, ImageGenerationResult, ImageVariationRequest, ImageVariationResult,
};
use crate::Result;
use async_trait::async_trait;

/// Schema-validated wrappers around a hosted image model.
///
/// Implementations validate the request before any network traffic and report
/// a well-formed answer without an image as `Ok` with `image: None`.
#[async_trait]
pub trait ImageFlowService: Send + Sync {
    async fn generate_image(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<ImageGenerationResult>;

    async fn create_variation(
        &self,
        request: &ImageVariationRequest,
    ) -> Result<ImageVariationResult>;
}
