use super::ImageFlowService;
use crate::data_uri::DataUri;
use crate::models::{
    ImageGenerationRequest, ImageGenerationResult, ImageVariationRequest, ImageVariationResult,
};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Tiny valid 1x1 PNG returned when no response is scripted.
const DEFAULT_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 pixel
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49,
    0x44, 0x41, // IDAT chunk
    0x54, 0x08, 0x99, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0xE2,
    0x25, 0x00, 0xBC, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, // IEND chunk
    0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Scripted answer for one mock call.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Image(DataUri),
    NoImage,
    Failure(String),
}

/// Records every request and answers from a cycling script.
#[derive(Clone)]
pub struct MockImageFlowClient {
    outcomes: Arc<Mutex<Vec<MockOutcome>>>,
    generation_requests: Arc<Mutex<Vec<ImageGenerationRequest>>>,
    variation_requests: Arc<Mutex<Vec<ImageVariationRequest>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockImageFlowClient {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(Vec::new())),
            generation_requests: Arc::new(Mutex::new(Vec::new())),
            variation_requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_image_response(self, image: DataUri) -> Self {
        self.outcomes.lock().unwrap().push(MockOutcome::Image(image));
        self
    }

    pub fn with_no_image_response(self) -> Self {
        self.outcomes.lock().unwrap().push(MockOutcome::NoImage);
        self
    }

    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .push(MockOutcome::Failure(message.into()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn generation_requests(&self) -> Vec<ImageGenerationRequest> {
        self.generation_requests.lock().unwrap().clone()
    }

    pub fn variation_requests(&self) -> Vec<ImageVariationRequest> {
        self.variation_requests.lock().unwrap().clone()
    }

    fn next_outcome(&self) -> Result<Option<DataUri>> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        let outcomes = self.outcomes.lock().unwrap();
        if outcomes.is_empty() {
            return Ok(Some(DataUri::from_bytes(DEFAULT_PNG)));
        }

        match &outcomes[(*count - 1) % outcomes.len()] {
            MockOutcome::Image(image) => Ok(Some(image.clone())),
            MockOutcome::NoImage => Ok(None),
            MockOutcome::Failure(message) => Err(Error::AiProvider(message.clone())),
        }
    }
}

impl Default for MockImageFlowClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageFlowService for MockImageFlowClient {
    async fn generate_image(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<ImageGenerationResult> {
        request.validate()?;
        self.generation_requests
            .lock()
            .unwrap()
            .push(request.clone());

        Ok(ImageGenerationResult {
            image: self.next_outcome()?,
        })
    }

    async fn create_variation(
        &self,
        request: &ImageVariationRequest,
    ) -> Result<ImageVariationResult> {
        request.validate()?;
        self.variation_requests.lock().unwrap().push(request.clone());

        Ok(ImageVariationResult {
            image: self.next_outcome()?,
        })
    }
}
