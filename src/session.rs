//! Interactive image session
//!
//! Holds the prompt being edited, the prompt last used successfully and a
//! single [`Phase`] describing what is on screen. Actions are split into a
//! `begin_*` step that validates and moves into a submitting phase, and a
//! `finish_*` step that folds the flow outcome back in, so a front-end can
//! render the loading state in between. [`Session::generate`] and
//! [`Session::create_variation`] run both steps around a flow call.

use crate::ai::ImageFlowService;
use crate::data_uri::DataUri;
use crate::models::{
    ImageGenerationRequest, ImageGenerationResult, ImageVariationRequest, ImageVariationResult,
};
use crate::{Error, Result};
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use uuid::Uuid;

pub const EMPTY_PROMPT: &str = "Prompt cannot be empty.";
pub const NO_BASE_IMAGE: &str = "No image available to create a variation from.";
pub const EMPTY_VARIATION_PROMPT: &str = "Please provide a prompt for the variation.";
pub const NO_IMAGE_RETURNED: &str = "AI did not return an image. Please try a different prompt.";
pub const NO_VARIATION_RETURNED: &str = "AI did not return an image variation. Please try again.";
pub const NOTHING_TO_DOWNLOAD: &str = "No image available to download.";

const BILLING_MARKER: &str = "Billing account not found";
const API_DISABLED_MARKER: &str = "Vertex AI API has not been used";

const DOWNLOAD_PREFIX: &str = "visionary_ai_image";

/// The two flow-backed actions; used to phrase failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Generation,
    Variation,
}

impl FlowKind {
    fn label(self) -> &'static str {
        match self {
            FlowKind::Generation => "Image generation",
            FlowKind::Variation => "Image variation",
        }
    }
}

/// What the user can do from the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Generate,
    CreateVariation,
    Download,
}

impl Action {
    pub fn label(self) -> &'static str {
        match self {
            Action::Generate => "Generate Image",
            Action::CreateVariation => "Create Variation",
            Action::Download => "Download Image",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Submitting {
        prompt: String,
    },
    /// The base image stays on screen while its variation is produced.
    SubmittingVariation {
        base: DataUri,
        prompt: String,
    },
    Success {
        image: DataUri,
    },
    /// `image` is a prior result that is still valid and actionable.
    Error {
        message: String,
        image: Option<DataUri>,
    },
}

pub struct Session {
    id: Uuid,
    prompt: String,
    last_prompt: String,
    phase: Phase,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt: String::new(),
            last_prompt: String::new(),
            phase: Phase::Idle,
        }
    }

    /// Start from an image produced earlier, e.g. one saved by [`Session::download`].
    pub fn resume(image: DataUri, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        Self {
            last_prompt: prompt.clone(),
            prompt,
            phase: Phase::Success { image },
            ..Self::new()
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn last_prompt(&self) -> &str {
        &self.last_prompt
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self.phase,
            Phase::Submitting { .. } | Phase::SubmittingVariation { .. }
        )
    }

    /// The image currently on screen, if any.
    pub fn image(&self) -> Option<&DataUri> {
        match &self.phase {
            Phase::Success { image } => Some(image),
            Phase::SubmittingVariation { base, .. } => Some(base),
            Phase::Error { image, .. } => image.as_ref(),
            Phase::Idle | Phase::Submitting { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.phase {
            Phase::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn available_actions(&self) -> Vec<Action> {
        if self.is_busy() {
            return Vec::new();
        }

        let mut actions = Vec::new();
        if !self.prompt.trim().is_empty() {
            actions.push(Action::Generate);
        }
        if self.image().is_some() {
            actions.push(Action::CreateVariation);
            actions.push(Action::Download);
        }
        actions
    }

    /// Validate the prompt and enter `Submitting`.
    ///
    /// Returns `None` when no call should be made: either a blank prompt, which
    /// surfaces an error, or a call already in flight, which leaves the state
    /// untouched.
    pub fn begin_generate(&mut self) -> Option<ImageGenerationRequest> {
        if self.is_busy() {
            warn!(session = %self.id, "Generate ignored: a request is already in flight");
            return None;
        }

        let request = match ImageGenerationRequest::new(self.prompt.clone()) {
            Ok(request) => request,
            Err(_) => {
                let shown = self.image().cloned();
                self.fail(EMPTY_PROMPT.to_string(), shown);
                return None;
            }
        };

        self.phase = Phase::Submitting {
            prompt: request.prompt.clone(),
        };
        Some(request)
    }

    pub fn finish_generate(&mut self, outcome: Result<ImageGenerationResult>) {
        let Phase::Submitting { prompt } = &self.phase else {
            warn!(session = %self.id, "Generation outcome arrived with no generation in flight");
            return;
        };
        let prompt = prompt.clone();

        match outcome {
            Ok(ImageGenerationResult { image: Some(image) }) => {
                info!(
                    session = %self.id,
                    "Image generated ({})",
                    image.mime_type().unwrap_or("untyped")
                );
                self.last_prompt = prompt;
                self.phase = Phase::Success { image };
            }
            Ok(ImageGenerationResult { image: None }) => {
                self.fail(NO_IMAGE_RETURNED.to_string(), None);
            }
            Err(e) => {
                error!(session = %self.id, "Image generation failed: {}", e);
                self.fail(failure_message(FlowKind::Generation, &e), None);
            }
        }
    }

    /// Pick the variation prompt and enter `SubmittingVariation`.
    ///
    /// A blank prompt input falls back to the prompt last used successfully.
    pub fn begin_variation(&mut self) -> Option<ImageVariationRequest> {
        if self.is_busy() {
            warn!(session = %self.id, "Variation ignored: a request is already in flight");
            return None;
        }

        let Some(base) = self.image().cloned() else {
            self.fail(NO_BASE_IMAGE.to_string(), None);
            return None;
        };

        let trimmed = self.prompt.trim();
        let prompt = if trimmed.is_empty() {
            self.last_prompt.clone()
        } else {
            trimmed.to_string()
        };
        if prompt.trim().is_empty() {
            self.fail(EMPTY_VARIATION_PROMPT.to_string(), Some(base));
            return None;
        }

        let request = match ImageVariationRequest::new(base.clone(), prompt.clone()) {
            Ok(request) => request,
            Err(e) => {
                self.fail(failure_message(FlowKind::Variation, &e), Some(base));
                return None;
            }
        };

        self.phase = Phase::SubmittingVariation { base, prompt };
        Some(request)
    }

    pub fn finish_variation(&mut self, outcome: Result<ImageVariationResult>) {
        let Phase::SubmittingVariation { base, prompt } = &self.phase else {
            warn!(session = %self.id, "Variation outcome arrived with no variation in flight");
            return;
        };
        let (base, prompt) = (base.clone(), prompt.clone());

        match outcome {
            Ok(ImageVariationResult { image: Some(image) }) => {
                info!(
                    session = %self.id,
                    "Variation created ({})",
                    image.mime_type().unwrap_or("untyped")
                );
                self.last_prompt = prompt;
                self.phase = Phase::Success { image };
            }
            Ok(ImageVariationResult { image: None }) => {
                self.fail(NO_VARIATION_RETURNED.to_string(), Some(base));
            }
            Err(e) => {
                error!(session = %self.id, "Image variation failed: {}", e);
                self.fail(failure_message(FlowKind::Variation, &e), Some(base));
            }
        }
    }

    pub async fn generate(&mut self, flows: &dyn ImageFlowService) {
        if let Some(request) = self.begin_generate() {
            let outcome = flows.generate_image(&request).await;
            self.finish_generate(outcome);
        }
    }

    pub async fn create_variation(&mut self, flows: &dyn ImageFlowService) {
        if let Some(request) = self.begin_variation() {
            let outcome = flows.create_variation(&request).await;
            self.finish_variation(outcome);
        }
    }

    /// Save the image on screen into `dir` and return the written path.
    pub fn download(&self, dir: &Path) -> Result<PathBuf> {
        let image = match self.image() {
            Some(image) if !self.is_busy() => image,
            _ => return Err(Error::Session(NOTHING_TO_DOWNLOAD.to_string())),
        };

        let bytes = image.decode()?;
        fs::create_dir_all(dir)?;
        let name = download_filename(image, Utc::now().timestamp_millis());
        let path = write_new_file(dir, &name, &bytes)?;

        info!(session = %self.id, "Saved image to {}", path.display());
        Ok(path)
    }

    fn fail(&mut self, message: String, image: Option<DataUri>) {
        self.phase = Phase::Error { message, image };
    }
}

/// Phrase a flow error for display, softening known configuration failures.
pub fn failure_message(kind: FlowKind, err: &Error) -> String {
    let text = err.to_string();
    if text.contains(BILLING_MARKER) {
        format!(
            "{} failed: Billing account not found or not associated with the project. \
             Please check your Google Cloud project configuration.",
            kind.label()
        )
    } else if text.contains(API_DISABLED_MARKER) {
        format!(
            "{} failed: Vertex AI API is not enabled or has not been used in the project. \
             Please enable it and ensure it's set up correctly.",
            kind.label()
        )
    } else {
        text
    }
}

/// Write `bytes` under `name`, adding a `-N` suffix before the extension
/// instead of replacing an existing file.
fn write_new_file(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let (stem, ext) = name.rsplit_once('.').unwrap_or((name, ""));

    for attempt in 0u32.. {
        let candidate = match attempt {
            0 => name.to_string(),
            n if ext.is_empty() => format!("{}-{}", stem, n),
            n => format!("{}-{}.{}", stem, n, ext),
        };
        let path = dir.join(candidate);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(bytes)?;
                return Ok(path);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(Error::Session(format!("No free file name for {}", name)))
}

pub fn download_filename(image: &DataUri, timestamp_millis: i64) -> String {
    format!(
        "{}_{}.{}",
        DOWNLOAD_PREFIX,
        timestamp_millis,
        image.file_extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockImageFlowClient;
    use pretty_assertions::assert_eq;

    fn png() -> DataUri {
        DataUri::new("image/png", "iVBORw0KGgo=")
    }

    fn jpeg() -> DataUri {
        DataUri::new("image/jpeg", "/9j/4AAQ")
    }

    #[tokio::test]
    async fn test_generate_success_remembers_prompt() {
        let flows = MockImageFlowClient::new().with_image_response(png());
        let mut session = Session::new();
        session.set_prompt("a red bicycle");

        session.generate(&flows).await;

        assert_eq!(session.phase(), &Phase::Success { image: png() });
        assert_eq!(session.last_prompt(), "a red bicycle");
        assert_eq!(
            session.available_actions(),
            vec![Action::Generate, Action::CreateVariation, Action::Download]
        );
        assert_eq!(flows.generation_requests()[0].prompt, "a red bicycle");
    }

    #[tokio::test]
    async fn test_blank_prompt_never_calls_the_flow() {
        let flows = MockImageFlowClient::new();
        let mut session = Session::new();

        for prompt in ["", "   ", "\n\t"] {
            session.set_prompt(prompt);
            session.generate(&flows).await;
            assert_eq!(session.error_message(), Some(EMPTY_PROMPT));
        }
        assert_eq!(flows.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_prompt_keeps_prior_image() {
        let flows = MockImageFlowClient::new().with_image_response(png());
        let mut session = Session::new();
        session.set_prompt("a cat");
        session.generate(&flows).await;

        session.set_prompt(" ");
        session.generate(&flows).await;

        assert_eq!(session.error_message(), Some(EMPTY_PROMPT));
        assert_eq!(session.image(), Some(&png()));
    }

    #[tokio::test]
    async fn test_generate_without_image_reports_no_result() {
        let flows = MockImageFlowClient::new().with_no_image_response();
        let mut session = Session::new();
        session.set_prompt("a cat");

        session.generate(&flows).await;

        assert_eq!(
            session.phase(),
            &Phase::Error {
                message: NO_IMAGE_RETURNED.to_string(),
                image: None
            }
        );
        assert_eq!(session.last_prompt(), "");
    }

    #[tokio::test]
    async fn test_generate_failure_clears_previous_image() {
        let flows = MockImageFlowClient::new()
            .with_image_response(png())
            .with_failure("quota exceeded");
        let mut session = Session::new();
        session.set_prompt("a cat");
        session.generate(&flows).await;
        session.generate(&flows).await;

        assert_eq!(session.error_message(), Some("quota exceeded"));
        assert!(session.image().is_none());
        assert_eq!(session.available_actions(), vec![Action::Generate]);
    }

    #[tokio::test]
    async fn test_success_replaces_stale_error() {
        let flows = MockImageFlowClient::new()
            .with_failure("temporary outage")
            .with_image_response(png());
        let mut session = Session::new();
        session.set_prompt("a cat");

        session.generate(&flows).await;
        assert!(session.error_message().is_some());

        session.generate(&flows).await;
        assert!(session.error_message().is_none());
        assert_eq!(session.image(), Some(&png()));
    }

    #[test]
    fn test_failure_message_softens_known_configuration_errors() {
        let billing = Error::AiProvider(
            "Gemini API error (status 403 Forbidden): Billing account not found".to_string(),
        );
        assert!(failure_message(FlowKind::Generation, &billing)
            .starts_with("Image generation failed: Billing account not found or not associated"));

        let disabled = Error::AiProvider(
            "Vertex AI API has not been used in project 123 before or it is disabled".to_string(),
        );
        assert!(failure_message(FlowKind::Variation, &disabled)
            .starts_with("Image variation failed: Vertex AI API is not enabled"));

        let other = Error::AiProvider("Gemini API error (status 429): quota".to_string());
        assert_eq!(
            failure_message(FlowKind::Generation, &other),
            "Gemini API error (status 429): quota"
        );
    }

    #[tokio::test]
    async fn test_variation_requires_an_image() {
        let flows = MockImageFlowClient::new();
        let mut session = Session::new();
        session.set_prompt("make it blue");

        session.create_variation(&flows).await;

        assert_eq!(session.error_message(), Some(NO_BASE_IMAGE));
        assert_eq!(flows.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_variation_sends_prior_image_and_new_prompt() {
        let flows = MockImageFlowClient::new()
            .with_image_response(png())
            .with_image_response(jpeg());
        let mut session = Session::new();
        session.set_prompt("a red bicycle");
        session.generate(&flows).await;

        session.set_prompt("make it blue");
        session.create_variation(&flows).await;

        let sent = flows.variation_requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].base_image, png());
        assert_eq!(sent[0].prompt, "make it blue");
        assert_eq!(session.image(), Some(&jpeg()));
        assert_eq!(session.last_prompt(), "make it blue");
    }

    #[tokio::test]
    async fn test_variation_falls_back_to_last_prompt() {
        let flows = MockImageFlowClient::new();
        let mut session = Session::new();
        session.set_prompt("a lighthouse");
        session.generate(&flows).await;

        session.set_prompt("");
        session.create_variation(&flows).await;

        assert_eq!(flows.variation_requests()[0].prompt, "a lighthouse");
        assert!(matches!(session.phase(), Phase::Success { .. }));
    }

    #[tokio::test]
    async fn test_padded_variation_prompt_is_trimmed() {
        let flows = MockImageFlowClient::new();
        let mut session = Session::resume(png(), "a cat");

        session.set_prompt("  make it blue  ");
        session.create_variation(&flows).await;

        assert_eq!(flows.variation_requests()[0].prompt, "make it blue");
        assert_eq!(session.last_prompt(), "make it blue");

        session.set_prompt("   ");
        session.create_variation(&flows).await;
        assert_eq!(flows.variation_requests()[1].prompt, "make it blue");
    }

    #[tokio::test]
    async fn test_variation_without_any_prompt_is_refused() {
        let flows = MockImageFlowClient::new();
        let mut session = Session::resume(png(), "");

        session.create_variation(&flows).await;

        assert_eq!(session.error_message(), Some(EMPTY_VARIATION_PROMPT));
        assert_eq!(session.image(), Some(&png()));
        assert_eq!(flows.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_variation_failure_keeps_base_image() {
        let flows = MockImageFlowClient::new().with_no_image_response();
        let mut session = Session::resume(png(), "a cat");

        session.create_variation(&flows).await;

        assert_eq!(
            session.phase(),
            &Phase::Error {
                message: NO_VARIATION_RETURNED.to_string(),
                image: Some(png())
            }
        );
        assert_eq!(
            session.available_actions(),
            vec![Action::Generate, Action::CreateVariation, Action::Download]
        );
    }

    #[test]
    fn test_in_flight_request_blocks_further_actions() {
        let mut session = Session::resume(png(), "a cat");

        let request = session.begin_variation().unwrap();
        assert_eq!(request.prompt, "a cat");
        assert!(session.is_busy());
        assert!(session.available_actions().is_empty());
        assert!(session.begin_generate().is_none());
        assert!(session.begin_variation().is_none());
        assert!(session.download(Path::new("unused")).is_err());

        // The base image stays visible while the variation is pending.
        assert_eq!(session.image(), Some(&png()));

        session.finish_variation(Ok(ImageVariationResult {
            image: Some(jpeg()),
        }));
        assert_eq!(session.phase(), &Phase::Success { image: jpeg() });
    }

    #[test]
    fn test_stray_outcome_is_ignored() {
        let mut session = Session::new();
        session.finish_generate(Ok(ImageGenerationResult { image: Some(png()) }));
        assert_eq!(session.phase(), &Phase::Idle);
    }

    #[test]
    fn test_download_filename_extension() {
        assert_eq!(download_filename(&png(), 1700), "visionary_ai_image_1700.png");
        assert_eq!(download_filename(&jpeg(), 1700), "visionary_ai_image_1700.jpg");

        let untyped = DataUri::parse("data:;base64,AAAA").unwrap();
        assert!(download_filename(&untyped, 1).ends_with(".png"));
    }

    #[test]
    fn test_download_writes_decoded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let image = DataUri::from_bytes(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]);
        let session = Session::resume(image, "a cat");

        let path = session.download(dir.path()).unwrap();

        assert!(path.to_string_lossy().ends_with(".jpg"));
        assert_eq!(fs::read(&path).unwrap(), vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00]);
    }

    #[test]
    fn test_same_name_download_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("visionary_ai_image_5.png"), b"first").unwrap();

        let path = write_new_file(dir.path(), "visionary_ai_image_5.png", b"second").unwrap();

        assert_eq!(path, dir.path().join("visionary_ai_image_5-1.png"));
        assert_eq!(fs::read(dir.path().join("visionary_ai_image_5.png")).unwrap(), b"first");
        assert_eq!(fs::read(&path).unwrap(), b"second");
    }

    #[test]
    fn test_download_without_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Session::new().download(dir.path()).unwrap_err();
        assert_eq!(err.to_string(), NOTHING_TO_DOWNLOAD);
    }
}
