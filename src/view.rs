//! Plain-text rendering of a [`Session`].

use crate::data_uri::DataUri;
use crate::session::{Phase, Session};
use std::fmt::Write as _;

pub const TITLE: &str = "Visionary AI";
pub const TAGLINE: &str = "Craft stunning visuals from your imagination.";

const GENERATING: &str = "Generating your masterpiece... This might take a moment.";
const CREATING_VARIATION: &str = "Creating variation...";

/// Render the current phase followed by the actions it allows.
///
/// Images are summarised by media type and payload size; the full data URI is
/// only printed on request since it is usually hundreds of kilobytes.
pub fn render(session: &Session) -> String {
    let mut out = String::new();

    match session.phase() {
        Phase::Idle => {
            let _ = writeln!(out, "Describe the image you want to create.");
        }
        Phase::Submitting { .. } => {
            let _ = writeln!(out, "{}", GENERATING);
        }
        Phase::SubmittingVariation { base, .. } => {
            let _ = writeln!(out, "{}", describe_image(base));
            let _ = writeln!(out, "{}", CREATING_VARIATION);
        }
        Phase::Success { image } => {
            let _ = writeln!(out, "{}", describe_image(image));
        }
        Phase::Error { message, image } => {
            let _ = writeln!(out, "Error: {}", message);
            if let Some(image) = image {
                let _ = writeln!(out, "{}", describe_image(image));
            }
        }
    }

    let actions = session.available_actions();
    if !actions.is_empty() {
        let labels: Vec<&str> = actions.iter().map(|a| a.label()).collect();
        let _ = writeln!(out, "[{}]", labels.join("] ["));
    }

    out
}

fn describe_image(image: &DataUri) -> String {
    format!(
        "Image ready: {} ({} base64 chars)",
        image.mime_type().unwrap_or("unknown type"),
        image.data().len()
    )
}
