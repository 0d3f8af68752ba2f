use pretty_assertions::assert_eq;
use visionary_ai::{
    ai::{ImageFlowService, MockImageFlowClient},
    app::{App, AppServices, ImageJob, JobStart},
    data_uri::DataUri,
    models::{ImageGenerationRequest, ImageVariationRequest},
    quotes::{QuoteBook, QuoteSelection},
    session::{Action, Phase, Session},
    view, Error,
};
use std::fs;

const PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAIAAACQd1PeAAAADElEQVQImWP4z8AAAAMBAQDiJQC8AAAAAElFTkSuQmCC";

fn png() -> DataUri {
    DataUri::new("image/png", PNG_B64)
}

/// A red bicycle is generated, shown with follow-up actions, and downloaded as PNG.
#[tokio::test]
async fn test_red_bicycle_walkthrough() {
    let flows = MockImageFlowClient::new().with_image_response(png());
    let dir = tempfile::tempdir().unwrap();

    let mut session = Session::new();
    session.set_prompt("a red bicycle");
    session.generate(&flows).await;

    assert_eq!(session.phase(), &Phase::Success { image: png() });
    let actions = session.available_actions();
    assert!(actions.contains(&Action::CreateVariation));
    assert!(actions.contains(&Action::Download));

    let rendered = view::render(&session);
    assert!(rendered.contains("Create Variation"));
    assert!(rendered.contains("Download Image"));

    let path = session.download(dir.path()).unwrap();
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("visionary_ai_image_"));
    assert!(name.ends_with(".png"));
    assert_eq!(fs::read(&path).unwrap(), png().decode().unwrap());
}

#[tokio::test]
async fn test_flows_forward_requests_untouched() {
    let flows = MockImageFlowClient::new();

    let generation = ImageGenerationRequest::new("  moonlit harbour ").unwrap();
    let result = flows.generate_image(&generation).await.unwrap();
    assert!(result.image.is_some());

    let variation = ImageVariationRequest::new(png(), "at dawn").unwrap();
    flows.create_variation(&variation).await.unwrap();

    assert_eq!(flows.generation_requests(), vec![generation]);
    assert_eq!(flows.variation_requests(), vec![variation]);
}

#[tokio::test]
async fn test_absent_image_is_not_an_error_at_the_flow_level() {
    let flows = MockImageFlowClient::new().with_no_image_response();
    let request = ImageGenerationRequest::new("anything").unwrap();

    let result = flows.generate_image(&request).await.unwrap();
    assert!(result.image.is_none());
}

#[tokio::test]
async fn test_app_job_chain_through_public_api() {
    let dir = tempfile::tempdir().unwrap();
    let flows = MockImageFlowClient::new();
    let probe = flows.clone();

    let app = App::with_services(
        AppServices {
            flows: Box::new(flows),
            quotes: QuoteBook::featured().unwrap(),
        },
        dir.path().join("downloads"),
    );

    let report = app
        .run(ImageJob {
            start: JobStart::Prompt("a red bicycle".to_string()),
            variations: vec!["in the rain".to_string(), "at night".to_string()],
            save: true,
        })
        .await
        .unwrap();

    assert_eq!(report.prompt, "at night");
    assert!(report.saved_to.unwrap().starts_with(dir.path().join("downloads")));

    let prompts: Vec<String> = probe
        .variation_requests()
        .into_iter()
        .map(|r| r.prompt)
        .collect();
    assert_eq!(prompts, vec!["in the rain", "at night"]);

    assert_eq!(
        app.quote("YESTERDAY"),
        "\"Don't let yesterday take up too much of today.\" - Will Rogers"
    );
}

#[tokio::test]
async fn test_blank_prompt_job_fails_without_calling_service() {
    let dir = tempfile::tempdir().unwrap();
    let flows = MockImageFlowClient::new();
    let probe = flows.clone();
    let app = App::with_services(
        AppServices {
            flows: Box::new(flows),
            quotes: QuoteBook::motivational().unwrap(),
        },
        dir.path().to_path_buf(),
    );

    let err = app
        .run(ImageJob {
            start: JobStart::Prompt("   ".to_string()),
            variations: Vec::new(),
            save: false,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Session(_)));
    assert_eq!(err.to_string(), "Prompt cannot be empty.");
    assert_eq!(probe.get_call_count(), 0);
}

#[test]
fn test_quote_filter_matches_subset() {
    let book = QuoteBook::motivational().unwrap();

    for _ in 0..50 {
        match book.pick_random("dream") {
            QuoteSelection::Found(quote) => assert_eq!(quote.text, "Dream bigger. Do bigger."),
            QuoteSelection::NoResults => panic!("expected a match"),
        }
    }
    assert_eq!(book.pick_random("unicorn"), QuoteSelection::NoResults);
}
