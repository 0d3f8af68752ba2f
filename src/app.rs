//! Application orchestration for one-shot image jobs and interactive sessions.

use crate::ai::{GeminiImageClient, ImageFlowService};
use crate::data_uri::DataUri;
use crate::models::Config;
use crate::quotes::QuoteBook;
use crate::session::Session;
use crate::view;
use crate::{Error, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::info;

const HELP: &str = "\
Type a prompt and press enter to generate an image.
  :vary [prompt]   create a variation (blank reuses the last prompt)
  :save            save the current image to the output directory
  :quote [search]  show a motivational quote
  :help            show this help
  :quit            leave
";

/// Where a job's session starts.
#[derive(Debug, Clone)]
pub enum JobStart {
    /// Generate a fresh image from this prompt.
    Prompt(String),
    /// Reuse an image produced earlier.
    Image(DataUri),
}

/// A scripted run: one starting point, zero or more variations, optional save.
#[derive(Debug, Clone)]
pub struct ImageJob {
    pub start: JobStart,
    pub variations: Vec<String>,
    pub save: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReport {
    #[serde(rename = "imageDataUri")]
    pub image: DataUri,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_to: Option<PathBuf>,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub flows: Box<dyn ImageFlowService>,
    pub quotes: QuoteBook,
}

/// Coordinates image flows, sessions and downloads.
pub struct App {
    flows: Box<dyn ImageFlowService>,
    quotes: QuoteBook,
    output_dir: PathBuf,
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Generate(&'a str),
    Vary(&'a str),
    Save,
    Quote(&'a str),
    Help,
    Quit,
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let Some(rest) = line.strip_prefix(':') else {
            return Command::Generate(line);
        };

        let (name, arg) = rest.split_once(' ').unwrap_or((rest, ""));
        let arg = arg.trim();
        match name {
            "vary" | "v" => Command::Vary(arg),
            "save" | "s" => Command::Save,
            "quote" => Command::Quote(arg),
            "help" | "h" => Command::Help,
            "quit" | "q" => Command::Quit,
            _ => Command::Unknown(name),
        }
    }
}

impl App {
    /// Build an app from concrete service dependencies.
    ///
    /// This is primarily useful for integration tests and local harnesses that
    /// need to inject mocks.
    pub fn with_services(services: AppServices, output_dir: PathBuf) -> Self {
        Self {
            flows: services.flows,
            quotes: services.quotes,
            output_dir,
        }
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub fn new() -> Result<Self> {
        let config = Config::from_env()?;

        info!(
            "Image provider: Gemini (output directory: {})",
            config.output_dir.display()
        );

        Ok(Self::with_services(
            AppServices {
                flows: Box::new(GeminiImageClient::new(config.gemini_api_key)),
                quotes: QuoteBook::motivational()?,
            },
            config.output_dir,
        ))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Read an image file into a data URI, sniffing its media type.
    pub fn load_image(path: &Path) -> Result<DataUri> {
        let bytes = fs::read(path)?;
        if bytes.is_empty() {
            return Err(Error::InvalidDataUri(format!(
                "{} is empty",
                path.display()
            )));
        }
        Ok(DataUri::from_bytes(&bytes))
    }

    /// Run a job to completion, stopping at the first failed step.
    pub async fn run(&self, job: ImageJob) -> Result<JobReport> {
        let mut session = match job.start {
            JobStart::Prompt(prompt) => {
                let mut session = Session::new();
                session.set_prompt(prompt);
                info!(session = %session.id(), "Generating image");
                session.generate(self.flows.as_ref()).await;
                Self::check(&session)?;
                session
            }
            JobStart::Image(image) => Session::resume(image, ""),
        };

        for (index, prompt) in job.variations.iter().enumerate() {
            info!(
                session = %session.id(),
                "Creating variation {}/{}",
                index + 1,
                job.variations.len()
            );
            session.set_prompt(prompt.as_str());
            session.create_variation(self.flows.as_ref()).await;
            Self::check(&session)?;
        }

        let image = session
            .image()
            .cloned()
            .ok_or_else(|| Error::Session("No image was produced.".to_string()))?;

        let saved_to = if job.save {
            Some(session.download(&self.output_dir)?)
        } else {
            None
        };

        Ok(JobReport {
            image,
            prompt: session.last_prompt().to_string(),
            saved_to,
        })
    }

    fn check(session: &Session) -> Result<()> {
        match session.error_message() {
            Some(message) => Err(Error::Session(message.to_string())),
            None => Ok(()),
        }
    }

    /// Pick a quote from the app's quote book.
    pub fn quote(&self, search: &str) -> String {
        self.quotes.pick_random(search).to_string()
    }

    /// Drive one session from line-oriented input until `:quit` or EOF.
    pub async fn interactive<R, W>(&self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut session = Session::new();
        let mut lines = input.lines();

        let banner = format!("{}\n{}\n\n{}", view::TITLE, view::TAGLINE, HELP);
        output.write_all(banner.as_bytes()).await?;
        output.flush().await?;

        while let Some(line) = lines.next_line().await? {
            match Command::parse(line.trim()) {
                Command::Quit => break,
                Command::Help => output.write_all(HELP.as_bytes()).await?,
                Command::Quote(search) => {
                    output
                        .write_all(format!("{}\n", self.quote(search)).as_bytes())
                        .await?;
                }
                Command::Save => {
                    let message = match session.download(&self.output_dir) {
                        Ok(path) => format!("Saved to {}\n", path.display()),
                        Err(e) => format!("Error: {}\n", e),
                    };
                    output.write_all(message.as_bytes()).await?;
                }
                Command::Unknown(name) => {
                    output
                        .write_all(format!("Unknown command `:{}`. Try :help\n", name).as_bytes())
                        .await?;
                }
                Command::Generate(prompt) => {
                    session.set_prompt(prompt);
                    if let Some(request) = session.begin_generate() {
                        output.write_all(view::render(&session).as_bytes()).await?;
                        output.flush().await?;
                        let outcome = self.flows.generate_image(&request).await;
                        session.finish_generate(outcome);
                    }
                    output.write_all(view::render(&session).as_bytes()).await?;
                }
                Command::Vary(prompt) => {
                    session.set_prompt(prompt);
                    if let Some(request) = session.begin_variation() {
                        output.write_all(view::render(&session).as_bytes()).await?;
                        output.flush().await?;
                        let outcome = self.flows.create_variation(&request).await;
                        session.finish_variation(outcome);
                    }
                    output.write_all(view::render(&session).as_bytes()).await?;
                }
            }
            output.flush().await?;
        }

        Ok(())
    }
}
