use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use visionary_ai::app::{App, ImageJob, JobReport, JobStart};
use visionary_ai::quotes::QuoteBook;

#[derive(Debug, Parser)]
#[command(name = "visionary-ai")]
#[command(about = "Craft images from text prompts with Gemini")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate an image from a prompt, optionally followed by variations.
    Generate {
        prompt: String,
        /// Prompt for a variation of the previous image; repeatable.
        #[arg(long = "vary", value_name = "PROMPT")]
        variations: Vec<String>,
        /// Save the final image to the output directory.
        #[arg(long)]
        save: bool,
        /// Print the result as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },
    /// Create a variation of an image saved earlier.
    Vary {
        #[arg(long, value_name = "PATH")]
        image: PathBuf,
        prompt: String,
        #[arg(long)]
        save: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show a motivational quote.
    Quote {
        /// Only pick quotes containing this text (case-insensitive).
        #[arg(long, default_value = "")]
        search: String,
        /// Use the attributed quote list.
        #[arg(long, conflicts_with = "file")]
        featured: bool,
        /// Load quotes from a JSON file instead of the built-in list.
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
    /// Start an interactive session on stdin/stdout.
    Interactive,
}

fn print_report(report: &JobReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "Image ready: {} for prompt \"{}\"",
        report.image.mime_type().unwrap_or("unknown type"),
        report.prompt
    );
    if let Some(path) = &report.saved_to {
        println!("Saved to {}", path.display());
    }
    Ok(())
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Quote {
            search,
            featured,
            file,
        } => {
            let book = match (file, featured) {
                (Some(path), _) => QuoteBook::from_file(&path)?,
                (None, true) => QuoteBook::featured()?,
                (None, false) => QuoteBook::motivational()?,
            };
            println!("{}", book.pick_random(&search));
        }
        Command::Generate {
            prompt,
            variations,
            save,
            json,
        } => {
            let app = App::new()?;
            let report = app
                .run(ImageJob {
                    start: JobStart::Prompt(prompt),
                    variations,
                    save,
                })
                .await?;
            print_report(&report, json)?;
        }
        Command::Vary {
            image,
            prompt,
            save,
            json,
        } => {
            let app = App::new()?;
            let report = app
                .run(ImageJob {
                    start: JobStart::Image(App::load_image(&image)?),
                    variations: vec![prompt],
                    save,
                })
                .await?;
            print_report(&report, json)?;
        }
        Command::Interactive => {
            let app = App::new()?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            app.interactive(stdin, tokio::io::stdout()).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "visionary_ai=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    if let Err(e) = run(args.command).await {
        error!("{}", e);
        std::process::exit(1);
    }

    Ok(())
}
