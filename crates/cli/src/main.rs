//! `dreamcanvas` -- command-line front end for the image studio.
//!
//! Drives the studio controllers against a running image service:
//! generate images, browse the gallery, like images, create variations
//! and run model retraining.
//!
//! # Environment variables
//!
//! | Variable                         | Default                     | Description                  |
//! |----------------------------------|-----------------------------|------------------------------|
//! | `DREAMCANVAS_API_URL`            | `http://localhost:5000/api` | Base URL of the service      |
//! | `DREAMCANVAS_PAGE_SIZE`          | `12`                        | Gallery page size            |
//! | `DREAMCANVAS_POLL_INTERVAL_SECS` | `5`                         | Training status poll cadence |
//! | `DREAMCANVAS_MAX_VARIATIONS`     | `8`                         | Max variations per request   |
//! | `RUST_LOG`                       | `dreamcanvas=info,...`      | Log filter                   |

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dreamcanvas_client::ClientConfig;

mod commands;
mod output;
mod studio;

use studio::Studio;

#[derive(Parser)]
#[command(
    name = "dreamcanvas",
    version,
    about = "Generate, browse and fine-tune anime-style images",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the image service
    #[arg(long, global = true, env = "DREAMCANVAS_API_URL")]
    api_url: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a single image
    Generate {
        /// Prompt text; a random example prompt is used when omitted
        prompt: Option<String>,

        /// Things to keep out of the image
        #[arg(short, long, default_value = "")]
        negative: String,

        /// Fixed seed for reproducible output
        #[arg(long, conflicts_with = "random_seed")]
        seed: Option<String>,

        /// Pick a random seed before generating
        #[arg(long)]
        random_seed: bool,

        #[arg(long)]
        steps: Option<u32>,

        #[arg(long)]
        guidance: Option<f64>,

        /// Directory to save the generated PNG into
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List gallery images
    Gallery {
        /// Number of pages to fetch
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        pages: u32,
    },

    /// Show one image
    Show { id: i64 },

    /// Like an image
    Like { id: i64 },

    /// Generate variations of an existing image
    Variations {
        id: i64,

        /// Prompt to use instead of the image's own
        #[arg(short, long)]
        prompt: Option<String>,

        /// How many variations to request
        #[arg(short, long)]
        count: Option<u32>,

        /// Directory to save the variation PNGs into
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Retrain the model on liked images and follow progress
    Retrain {
        #[arg(long, default_value_t = dreamcanvas_core::training::DEFAULT_LEARNING_RATE)]
        learning_rate: f64,

        #[arg(long, default_value_t = dreamcanvas_core::training::DEFAULT_NUM_EPOCHS)]
        epochs: u32,

        #[arg(long, default_value_t = dreamcanvas_core::training::DEFAULT_BATCH_SIZE)]
        batch_size: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = ClientConfig::from_env();
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }

    tracing::debug!(
        api_url = %config.api_url,
        page_size = config.page_size,
        poll_interval_secs = config.poll_interval.as_secs(),
        max_variations = config.max_variations,
        "Loaded configuration",
    );

    let studio = Studio::new(&config);

    match cli.command {
        Commands::Generate {
            prompt,
            negative,
            seed,
            random_seed,
            steps,
            guidance,
            out,
        } => {
            let args = commands::GenerateArgs {
                prompt,
                negative,
                seed,
                random_seed,
                steps,
                guidance,
                out,
            };
            commands::generate(&studio, args).await?
        }
        Commands::Gallery { pages } => commands::gallery(&studio, pages).await?,
        Commands::Show { id } => commands::show(&studio, id).await?,
        Commands::Like { id } => commands::like(&studio, id).await?,
        Commands::Variations {
            id,
            prompt,
            count,
            out,
        } => commands::variations(&studio, id, prompt, count, out).await?,
        Commands::Retrain {
            learning_rate,
            epochs,
            batch_size,
        } => {
            let params = dreamcanvas_core::training::Hyperparameters {
                learning_rate,
                num_epochs: epochs,
                batch_size,
            };
            commands::retrain(&studio, params).await?
        }
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dreamcanvas=info,dreamcanvas_studio=info,dreamcanvas_client=info".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}
