use std::path::PathBuf;

use anyhow::{bail, Result};

use dreamcanvas_core::prompt::{random_example, GenerationRequest};
use dreamcanvas_core::training::{Hyperparameters, TrainingStatus};
use dreamcanvas_core::types::DbId;

use crate::output;
use crate::studio::Studio;

pub struct GenerateArgs {
    pub prompt: Option<String>,
    pub negative: String,
    pub seed: Option<String>,
    pub random_seed: bool,
    pub steps: Option<u32>,
    pub guidance: Option<f64>,
    pub out: Option<PathBuf>,
}

pub async fn generate(studio: &Studio, args: GenerateArgs) -> Result<()> {
    let generation = &studio.generation;

    let prompt = match args.prompt {
        Some(prompt) => prompt,
        None => {
            let example = random_example();
            println!("Using example prompt: {example}");
            example.to_string()
        }
    };

    if args.random_seed {
        generation.randomize_seed();
    } else if let Some(seed) = args.seed {
        generation.set_seed(seed);
    }
    let seed = generation.seed_from_field()?;

    let mut request = GenerationRequest::new(prompt)
        .with_negative_prompt(args.negative)
        .with_seed(seed);
    if let Some(steps) = args.steps {
        request = request.with_steps(steps);
    }
    if let Some(scale) = args.guidance {
        request = request.with_guidance_scale(scale);
    }

    let image = generation.generate(request).await?;
    println!("Generated image {} with seed {}", image.id, image.seed);

    if let Some(dir) = args.out {
        let path = output::save_payload(&dir, &image.image, None)?;
        println!("Saved {}", path.display());
    }
    Ok(())
}

pub async fn gallery(studio: &Studio, pages: u32) -> Result<()> {
    studio.gallery.refresh().await?;
    let mut fetched = 1;
    while fetched < pages {
        match studio.gallery.next_page().await? {
            Some(_) => fetched += 1,
            None => break,
        }
    }

    let state = studio.gallery.state();
    if state.items.is_empty() {
        println!("No images yet.");
        return Ok(());
    }
    for image in &state.items {
        println!("{}", output::image_row(image));
    }
    if state.has_more {
        println!("More images available, rerun with --pages {}", fetched + 1);
    }
    Ok(())
}

pub async fn show(studio: &Studio, id: DbId) -> Result<()> {
    let image = studio.detail.load(id).await?;
    println!("{}", output::image_details(&image));
    Ok(())
}

pub async fn like(studio: &Studio, id: DbId) -> Result<()> {
    studio.detail.load(id).await?;
    let image = studio.detail.like().await?;
    println!("Liked image {} (feedback {})", image.id, image.feedback_score);
    Ok(())
}

pub async fn variations(
    studio: &Studio,
    id: DbId,
    prompt: Option<String>,
    count: Option<u32>,
    out: Option<PathBuf>,
) -> Result<()> {
    let image = studio.detail.load(id).await?;
    if let Some(prompt) = prompt {
        studio.detail.set_variation_prompt(prompt);
    }

    let items = match count {
        None => studio.detail.generate_variations().await?,
        Some(count) => {
            let prompt = studio.detail.state().variation_prompt;
            studio
                .generation
                .generate_variations(&image, Some(prompt.as_str()), Some(count))
                .await?
        }
    };

    for (index, item) in items.iter().enumerate() {
        println!("{:>6}  {}", item.id, output::preview(&item.prompt));
        if let Some(dir) = &out {
            let path = output::save_payload(dir, &item.image, Some(index + 1))?;
            println!("        saved {}", path.display());
        }
    }
    Ok(())
}

/// Start a run and follow it until it finishes. Ctrl-C stops following
/// but leaves the server-side job running.
pub async fn retrain(studio: &Studio, params: Hyperparameters) -> Result<()> {
    println!("Starting retraining: {}", output::hyperparameters(&params));

    let mut updates = studio.training.subscribe();
    studio.training.start(params).await?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let final_state = loop {
        let state = updates.borrow_and_update().clone();
        println!("{}", output::training_line(&state));
        if state.status.is_terminal() {
            break state;
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    bail!("training monitor closed unexpectedly");
                }
            }
            _ = &mut ctrl_c => {
                studio.training.teardown();
                println!("Stopped following; the job keeps running on the server.");
                return Ok(());
            }
        }
    };

    match final_state.status {
        TrainingStatus::Completed => {
            println!("Training complete.");
            Ok(())
        }
        _ => bail!(
            "training failed: {}",
            final_state.error.as_deref().unwrap_or("unknown error")
        ),
    }
}
