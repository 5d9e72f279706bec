//! Terminal rendering and image file output.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use base64::Engine;

use dreamcanvas_core::image::{download_file_name, Image};
use dreamcanvas_core::seed::format_seed;
use dreamcanvas_core::training::{format_learning_rate, format_loss, Hyperparameters};
use dreamcanvas_studio::training::TrainingState;

const PROMPT_PREVIEW_CHARS: usize = 60;

/// Decode an image payload (data URL or bare base64) into raw bytes.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    if payload.starts_with("http://") || payload.starts_with("https://") {
        bail!("image is hosted remotely at {payload}, nothing to decode");
    }
    let encoded = match payload.strip_prefix("data:") {
        Some(rest) => match rest.split_once(";base64,") {
            Some((_, data)) => data,
            None => bail!("unsupported data URL, expected base64 encoding"),
        },
        None => payload,
    };
    base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .context("image payload is not valid base64")
}

/// Write a payload into `dir` under a timestamped file name.
///
/// `suffix` distinguishes several files saved in the same millisecond.
pub fn save_payload(dir: &Path, payload: &str, suffix: Option<usize>) -> Result<PathBuf> {
    let bytes = decode_payload(payload)?;
    let mut name = download_file_name(chrono::Utc::now().timestamp_millis());
    if let Some(suffix) = suffix {
        name = name.replacen(".png", &format!("-{suffix}.png"), 1);
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(name);
    std::fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Shorten a prompt to a single preview line.
pub fn preview(prompt: &str) -> String {
    let line = prompt.lines().next().unwrap_or_default();
    if line.chars().count() <= PROMPT_PREVIEW_CHARS && line.len() == prompt.len() {
        return line.to_string();
    }
    let cut: String = line.chars().take(PROMPT_PREVIEW_CHARS).collect();
    format!("{cut}...")
}

/// One gallery row.
pub fn image_row(image: &Image) -> String {
    let liked = if image.is_liked() { "*" } else { " " };
    let created = image
        .created_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".into());
    format!(
        "{liked} {:>6}  {:>10}  {created:<16}  {}",
        image.id,
        format_seed(image.seed),
        preview(&image.prompt)
    )
}

/// Multi-line detail view of one image.
pub fn image_details(image: &Image) -> String {
    let created = image
        .created_at
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "unknown".into());
    format!(
        "id:       {}\nprompt:   {}\nseed:     {}\ncreated:  {created}\nliked:    {}",
        image.id,
        image.prompt,
        image.seed.map_or_else(|| "random".to_string(), |s| s.to_string()),
        if image.is_liked() { "yes" } else { "no" },
    )
}

pub fn hyperparameters(params: &Hyperparameters) -> String {
    format!(
        "learning rate {}, {} epochs, batch size {}",
        format_learning_rate(params.learning_rate),
        params.num_epochs,
        params.batch_size
    )
}

/// Progress line for the retrain command.
pub fn training_line(state: &TrainingState) -> String {
    let progress = &state.progress;
    format!(
        "[{:?}] {:>5.1}%  epoch {}/{}  loss {}",
        state.status,
        progress.progress_percent,
        progress.current_epoch,
        progress.total_epochs,
        format_loss(progress.current_loss)
    )
}
