//! Prompt enhancement and generation request shaping.
//!
//! Every generation goes out with a fixed anime style applied: a style
//! suffix on the prompt, a photo-realism exclusion prefix on the negative
//! prompt and a set of style parameters merged into the body. The
//! transformation is pure, so the same input always yields the same body.

use rand::seq::IndexedRandom;
use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Style constants
// ---------------------------------------------------------------------------

/// Appended to every user prompt.
pub const STYLE_SUFFIX: &str =
    ", anime style, cartoon art, detailed illustration, vibrant colors, Naruto-inspired";

/// Prepended to every negative prompt.
pub const NEGATIVE_STYLE_PREFIX: &str = "realistic, photorealistic, 3d render, photograph, ";

pub const DEFAULT_INFERENCE_STEPS: u32 = 50;
pub const DEFAULT_GUIDANCE_SCALE: f64 = 7.5;

/// Prompts offered to users who need a starting point.
pub const EXAMPLE_PROMPTS: &[&str] = &[
    "A serene mountain landscape at dawn with misty valleys and golden light",
    "A cyberpunk cityscape with neon lights and flying vehicles",
    "A magical forest with glowing mushrooms and fairy lights",
    "An underwater scene with coral reefs and tropical fish",
    "A futuristic laboratory with holographic displays and robots",
];

/// Pick one of [`EXAMPLE_PROMPTS`] at random.
pub fn random_example() -> &'static str {
    EXAMPLE_PROMPTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(EXAMPLE_PROMPTS[0])
}

// ---------------------------------------------------------------------------
// Style parameters
// ---------------------------------------------------------------------------

/// Style parameters merged into the top level of the generate body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleParams {
    pub style_preset: String,
    pub art_style: String,
    pub quality: String,
}

impl Default for StyleParams {
    fn default() -> Self {
        Self {
            style_preset: "anime".into(),
            art_style: "cartoon".into(),
            quality: "hd".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Raw user input for a single generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub negative_prompt: String,
    pub num_inference_steps: u32,
    pub guidance_scale: f64,
    /// `None` lets the server choose.
    pub seed: Option<i64>,
    pub style: StyleParams,
}

impl GenerationRequest {
    /// A request with default tuning for the given prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: String::new(),
            num_inference_steps: DEFAULT_INFERENCE_STEPS,
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            seed: None,
            style: StyleParams::default(),
        }
    }

    pub fn with_negative_prompt(mut self, negative: impl Into<String>) -> Self {
        self.negative_prompt = negative.into();
        self
    }

    pub fn with_seed(mut self, seed: Option<i64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.num_inference_steps = steps;
        self
    }

    pub fn with_guidance_scale(mut self, scale: f64) -> Self {
        self.guidance_scale = scale;
        self
    }

    /// Reject prompts that are empty after trimming.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_prompt(&self.prompt)
    }

    /// Build the wire body with the style transformation applied.
    pub fn enhanced(&self) -> EnhancedGeneration {
        EnhancedGeneration {
            prompt: enhance_prompt(&self.prompt),
            negative_prompt: enhance_negative_prompt(&self.negative_prompt),
            num_inference_steps: self.num_inference_steps,
            guidance_scale: self.guidance_scale,
            seed: self.seed,
            style: self.style.clone(),
        }
    }
}

/// Body of `POST /generate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancedGeneration {
    pub prompt: String,
    pub negative_prompt: String,
    pub num_inference_steps: u32,
    pub guidance_scale: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(flatten)]
    pub style: StyleParams,
}

pub fn enhance_prompt(prompt: &str) -> String {
    format!("{prompt}{STYLE_SUFFIX}")
}

pub fn enhance_negative_prompt(negative: &str) -> String {
    format!("{NEGATIVE_STYLE_PREFIX}{negative}")
}

pub fn validate_prompt(prompt: &str) -> Result<(), CoreError> {
    if prompt.trim().is_empty() {
        return Err(CoreError::Validation(
            "Please enter a text prompt to generate an image".into(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Variations
// ---------------------------------------------------------------------------

/// Number of variations requested when the caller does not say.
pub const DEFAULT_VARIATION_COUNT: u32 = 4;

/// Check a requested variation count against the configured ceiling.
pub fn validate_variation_count(count: u32, max: u32) -> Result<(), CoreError> {
    if count == 0 || count > max {
        return Err(CoreError::Validation(format!(
            "Variation count must be between 1 and {max}, got {count}"
        )));
    }
    Ok(())
}
