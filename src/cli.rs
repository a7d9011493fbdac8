//! CLI parser
use clap::Parser;
use std::num::NonZeroU16;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::constants::{
    DEFAULT_IMAGE_API_BASE, DEFAULT_IMAGE_MODEL, DEFAULT_OLLAMA_URL, DEFAULT_STATIC_DIR,
    DEFAULT_TEXT_MODEL,
};

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "STORYFORGE_DEBUG")]
    /// Enable debug logging. Env: STORYFORGE_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "8000", env = "STORYFORGE_PORT")]
    /// http listener, defaults to `8000`.
    /// Env: STORYFORGE_PORT
    pub port: NonZeroU16,
    #[clap(long, short, default_value = "0.0.0.0", env = "STORYFORGE_LISTEN_ADDRESS")]
    /// Listen address, defaults to `0.0.0.0`.
    /// Env: STORYFORGE_LISTEN_ADDRESS
    pub listen_address: String,
    #[clap(long, short, default_value = DEFAULT_STATIC_DIR, env = "STORYFORGE_STATIC_DIR")]
    /// Where generated images are written, served under `/static`.
    /// Env: STORYFORGE_STATIC_DIR
    pub static_dir: PathBuf,

    #[clap(long, env = "HF_TOKEN", hide_env_values = true)]
    /// Hugging Face API token, required. Env: HF_TOKEN
    pub hf_token: String,

    #[clap(long, default_value = DEFAULT_TEXT_MODEL, env = "STORYFORGE_TEXT_MODEL")]
    /// Ollama model used for the story and descriptions.
    /// Env: STORYFORGE_TEXT_MODEL
    pub text_model: String,
    #[clap(long, default_value = DEFAULT_OLLAMA_URL, env = "STORYFORGE_OLLAMA_URL")]
    /// Ollama base URL. Env: STORYFORGE_OLLAMA_URL
    pub ollama_url: Url,
    #[clap(long, default_value = DEFAULT_IMAGE_MODEL, env = "STORYFORGE_IMAGE_MODEL")]
    /// Text-to-image model. Env: STORYFORGE_IMAGE_MODEL
    pub image_model: String,
    #[clap(long, default_value = DEFAULT_IMAGE_API_BASE, env = "STORYFORGE_IMAGE_API_BASE")]
    /// Inference endpoint the image model id is appended to.
    /// Env: STORYFORGE_IMAGE_API_BASE
    pub image_api_base: Url,

    #[clap(long, env = "STORYFORGE_REQUEST_TIMEOUT_SECS")]
    /// Per-call timeout for backend requests, unset means wait forever.
    /// Env: STORYFORGE_REQUEST_TIMEOUT_SECS
    pub request_timeout_secs: Option<u64>,
    #[clap(long, env = "STORYFORGE_SHARED_OUTPUTS")]
    /// Write every request's images to the same three files instead of a
    /// per-request directory. Env: STORYFORGE_SHARED_OUTPUTS
    pub shared_outputs: bool,
    #[clap(long, env = "STORYFORGE_CONCURRENT_IMAGES")]
    /// Generate the character and background images concurrently.
    /// Env: STORYFORGE_CONCURRENT_IMAGES
    pub concurrent_images: bool,
}

impl CliOptions {
    /// The backend timeout, if one was configured
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
