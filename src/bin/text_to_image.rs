use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use storyforge::config::{load_dotenv, setup_logging};
use storyforge::constants::{DEFAULT_IMAGE_API_BASE, DEFAULT_IMAGE_MODEL};
use storyforge::imagegen::{HuggingFaceClient, ImageGenerator};
use url::Url;

/// Render a single image from a text prompt.
///
/// Minimal UX:
///   text_to_image "Astronaut riding a horse"
#[derive(Parser, Debug)]
#[command(name = "text_to_image")]
#[command(about = "Generate one image from a prompt with the configured text-to-image model")]
struct Args {
    /// What to draw
    #[arg(default_value = "Astronaut riding a horse")]
    prompt: String,

    /// Hugging Face API token
    #[arg(required = true, long, env = "HF_TOKEN", hide_env_values = true)]
    hf_token: String,

    /// Image model
    #[arg(long, default_value = DEFAULT_IMAGE_MODEL, env = "STORYFORGE_IMAGE_MODEL")]
    image_model: String,

    /// Inference endpoint the model id is appended to
    #[arg(long, default_value = DEFAULT_IMAGE_API_BASE, env = "STORYFORGE_IMAGE_API_BASE")]
    image_api_base: Url,

    /// Where to write the PNG
    #[arg(long, short, default_value = "astronaut.png")]
    out: PathBuf,

    /// Replace the output file if it already exists
    #[arg(long)]
    overwrite: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let args = Args::parse();
    setup_logging(args.debug).map_err(|err| anyhow!("Failed to set up logging: {err}"))?;

    if args.out.exists() && !args.overwrite {
        return Err(anyhow!(
            "Image already exists: {} (pass --overwrite to replace it)",
            args.out.display()
        ));
    }
    if let Some(parent) = args.out.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let client = HuggingFaceClient::new(&args.image_api_base, &args.image_model, &args.hf_token, None)
        .context("Failed to build image client")?;
    let image = client
        .generate_image(&args.prompt)
        .await
        .context("Image generation failed")?
        .into_image()
        .context("Failed to decode generated image")?;

    image
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;

    eprintln!(
        "Saved: {} ({}x{})",
        args.out.display(),
        image.width(),
        image.height()
    );
    Ok(())
}
