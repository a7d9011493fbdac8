use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use storyforge::config::{load_dotenv, setup_logging};
use storyforge::imagegen::HuggingFaceClient;
use storyforge::llm::OllamaClient;
use storyforge::output::{OutputLayout, OutputStore};
use storyforge::pipeline::Pipeline;
use tracing::{error, info};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    load_dotenv();
    let cli = storyforge::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return ExitCode::FAILURE;
    }

    let timeout = cli.request_timeout();
    if timeout.is_none() {
        info!("No backend timeout configured, requests wait until the backend answers");
    }

    let text = match OllamaClient::new(&cli.ollama_url, &cli.text_model, timeout) {
        Ok(client) => client,
        Err(err) => {
            error!("Failed to build text client: {}", err);
            return ExitCode::FAILURE;
        }
    };
    let images =
        match HuggingFaceClient::new(&cli.image_api_base, &cli.image_model, &cli.hf_token, timeout)
        {
            Ok(client) => client,
            Err(err) => {
                error!("Failed to build image client: {}", err);
                return ExitCode::FAILURE;
            }
        };
    info!(
        "Text model {} at {}, image model {}",
        text.model(),
        cli.ollama_url,
        images.model()
    );

    let layout = if cli.shared_outputs {
        OutputLayout::Shared
    } else {
        OutputLayout::PerRequest
    };
    let pipeline = Pipeline::new(
        Arc::new(text),
        Arc::new(images),
        OutputStore::new(cli.static_dir.clone(), layout),
    )
    .with_concurrent_images(cli.concurrent_images);

    if let Err(err) = storyforge::web::setup_server(&cli.listen_address, cli.port, pipeline).await {
        error!("Application error: {}", err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
