//! Shared constants/setters for things
//!

/// The default place generated images are written to and served from
pub const DEFAULT_STATIC_DIR: &str = "./static";

/// URL prefix the static directory is mounted at
pub const STATIC_URL_PREFIX: &str = "/static";

/// Subdirectory of the static dir holding per-request outputs
pub const GENERATED_SUBDIR: &str = "generated";

/// File name of the character image
pub const CHARACTER_FILE: &str = "character.png";

/// File name of the background image
pub const BACKGROUND_FILE: &str = "background.png";

/// File name of the composited image
pub const MERGED_FILE: &str = "merged.png";

/// Length of the random per-request identifier
pub const REQUEST_ID_LENGTH: usize = 16;

/// Default Ollama base URL.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default text model served by Ollama.
pub const DEFAULT_TEXT_MODEL: &str = "llama3.2:1b";

/// Default Hugging Face inference endpoint, the model id is appended.
pub const DEFAULT_IMAGE_API_BASE: &str = "https://router.huggingface.co/hf-inference/models";

/// Default text-to-image model.
pub const DEFAULT_IMAGE_MODEL: &str = "black-forest-labs/FLUX.1-dev";

/// Message returned by the health endpoint
pub const HEALTH_MESSAGE: &str = "Story Generator is running";
