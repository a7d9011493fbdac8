//! Error handling

use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::{error, info};

use crate::web::views::IndexTemplate;

/// Errors raised while turning a prompt into an illustrated story.
#[derive(Debug)]
pub enum StoryError {
    /// The caller sent something unusable, eg an empty prompt
    BadRequest(String),
    /// The text-completion backend failed or returned garbage
    TextGeneration(String),
    /// The text-to-image backend failed or returned garbage
    ImageGeneration(String),
    /// A generated image could not be decoded
    ImageDecode(String),
    /// Compositing the two images failed
    Composite(String),
    /// Writing an image to disk failed
    Io(std::io::Error),
    /// When an internal server error occurs
    InternalServerError(String),
}

impl StoryError {
    /// HTTP status the error is rendered with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::TextGeneration(_) | Self::ImageGeneration(_) => StatusCode::BAD_GATEWAY,
            Self::ImageDecode(_)
            | Self::Composite(_)
            | Self::Io(_)
            | Self::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for StoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(message) => write!(f, "{message}"),
            Self::TextGeneration(message) => write!(f, "Text generation failed: {message}"),
            Self::ImageGeneration(message) => write!(f, "Image generation failed: {message}"),
            Self::ImageDecode(message) => write!(f, "Could not decode image: {message}"),
            Self::Composite(message) => write!(f, "Compositing failed: {message}"),
            Self::Io(err) => write!(f, "Failed to save image: {err}"),
            Self::InternalServerError(message) => write!(f, "Internal server error: {message}"),
        }
    }
}

impl std::error::Error for StoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoryError {
    fn from(err: std::io::Error) -> Self {
        StoryError::Io(err)
    }
}

impl From<image::ImageError> for StoryError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(err) => StoryError::Io(err),
            other => StoryError::ImageDecode(other.to_string()),
        }
    }
}

impl From<base64::DecodeError> for StoryError {
    fn from(err: base64::DecodeError) -> Self {
        StoryError::ImageDecode(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StoryError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoryError::InternalServerError(err.to_string())
    }
}

impl IntoResponse for StoryError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_client_error() {
            info!("Rejected request: {}", self);
        } else {
            error!("Generation failed: {}", self);
        }
        (status, IndexTemplate::failed(self.to_string())).into_response()
    }
}
