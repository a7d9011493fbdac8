//! Text-to-image backend.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose;
use image::DynamicImage;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::StoryError;

/// What an image backend hands back: either still-encoded bytes or an image
/// that has already been decoded.
#[derive(Clone, Debug)]
pub enum ImagePayload {
    /// PNG/JPEG/WebP bytes straight off the wire
    Encoded(Vec<u8>),
    /// A decoded raster
    Decoded(DynamicImage),
}

impl ImagePayload {
    /// The one place payloads become images.
    pub fn into_image(self) -> Result<DynamicImage, StoryError> {
        match self {
            Self::Decoded(image) => Ok(image),
            Self::Encoded(bytes) => {
                if bytes.is_empty() {
                    return Err(StoryError::ImageDecode("empty image payload".to_string()));
                }
                let reader = image::ImageReader::new(Cursor::new(bytes))
                    .with_guessed_format()
                    .map_err(|err| {
                        debug!("Failed to guess image format: {}", err);
                        StoryError::ImageDecode(err.to_string())
                    })?;
                debug!("Decoding generated image as {:?}", reader.format());
                Ok(reader.decode()?)
            }
        }
    }
}

/// Something that renders an instruction into an image.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generates one image for `prompt`.
    async fn generate_image(&self, prompt: &str) -> Result<ImagePayload, StoryError>;
}

/// Hugging Face inference client for text-to-image models.
#[derive(Clone, Debug)]
pub struct HuggingFaceClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    model: String,
}

#[derive(Serialize, Debug)]
struct TextToImageRequest<'a> {
    inputs: &'a str,
}

/// JSON bodies some providers answer with instead of raw bytes.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum JsonImageResponse {
    Many(Vec<JsonImage>),
    One(JsonImage),
}

#[derive(Deserialize, Debug)]
struct JsonImage {
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: Vec<JsonImage>,
}

impl JsonImageResponse {
    fn into_items(self) -> Vec<JsonImage> {
        let top = match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        };
        let mut items = Vec::with_capacity(top.len());
        for mut item in top {
            let nested = std::mem::take(&mut item.data);
            items.push(item);
            items.extend(nested);
        }
        items
    }
}

/// Strips a `data:image/png;base64,` style prefix if present.
fn strip_data_url(encoded: &str) -> &str {
    match encoded.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded,
    }
}

impl HuggingFaceClient {
    /// Builds a client for `model` served below `api_base`.
    pub fn new(
        api_base: &Url,
        model: &str,
        token: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, StoryError> {
        if token.trim().is_empty() {
            return Err(StoryError::InternalServerError(
                "Hugging Face token is empty".to_string(),
            ));
        }
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| StoryError::InternalServerError(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/{}", api_base.as_str().trim_end_matches('/'), model),
            token: token.to_string(),
            model: model.to_string(),
        })
    }

    /// The model images are requested from
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, StoryError> {
        let resp = self.client.get(url).send().await.map_err(|err| {
            StoryError::ImageGeneration(format!("failed to download image URL: {err}"))
        })?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|err| {
            StoryError::ImageGeneration(format!("failed to read downloaded image: {err}"))
        })?;
        if !status.is_success() {
            return Err(StoryError::ImageGeneration(format!(
                "image download returned {status}"
            )));
        }
        Ok(bytes.to_vec())
    }

    async fn payload_from_json(&self, bytes: &[u8]) -> Result<ImagePayload, StoryError> {
        let parsed: JsonImageResponse = serde_json::from_slice(bytes).map_err(|err| {
            StoryError::ImageGeneration(format!("failed to parse image response JSON: {err}"))
        })?;
        let items = parsed.into_items();
        if let Some(err) = items.iter().find_map(|item| item.error.as_deref()) {
            return Err(StoryError::ImageGeneration(err.to_string()));
        }
        if let Some(encoded) = items
            .iter()
            .find_map(|item| item.b64_json.as_deref().or(item.image.as_deref()))
        {
            let bytes = general_purpose::STANDARD.decode(strip_data_url(encoded).trim())?;
            return Ok(ImagePayload::Encoded(bytes));
        }
        if let Some(url) = items.iter().find_map(|item| item.url.as_deref()) {
            return Ok(ImagePayload::Encoded(self.download(url).await?));
        }
        Err(StoryError::ImageGeneration(
            "image response had no image data".to_string(),
        ))
    }
}

#[async_trait]
impl ImageGenerator for HuggingFaceClient {
    async fn generate_image(&self, prompt: &str) -> Result<ImagePayload, StoryError> {
        debug!(model = %self.model, chars = prompt.len(), "Requesting image");
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&TextToImageRequest { inputs: prompt })
            .send()
            .await
            .map_err(|err| {
                StoryError::ImageGeneration(format!("request to image backend failed: {err}"))
            })?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let bytes = resp.bytes().await.map_err(|err| {
            StoryError::ImageGeneration(format!("failed reading image response: {err}"))
        })?;
        if !status.is_success() {
            return Err(StoryError::ImageGeneration(format!(
                "image backend returned {status}: {}",
                String::from_utf8_lossy(&bytes)
            )));
        }
        debug!(content_type = %content_type, bytes = bytes.len(), "Image response received");

        if content_type.starts_with("application/json") {
            self.payload_from_json(&bytes).await
        } else {
            Ok(ImagePayload::Encoded(bytes.to_vec()))
        }
    }
}
