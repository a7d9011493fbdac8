//! Deterministic backends for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use image::{DynamicImage, Rgba, RgbaImage};

use crate::error::StoryError;
use crate::imagegen::{ImageGenerator, ImagePayload};
use crate::llm::TextGenerator;

/// Answers story, character, background in that order; optionally fails the
/// n-th call (1-based).
#[derive(Default)]
pub(crate) struct ScriptedText {
    pub(crate) calls: Mutex<Vec<String>>,
    pub(crate) fail_on: Option<usize>,
}

#[async_trait]
impl TextGenerator for ScriptedText {
    async fn complete(&self, prompt: &str) -> Result<String, StoryError> {
        let mut calls = self
            .calls
            .lock()
            .map_err(|err| StoryError::InternalServerError(err.to_string()))?;
        calls.push(prompt.to_string());
        let n = calls.len();
        if self.fail_on == Some(n) {
            return Err(StoryError::TextGeneration("stub failure".to_string()));
        }
        Ok(match n {
            1 => "  THE STORY  ".to_string(),
            2 => "THE CHARACTER".to_string(),
            _ => "THE BACKGROUND".to_string(),
        })
    }
}

/// A red 200x200 character and a blue 400x400 background.
#[derive(Default)]
pub(crate) struct SolidImages {
    pub(crate) calls: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageGenerator for SolidImages {
    async fn generate_image(&self, prompt: &str) -> Result<ImagePayload, StoryError> {
        self.calls
            .lock()
            .map_err(|err| StoryError::InternalServerError(err.to_string()))?
            .push(prompt.to_string());
        let (size, colour) = if prompt.starts_with("Portrait") {
            (200, Rgba([255, 0, 0, 255]))
        } else {
            (400, Rgba([0, 0, 255, 255]))
        };
        Ok(ImagePayload::Decoded(DynamicImage::ImageRgba8(
            RgbaImage::from_pixel(size, size, colour),
        )))
    }
}
