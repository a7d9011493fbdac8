//! Pastes the character portrait onto the background scene.

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use tracing::debug;

use crate::error::StoryError;

/// Resampling filter used to shrink the character.
const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// Where the character lands on the background, and how big it is there.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Placement {
    /// Left edge on the canvas
    pub x: u32,
    /// Top edge on the canvas
    pub y: u32,
    /// Width of the resized character
    pub width: u32,
    /// Height of the resized character
    pub height: u32,
}

impl Placement {
    /// Half the background's size, a quarter in from the top-left corner.
    pub fn for_background(width: u32, height: u32) -> Self {
        Self {
            x: width / 4,
            y: height / 4,
            width: width / 2,
            height: height / 2,
        }
    }
}

/// Composites `character` onto a copy of `background`.
///
/// The result always has the background's dimensions. The character's own
/// alpha channel is the blend mask, so transparent character pixels leave the
/// background visible.
pub fn composite(
    background: &DynamicImage,
    character: &DynamicImage,
) -> Result<RgbaImage, StoryError> {
    let mut canvas = background.to_rgba8();
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return Err(StoryError::Composite("background image is empty".to_string()));
    }
    let character = character.to_rgba8();
    if character.width() == 0 || character.height() == 0 {
        return Err(StoryError::Composite("character image is empty".to_string()));
    }

    let placement = Placement::for_background(width, height);
    debug!(
        ?placement,
        "Compositing {}x{} character onto {}x{} background",
        character.width(),
        character.height(),
        width,
        height
    );
    // a 1px wide or tall background leaves no room for the character
    if placement.width == 0 || placement.height == 0 {
        return Ok(canvas);
    }

    let resized = imageops::resize(&character, placement.width, placement.height, RESIZE_FILTER);
    imageops::overlay(
        &mut canvas,
        &resized,
        i64::from(placement.x),
        i64::from(placement.y),
    );
    Ok(canvas)
}
