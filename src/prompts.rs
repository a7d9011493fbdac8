//! Instruction templates sent to the text and image backends.

/// Asks the text model for the story.
pub fn story_prompt(prompt: &str) -> String {
    format!(
        "Write a short story (200-300 words) based on this prompt: {prompt}. Make it engaging and creative."
    )
}

/// Asks the text model to describe the story's character.
pub fn character_description_prompt(story: &str) -> String {
    format!(
        "Based on this story: {story}, create a detailed character description (100-150 words) including appearance, personality, and distinctive features."
    )
}

/// Asks the text model to describe the story's setting.
pub fn background_description_prompt(story: &str) -> String {
    format!(
        "Based on this story: {story}, create a detailed background/scene description (100-150 words) including environment, atmosphere, time period, and visual details."
    )
}

/// Image prompt for the character portrait.
pub fn character_image_prompt(character_description: &str) -> String {
    format!(
        "Portrait of a character: {character_description}. High quality, detailed, artistic style."
    )
}

/// Image prompt for the background scene.
pub fn background_image_prompt(background_description: &str) -> String {
    format!(
        "Background scene: {background_description}. High quality, detailed, artistic style, matches character."
    )
}
