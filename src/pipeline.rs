//! The prompt -> story -> images -> composite pipeline.

use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use crate::compositor;
use crate::error::StoryError;
use crate::imagegen::{ImageGenerator, ImagePayload};
use crate::llm::TextGenerator;
use crate::output::{OutputStore, new_request_id};
use crate::prompts;

/// Named stages, used when reporting which one failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
    /// First text call
    Story,
    /// Second text call
    CharacterDescription,
    /// Third text call
    BackgroundDescription,
    /// First image call
    CharacterImage,
    /// Second image call
    BackgroundImage,
    /// Decoding, compositing and saving
    Composite,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Story => "story generation",
            Self::CharacterDescription => "character description",
            Self::BackgroundDescription => "background description",
            Self::CharacterImage => "character image generation",
            Self::BackgroundImage => "background image generation",
            Self::Composite => "image compositing",
        };
        f.write_str(name)
    }
}

/// Everything a successful request produces.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Generation {
    /// Identifier the output files are namespaced by
    pub request_id: String,
    /// The caller's prompt, trimmed
    pub prompt: String,
    /// The generated story
    pub story: String,
    /// Description of the story's main character
    pub character_description: String,
    /// Description of the story's setting
    pub background_description: String,
    /// Where the composited image is served from
    pub merged_image_url: String,
    /// Width and height of the composited image
    pub merged_size: (u32, u32),
}

/// Runs the whole generation for one prompt.
pub struct Pipeline {
    text: Arc<dyn TextGenerator>,
    images: Arc<dyn ImageGenerator>,
    output: OutputStore,
    concurrent_images: bool,
}

fn logged<T>(step: Step, result: Result<T, StoryError>) -> Result<T, StoryError> {
    result.inspect_err(|err| error!("Step '{}' failed: {}", step, err))
}

impl Pipeline {
    /// Builds a pipeline over the given backends.
    pub fn new(
        text: Arc<dyn TextGenerator>,
        images: Arc<dyn ImageGenerator>,
        output: OutputStore,
    ) -> Self {
        Self {
            text,
            images,
            output,
            concurrent_images: false,
        }
    }

    /// Runs the two image calls at the same time rather than one after the other.
    pub fn with_concurrent_images(mut self, concurrent: bool) -> Self {
        self.concurrent_images = concurrent;
        self
    }

    /// Output layout this pipeline writes with
    pub fn output(&self) -> &OutputStore {
        &self.output
    }

    async fn complete(&self, step: Step, instruction: &str) -> Result<String, StoryError> {
        debug!("Running step '{}'", step);
        let text = logged(step, self.text.complete(instruction).await)?;
        Ok(text.trim().to_string())
    }

    async fn render(&self, step: Step, instruction: &str) -> Result<ImagePayload, StoryError> {
        debug!("Running step '{}'", step);
        logged(step, self.images.generate_image(instruction).await)
    }

    /// Runs every step for `prompt`. Any failure aborts the whole request.
    #[instrument(skip_all, fields(request_id = tracing::field::Empty))]
    pub async fn run(&self, prompt: &str) -> Result<Generation, StoryError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(StoryError::BadRequest("Prompt must not be empty".to_string()));
        }
        let request_id = new_request_id();
        tracing::Span::current().record("request_id", request_id.as_str());
        info!("Generating story for prompt {:?}", prompt);

        let story = self
            .complete(Step::Story, &prompts::story_prompt(prompt))
            .await?;
        let character_description = self
            .complete(
                Step::CharacterDescription,
                &prompts::character_description_prompt(&story),
            )
            .await?;
        let background_description = self
            .complete(
                Step::BackgroundDescription,
                &prompts::background_description_prompt(&story),
            )
            .await?;

        let character_prompt = prompts::character_image_prompt(&character_description);
        let background_prompt = prompts::background_image_prompt(&background_description);
        let (character, background) = if self.concurrent_images {
            tokio::try_join!(
                self.render(Step::CharacterImage, &character_prompt),
                self.render(Step::BackgroundImage, &background_prompt),
            )?
        } else {
            let character = self.render(Step::CharacterImage, &character_prompt).await?;
            let background = self.render(Step::BackgroundImage, &background_prompt).await?;
            (character, background)
        };

        let paths = self.output.paths_for(&request_id);
        let merged_image_url = paths.merged_url();
        let span = tracing::Span::current();
        let composited = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            let character = character.into_image()?;
            let background = background.into_image()?;
            let merged = compositor::composite(&background, &character)?;
            paths.save(&character, &background, &merged)?;
            Ok::<_, StoryError>(merged.dimensions())
        })
        .await;
        let merged_size = logged(
            Step::Composite,
            composited.map_err(StoryError::from).and_then(|result| result),
        )?;

        info!("Generation complete, merged image at {}", merged_image_url);
        Ok(Generation {
            request_id,
            prompt: prompt.to_string(),
            story,
            character_description,
            background_description,
            merged_image_url,
            merged_size,
        })
    }
}
