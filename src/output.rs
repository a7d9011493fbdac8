//! Where generated images end up on disk and how they are addressed.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbaImage};
use rand::distr::{Alphanumeric, Distribution};
use tracing::{debug, error};

use crate::constants::{
    BACKGROUND_FILE, CHARACTER_FILE, GENERATED_SUBDIR, MERGED_FILE, REQUEST_ID_LENGTH,
    STATIC_URL_PREFIX,
};
use crate::error::StoryError;

/// How output files are laid out below the static directory.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutputLayout {
    /// Every request overwrites `character.png`, `background.png` and
    /// `merged.png` at the top of the static dir. Concurrent requests race.
    Shared,
    /// Each request writes below `generated/<request id>/`.
    PerRequest,
}

/// Generates a random request identifier.
pub fn new_request_id() -> String {
    Alphanumeric
        .sample_iter(rand::rng())
        .take(REQUEST_ID_LENGTH)
        .map(char::from)
        .collect()
}

/// Resolves output paths for requests.
#[derive(Clone, Debug)]
pub struct OutputStore {
    static_dir: PathBuf,
    layout: OutputLayout,
}

/// The three files one request writes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OutputPaths {
    dir: PathBuf,
    url_prefix: String,
}

impl OutputStore {
    /// Creates a store rooted at `static_dir`.
    pub fn new(static_dir: impl Into<PathBuf>, layout: OutputLayout) -> Self {
        Self {
            static_dir: static_dir.into(),
            layout,
        }
    }

    /// The directory served under `/static`
    pub fn static_dir(&self) -> &Path {
        &self.static_dir
    }

    /// The configured layout
    pub fn layout(&self) -> OutputLayout {
        self.layout
    }

    /// Paths for the request with the given identifier.
    pub fn paths_for(&self, request_id: &str) -> OutputPaths {
        match self.layout {
            OutputLayout::Shared => OutputPaths {
                dir: self.static_dir.clone(),
                url_prefix: STATIC_URL_PREFIX.to_string(),
            },
            OutputLayout::PerRequest => OutputPaths {
                dir: self.static_dir.join(GENERATED_SUBDIR).join(request_id),
                url_prefix: format!("{STATIC_URL_PREFIX}/{GENERATED_SUBDIR}/{request_id}"),
            },
        }
    }
}

impl OutputPaths {
    /// Directory holding all three files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The unmodified character image
    pub fn character(&self) -> PathBuf {
        self.dir.join(CHARACTER_FILE)
    }

    /// The unmodified background image
    pub fn background(&self) -> PathBuf {
        self.dir.join(BACKGROUND_FILE)
    }

    /// The composited image
    pub fn merged(&self) -> PathBuf {
        self.dir.join(MERGED_FILE)
    }

    /// URL the composited image is served from
    pub fn merged_url(&self) -> String {
        format!("{}/{}", self.url_prefix, MERGED_FILE)
    }

    /// Writes all three images as PNG, replacing anything already there.
    ///
    /// Blocking, run it off the async workers.
    pub fn save(
        &self,
        character: &DynamicImage,
        background: &DynamicImage,
        merged: &RgbaImage,
    ) -> Result<(), StoryError> {
        std::fs::create_dir_all(&self.dir).map_err(|err| {
            error!("Creating output dir {} failed: {}", self.dir.display(), err);
            StoryError::Io(err)
        })?;

        save_step("save character image", &self.character(), |path| {
            character.save_with_format(path, ImageFormat::Png)
        })?;
        save_step("save background image", &self.background(), |path| {
            background.save_with_format(path, ImageFormat::Png)
        })?;
        save_step("save merged image", &self.merged(), |path| {
            merged.save_with_format(path, ImageFormat::Png)
        })?;
        Ok(())
    }
}

fn save_step(
    step: &str,
    path: &Path,
    save: impl FnOnce(&Path) -> image::ImageResult<()>,
) -> Result<(), StoryError> {
    save(path).map_err(|err| {
        error!("{} failed for {}: {}", step, path.display(), err);
        StoryError::from(err)
    })?;
    debug!("{} wrote {}", step, path.display());
    Ok(())
}
