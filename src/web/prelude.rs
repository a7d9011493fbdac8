pub(crate) use crate::constants::HEALTH_MESSAGE;
pub(crate) use crate::error::StoryError;
pub(crate) use crate::pipeline::Generation;
pub(crate) use crate::web::AppState;
pub(crate) use askama::Template;
pub(crate) use askama_web::WebTemplate;
pub(crate) use axum::Json;
pub(crate) use axum::extract::{Form, State};
pub(crate) use serde::Deserialize;
pub(crate) use serde_json::{Value, json};
pub(crate) use tracing::instrument;
