use super::prelude::*;

#[derive(Deserialize)]
pub(crate) struct GenerateForm {
    prompt: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub(crate) struct IndexTemplate {
    pub(crate) result: Option<Generation>,
    pub(crate) error: Option<String>,
}

impl IndexTemplate {
    pub(crate) fn empty() -> Self {
        Self {
            result: None,
            error: None,
        }
    }

    pub(crate) fn failed(message: String) -> Self {
        Self {
            result: None,
            error: Some(message),
        }
    }
}

impl From<Generation> for IndexTemplate {
    fn from(generation: Generation) -> Self {
        Self {
            result: Some(generation),
            error: None,
        }
    }
}

/// handles the / GET
pub(crate) async fn root_handler() -> IndexTemplate {
    IndexTemplate::empty()
}

/// handles the /generate POST, any failure replaces the whole result
#[instrument(skip_all)]
pub(crate) async fn generate_handler(
    State(state): State<AppState>,
    Form(form): Form<GenerateForm>,
) -> Result<IndexTemplate, StoryError> {
    let generation = state.pipeline.run(&form.prompt).await?;
    Ok(IndexTemplate::from(generation))
}

pub(crate) async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": HEALTH_MESSAGE,
    }))
}
