//! HTTP front end: the prompt form, the generate endpoint and health checks.

use std::num::NonZeroU16;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::constants::STATIC_URL_PREFIX;
use crate::pipeline::Pipeline;

mod prelude;
pub(crate) mod views;

use views::{generate_handler, health_handler, root_handler};

#[derive(Clone)]
pub(crate) struct AppState {
    pipeline: Arc<Pipeline>,
}

async fn styles_handler() -> impl IntoResponse {
    const STYLES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/styles.css"));
    ([(CONTENT_TYPE, "text/css")], STYLES)
}

/// Builds the application router, serving generated files from `static_dir`.
pub fn create_router(pipeline: Arc<Pipeline>, static_dir: &Path) -> Router {
    Router::new()
        .route("/", axum::routing::get(root_handler))
        .route("/generate", axum::routing::post(generate_handler))
        .route("/health", axum::routing::get(health_handler))
        .route("/assets/styles.css", axum::routing::get(styles_handler))
        .nest_service(STATIC_URL_PREFIX, ServeDir::new(static_dir))
        .with_state(AppState { pipeline })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        return;
    }
    info!("Shutdown signal received");
}

/// Binds the listener and serves until ctrl-c.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    pipeline: Pipeline,
) -> Result<(), anyhow::Error> {
    let static_dir = pipeline.output().static_dir().to_path_buf();
    tokio::fs::create_dir_all(&static_dir).await?;
    let app = create_router(Arc::new(pipeline), &static_dir);

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::output::{OutputLayout, OutputStore};
    use crate::testing::{ScriptedText, SolidImages};

    fn setup_app(text: ScriptedText, dir: &Path) -> Router {
        let pipeline = Pipeline::new(
            Arc::new(text),
            Arc::new(SolidImages::default()),
            OutputStore::new(dir, OutputLayout::Shared),
        );
        create_router(Arc::new(pipeline), dir)
    }

    async fn read_body(response: axum::response::Response) -> String {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        String::from_utf8_lossy(&bytes).to_string()
    }

    fn generate_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/generate")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn home_renders_form() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let app = setup_app(ScriptedText::default(), tmp.path());
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_body(response).await;
        assert!(body.contains("action=\"/generate\""));
        assert!(!body.contains("Something went wrong"));
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let app = setup_app(ScriptedText::default(), tmp.path());
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value =
            serde_json::from_str(&read_body(response).await).expect("json body");
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["message"], "Story Generator is running");
    }

    #[tokio::test]
    async fn generate_renders_story_and_serves_merged_image() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let app = setup_app(ScriptedText::default(), tmp.path());

        let response = app
            .clone()
            .oneshot(generate_request("prompt=a+lonely+lighthouse+keeper"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_body(response).await;
        assert!(body.contains("a lonely lighthouse keeper"));
        assert!(body.contains("THE STORY"));
        assert!(body.contains("THE CHARACTER"));
        assert!(body.contains("THE BACKGROUND"));
        assert!(body.contains("/static/merged.png"));

        let request = Request::builder()
            .uri("/static/merged.png")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "image/png");
    }

    #[tokio::test]
    async fn failure_renders_only_the_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let app = setup_app(
            ScriptedText {
                fail_on: Some(2),
                ..Default::default()
            },
            tmp.path(),
        );

        let response = app
            .oneshot(generate_request("prompt=a+lonely+lighthouse+keeper"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = read_body(response).await;
        assert!(body.contains("Something went wrong"));
        assert!(body.contains("stub failure"));
        assert!(!body.contains("THE STORY"));
        assert!(!tmp.path().join("merged.png").exists());
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let app = setup_app(ScriptedText::default(), tmp.path());

        let response = app.oneshot(generate_request("prompt=+++")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = read_body(response).await;
        assert!(body.contains("Prompt must not be empty"));
    }

    #[tokio::test]
    async fn styles_are_served() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let app = setup_app(ScriptedText::default(), tmp.path());
        let request = Request::builder()
            .uri("/assets/styles.css")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/css");
    }
}
