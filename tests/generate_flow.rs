use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header::CONTENT_TYPE};
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use storyforge::error::StoryError;
use storyforge::imagegen::{ImageGenerator, ImagePayload};
use storyforge::llm::TextGenerator;
use storyforge::output::{OutputLayout, OutputStore};
use storyforge::pipeline::Pipeline;
use storyforge::web::create_router;
use tower::ServiceExt;

/// Echoes which template it was asked for.
struct EchoText;

#[async_trait]
impl TextGenerator for EchoText {
    async fn complete(&self, prompt: &str) -> Result<String, StoryError> {
        if prompt.starts_with("Write a short story") {
            Ok("The keeper climbed the stairs every night.".to_string())
        } else if prompt.contains("character description") {
            Ok("A weathered old keeper with a grey beard.".to_string())
        } else {
            Ok("A storm-lashed rock at dusk.".to_string())
        }
    }
}

/// Returns PNG-encoded bytes, exercising the decode step.
#[derive(Default)]
struct PngImages {
    prompts: Mutex<Vec<String>>,
}

fn png(width: u32, height: u32, colour: Rgba<u8>) -> Vec<u8> {
    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, colour));
    let mut bytes = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}

#[async_trait]
impl ImageGenerator for PngImages {
    async fn generate_image(&self, prompt: &str) -> Result<ImagePayload, StoryError> {
        self.prompts
            .lock()
            .expect("lock prompts")
            .push(prompt.to_string());
        if prompt.starts_with("Portrait of a character") {
            Ok(ImagePayload::Encoded(png(200, 200, Rgba([200, 10, 10, 255]))))
        } else {
            Ok(ImagePayload::Encoded(png(400, 400, Rgba([10, 10, 200, 255]))))
        }
    }
}

#[tokio::test]
async fn lighthouse_keeper_round_trip() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let images = Arc::new(PngImages::default());
    let pipeline = Pipeline::new(
        Arc::new(EchoText),
        images.clone(),
        OutputStore::new(tmp.path(), OutputLayout::PerRequest),
    );
    let app = create_router(Arc::new(pipeline), tmp.path());

    let request = Request::builder()
        .method("POST")
        .uri("/generate")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("prompt=a+lonely+lighthouse+keeper"))
        .expect("build request");
    let response = app.clone().oneshot(request).await.expect("generate");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    let body = String::from_utf8_lossy(&body);
    assert!(body.contains("The keeper climbed the stairs every night."));
    assert!(body.contains("A weathered old keeper with a grey beard."));

    let prompts = images.prompts.lock().expect("lock prompts").clone();
    assert_eq!(
        prompts,
        vec![
            "Portrait of a character: A weathered old keeper with a grey beard.. High quality, detailed, artistic style.".to_string(),
            "Background scene: A storm-lashed rock at dusk.. High quality, detailed, artistic style, matches character.".to_string(),
        ]
    );

    let start = body.find("/static/generated/").expect("merged url in body");
    let url: String = body[start..]
        .chars()
        .take_while(|c| *c != '"')
        .collect();
    assert!(url.ends_with("/merged.png"));

    let request = Request::builder()
        .uri(url.as_str())
        .body(Body::empty())
        .expect("build request");
    let response = app.oneshot(request).await.expect("fetch merged");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect image")
        .to_bytes();
    let merged = image::load_from_memory(&bytes).expect("decode merged").to_rgba8();
    assert_eq!(merged.dimensions(), (400, 400));
    assert_eq!(*merged.get_pixel(100, 100), Rgba([200, 10, 10, 255]));
    assert_eq!(*merged.get_pixel(99, 99), Rgba([10, 10, 200, 255]));
    assert_eq!(*merged.get_pixel(300, 299), Rgba([10, 10, 200, 255]));
}
