//! HTTP surface: the suggestion proxy and a server side render endpoint.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::json;

use crate::error::{RenderError, SuggestError};
use crate::render::config::{Logo, RenderConfig};
use crate::render::{self, DOWNLOAD_FILE_NAME};
use crate::suggest::upstream::Upstream;

#[derive(Clone)]
pub struct AppState {
    upstream: Arc<Upstream>,
}

impl AppState {
    pub fn new(upstream: Upstream) -> Self {
        AppState {
            upstream: Arc::new(upstream),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/ai", post(suggest))
        .route("/api/qr", post(render_qr))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

#[derive(Debug, Deserialize)]
struct SuggestBody {
    #[serde(default)]
    prompt: Option<String>,
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn suggest(
    State(state): State<AppState>,
    body: Result<Json<SuggestBody>, JsonRejection>,
) -> Response {
    let prompt = match body {
        Ok(Json(SuggestBody {
            prompt: Some(prompt),
        })) if !prompt.trim().is_empty() => prompt,
        Ok(_) => return error_body(StatusCode::BAD_REQUEST, "Prompt required"),
        Err(rejection) => {
            tracing::debug!("unreadable suggestion request: {rejection}");
            return error_body(StatusCode::BAD_REQUEST, "Prompt required");
        }
    };

    match state.upstream.suggest(&prompt).await {
        Ok(items) => Json(items).into_response(),
        Err(SuggestError::EmptyPrompt) => error_body(StatusCode::BAD_REQUEST, "Prompt required"),
        Err(err) => {
            tracing::error!("suggestion generation failed: {err}");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "AI generation failed")
        }
    }
}

#[derive(Debug, Deserialize)]
struct RenderBody {
    #[serde(flatten)]
    config: RenderConfig,
    /// Base64 encoded logo image.
    #[serde(default)]
    logo: Option<String>,
}

async fn render_qr(body: Result<Json<RenderBody>, JsonRejection>) -> Response {
    let Json(RenderBody { mut config, logo }) = match body {
        Ok(body) => body,
        Err(rejection) => return error_body(StatusCode::BAD_REQUEST, &rejection.body_text()),
    };

    if let Some(logo) = logo {
        match STANDARD.decode(logo.trim()) {
            Ok(bytes) => config.logo = Some(Logo::new("logo", bytes)),
            Err(err) => return error_body(StatusCode::BAD_REQUEST, &format!("invalid logo: {err}")),
        }
    }

    let result = tokio::task::spawn_blocking(move || render::render(&config))
        .await
        .map_err(RenderError::from)
        .and_then(|result| result);

    match result {
        Ok(image) => (
            [
                (header::CONTENT_TYPE, "image/png".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\""),
                ),
            ],
            image.png,
        )
            .into_response(),
        Err(err @ (RenderError::Task(_) | RenderError::Png(_))) => {
            tracing::error!("render failed: {err}");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Render failed")
        }
        Err(err) => error_body(StatusCode::BAD_REQUEST, &err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::upstream::{DEFAULT_MODEL, DEFAULT_URL};
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    const SUGGESTIONS: &str = r#"[
        {"title": "Guest WiFi", "content": "WIFI:T:WPA;S:Guest Room;P:welcome;;", "description": "Scan to join the guest room network"},
        {"title": "Host contact", "content": "BEGIN:VCARD\nVERSION:3.0\nFN:Your Host\nTEL:+15550100\nEND:VCARD", "description": "Save the host's number"},
        {"title": "Welcome page", "content": "https://example.com/welcome", "description": "House guide for guests"}
    ]"#;

    // Stand-in for the Responses API that always answers with `text`.
    async fn spawn_upstream(text: &'static str) -> String {
        let app = Router::new().route(
            "/v1/responses",
            post(move |Json(request): Json<Value>| async move {
                assert_eq!(request["model"], DEFAULT_MODEL);
                Json(json!({
                    "output": [{
                        "type": "message",
                        "content": [{"type": "output_text", "text": text}]
                    }]
                }))
            }),
        );
        spawn(app).await
    }

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}/v1/responses")
    }

    async fn assert_generation_failed(url: &str) {
        let response = app(url, Some("sk-test"))
            .oneshot(post_json("/api/ai", r#"{"prompt": "test"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await, json!({"error": "AI generation failed"}));
    }

    fn app(url: &str, api_key: Option<&str>) -> Router {
        let upstream = Upstream::new(
            url,
            DEFAULT_MODEL,
            api_key.map(str::to_string),
            Duration::from_secs(5),
        )
        .unwrap();
        router(AppState::new(upstream))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_suggest_returns_three_items() {
        let url = spawn_upstream(SUGGESTIONS).await;
        let response = app(&url, Some("sk-test"))
            .oneshot(post_json("/api/ai", r#"{"prompt": "WiFi for guest room"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 3);
        for item in items {
            for field in ["title", "content", "description"] {
                assert!(!item[field].as_str().unwrap().is_empty());
            }
        }
    }

    #[tokio::test]
    async fn test_suggest_requires_prompt() {
        for body in [r#"{}"#, r#"{"prompt": ""}"#, r#"{"prompt": "  "}"#, "not json"] {
            let response = app(DEFAULT_URL, Some("sk-test"))
                .oneshot(post_json("/api/ai", body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(json_body(response).await, json!({"error": "Prompt required"}));
        }
    }

    #[tokio::test]
    async fn test_suggest_non_json_output() {
        let url = spawn_upstream("I'm sorry, I can only answer in prose.").await;
        let response = app(&url, Some("sk-test"))
            .oneshot(post_json("/api/ai", r#"{"prompt": "test"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await, json!({"error": "AI generation failed"}));
    }

    #[tokio::test]
    async fn test_suggest_upstream_error_status() {
        let app = Router::new().route(
            "/v1/responses",
            post(|| async { (StatusCode::BAD_GATEWAY, "down") }),
        );
        let url = spawn(app).await;
        assert_generation_failed(&url).await;
    }

    #[tokio::test]
    async fn test_suggest_upstream_unreachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        assert_generation_failed(&format!("http://{addr}/v1/responses")).await;
    }

    #[tokio::test]
    async fn test_suggest_too_few_items() {
        let url = spawn_upstream(
            r#"[
                {"title": "Menu", "content": "https://example.com/menu", "description": "See the menu"},
                {"title": "Call", "content": "tel:+15550100", "description": "Call the front desk"}
            ]"#,
        )
        .await;
        assert_generation_failed(&url).await;
    }

    #[tokio::test]
    async fn test_suggest_without_api_key() {
        let url = spawn_upstream(SUGGESTIONS).await;
        let response = app(&url, None)
            .oneshot(post_json("/api/ai", r#"{"prompt": "test"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await, json!({"error": "AI generation failed"}));
    }

    #[tokio::test]
    async fn test_render_returns_png() {
        let response = app(DEFAULT_URL, None)
            .oneshot(post_json("/api/qr", r#"{"data": "https://example.com", "qrSize": 512}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"qr-code.png\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let image = image::load_from_memory(&bytes).unwrap();
        assert_eq!((image.width(), image.height()), (512, 512));
    }

    #[tokio::test]
    async fn test_render_rejects_bad_config() {
        let response = app(DEFAULT_URL, None)
            .oneshot(post_json("/api/qr", r#"{"outputSizePx": 64}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let too_long = json!({"data": "q".repeat(1400), "errorCorrectionLevel": "H"}).to_string();
        let response = app(DEFAULT_URL, None)
            .oneshot(post_json("/api/qr", &too_long))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("too long"));
    }

    #[tokio::test]
    async fn test_render_rejects_bad_logo_encoding() {
        let response = app(DEFAULT_URL, None)
            .oneshot(post_json("/api/qr", r#"{"logo": "%%%"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
