//! HTTP boundary tests against an in-process Rocket client.

use pretty_assertions::assert_eq;
use rocket::http::{ContentType, Method, Status};
use rocket::local::asynchronous::{Client, LocalResponse};
use serde_json::{Value, json};
use std::sync::Arc;
use tactix_config::{ServerConfig, TactixConfig};
use tactix_core::{AnalysisClient, AnalysisHandler};
use tactix_server::build_rocket;
use tactix_test_utils::RecordingModel;

async fn client_with(config: TactixConfig, model: Option<Arc<RecordingModel>>) -> Client {
    let client = model.map(|model| AnalysisClient::new(model));
    let handler = AnalysisHandler::new(client, &config.prompts);
    Client::tracked(build_rocket(&config, handler))
        .await
        .expect("rocket client")
}

async fn json_body(response: LocalResponse<'_>) -> Value {
    let text = response.into_string().await.expect("body");
    serde_json::from_str(&text).expect("json body")
}

fn assert_standard_headers(response: &LocalResponse<'_>) {
    let headers = response.headers();
    assert_eq!(headers.get_one("Access-Control-Allow-Origin"), Some("*"));
    assert_eq!(
        headers.get_one("Access-Control-Allow-Methods"),
        Some("POST, OPTIONS")
    );
    assert_eq!(
        headers.get_one("Access-Control-Allow-Headers"),
        Some("Content-Type")
    );
    assert_eq!(response.content_type(), Some(ContentType::JSON));
}

#[tokio::test]
async fn post_returns_analysis() {
    let model = Arc::new(RecordingModel::new("## フォーメーション"));
    let client = client_with(TactixConfig::default(), Some(model.clone())).await;

    let response = client
        .post("/api/analyze")
        .header(ContentType::JSON)
        .body(json!({ "message": "分析して" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    assert_standard_headers(&response);

    let body = json_body(response).await;
    assert_eq!(body["reply"], "## フォーメーション");
    assert!(body["timestamp"].is_string());
    assert!(body["processingTimeMs"].is_u64());
    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn options_is_empty_object() {
    let model = Arc::new(RecordingModel::new("unused"));
    let client = client_with(TactixConfig::default(), Some(model.clone())).await;

    let response = client.options("/api/analyze").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_standard_headers(&response);
    assert_eq!(json_body(response).await, json!({}));
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn other_methods_answer_405_envelopes() {
    let client = client_with(TactixConfig::default(), None).await;

    for response in [
        client.get("/api/analyze").dispatch().await,
        client.put("/api/analyze").dispatch().await,
        client.delete("/somewhere/else").dispatch().await,
        client.patch("/").dispatch().await,
        client.req(Method::Trace, "/api/analyze").dispatch().await,
        client.req(Method::Connect, "/api/analyze").dispatch().await,
    ] {
        assert_eq!(response.status(), Status::MethodNotAllowed);
        assert_standard_headers(&response);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Method not allowed", "code": "METHOD_NOT_ALLOWED" })
        );
    }
}

#[tokio::test]
async fn empty_body_is_missing_body() {
    let client = client_with(TactixConfig::default(), None).await;
    let response = client.post("/api/analyze").dispatch().await;
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Request body is required", "code": "MISSING_BODY" })
    );
}

#[tokio::test]
async fn malformed_json_is_invalid_json() {
    let model = Arc::new(RecordingModel::new("unused"));
    let client = client_with(TactixConfig::default(), Some(model.clone())).await;
    let response = client
        .post("/api/analyze")
        .header(ContentType::JSON)
        .body("{\"message\": ")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Invalid JSON in request body", "code": "INVALID_JSON" })
    );
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn missing_key_is_server_configuration_error() {
    let client = client_with(TactixConfig::default(), None).await;
    let response = client
        .post("/api/analyze")
        .header(ContentType::JSON)
        .body(json!({ "image": "QUJD" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::InternalServerError);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Server configuration error", "code": "MISSING_API_KEY" })
    );
}

#[tokio::test]
async fn oversized_body_still_gets_an_envelope() {
    let config = TactixConfig::builder()
        .server(ServerConfig {
            body_limit_bytes: 16,
            ..ServerConfig::default()
        })
        .build();
    let model = Arc::new(RecordingModel::new("unused"));
    let client = client_with(config, Some(model.clone())).await;

    let response = client
        .post("/api/analyze")
        .header(ContentType::JSON)
        .body(json!({ "message": "this body is longer than sixteen bytes" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::PayloadTooLarge);
    assert_standard_headers(&response);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Invalid JSON in request body", "code": "INVALID_JSON" })
    );
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn non_utf8_body_is_invalid_json() {
    let model = Arc::new(RecordingModel::new("unused"));
    let client = client_with(TactixConfig::default(), Some(model.clone())).await;

    let response = client
        .post("/api/analyze")
        .body([0xff_u8, 0xfe, 0xfd].as_slice())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    assert_standard_headers(&response);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Invalid JSON in request body", "code": "INVALID_JSON" })
    );
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn route_comes_from_config() {
    let config = TactixConfig::builder()
        .server(ServerConfig {
            route: "/v2/tactics".to_string(),
            ..ServerConfig::default()
        })
        .build();
    let model = Arc::new(RecordingModel::new("ok"));
    let client = client_with(config, Some(model.clone())).await;

    let response = client
        .post("/v2/tactics")
        .body(json!({ "message": "hi" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let response = client
        .post("/api/analyze")
        .body(json!({ "message": "hi" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
    assert_standard_headers(&response);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Not Found", "code": "INTERNAL_ERROR" })
    );
    assert_eq!(model.call_count(), 1);
}
