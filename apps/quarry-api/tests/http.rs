//! Router-level tests: auth, upload validation, and the tag dictionary
//! endpoints. These run against a temporary data directory and never reach
//! the vector store or any provider.

use std::path::Path;

use axum::{
	body::{self, Body},
	http::{Request, StatusCode, header},
};
use tower::util::ServiceExt;

use quarry_api::{routes, state::AppState};
use quarry_config::{
	Chunking, Config, Data, EmbeddingProviderConfig, Ingest, LlmProviderConfig, Providers, Search,
	Security, Service, Storage, Vector,
};

fn embedding_provider() -> EmbeddingProviderConfig {
	EmbeddingProviderConfig {
		api_base: "http://localhost:9".into(),
		api_key: "test".into(),
		path: "/v1/embeddings".into(),
		model: "test-embedding".into(),
		dimensions: 8,
		timeout_ms: 1_000,
		default_headers: Default::default(),
	}
}

fn llm_provider() -> LlmProviderConfig {
	LlmProviderConfig {
		api_base: "http://localhost:9".into(),
		api_key: "test".into(),
		path: "/v1/chat/completions".into(),
		model: "test-llm".into(),
		temperature: 0.,
		timeout_ms: 1_000,
		default_headers: Default::default(),
	}
}

fn test_config(base_dir: &Path) -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".into(), log_level: "info".into() },
		storage: Storage {
			vector: Vector {
				url: "http://localhost:6334".into(),
				collection: "quarry-test".into(),
				vector_dim: 8,
			},
			data: Data { base_dir: base_dir.to_path_buf() },
		},
		providers: Providers {
			embedding: embedding_provider(),
			llm: llm_provider(),
			vision: llm_provider(),
		},
		chunking: Chunking {
			chunk_size: 1_000,
			chunk_overlap: 200,
			separators: vec!["\n\n".into(), "\n".into(), " ".into()],
		},
		search: Search { retrieval_top_k: 50, rerank_top_k: 10, recommended_tags_top_k: 15 },
		ingest: Ingest {
			max_file_size: 1024,
			pandoc_bin: "pandoc".into(),
			allowed_extensions: vec![".txt".into(), ".md".into(), ".docx".into()],
		},
		security: Security { admin_token: "admin-token".into(), user_token: "user-token".into() },
	}
}

fn app(base_dir: &Path) -> axum::Router {
	routes::router(AppState::new(test_config(base_dir)).unwrap())
}

fn bearer(request: axum::http::request::Builder, token: &str) -> axum::http::request::Builder {
	request.header(header::AUTHORIZATION, format!("Bearer {token}"))
}

fn multipart_body(boundary: &str, filename: &str, content: &str) -> String {
	format!(
		"--{boundary}\r\n\
		Content-Disposition: form-data; name=\"files\"; filename=\"{filename}\"\r\n\
		Content-Type: application/octet-stream\r\n\r\n\
		{content}\r\n\
		--{boundary}--\r\n"
	)
}

#[tokio::test]
async fn health_needs_no_auth() {
	let dir = tempfile::tempdir().unwrap();
	let response = app(dir.path())
		.oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
	let dir = tempfile::tempdir().unwrap();
	let response = app(dir.path())
		.oneshot(
			Request::post("/api/search")
				.header(header::CONTENT_TYPE, "application/json")
				.body(Body::from(r#"{"query": "anything"}"#))
				.unwrap(),
		)
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_token_cannot_reach_admin_routes() {
	let dir = tempfile::tempdir().unwrap();
	let response = app(dir.path())
		.oneshot(bearer(Request::post("/api/ingest"), "user-token").body(Body::empty()).unwrap())
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_token_is_unauthorized() {
	let dir = tempfile::tempdir().unwrap();
	let response = app(dir.path())
		.oneshot(bearer(Request::get("/api/tags"), "wrong").body(Body::empty()).unwrap())
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tags_roundtrip_through_the_api() {
	let dir = tempfile::tempdir().unwrap();
	let app = app(dir.path());
	let response = app
		.clone()
		.oneshot(bearer(Request::get("/api/tags"), "user-token").body(Body::empty()).unwrap())
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::OK);

	let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
	let defaults: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

	assert!(!defaults["tags"].as_array().unwrap().is_empty());

	// Replacement is admin-only.
	let denied = app
		.clone()
		.oneshot(
			bearer(Request::put("/api/tags"), "user-token")
				.header(header::CONTENT_TYPE, "application/json")
				.body(Body::from(r#"{"tags": ["rust"]}"#))
				.unwrap(),
		)
		.await
		.unwrap();

	assert_eq!(denied.status(), StatusCode::FORBIDDEN);

	let replaced = app
		.clone()
		.oneshot(
			bearer(Request::put("/api/tags"), "admin-token")
				.header(header::CONTENT_TYPE, "application/json")
				.body(Body::from(r#"{"tags": ["rust", "search"]}"#))
				.unwrap(),
		)
		.await
		.unwrap();

	assert_eq!(replaced.status(), StatusCode::OK);

	let response = app
		.oneshot(bearer(Request::get("/api/tags"), "user-token").body(Body::empty()).unwrap())
		.await
		.unwrap();
	let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
	let current: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

	assert_eq!(current["tags"], serde_json::json!(["rust", "search"]));
}

#[tokio::test]
async fn upload_stores_files_with_an_id_prefix() {
	let dir = tempfile::tempdir().unwrap();
	let boundary = "quarry-test-boundary";
	let response = app(dir.path())
		.oneshot(
			bearer(Request::post("/api/upload"), "admin-token")
				.header(
					header::CONTENT_TYPE,
					format!("multipart/form-data; boundary={boundary}"),
				)
				.body(Body::from(multipart_body(boundary, "notes.txt", "hello world")))
				.unwrap(),
		)
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::OK);

	let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
	let uploaded: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
	let file_id = uploaded["files"][0]["file_id"].as_str().unwrap();

	assert_eq!(uploaded["files"][0]["filename"], "notes.txt");

	let stored = dir.path().join("upload").join(format!("{file_id}_notes.txt"));

	assert_eq!(tokio::fs::read_to_string(stored).await.unwrap(), "hello world");
}

#[tokio::test]
async fn upload_rejects_disallowed_extensions() {
	let dir = tempfile::tempdir().unwrap();
	let boundary = "quarry-test-boundary";
	let response = app(dir.path())
		.oneshot(
			bearer(Request::post("/api/upload"), "admin-token")
				.header(
					header::CONTENT_TYPE,
					format!("multipart/form-data; boundary={boundary}"),
				)
				.body(Body::from(multipart_body(boundary, "payload.exe", "MZ")))
				.unwrap(),
		)
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
	let error: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

	assert_eq!(error["error_code"], "unsupported_file_type");
}

#[tokio::test]
async fn unknown_document_is_not_found() {
	let dir = tempfile::tempdir().unwrap();
	let response = app(dir.path())
		.oneshot(
			bearer(Request::get("/api/document/nope1234"), "user-token")
				.body(Body::empty())
				.unwrap(),
		)
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
