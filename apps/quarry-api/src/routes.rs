use axum::{
	Json, Router,
	extract::{DefaultBodyLimit, Multipart, Path, State},
	http::{HeaderMap, StatusCode, header},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use uuid::Uuid;

use quarry_service::{
	DocumentMetadata, IngestResponse, SearchRequest, SearchResponse, ServiceError, StatsResponse,
	TagDictionary,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	// Leave headroom above the per-file limit for multipart framing.
	let body_limit = state.service.cfg.ingest.max_file_size as usize + 64 * 1024;

	Router::new()
		.route("/api/health", get(health))
		.route("/api/upload", post(upload))
		.route("/api/ingest", post(ingest))
		.route("/api/search", post(search))
		.route("/api/document/{file_id}", get(document))
		.route("/api/tags", get(get_tags).put(put_tags))
		.route("/api/stats", get(stats))
		.layer(DefaultBodyLimit::max(body_limit))
		.with_state(state)
}

#[derive(Clone, Copy)]
enum Role {
	Admin,
	User,
}

/// Bearer token check. The admin token opens every route; the user token
/// opens user routes only. Missing or unknown tokens are 401, a valid user
/// token on an admin route is 403.
fn authorize(state: &AppState, headers: &HeaderMap, role: Role) -> Result<(), ApiError> {
	let token = headers
		.get(header::AUTHORIZATION)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.strip_prefix("Bearer "))
		.ok_or_else(|| {
			json_error(
				StatusCode::UNAUTHORIZED,
				"unauthorized",
				"Missing or malformed Authorization header.",
				None,
			)
		})?;
	let security = &state.service.cfg.security;

	if token == security.admin_token {
		return Ok(());
	}
	if token == security.user_token {
		return match role {
			Role::User => Ok(()),
			Role::Admin => Err(json_error(
				StatusCode::FORBIDDEN,
				"forbidden",
				"This operation requires the admin token.",
				None,
			)),
		};
	}

	Err(json_error(StatusCode::UNAUTHORIZED, "unauthorized", "Unknown token.", None))
}

async fn health() -> Json<serde_json::Value> {
	let timestamp = time::OffsetDateTime::now_utc()
		.format(&time::format_description::well_known::Rfc3339)
		.unwrap_or_default();

	Json(serde_json::json!({ "status": "healthy", "timestamp": timestamp }))
}

#[derive(Debug, Serialize)]
pub struct UploadedFile {
	pub file_id: String,
	pub filename: String,
	pub size: u64,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
	pub success: bool,
	pub message: String,
	pub files: Vec<UploadedFile>,
}

async fn upload(
	State(state): State<AppState>,
	headers: HeaderMap,
	mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
	authorize(&state, &headers, Role::Admin)?;

	let cfg = &state.service.cfg.ingest;
	let upload_dir = state.service.cfg.storage.data.upload_dir();

	tokio::fs::create_dir_all(&upload_dir).await.map_err(internal)?;

	let mut files = Vec::new();

	while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
		let Some(raw_name) = field.file_name().map(str::to_owned) else { continue };
		// Strip any client-supplied path components.
		let filename = raw_name.rsplit(['/', '\\']).next().unwrap_or(&raw_name).to_string();
		let extension = filename
			.rfind('.')
			.map(|dot| filename[dot..].to_lowercase())
			.unwrap_or_default();

		if !cfg.allowed_extensions.contains(&extension) {
			return Err(json_error(
				StatusCode::BAD_REQUEST,
				"unsupported_file_type",
				format!("File type \"{extension}\" is not allowed."),
				Some(vec![filename]),
			));
		}

		let data = field.bytes().await.map_err(bad_multipart)?;

		if data.len() as u64 > cfg.max_file_size {
			return Err(json_error(
				StatusCode::BAD_REQUEST,
				"file_too_large",
				format!("File exceeds the {} byte limit.", cfg.max_file_size),
				Some(vec![filename]),
			));
		}

		let file_id = Uuid::new_v4().simple().to_string()[..8].to_string();
		let stored_name = format!("{file_id}_{filename}");

		tokio::fs::write(upload_dir.join(&stored_name), &data).await.map_err(internal)?;
		tracing::info!(file = %stored_name, size = data.len(), "File uploaded.");
		files.push(UploadedFile { file_id, filename, size: data.len() as u64 });
	}

	if files.is_empty() {
		return Err(json_error(
			StatusCode::BAD_REQUEST,
			"no_files",
			"The request contained no files.",
			None,
		));
	}

	Ok(Json(UploadResponse {
		success: true,
		message: format!("Uploaded {} files.", files.len()),
		files,
	}))
}

async fn ingest(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<IngestResponse>, ApiError> {
	authorize(&state, &headers, Role::Admin)?;

	let response = state.service.ingest().await?;

	Ok(Json(response))
}

async fn search(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
	authorize(&state, &headers, Role::User)?;

	let response = state.service.search(payload).await?;

	Ok(Json(response))
}

async fn document(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(file_id): Path<String>,
) -> Result<Json<DocumentMetadata>, ApiError> {
	authorize(&state, &headers, Role::User)?;

	let metadata = state.service.document_metadata(&file_id).await?.ok_or_else(|| {
		json_error(
			StatusCode::NOT_FOUND,
			"not_found",
			format!("No ingested document with id \"{file_id}\"."),
			None,
		)
	})?;

	Ok(Json(metadata))
}

async fn get_tags(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<TagDictionary>, ApiError> {
	authorize(&state, &headers, Role::User)?;

	let dictionary = state.service.tag_dictionary().await?;

	Ok(Json(dictionary))
}

async fn put_tags(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<TagDictionary>,
) -> Result<Json<TagDictionary>, ApiError> {
	authorize(&state, &headers, Role::Admin)?;

	let dictionary = state.service.update_tag_dictionary(payload).await?;

	Ok(Json(dictionary))
}

async fn stats(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<StatsResponse>, ApiError> {
	authorize(&state, &headers, Role::User)?;

	let response = state.service.stats().await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}

fn internal(err: std::io::Error) -> ApiError {
	json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", err.to_string(), None)
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> ApiError {
	json_error(StatusCode::BAD_REQUEST, "invalid_multipart", err.to_string(), None)
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_request", message, None),
			ServiceError::Provider { message } =>
				json_error(StatusCode::BAD_GATEWAY, "provider_error", message, None),
			ServiceError::Storage { message } =>
				json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", message, None),
			ServiceError::Vector { message } =>
				json_error(StatusCode::BAD_GATEWAY, "vector_unavailable", message, None),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}
