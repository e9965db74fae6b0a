//! HTTP request handlers for the meme API.
//!
//! # Endpoints
//!
//! - `GET /memes` - Public listing or image
//! - `GET /private/memes` - Full listing or image (bearer)
//! - `POST /private/auth` - Exchange credentials for a bearer token
//! - `POST /private/memes` - Upload a meme (bearer)
//! - `PUT /private/memes` - Update a meme (bearer)
//! - `DELETE /private/memes` - Soft-delete a meme (bearer)
//! - `GET /health` - Health check endpoint

use axum::{
    body::Body,
    extract::{FromRequest, Multipart, Query, Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::blob::{BlobObject, BlobStore};
use crate::credentials::{check_login, CredentialHasher};
use crate::error::{IoError, MemeError};
use crate::meme::{ImageUpload, ListPage, MemeService};
use crate::store::{MemeRecord, MemeSummary, MetadataStore};

use super::auth::{AuthError, AuthenticatedUser, TokenAuth};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<M: MetadataStore, B: BlobStore> {
    /// The meme service backing every route
    pub service: MemeService<M, B>,

    /// Password hasher for the login route
    pub hasher: CredentialHasher,

    /// Token issuer for the login route
    pub tokens: TokenAuth,
}

impl<M: MetadataStore, B: BlobStore> AppState<M, B> {
    /// Create a new application state.
    pub fn new(service: MemeService<M, B>, hasher: CredentialHasher, tokens: TokenAuth) -> Self {
        Self {
            service,
            hasher,
            tokens,
        }
    }
}

impl<M: MetadataStore, B: BlobStore> Clone for AppState<M, B> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            hasher: self.hasher.clone(),
            tokens: self.tokens.clone(),
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters for the listing routes.
#[derive(Debug, Default, Deserialize)]
pub struct MemeQueryParams {
    /// Serve this meme's image instead of a listing
    #[serde(default)]
    pub meme_id: Option<i64>,

    /// Listing page, 1-based (default: 1)
    #[serde(default)]
    pub page: Option<u32>,
}

/// Query parameters for routes addressing a single meme.
#[derive(Debug, Deserialize)]
pub struct MemeIdParams {
    pub meme_id: i64,

    /// New name, as an alternative to the multipart `text` field on update
    #[serde(default)]
    pub text: Option<String>,
}

/// Form body of `POST /private/auth`.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Parts read from a `multipart/form-data` meme body.
#[derive(Debug, Default)]
pub struct MemeForm {
    /// Meme name
    pub text: Option<String>,

    /// Image part, already checked to be `image/*`
    pub image: Option<ImageUpload>,
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "missing_field")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// Successful login response.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    /// Always "bearer"
    pub token_type: String,

    /// Seconds until the token expires
    pub expires_in: u64,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert MemeError to HTTP response.
///
/// 5xx errors are logged at ERROR, 404s at DEBUG and other 4xx at WARN.
impl IntoResponse for MemeError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            MemeError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),

            // 422 Unprocessable Entity - validation failures
            MemeError::UnsupportedMediaType { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unsupported_media_type")
            }
            MemeError::MissingField(_) => (StatusCode::UNPROCESSABLE_ENTITY, "missing_field"),
            MemeError::InvalidRequest(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_request"),

            MemeError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),

            MemeError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),

            MemeError::Storage(io_err) => match io_err {
                IoError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                IoError::Connection(_) => (StatusCode::BAD_GATEWAY, "connection_error"),
                IoError::S3(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            },
        };
        let message = self.to_string();

        // Log errors based on severity
        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle public listing and image requests.
///
/// # Endpoint
///
/// `GET /memes?page={page}` or `GET /memes?meme_id={id}`
///
/// # Response
///
/// - `200 OK`: `{"page", "max_page", "memes": [{"id", "name"}]}`, or the
///   image bytes with `Content-Type: image/{extension}` when `meme_id` is given
/// - `404 Not Found`: Unknown or deleted `meme_id`
pub async fn public_memes_handler<M, B>(
    State(state): State<AppState<M, B>>,
    Query(query): Query<MemeQueryParams>,
) -> Result<Response, MemeError>
where
    M: MetadataStore + 'static,
    B: BlobStore + 'static,
{
    match query.meme_id {
        Some(id) => image_response(&state.service, id).await,
        None => {
            let page: ListPage<MemeSummary> = state.service.list(query.page).await?;
            Ok(Json(page).into_response())
        }
    }
}

/// Handle private listing and image requests.
///
/// Same as [`public_memes_handler`], but listings carry every column.
///
/// # Endpoint
///
/// `GET /private/memes?page={page}` or `GET /private/memes?meme_id={id}`
pub async fn private_memes_handler<M, B>(
    State(state): State<AppState<M, B>>,
    Query(query): Query<MemeQueryParams>,
) -> Result<Response, MemeError>
where
    M: MetadataStore + 'static,
    B: BlobStore + 'static,
{
    match query.meme_id {
        Some(id) => image_response(&state.service, id).await,
        None => {
            let page: ListPage<MemeRecord> = state.service.list_full(query.page).await?;
            Ok(Json(page).into_response())
        }
    }
}

/// Handle login requests.
///
/// # Endpoint
///
/// `POST /private/auth` with an `application/x-www-form-urlencoded` body
/// carrying `username` and `password`.
///
/// # Response
///
/// - `200 OK`: `{"access_token", "token_type": "bearer", "expires_in"}`
/// - `400 Bad Request`: Incorrect username or password
pub async fn login_handler<M, B>(
    State(state): State<AppState<M, B>>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, AuthError>
where
    M: MetadataStore + 'static,
    B: BlobStore + 'static,
{
    let credential = check_login(
        state.service.metadata(),
        &state.hasher,
        &form.username,
        &form.password,
    )
    .await
    .map_err(|e| AuthError::Backend(e.to_string()))?
    .ok_or(AuthError::InvalidCredentials)?;

    let (access_token, _expiry) = state.tokens.issue(&credential.name);
    info!(username = %credential.name, "Issued access token");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: state.tokens.ttl().as_secs(),
    }))
}

/// Handle meme uploads.
///
/// # Endpoint
///
/// `POST /private/memes` with a `multipart/form-data` body carrying
/// `image` (an `image/*` file part) and `text` (the meme name).
///
/// # Response
///
/// - `200 OK`: `{"id", "name"}`
/// - `413 Payload Too Large`: Body exceeds the upload limit
/// - `422 Unprocessable Entity`: Missing field or non-image upload
pub async fn upload_handler<M, B>(
    State(state): State<AppState<M, B>>,
    Extension(user): Extension<AuthenticatedUser>,
    multipart: Multipart,
) -> Result<Json<MemeSummary>, MemeError>
where
    M: MetadataStore + 'static,
    B: BlobStore + 'static,
{
    let form = read_meme_form(multipart).await?;
    let image = form.image.ok_or(MemeError::MissingField("image"))?;
    let name = form.text.ok_or(MemeError::MissingField("text"))?;

    debug!(user = %user.username, name = %name, "Upload requested");
    let summary = state.service.upload(&name, image).await?;

    Ok(Json(summary))
}

/// Handle meme updates.
///
/// # Endpoint
///
/// `PUT /private/memes?meme_id={id}` with an optional `multipart/form-data`
/// body carrying `text` and/or `image`. A `text` query parameter is accepted
/// in place of the multipart field.
///
/// # Response
///
/// - `200 OK`: The updated record
/// - `404 Not Found`: Unknown or deleted meme
/// - `422 Unprocessable Entity`: Non-image upload
pub async fn update_handler<M, B>(
    State(state): State<AppState<M, B>>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<MemeIdParams>,
    request: Request,
) -> Result<Json<MemeRecord>, MemeError>
where
    M: MetadataStore + 'static,
    B: BlobStore + 'static,
{
    let form = if is_multipart(&request) {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| MemeError::InvalidRequest(e.body_text()))?;
        read_meme_form(multipart).await?
    } else {
        MemeForm::default()
    };

    let name = form.text.or(params.text);

    debug!(user = %user.username, meme_id = params.meme_id, "Update requested");
    let record = state
        .service
        .update(params.meme_id, name, form.image)
        .await?;

    Ok(Json(record))
}

/// Handle meme deletion.
///
/// # Endpoint
///
/// `DELETE /private/memes?meme_id={id}`
///
/// # Response
///
/// - `200 OK`: The soft-deleted record, `delete_date` set
/// - `404 Not Found`: Unknown or already deleted meme
pub async fn delete_handler<M, B>(
    State(state): State<AppState<M, B>>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<MemeIdParams>,
) -> Result<Json<MemeRecord>, MemeError>
where
    M: MetadataStore + 'static,
    B: BlobStore + 'static,
{
    debug!(user = %user.username, meme_id = params.meme_id, "Delete requested");
    let record = state.service.delete(params.meme_id).await?;
    Ok(Json(record))
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Helpers
// =============================================================================

/// Stream a meme's image back with its content type and length.
async fn image_response<M, B>(service: &MemeService<M, B>, id: i64) -> Result<Response, MemeError>
where
    M: MetadataStore,
    B: BlobStore,
{
    let (record, object) = service.open_image(id).await?;
    Ok(stream_image(&record, object))
}

fn stream_image(record: &MemeRecord, object: BlobObject) -> Response {
    let content_type = HeaderValue::from_str(&format!("image/{}", record.extension))
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    let mut response = (
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        Body::from_stream(object.stream),
    )
        .into_response();

    if let Some(len) = object.content_length {
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    }

    response
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("multipart/form-data"))
}

/// Read the `text` and `image` parts of a meme form. Other parts are skipped.
async fn read_meme_form(mut multipart: Multipart) -> Result<MemeForm, MemeError> {
    let mut form = MemeForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("text") => {
                form.text = Some(field.text().await.map_err(multipart_error)?);
            }
            Some("image") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                form.image = Some(ImageUpload::new(&content_type, data)?);
            }
            _ => {}
        }
    }

    Ok(form)
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> MemeError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        MemeError::PayloadTooLarge(err.body_text())
    } else {
        MemeError::InvalidRequest(err.body_text())
    }
}

// =============================================================================
// Tests
// =============================================================================
