//! Stored File Routes
//!
//! Serves uploaded face photos and generated simulation artifacts. Paths
//! stored on records resolve against these routes.

use axum::{
    Router,
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use http::header;

use crate::core::ServerState;
use crate::facesim::FACESIM_UPLOAD_DIR;

/// Stored file response
enum StoredFileResponse {
    Ok(String, Bytes),
    NotFound,
    BadRequest(&'static str),
}

impl IntoResponse for StoredFileResponse {
    fn into_response(self) -> axum::response::Response {
        match self {
            StoredFileResponse::Ok(content_type, content) => (
                http::StatusCode::OK,
                [(header::CONTENT_TYPE, content_type)],
                content,
            )
                .into_response(),
            StoredFileResponse::NotFound => {
                (http::StatusCode::NOT_FOUND, "File not found").into_response()
            }
            StoredFileResponse::BadRequest(msg) => {
                (http::StatusCode::BAD_REQUEST, msg).into_response()
            }
        }
    }
}

/// Serve stored file handler
async fn serve_stored_file(
    State(state): State<ServerState>,
    Path(filename): Path<String>,
) -> StoredFileResponse {
    // Security check: prevent path traversal
    if filename.is_empty()
        || filename.contains("..")
        || filename.contains('/')
        || filename.contains('\\')
    {
        return StoredFileResponse::BadRequest("Invalid filename");
    }

    let file_path = state.work_dir().join(FACESIM_UPLOAD_DIR).join(&filename);

    match tokio::fs::read(&file_path).await {
        Ok(content) => {
            let content_type = mime_guess::from_path(&filename)
                .first_or_octet_stream()
                .to_string();
            StoredFileResponse::Ok(content_type, content.into())
        }
        Err(e) => {
            tracing::debug!(filename = %filename, error = %e, "Stored file not found");
            StoredFileResponse::NotFound
        }
    }
}

/// Build stored file router - public access
pub fn router() -> Router<ServerState> {
    Router::new().route("/uploads/facesim/{filename}", get(serve_stored_file))
}
