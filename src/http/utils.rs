use axum::body::Body;
use axum::http::header;
use axum::response::IntoResponse;
use tokio::fs;
use tokio_util::io::ReaderStream;

use crate::http::status_error::StatusError;

pub type AxumResult<T> = axum::response::Result<T>;

/// Streams a file inline with its guessed content type; used for thumbnail
/// and fallback-image responses.
pub async fn image_to_response(image_path: &std::path::Path) -> AxumResult<impl IntoResponse> {
    let mime = mime_guess::from_path(image_path)
        .first_or_octet_stream()
        .as_ref()
        .to_string();

    let stream = ReaderStream::new(
        fs::File::open(&image_path)
            .await
            .map_err(|e| StatusError::create(e.to_string()))?,
    );
    let body = Body::from_stream(stream);

    Ok(([(header::CONTENT_TYPE, mime)], body))
}
