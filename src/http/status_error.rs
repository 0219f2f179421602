use std::fmt;

use axum::http::StatusCode;
use axum::response::{ErrorResponse, IntoResponse, Response};

/// Plain-text error response carrying an explicit status code.
#[derive(Debug)]
pub struct StatusError {
    message: String,
    status_code: StatusCode,
}

impl StatusError {
    pub fn create<S: Into<String>>(message: S) -> ErrorResponse {
        Self::new_status(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Missing camera/date/video directories are the dominant error shape
    /// here, so 404 gets its own constructor.
    pub fn not_found<S: Into<String>>(message: S) -> ErrorResponse {
        Self::new_status(message, StatusCode::NOT_FOUND)
    }

    pub fn new_status<S: Into<String>>(message: S, status_code: StatusCode) -> ErrorResponse {
        ErrorResponse::from(Self {
            message: message.into(),
            status_code,
        })
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status_code, self.message)
    }
}

impl IntoResponse for StatusError {
    fn into_response(self) -> Response {
        (self.status_code, self.message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_carry_their_status_codes() {
        let response =
            axum::response::Result::<()>::Err(StatusError::not_found("missing")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response =
            axum::response::Result::<()>::Err(StatusError::create("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
