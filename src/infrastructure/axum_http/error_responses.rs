use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

/// Error body shared by every router. Server-side failures get a generic
/// message; internal detail stays in the logs.
pub fn failure(status: StatusCode, error: impl std::fmt::Display) -> Response {
    let message = if status.is_server_error() {
        "Internal server error".to_string()
    } else {
        error.to_string()
    };

    (
        status,
        Json(ErrorResponse {
            code: status.as_u16(),
            message,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_do_not_leak_detail() {
        let response = failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "connection to db at 10.0.0.3 refused",
        );
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn client_errors_keep_their_message() {
        let response = failure(StatusCode::BAD_REQUEST, "prompt must not be empty");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
