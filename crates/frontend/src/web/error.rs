//! Handler errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use types::FrontEndError;

/// Details of an unhandled error, carried on the 500 response for the
/// exception handler to log and render
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    pub message: String,
}

/// Error returned by request handlers
#[derive(Debug)]
pub struct AppError(pub FrontEndError);

impl<E> From<E> for AppError
where
    E: Into<FrontEndError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(ErrorDetail {
            message: self.0.to_string(),
        });
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ApiClientError;

    #[test]
    fn test_error_response_carries_detail() {
        let err: AppError = ApiClientError::Timeout {
            url: "http://backend/Speakers".to_string(),
        }
        .into();

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = response.extensions().get::<ErrorDetail>().unwrap();
        assert!(detail.message.contains("http://backend/Speakers"));
    }
}
