use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use classifier::ClassifierError;
use records::StoreError;
use serde::Serialize;

/// Seconds a client should wait before retrying while the model loads.
const RETRY_AFTER_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    retry_after: Option<u64>,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        let msg: String = msg.into();
        tracing::warn!("Bad request: {}", msg);
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        let msg: String = msg.into();
        tracing::warn!("Not found: {}", msg);
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", msg)
    }

    /// Internal details are logged, never returned to the client.
    pub fn internal(msg: impl Into<String>) -> Self {
        let msg: String = msg.into();
        tracing::error!("Internal error: {}", msg);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Error processing request",
        )
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        let msg: String = msg.into();
        tracing::warn!("Service unavailable: {}", msg);
        Self {
            retry_after: Some(RETRY_AFTER_SECS),
            ..Self::new(StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", msg)
        }
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        let msg: String = msg.into();
        tracing::error!("Timeout: {}", msg);
        Self::new(StatusCode::GATEWAY_TIMEOUT, "TIMEOUT", msg)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorEnvelope<'a> {
            error: ErrorBody<'a>,
        }

        #[derive(Serialize)]
        struct ErrorBody<'a> {
            code: &'a str,
            message: &'a str,
        }

        let mut response = (
            self.status,
            Json(ErrorEnvelope {
                error: ErrorBody {
                    code: self.code,
                    message: &self.message,
                },
            }),
        )
            .into_response();

        if let Some(secs) = self.retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }

        response
    }
}

impl From<ClassifierError> for ApiError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::Decode(msg) => Self::bad_request(format!("Invalid image: {}", msg)),
            ClassifierError::NotInitialized => {
                Self::service_unavailable("Model is still loading")
            }
            ClassifierError::Inference(msg) => Self::internal(format!("Inference failed: {}", msg)),
            ClassifierError::Configuration(msg) => {
                Self::internal(format!("Classifier misconfigured: {}", msg))
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::not_found(err.to_string()),
            StoreError::Poisoned => Self::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifier_error_mapping() {
        let cases = vec![
            (ClassifierError::Decode("bad".into()), StatusCode::BAD_REQUEST),
            (ClassifierError::NotInitialized, StatusCode::SERVICE_UNAVAILABLE),
            (
                ClassifierError::Inference("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ClassifierError::Configuration("labels".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_not_initialized_sets_retry_after() {
        let response = ApiError::from(ClassifierError::NotInitialized).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER).unwrap(),
            &HeaderValue::from(RETRY_AFTER_SECS)
        );
    }

    #[test]
    fn test_internal_hides_details() {
        let err = ApiError::from(ClassifierError::Inference("session poisoned".into()));
        assert!(!err.message().contains("session poisoned"));
    }

    #[test]
    fn test_store_not_found_is_404() {
        let err = ApiError::from(StoreError::NotFound(42));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(err.message().contains("42"));
    }
}
