use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use osint_core::OsintError;

/// Carries an explicit 400 through the `anyhow::Error` chain.
#[derive(Debug)]
struct BadRequestError(String);

impl std::fmt::Display for BadRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for BadRequestError {}

/// Unified error type for HTTP responses. Bodies are `{"error": "..."}`.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequestError(msg.into()).into())
    }

    fn status(&self) -> StatusCode {
        if self.0.downcast_ref::<BadRequestError>().is_some() {
            return StatusCode::BAD_REQUEST;
        }
        let Some(e) = self.0.downcast_ref::<OsintError>() else {
            return StatusCode::INTERNAL_SERVER_ERROR;
        };
        match e {
            OsintError::WorkflowNotFound(_)
            | OsintError::AlertNotFound(_)
            | OsintError::ToolNotFound(_) => StatusCode::NOT_FOUND,
            OsintError::InvalidObjective(_)
            | OsintError::InvalidWorkflowType(_)
            | OsintError::InvalidSeverity(_)
            | OsintError::InvalidAlertCondition(_)
            | OsintError::InvalidReportFormat(_) => StatusCode::BAD_REQUEST,
            OsintError::Gateway(_) | OsintError::MalformedResponse { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_not_found_maps_to_404() {
        let err = AppError(OsintError::WorkflowNotFound("wf_x".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn alert_not_found_maps_to_404() {
        let err = AppError(OsintError::AlertNotFound("alert_x".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_severity_maps_to_400() {
        let err = AppError(OsintError::InvalidSeverity("loud".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn bad_request_constructor_maps_to_400() {
        let err = AppError::bad_request("name must not be empty");
        assert_eq!(err.0.to_string(), "name must not be empty");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn gateway_error_maps_to_502() {
        let err = AppError(OsintError::Gateway("timeout".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn io_error_maps_to_500() {
        let err = AppError(OsintError::Io(std::io::Error::other("disk full")).into());
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn foreign_error_maps_to_500() {
        let err = AppError(anyhow::anyhow!("something unexpected"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn response_body_is_json() {
        let response = AppError(OsintError::WorkflowNotFound("x".into()).into()).into_response();
        let ct = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .expect("should have content-type");
        assert!(ct.to_str().unwrap().contains("application/json"));
    }
}
