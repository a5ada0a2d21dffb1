use crate::error::ClinicError;
use crate::storage::Page;
use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

/// Paging metadata attached to list responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub pages: u32,
}

impl<T> From<&Page<T>> for Pagination {
    fn from(page: &Page<T>) -> Self {
        Self {
            page: page.page,
            limit: page.limit,
            total: page.total,
            pages: page.pages(),
        }
    }
}

/// JSON envelope shared by every endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> ApiResponse<T> {
    pub const fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            error: None,
            pagination: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            error: None,
            pagination: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

pub const fn status_for(err: &ClinicError) -> StatusCode {
    match err {
        ClinicError::Validation(_)
        | ClinicError::InvalidTicketNumber(_)
        | ClinicError::DuplicateUsername { .. }
        | ClinicError::IncorrectPassword => StatusCode::BAD_REQUEST,
        ClinicError::InvalidCredentials
        | ClinicError::AccountDeactivated
        | ClinicError::MissingToken
        | ClinicError::InvalidToken
        | ClinicError::TokenExpired
        | ClinicError::InactiveUser => StatusCode::UNAUTHORIZED,
        ClinicError::Forbidden(_) => StatusCode::FORBIDDEN,
        ClinicError::TicketNotFound { .. } | ClinicError::UserNotFound { .. } => {
            StatusCode::NOT_FOUND
        },
        ClinicError::DuplicateTicketNumber { .. } => StatusCode::CONFLICT,
        ClinicError::TicketCreationConflict { .. } | ClinicError::SequenceExhausted { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        },
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ClinicError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let recoverable = self.is_recoverable();
        let body = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "Request failed");
            ApiResponse::<()> {
                success: false,
                message: Some("Request failed".to_string()),
                data: None,
                error: Some(self.user_message()),
                pagination: None,
            }
        } else {
            ApiResponse::<()> {
                success: false,
                message: Some(self.user_message()),
                data: None,
                error: None,
                pagination: None,
            }
        };

        let mut response = (status, Json(body)).into_response();
        if recoverable {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&ClinicError::validation("bad")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_for(&ClinicError::TokenExpired), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_for(&ClinicError::Forbidden("no".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(&ClinicError::TicketCreationConflict { attempts: 3 }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&ClinicError::storage("down")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_conflict_response_sets_retry_after() {
        let response = ClinicError::TicketCreationConflict { attempts: 3 }.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
    }

    #[test]
    fn test_envelope_skips_empty_fields() {
        let json = serde_json::to_value(ApiResponse::message("ok")).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "message": "ok" }));
    }
}
