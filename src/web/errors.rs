use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use serde::Serialize;

use crate::domain::account::AccountError;
use crate::domain::customer::CustomerError;
use crate::domain::shared::ErrorKind;

// ============================================================================
// Error Rendering
// ============================================================================
//
// Every failure leaves the API as { error_code, message, status } with the
// HTTP status taken from the error's kind.
//
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error_code: String,
    pub message: String,
    pub status: u16,
}

fn status_of(kind: ErrorKind) -> StatusCode {
    StatusCode::from_u16(kind.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn render(status: StatusCode, code: &str, message: String) -> HttpResponse {
    HttpResponse::build(status).json(ErrorBody {
        error_code: code.to_string(),
        message,
        status: status.as_u16(),
    })
}

impl ResponseError for AccountError {
    fn status_code(&self) -> StatusCode {
        status_of(self.kind())
    }

    fn error_response(&self) -> HttpResponse {
        render(self.status_code(), self.code(), self.to_string())
    }
}

impl ResponseError for CustomerError {
    fn status_code(&self) -> StatusCode {
        status_of(self.kind())
    }

    fn error_response(&self) -> HttpResponse {
        render(self.status_code(), self.code(), self.to_string())
    }
}

/// Malformed JSON bodies get the same error shape as domain errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        let response = render(StatusCode::BAD_REQUEST, "INVALID_REQUEST", err.to_string());
        actix_web::error::InternalError::from_response(err, response).into()
    })
}
