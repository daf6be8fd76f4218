use actix_web::body::BoxBody;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use spendguard_repo::catalog_repo::CatalogRepoError;
use spendguard_repo::transaction_repo::TransactionRepoError;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

static EXPOSE_ERROR_DETAIL: AtomicBool = AtomicBool::new(false);

/// When enabled, 500 responses carry the internal error message. Clients in
/// production only see the generic "Failed to <operation>" message.
pub fn set_development_mode(enabled: bool) {
    EXPOSE_ERROR_DETAIL.store(enabled, Ordering::Relaxed);
}

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Missing required fields")]
    Validation(BTreeMap<&'static str, Vec<String>>),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Failed to {operation}")]
    Internal {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ResponseError for HandlerError {
    fn status_code(&self) -> StatusCode {
        match self {
            HandlerError::Validation(_) | HandlerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HandlerError::NotFound(_) => StatusCode::NOT_FOUND,
            HandlerError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        match self {
            HandlerError::Validation(errors) => HttpResponse::BadRequest().json(json!({
                "message": "Missing required fields",
                "errors": errors,
            })),
            HandlerError::BadRequest(message) => {
                HttpResponse::BadRequest().json(json!({ "message": message }))
            }
            HandlerError::NotFound(message) => {
                HttpResponse::NotFound().json(json!({ "message": message }))
            }
            HandlerError::Internal { operation, source } => {
                tracing::error!(operation, error = %source, "request failed");
                let mut body = json!({ "message": format!("Failed to {}", operation) });
                if EXPOSE_ERROR_DETAIL.load(Ordering::Relaxed) {
                    body["error"] = json!(format!("{:#}", source));
                }
                HttpResponse::InternalServerError().json(body)
            }
        }
    }
}

pub(crate) fn transaction_error(
    error: TransactionRepoError,
    operation: &'static str,
) -> HandlerError {
    match error {
        TransactionRepoError::TransactionNotFound(_) => {
            HandlerError::NotFound("Transaction not found".to_string())
        }
        TransactionRepoError::InvalidCategory(name) => {
            HandlerError::BadRequest(format!("Unknown category {:?}", name))
        }
        TransactionRepoError::InvalidReference => {
            HandlerError::BadRequest("Invalid category or account reference".to_string())
        }
        TransactionRepoError::AlreadyExists => {
            HandlerError::BadRequest("Transaction already exists".to_string())
        }
        TransactionRepoError::Other(source) => HandlerError::Internal { operation, source },
    }
}

pub(crate) fn catalog_error(
    error: CatalogRepoError,
    entity: &'static str,
    operation: &'static str,
) -> HandlerError {
    match error {
        CatalogRepoError::NotFound(_) => HandlerError::NotFound(format!("{} not found", entity)),
        CatalogRepoError::NameTaken(_) => {
            HandlerError::BadRequest(format!("{} name already exists", entity))
        }
        CatalogRepoError::InUse(_) => HandlerError::BadRequest(format!(
            "Cannot delete {} with existing transactions",
            entity.to_lowercase()
        )),
        CatalogRepoError::Other(source) => HandlerError::Internal { operation, source },
    }
}
