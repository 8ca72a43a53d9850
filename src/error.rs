//! Error handler for the HRIS API.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use sqlx::Error as SQLxError;
use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

pub type Result<T> = std::result::Result<T, ServerError>;

const SERVER_ERROR: &str = "Server Error";
const UNAUTHENTICATED: &str = "Unauthenticated.";

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    /// Body validation, `fields` giving the order rules are declared in.
    #[error("validation error occurred")]
    Form {
        errors: ValidationErrors,
        fields: &'static [&'static str],
    },

    #[error(transparent)]
    Axum(#[from] JsonRejection),

    #[error("SQL request failed: {0}")]
    Sql(#[from] SQLxError),

    #[error(transparent)]
    Crypto(#[from] crate::crypto::CryptoError),

    #[error("internal server error, {details}")]
    Internal {
        details: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("invalid 'Authorization' header")]
    Unauthorized,
}

/// JSON body returned on every error.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
    #[serde(skip)]
    status: u16,
}

impl ResponseError {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code.as_u16();
        self
    }

    /// Update `message` field.
    pub fn message(mut self, message: &str) -> Self {
        self.message = message.into();
        self
    }

    /// Fill `errors` and derive `message` from the first one.
    pub fn errors(self, errors: &ValidationErrors) -> Self {
        self.ordered_errors(errors, &[])
    }

    /// Fill `errors`. `message` comes from the first field of `order` with
    /// an error, then from the remaining fields in lexical order.
    pub fn ordered_errors(
        mut self,
        errors: &ValidationErrors,
        order: &[&str],
    ) -> Self {
        let fields = parse_validation_errors(errors);
        let total: usize = fields.values().map(Vec::len).sum();
        let first = order
            .iter()
            .filter_map(|field| fields.get(*field))
            .chain(fields.values())
            .flatten()
            .next();

        if let Some(first) = first {
            self.message = match total - 1 {
                0 => first.clone(),
                1 => format!("{first} (and 1 more error)"),
                n => format!("{first} (and {n} more errors)"),
            };
        }

        self.errors = Some(fields);
        self
    }

    /// Transform [`ResponseError`] into axum [`Response`].
    pub fn into_response(
        self,
    ) -> std::result::Result<Response, axum::http::Error> {
        if let Ok(body) = serde_json::to_string(&self) {
            Response::builder()
                .status(self.status)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
        } else {
            Ok(internal_server_error())
        }
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            message: SERVER_ERROR.to_owned(),
            errors: None,
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        }
    }
}

fn parse_validation_errors(
    errors: &ValidationErrors,
) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .iter()
        .map(|(field, issues)| {
            let messages = issues
                .iter()
                .map(|issue| {
                    issue
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| issue.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

/// Build a single-field [`ValidationErrors`].
pub fn field_error(
    field: &'static str,
    code: &'static str,
    message: &'static str,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(field, ValidationError::new(code).with_message(message.into()));
    errors
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let response = ResponseError::default()
            .message(&self.to_string())
            .status(StatusCode::BAD_REQUEST);

        let response = match &self {
            ServerError::Validation(validation_errors) => response
                .status(StatusCode::UNPROCESSABLE_ENTITY)
                .errors(validation_errors),

            ServerError::Form { errors, fields } => response
                .status(StatusCode::UNPROCESSABLE_ENTITY)
                .ordered_errors(errors, fields),

            ServerError::Axum(rejection) => response
                .status(rejection.status())
                .message(&rejection.body_text()),

            ServerError::Unauthorized => response
                .message(UNAUTHENTICATED)
                .status(StatusCode::UNAUTHORIZED),

            ServerError::Sql(err) => {
                tracing::error!(error = %err, "database request failed");
                ResponseError::default()
            },

            ServerError::Crypto(err) => {
                tracing::error!(error = %err, "cryptographic operation failed");
                ResponseError::default()
            },

            ServerError::Internal { details, source } => {
                tracing::error!(err = ?source, %details, "server returned 500 status");
                ResponseError::default()
            },
        };

        response
            .into_response()
            .unwrap_or_else(|_| internal_server_error())
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(
            serde_json::json!({ "message": SERVER_ERROR })
                .to_string()
                .into(),
        )
        .unwrap_or_else(|_| Response::new(SERVER_ERROR.into()))
}
