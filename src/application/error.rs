use std::error::Error as StdError;

use axum::{http::StatusCode, response::Response};
use thiserror::Error;

use crate::{domain::error::DomainError, infra::error::InfraError};

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Diagnostic chain attached to error responses for the logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    BadRequest,
    Internal,
}

/// Error returned by the catalog services.
///
/// The variant is the error kind; each carries a human-readable message and
/// the collaborator or policy failure that caused it, if any.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{message}")]
    NotFound {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
    #[error("{message}")]
    Unauthorized {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
    #[error("{message}")]
    BadRequest {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
    #[error("{message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl CatalogError {
    pub fn not_found(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::NotFound {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn unauthorized(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Unauthorized {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn bad_request(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::BadRequest {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn internal(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Wrap a policy failure, choosing the kind from the failure.
    pub fn policy(message: impl Into<String>, error: DomainError) -> Self {
        let message = message.into();
        match error {
            DomainError::NotFound { .. } => Self::not_found(message, error),
            DomainError::NotOwner | DomainError::MerchantNotVerified => {
                Self::unauthorized(message, error)
            }
            DomainError::ReservedCategory { .. }
            | DomainError::PageOutOfRange { .. }
            | DomainError::Validation { .. } => Self::bad_request(message, error),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::BadRequest { .. } => ErrorKind::BadRequest,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::NotFound { message, .. }
            | Self::Unauthorized { message, .. }
            | Self::BadRequest { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    /// The policy failure behind this error, when there is one.
    pub fn domain(&self) -> Option<&DomainError> {
        let source = match self {
            Self::NotFound { source, .. }
            | Self::Unauthorized { source, .. }
            | Self::BadRequest { source, .. }
            | Self::Internal { source, .. } => source.as_ref()?,
        };
        source.downcast_ref::<DomainError>()
    }
}

/// Top-level error for the `pasar` binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
