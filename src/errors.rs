use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use crate::response::Envelope;

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// Store or transport failure, annotated with the statement that failed.
    DatabaseError {
        /// The SQL statement that was executed.
        statement: String,
        /// The bound parameters, rendered for diagnostics.
        params: String,
        /// The driver error.
        source: sqlx::Error,
    },
    /// Entity missing or inactive.
    NotFound(String),
    /// Bad request error (invalid or missing input).
    BadRequest(String),
    /// No handler matches the request.
    RouteNotFound {
        /// HTTP method of the request.
        method: String,
        /// Requested path.
        path: String,
    },
    /// Internal server error.
    InternalError(String),
    /// A remote API call failed or answered unexpectedly.
    ExternalApiError(String),
    /// Error with a client-facing description of the failed operation.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// Wraps a driver error together with the statement that produced it.
    pub fn database(
        statement: impl Into<String>,
        params: impl Into<String>,
        source: sqlx::Error,
    ) -> Self {
        AppError::DatabaseError {
            statement: statement.into(),
            params: params.into(),
            source,
        }
    }

    /// HTTP status the error renders with.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DatabaseError { .. } | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::NotFound(_) | AppError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ExternalApiError(_) => StatusCode::BAD_GATEWAY,
            AppError::WithContext { source, .. } => source.status(),
        }
    }

    /// Message shown to clients in the envelope's `message` field.
    fn public_message(&self) -> String {
        match self {
            AppError::DatabaseError { .. } => "Erro ao acessar o banco de dados".to_string(),
            AppError::NotFound(msg) | AppError::BadRequest(msg) => msg.clone(),
            AppError::RouteNotFound { method, path } => {
                format!("Endpoint {} {} não encontrado", method, path)
            }
            AppError::InternalError(_) => "Erro interno do servidor".to_string(),
            AppError::ExternalApiError(_) => "Erro ao comunicar com serviço externo".to_string(),
            AppError::WithContext { source, context } => match source.as_ref() {
                // Client errors keep their own message; the context only names server failures.
                AppError::NotFound(_) | AppError::BadRequest(_) => source.public_message(),
                _ => context.clone(),
            },
        }
    }

    /// Textual detail for the envelope's `error` field. Statements and
    /// parameters stay in the server log.
    fn public_detail(&self) -> Option<String> {
        match self {
            AppError::DatabaseError { source, .. } => Some(source.to_string()),
            AppError::InternalError(msg) | AppError::ExternalApiError(msg) => Some(msg.clone()),
            AppError::WithContext { source, .. } => source.public_detail(),
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError {
                statement,
                params,
                source,
            } => write!(
                f,
                "Database error: {} (statement: {}, params: {})",
                source,
                statement.split_whitespace().collect::<Vec<_>>().join(" "),
                params
            ),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::RouteNotFound { method, path } => {
                write!(f, "No route for {} {}", method, path)
            }
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::ExternalApiError(msg) => write!(f, "External API error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::DatabaseError { source, .. } => Some(source),
            AppError::WithContext { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    /// Converts the error into an enveloped HTTP response.
    ///
    /// Server-side failures are logged with full detail before rendering;
    /// client errors are logged at debug level only.
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("{}", self);
        }

        let body = Envelope::failure(self.public_message(), self.public_detail());

        (status, body).into_response()
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    ///
    /// # Arguments
    ///
    /// * `context` - The context message to add.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    ///
    /// # Arguments
    ///
    /// * `f` - A closure that produces the context message.
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(
            AppError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::RouteNotFound {
                method: "GET".into(),
                path: "/nope".into()
            }
            .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::database("SELECT 1", "[]", sqlx::Error::PoolTimedOut).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn context_keeps_the_source_status() {
        let err: Result<(), AppError> = Err(AppError::NotFound("Produto".into()));
        let err = err.context("Erro ao buscar produto").unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.public_message(), "Produto");
    }

    #[test]
    fn database_detail_hides_the_statement() {
        let err: Result<(), AppError> = Err(AppError::database(
            "SELECT secret FROM produtos WHERE id = $1",
            "[42]",
            sqlx::Error::PoolTimedOut,
        ));
        let err = err
            .with_context(|| "Erro ao buscar produtos no banco de dados".to_string())
            .unwrap_err();

        assert_eq!(
            err.public_message(),
            "Erro ao buscar produtos no banco de dados"
        );
        let detail = err.public_detail().unwrap();
        assert!(!detail.contains("SELECT"));
        assert!(!detail.contains("42"));
        // Full detail is kept for the server log.
        assert!(err.to_string().contains("SELECT secret FROM produtos"));
    }

    #[test]
    fn route_not_found_names_method_and_path() {
        let err = AppError::RouteNotFound {
            method: "DELETE".into(),
            path: "/api/produtos".into(),
        };
        assert_eq!(
            err.public_message(),
            "Endpoint DELETE /api/produtos não encontrado"
        );
    }
}
