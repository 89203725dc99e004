use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use zeroapp_core::criteria::CompileError;
use zeroapp_core::store::StoreError;
use zeroapp_fiql::ParseError;

/// API error type that maps core errors to structured JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// The `q` filter string failed to parse; carries the original query so
    /// the client sees exactly what was rejected.
    #[error("invalid filter query: {source}")]
    QueryParse { source: ParseError, query: String },

    /// The filter parsed but failed schema validation or coercion.
    #[error("invalid filter query: {source}")]
    QueryCompile { source: CompileError, query: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn parse(source: ParseError, query: &str) -> Self {
        ApiError::QueryParse {
            source,
            query: query.to_string(),
        }
    }

    pub fn compile(source: CompileError, query: &str) -> Self {
        ApiError::QueryCompile {
            source,
            query: query.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message, query) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "notFound", msg.clone(), None),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "badRequest", msg.clone(), None)
            }
            ApiError::QueryParse { source, query } => {
                let error_type = match source {
                    ParseError::MalformedExpression { .. } => "malformedExpression",
                    ParseError::UnknownOperator(_) => "unknownOperator",
                };
                (
                    StatusCode::BAD_REQUEST,
                    error_type,
                    source.to_string(),
                    Some(query.clone()),
                )
            }
            ApiError::QueryCompile { source, query } => {
                let error_type = match source {
                    CompileError::UnknownField { .. } => "unknownField",
                    CompileError::UnsupportedOperator { .. } => "unsupportedOperator",
                    CompileError::TypeMismatch { .. } => "typeMismatch",
                };
                (
                    StatusCode::BAD_REQUEST,
                    error_type,
                    source.to_string(),
                    Some(query.clone()),
                )
            }
            ApiError::Store(StoreError::NotFound { .. }) => (
                StatusCode::NOT_FOUND,
                "notFound",
                self.to_string(),
                None,
            ),
            ApiError::Store(StoreError::Database(err)) => {
                tracing::error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internalError",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internalError",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "error": {
                "type": error_type,
                "message": message,
                "statusCode": status.as_u16(),
            }
        });
        if let Some(query) = query {
            body["error"]["query"] = json!(query);
        }

        (status, Json(body)).into_response()
    }
}

/// Convenience type alias for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_maps_to_kind_and_keeps_query() {
        let err = ApiError::parse(ParseError::UnknownOperator("=lt=".into()), "age=lt=55");
        match err {
            ApiError::QueryParse { query, .. } => assert_eq!(query, "age=lt=55"),
            other => panic!("unexpected variant {other:?}"),
        }
    }

    #[test]
    fn store_not_found_is_not_found() {
        let err = ApiError::from(StoreError::NotFound {
            entity: "user".into(),
            id: 7,
        });
        assert!(err.to_string().contains("user"));
    }
}
