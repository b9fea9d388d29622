use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

#[derive(Debug, thiserror::Error)]
pub enum BazarError {
    #[error("upstream unreachable: {url}")]
    UpstreamUnreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("upstream returned non-JSON: {url}")]
    NonJsonUpstream { url: String },

    #[error("Book not found")]
    BookNotFound(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unable to serialize: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("All order replicas are down")]
    AllReplicasDown,
}

/// Boundary translation required by the protocol: dependency failures become
/// JSON error payloads with a 502/503 status, local store failures a 500,
/// never a raw error propagated to the client.
impl IntoResponse for BazarError {
    fn into_response(self) -> Response {
        let status = match &self {
            BazarError::UpstreamUnreachable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            BazarError::NonJsonUpstream { .. } => StatusCode::BAD_GATEWAY,
            BazarError::BookNotFound(_) => StatusCode::NOT_FOUND,
            BazarError::Io(_) | BazarError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BazarError::AllReplicasDown => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
