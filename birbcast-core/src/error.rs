use thiserror::Error;

/// An inbound frame that could not be turned into a model value.
///
/// Frames failing with this error are dropped by the controllers; they never
/// reach controller state.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected frame type `{0}`")]
    UnexpectedType(String),

    #[error("invalid timestamp: {0}")]
    Timestamp(String),

    #[error("invalid count: {0}")]
    Count(String),

    #[error("invalid frame data: {0}")]
    Frame(String),
}

#[derive(Debug, Error)]
#[error("unknown transport policy `{0}` (expected `all` or `relay`)")]
pub struct UnknownTransportPolicy(pub String);
