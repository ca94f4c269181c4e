use astra::Response;
use std::fmt;

/// Errors originating from the server logic (routing, missing resources,
/// ownership checks) or downstream layers (DB, object storage).
#[derive(Debug)]
pub enum ServerError {
    NotFound(String),
    BadRequest(String),
    Forbidden(String),
    DbError(String),
    InternalError,
}

// Type alias commonly used by route handlers.
pub type ResultResp = Result<Response, ServerError>;

impl ServerError {
    pub fn status(&self) -> u16 {
        match self {
            ServerError::NotFound(_) => 404,
            ServerError::BadRequest(_) => 400,
            ServerError::Forbidden(_) => 403,
            ServerError::DbError(_) | ServerError::InternalError => 500,
        }
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::NotFound(msg) => write!(f, "{msg}"),
            ServerError::BadRequest(msg) => write!(f, "{msg}"),
            ServerError::Forbidden(msg) => write!(f, "{msg}"),
            ServerError::DbError(msg) => write!(f, "Database Error: {msg}"),
            ServerError::InternalError => write!(f, "Internal Server Error"),
        }
    }
}

impl std::error::Error for ServerError {}
