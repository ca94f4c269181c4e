use crate::errors::{ResultResp, ServerError};
use astra::{Body, Response, ResponseBuilder};
use serde::Serialize;

/// 200 response with a JSON body.
pub fn json_response<T: Serialize>(value: &T) -> ResultResp {
    let body = serde_json::to_string(value).map_err(|e| {
        eprintln!("serialize response failed: {e}");
        ServerError::InternalError
    })?;

    ResponseBuilder::new()
        .status(200)
        .header("Content-Type", "application/json; charset=utf-8")
        .body(Body::from(body))
        .map_err(|_| ServerError::InternalError)
}

/// Plain-text response, used for status messages like the original
/// cloud functions ("Listing updated successfully", "Unauthorized", ...).
pub fn text_response(status: u16, message: &str) -> ResultResp {
    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Body::from(message.to_string()))
        .map_err(|_| ServerError::InternalError)
}

/// Convert a ServerError into the plain-text response the client sees.
pub fn error_to_response(err: ServerError) -> Response {
    ResponseBuilder::new()
        .status(err.status())
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Body::from(err.to_string()))
        .unwrap_or_else(|_| Response::new(Body::from("Internal Server Error".to_string())))
}
