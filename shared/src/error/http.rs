//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound | Self::OrderNotFound | Self::MenuItemNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict (stale client view or allocation race, client may retry)
            Self::OrderInvalidStatus
            | Self::OrderDuplicateId
            | Self::MenuItemNameExists => StatusCode::CONFLICT,

            // 422 Unprocessable (request is well-formed but the menu moved on)
            Self::MenuItemUnavailable | Self::PriceMismatch | Self::OrderSequenceExhausted => {
                StatusCode::UNPROCESSABLE_ENTITY
            }

            // 503/504 (transient errors, client can retry)
            Self::TimeoutError => StatusCode::GATEWAY_TIMEOUT,

            // 500 Internal Server Error
            Self::Unknown
            | Self::InternalError
            | Self::DatabaseError
            | Self::CacheError => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
