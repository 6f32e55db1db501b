//! Caller identity.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;

use crate::error::ApiError;

/// Header carrying the authenticated user's id, set by the gateway in front
/// of this service.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated purchaser making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?;

        raw.to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(UserId::new)
            .filter(UserId::is_valid)
            .map(Caller)
            .ok_or_else(|| ApiError::Unauthorized(format!("malformed {USER_ID_HEADER} header")))
    }
}
