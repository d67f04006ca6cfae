use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::OwnerContext;

/// Header carrying the authenticated user id, set by the identity provider in front
/// of this service.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller's identity, if any. A missing header is not an error: consultation
/// routes treat it as "profile not ready yet" and do nothing. A malformed header
/// is rejected.
pub struct MaybeOwner(pub Option<OwnerContext>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeOwner
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(MaybeOwner(None));
        };
        let raw = raw
            .to_str()
            .map_err(|_| AppError::Validation(format!("{USER_ID_HEADER} must be ASCII")))?;
        let user_id = Uuid::parse_str(raw.trim())
            .map_err(|_| AppError::Validation(format!("{USER_ID_HEADER} must be a UUID")))?;
        Ok(MaybeOwner(Some(OwnerContext::new(user_id))))
    }
}
