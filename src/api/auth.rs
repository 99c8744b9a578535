//! Owner identity extraction.
//!
//! The gateway in front of this service authenticates callers and forwards
//! the owner id in `X-Owner-Id`.

use axum::extract::FromRequestParts;
use axum::http::header::HeaderName;
use axum::http::request::Parts;
use uuid::Uuid;

use super::error::ApiErrorResponse;
use crate::domain::OwnerId;

/// Header carrying the owner resolved by the upstream gateway.
pub static OWNER_ID_HEADER: HeaderName = HeaderName::from_static("x-owner-id");

// =============================================================================
// AuthenticatedOwner Extractor
// =============================================================================

/// The owner on whose behalf a request runs.
///
/// Rejects with 401 when the header is missing or not a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedOwner(pub OwnerId);

impl AuthenticatedOwner {
    #[must_use]
    pub const fn owner_id(&self) -> &OwnerId {
        &self.0
    }
}

impl<State> FromRequestParts<State> for AuthenticatedOwner
where
    State: Send + Sync,
{
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &State,
    ) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(&OWNER_ID_HEADER)
            .ok_or_else(|| ApiErrorResponse::unauthorized("Missing X-Owner-Id header"))?;

        value
            .to_str()
            .ok()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .map(|uuid| Self(OwnerId::from_uuid(uuid)))
            .ok_or_else(|| {
                tracing::debug!("Rejected malformed X-Owner-Id header");
                ApiErrorResponse::unauthorized("Invalid X-Owner-Id header")
            })
    }
}
