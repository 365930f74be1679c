// =============================================================================
// Bearer Token Authentication — Supabase-verified identities
// =============================================================================
//
// Extracts the `Authorization: Bearer <token>` header and verifies the token
// against the Supabase identity endpoint, yielding the caller's user id and
// email. Usage as an Axum extractor:
//
//   async fn handler(user: CurrentUser, ...) { ... }
//
// A missing or malformed header and a token Supabase rejects both produce the
// same 401 so callers cannot probe which check failed. The only non-401
// rejection is a 500 when the service has no Supabase project configured.
// =============================================================================

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use crate::api::error::ApiError;
use crate::app_state::AppState;

/// The verified caller, available to any handler that lists it as an argument.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub email: Option<String>,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let token = match header {
            Some(value) if value.starts_with("Bearer ") => &value[7..],
            _ => return Err(ApiError::unauthorized("Invalid token")),
        };

        if !state.supabase.is_configured() {
            return Err(ApiError::internal("Supabase configuration missing"));
        }

        match state.supabase.get_user(token).await {
            Ok(principal) => Ok(CurrentUser {
                id: principal.id,
                email: principal.email,
            }),
            Err(e) => {
                warn!(error = %e, "token verification failed");
                Err(ApiError::unauthorized("Invalid token"))
            }
        }
    }
}
