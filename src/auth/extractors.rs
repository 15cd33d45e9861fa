use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use tracing::warn;

use super::claims::Claims;
use crate::{config::AuthConfig, error::AppError, state::AppState};

/// Caller identity established by the auth provider's session token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Read Authorization header
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(AppError::Unauthorized)?;

        let claims = verify_session_token(&state.config.auth, token).map_err(|e| {
            warn!(error = %e, "invalid or expired session token");
            AppError::Unauthorized
        })?;

        if claims.sub.trim().is_empty() {
            return Err(AppError::Unauthorized);
        }

        Ok(AuthUser {
            user_id: claims.sub,
            email: claims.email.unwrap_or_default(),
        })
    }
}

pub fn verify_session_token(cfg: &AuthConfig, token: &str) -> anyhow::Result<Claims> {
    let mut validation = Validation::default();
    match &cfg.audience {
        Some(aud) => validation.set_audience(std::slice::from_ref(aud)),
        None => validation.validate_aud = false,
    }
    if let Some(iss) = &cfg.issuer {
        validation.set_issuer(std::slice::from_ref(iss));
    }
    let decoding = DecodingKey::from_secret(cfg.secret.as_bytes());
    let data = decode::<Claims>(token, &decoding, &validation)?;
    Ok(data.claims)
}
