use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;

use crate::error::ApiError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// API key protection for `/api` routes. Without a configured key the
/// service runs open, for local and in-cluster use.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    #[allow(dead_code)]
    pub subject: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AuthConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AuthConfig::from_ref(state);
        authorize_api_key(parts, &config)
    }
}

fn authorize_api_key(parts: &Parts, config: &AuthConfig) -> Result<AuthUser, ApiError> {
    let Some(expected) = config.api_key.as_deref() else {
        return Ok(AuthUser {
            subject: "anonymous".to_string(),
        });
    };

    let provided = parts
        .headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing X-API-Key header".into()))?;

    if provided != expected {
        return Err(ApiError::Unauthorized("invalid API key".into()));
    }

    Ok(AuthUser {
        subject: "api_key".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(api_key: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/match-jobs");
        if let Some(key) = api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn open_mode_accepts_anonymous_requests() {
        let user = authorize_api_key(&parts(None), &AuthConfig::default()).unwrap();
        assert_eq!(user.subject, "anonymous");
    }

    #[test]
    fn rejects_missing_and_wrong_keys() {
        let config = AuthConfig {
            api_key: Some("secret".into()),
        };

        assert!(matches!(
            authorize_api_key(&parts(None), &config),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            authorize_api_key(&parts(Some("nope")), &config),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(authorize_api_key(&parts(Some("secret")), &config).is_ok());
    }
}
