use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};

use crate::utils::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const COMPANY_ID_HEADER: &str = "x-company-id";

/// Caller identity passed explicitly with every request.
///
/// Authentication happens upstream; this service only needs to know whose
/// editor session a request belongs to and which company's roles to list.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct RequestContext {
    pub user_id: i64,
    pub company_id: Option<i64>,
}

impl RequestContext {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let user_id = headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::validation_error("Missing X-User-Id header"))?
            .trim()
            .parse::<i64>()
            .map_err(|_| ApiError::validation_error("X-User-Id must be an integer"))?;

        let company_id = match headers.get(COMPANY_ID_HEADER) {
            None => None,
            Some(value) => Some(
                value
                    .to_str()
                    .ok()
                    .and_then(|v| v.trim().parse::<i64>().ok())
                    .ok_or_else(|| ApiError::validation_error("X-Company-Id must be an integer"))?,
            ),
        };

        Ok(Self { user_id, company_id })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = Self::from_headers(&parts.headers).map_err(|err| {
            tracing::warn!("Rejected {} {}: {}", parts.method, parts.uri.path(), err);
            err
        })?;
        tracing::debug!(
            "Request context for {} {}: user {} (company: {:?})",
            parts.method,
            parts.uri.path(),
            ctx.user_id,
            ctx.company_id
        );
        Ok(ctx)
    }
}
