//! HTTP client for the external rights backend
//!
//! All calls go to the `/Role/*` resource of the back-office REST API.
//! Non-success responses surface the raw response text; the backend is the
//! source of truth for semantic validation.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::BackendConfig;
use crate::models::{AssignedRight, PermissionFlags, Right, Role, RoleListRequest};
use crate::utils::{ApiError, ApiResult};

/// Collaborator contract of the rights editor
#[async_trait]
pub trait RightsBackend: Send + Sync {
    async fn fetch_all_rights(&self) -> ApiResult<Vec<Right>>;

    async fn fetch_roles(&self, request: &RoleListRequest) -> ApiResult<Vec<Role>>;

    async fn fetch_assigned_rights(&self, role_id: i64) -> ApiResult<Vec<AssignedRight>>;

    async fn add_right_to_role(
        &self,
        role_id: i64,
        right_id: i64,
        flags: PermissionFlags,
    ) -> ApiResult<()>;

    async fn update_right_to_role(
        &self,
        role_id: i64,
        right_id: i64,
        flags: PermissionFlags,
    ) -> ApiResult<()>;

    async fn delete_right_from_role(&self, role_id: i64, right_id: i64) -> ApiResult<()>;
}

pub struct HttpRightsClient {
    http_client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpRightsClient {
    pub fn new(config: &BackendConfig) -> ApiResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::internal_error(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/Role/{}", self.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send the request and fail on non-success status with the raw body
    async fn send(&self, builder: RequestBuilder, what: &str) -> ApiResult<reqwest::Response> {
        let response = self.authorize(builder).send().await.map_err(|e| {
            tracing::error!("Request to rights backend failed ({}): {}", what, e);
            ApiError::backend_unavailable(format!("{}: {}", what, e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Rights backend returned {} for {}: {}", status, what, error_text);
            let message =
                if error_text.is_empty() { format!("HTTP status: {}", status) } else { error_text };
            return Err(ApiError::backend_error(message));
        }

        Ok(response)
    }

    async fn send_json<T>(&self, builder: RequestBuilder, what: &str) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send(builder, what).await?;
        response.json::<T>().await.map_err(|e| {
            ApiError::backend_error(format!("Failed to parse response of {}: {}", what, e))
        })
    }
}

#[async_trait]
impl RightsBackend for HttpRightsClient {
    async fn fetch_all_rights(&self) -> ApiResult<Vec<Right>> {
        let rights: Vec<Right> = self
            .send_json(self.http_client.get(self.url("GetAllRights")), "GetAllRights")
            .await?;
        tracing::debug!("Fetched {} rights from backend", rights.len());
        Ok(rights)
    }

    async fn fetch_roles(&self, request: &RoleListRequest) -> ApiResult<Vec<Role>> {
        let roles: Vec<Role> = self
            .send_json(self.http_client.post(self.url("GetList")).json(request), "GetList")
            .await?;
        tracing::debug!("Fetched {} roles from backend", roles.len());
        Ok(roles)
    }

    async fn fetch_assigned_rights(&self, role_id: i64) -> ApiResult<Vec<AssignedRight>> {
        let builder = self
            .http_client
            .get(self.url("GetAllRightsToRole"))
            .query(&[("roleId", role_id)]);
        let assigned: Vec<AssignedRight> = self.send_json(builder, "GetAllRightsToRole").await?;
        tracing::debug!("Fetched {} assigned rights for role {}", assigned.len(), role_id);
        Ok(assigned)
    }

    async fn add_right_to_role(
        &self,
        role_id: i64,
        right_id: i64,
        flags: PermissionFlags,
    ) -> ApiResult<()> {
        let builder = self
            .http_client
            .post(self.url("addRightToRole"))
            .query(&[("roleId", role_id), ("rightId", right_id)])
            .query(&flags.as_query());
        self.send(builder, "addRightToRole").await?;
        tracing::info!("Added right {} to role {}", right_id, role_id);
        Ok(())
    }

    async fn update_right_to_role(
        &self,
        role_id: i64,
        right_id: i64,
        flags: PermissionFlags,
    ) -> ApiResult<()> {
        let builder = self
            .http_client
            .put(self.url("updateRightToRole"))
            .query(&[("roleId", role_id), ("rightId", right_id)])
            .query(&flags.as_query());
        self.send(builder, "updateRightToRole").await?;
        tracing::info!("Updated right {} on role {}", right_id, role_id);
        Ok(())
    }

    async fn delete_right_from_role(&self, role_id: i64, right_id: i64) -> ApiResult<()> {
        let builder = self
            .http_client
            .delete(self.url("deleteRightFromRole"))
            .query(&[("roleId", role_id), ("rightId", right_id)]);
        self.send(builder, "deleteRightFromRole").await?;
        tracing::info!("Removed right {} from role {}", right_id, role_id);
        Ok(())
    }
}
