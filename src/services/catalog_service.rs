use std::sync::Arc;
use tokio::sync::RwLock;

use crate::middleware::RequestContext;
use crate::models::{Right, Role, RoleListRequest};
use crate::services::rights_client::RightsBackend;
use crate::utils::ApiResult;

/// Reference data shared by all editor sessions.
///
/// The rights catalog is fetched once and kept for the process lifetime
/// unless explicitly refreshed. Roles are always read through.
pub struct CatalogService {
    backend: Arc<dyn RightsBackend>,
    rights: RwLock<Option<Arc<Vec<Right>>>>,
    role_page_size: u32,
}

impl CatalogService {
    pub fn new(backend: Arc<dyn RightsBackend>, role_page_size: u32) -> Self {
        Self { backend, rights: RwLock::new(None), role_page_size }
    }

    /// Rights catalog, fetched on first use
    pub async fn list_rights(&self) -> ApiResult<Arc<Vec<Right>>> {
        if let Some(rights) = self.rights.read().await.as_ref() {
            return Ok(Arc::clone(rights));
        }

        let mut cache = self.rights.write().await;
        // Another request may have filled the cache while we waited
        if let Some(rights) = cache.as_ref() {
            return Ok(Arc::clone(rights));
        }

        let rights = Arc::new(self.backend.fetch_all_rights().await?);
        tracing::info!("Rights catalog loaded: {} rights", rights.len());
        *cache = Some(Arc::clone(&rights));
        Ok(rights)
    }

    /// Force a refetch. On failure the cached catalog stays as it was.
    pub async fn refresh_rights(&self) -> ApiResult<Arc<Vec<Right>>> {
        let rights = match self.backend.fetch_all_rights().await {
            Ok(rights) => Arc::new(rights),
            Err(e) => {
                tracing::warn!("Rights catalog refresh failed, keeping cached copy: {}", e);
                return Err(e);
            },
        };

        *self.rights.write().await = Some(Arc::clone(&rights));
        tracing::info!("Rights catalog refreshed: {} rights", rights.len());
        Ok(rights)
    }

    pub async fn list_roles(
        &self,
        ctx: &RequestContext,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> ApiResult<Vec<Role>> {
        let request = RoleListRequest::new(
            page.unwrap_or(1),
            page_size.unwrap_or(self.role_page_size),
        )
        .for_company(ctx.company_id);

        tracing::debug!(
            "Listing roles for user {} (company: {:?}, page {}, size {})",
            ctx.user_id,
            ctx.company_id,
            request.page,
            request.page_size
        );
        self.backend.fetch_roles(&request).await
    }
}
