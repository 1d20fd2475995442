// Common test utilities and helpers

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::AppState;
use crate::middleware::RequestContext;
use crate::models::{AssignedRight, PermissionFlags, Right, Role, RoleListRequest};
use crate::services::RightsBackend;
use crate::utils::{ApiError, ApiResult};

/// In-process stand-in for the rights backend.
///
/// Mutations are applied to an in-memory assignment table so re-fetches see
/// them. Individual rights can be made to fail, and fetches can be delayed
/// per role to reproduce out-of-order responses.
#[derive(Default)]
pub struct MockRightsBackend {
    pub rights: Mutex<Vec<Right>>,
    pub roles: Vec<Role>,
    pub assigned: Mutex<HashMap<i64, Vec<AssignedRight>>>,
    pub failing_rights: Mutex<HashSet<i64>>,
    pub fail_catalog: Mutex<bool>,
    pub fail_assigned_fetch: Mutex<bool>,
    pub fetch_delays: Mutex<HashMap<i64, Duration>>,
    pub calls: Mutex<Vec<String>>,
    pub role_requests: Mutex<Vec<RoleListRequest>>,
}

impl MockRightsBackend {
    pub fn fail_right(&self, right_id: i64) {
        self.failing_rights.lock().unwrap().insert(right_id);
    }

    pub fn delay_role(&self, role_id: i64, delay: Duration) {
        self.fetch_delays.lock().unwrap().insert(role_id, delay);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutation_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("add") || c.starts_with("update") || c.starts_with("delete"))
            .collect()
    }

    pub fn assigned_for(&self, role_id: i64) -> Vec<AssignedRight> {
        self.assigned.lock().unwrap().get(&role_id).cloned().unwrap_or_default()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_right(&self, right_id: i64) -> ApiResult<()> {
        if self.failing_rights.lock().unwrap().contains(&right_id) {
            return Err(ApiError::backend_error(format!("Right {} is locked", right_id)));
        }
        Ok(())
    }

    fn upsert(&self, role_id: i64, right_id: i64, flags: PermissionFlags) {
        let mut assigned = self.assigned.lock().unwrap();
        let rows = assigned.entry(role_id).or_default();
        rows.retain(|a| a.right_id != right_id);
        rows.push(AssignedRight::new(role_id, right_id, flags));
    }
}

#[async_trait]
impl RightsBackend for MockRightsBackend {
    async fn fetch_all_rights(&self) -> ApiResult<Vec<Right>> {
        self.record("GetAllRights".to_string());
        if *self.fail_catalog.lock().unwrap() {
            return Err(ApiError::backend_unavailable("connection refused"));
        }
        Ok(self.rights.lock().unwrap().clone())
    }

    async fn fetch_roles(&self, request: &RoleListRequest) -> ApiResult<Vec<Role>> {
        self.record("GetList".to_string());
        self.role_requests.lock().unwrap().push(request.clone());
        Ok(self.roles.clone())
    }

    async fn fetch_assigned_rights(&self, role_id: i64) -> ApiResult<Vec<AssignedRight>> {
        self.record(format!("GetAllRightsToRole:{}", role_id));
        let delay = self.fetch_delays.lock().unwrap().get(&role_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.fail_assigned_fetch.lock().unwrap() {
            return Err(ApiError::backend_unavailable("connection reset"));
        }
        Ok(self.assigned_for(role_id))
    }

    async fn add_right_to_role(
        &self,
        role_id: i64,
        right_id: i64,
        flags: PermissionFlags,
    ) -> ApiResult<()> {
        self.record(format!("add:{}:{}", role_id, right_id));
        self.check_right(right_id)?;
        self.upsert(role_id, right_id, flags);
        Ok(())
    }

    async fn update_right_to_role(
        &self,
        role_id: i64,
        right_id: i64,
        flags: PermissionFlags,
    ) -> ApiResult<()> {
        self.record(format!("update:{}:{}", role_id, right_id));
        self.check_right(right_id)?;
        self.upsert(role_id, right_id, flags);
        Ok(())
    }

    async fn delete_right_from_role(&self, role_id: i64, right_id: i64) -> ApiResult<()> {
        self.record(format!("delete:{}:{}", role_id, right_id));
        self.check_right(right_id)?;
        if let Some(rows) = self.assigned.lock().unwrap().get_mut(&role_id) {
            rows.retain(|a| a.right_id != right_id);
        }
        Ok(())
    }
}

pub fn right(id: i64, name: &str, module: &str) -> Right {
    Right {
        right_id: id,
        right_code: format!("R{}", id),
        table_name: Some(format!("tbl_{}", id)),
        display_name: name.to_string(),
        description: Some(format!("{} screen", name)),
        module: module.to_string(),
        category: None,
        is_active: true,
    }
}

pub fn role(id: i64, name: &str) -> Role {
    Role {
        role_id: id,
        company_id: Some(1),
        role_name: name.to_string(),
        description: None,
        is_system_role: false,
        is_active: true,
        version: Some(1),
        extra: Default::default(),
    }
}

pub fn ctx(user_id: i64) -> RequestContext {
    RequestContext { user_id, company_id: Some(1) }
}

/// Catalog: 1 Invoices, 2 Receipts (Billing), 3 Job Orders, 4 Fund Requests (Operations).
/// Roles 5 and 6. Role 5 holds right 2 with all flags and right 3 with read-only flags.
pub fn create_mock_backend() -> Arc<MockRightsBackend> {
    let backend = MockRightsBackend {
        rights: Mutex::new(vec![
            right(1, "Invoices", "Billing"),
            right(2, "Receipts", "Billing"),
            right(3, "Job Orders", "Operations"),
            right(4, "Fund Requests", "Operations"),
        ]),
        roles: vec![role(5, "Accountant"), role(6, "Dispatcher")],
        ..Default::default()
    };

    let read_only = PermissionFlags { allow_get_list: true, ..PermissionFlags::none() };
    backend.assigned.lock().unwrap().insert(
        5,
        vec![
            AssignedRight::new(5, 2, PermissionFlags::all()),
            AssignedRight::new(5, 3, read_only),
        ],
    );
    backend
        .assigned
        .lock()
        .unwrap()
        .insert(6, vec![AssignedRight::new(6, 4, PermissionFlags::all())]);

    Arc::new(backend)
}

pub fn create_test_state(backend: Arc<MockRightsBackend>) -> AppState {
    AppState::new(backend, 100)
}
