use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub role_id: i64,
    #[serde(default)]
    pub company_id: Option<i64>,
    #[serde(default)]
    pub role_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_system_role: bool,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub version: Option<i64>,
    /// Backend columns not modelled above, passed through untouched
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Body of `POST /Role/GetList`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleListRequest {
    pub select: String,
    #[serde(rename = "where")]
    pub r#where: String,
    pub sort_on: String,
    pub page: u32,
    pub page_size: u32,
}

impl RoleListRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            select: String::new(),
            r#where: String::new(),
            sort_on: "roleName".to_string(),
            page,
            page_size,
        }
    }

    pub fn for_company(mut self, company_id: Option<i64>) -> Self {
        if let Some(company_id) = company_id {
            self.r#where = format!("companyId = {}", company_id);
        }
        self
    }
}

#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoleListQuery {
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 1000))]
    pub page_size: Option<u32>,
}
