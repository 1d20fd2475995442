use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Catalog entry describing one grantable right
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Right {
    pub right_id: i64,
    #[serde(default)]
    pub right_code: String,
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// The five per-action flags carried by a role/right association
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionFlags {
    pub allow_insert: bool,
    pub allow_update: bool,
    pub allow_delete: bool,
    pub allow_get_list: bool,
    pub allow_print: bool,
}

impl PermissionFlags {
    pub const fn all() -> Self {
        Self {
            allow_insert: true,
            allow_update: true,
            allow_delete: true,
            allow_get_list: true,
            allow_print: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            allow_insert: false,
            allow_update: false,
            allow_delete: false,
            allow_get_list: false,
            allow_print: false,
        }
    }

    /// Copy with a single flag changed
    pub fn with(mut self, flag: PermissionFlag, value: bool) -> Self {
        match flag {
            PermissionFlag::AllowInsert => self.allow_insert = value,
            PermissionFlag::AllowUpdate => self.allow_update = value,
            PermissionFlag::AllowDelete => self.allow_delete = value,
            PermissionFlag::AllowGetList => self.allow_get_list = value,
            PermissionFlag::AllowPrint => self.allow_print = value,
        }
        self
    }

    /// Query parameters in the order the backend expects them
    pub fn as_query(&self) -> [(&'static str, bool); 5] {
        [
            ("allowInsert", self.allow_insert),
            ("allowUpdate", self.allow_update),
            ("allowDelete", self.allow_delete),
            ("allowGetList", self.allow_get_list),
            ("allowPrint", self.allow_print),
        ]
    }
}

impl Default for PermissionFlags {
    fn default() -> Self {
        Self::none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum PermissionFlag {
    AllowInsert,
    AllowUpdate,
    AllowDelete,
    AllowGetList,
    AllowPrint,
}

/// Server-confirmed association between a role and a right
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignedRight {
    pub role_id: i64,
    pub right_id: i64,
    #[serde(default)]
    pub allow_insert: bool,
    #[serde(default)]
    pub allow_update: bool,
    #[serde(default)]
    pub allow_delete: bool,
    #[serde(default)]
    pub allow_get_list: bool,
    #[serde(default)]
    pub allow_print: bool,
}

impl AssignedRight {
    pub fn flags(&self) -> PermissionFlags {
        PermissionFlags {
            allow_insert: self.allow_insert,
            allow_update: self.allow_update,
            allow_delete: self.allow_delete,
            allow_get_list: self.allow_get_list,
            allow_print: self.allow_print,
        }
    }

    pub fn new(role_id: i64, right_id: i64, flags: PermissionFlags) -> Self {
        Self {
            role_id,
            right_id,
            allow_insert: flags.allow_insert,
            allow_update: flags.allow_update,
            allow_delete: flags.allow_delete,
            allow_get_list: flags.allow_get_list,
            allow_print: flags.allow_print,
        }
    }
}
