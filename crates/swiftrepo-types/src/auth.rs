use serde::{Deserialize, Serialize};

/// Authentication scheme used to open a Swift account.
///
/// Keystone is the only scheme that carries extra configuration; the tenant
/// fields are passed through to the token request as-is (empty strings are
/// omitted).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMethod {
    #[default]
    Basic,
    TempAuth,
    Keystone { tenant_name: String, tenant_id: String },
}

impl AuthMethod {
    /// Map a settings string onto an auth method.
    ///
    /// Matching is case-insensitive. Anything other than `keystone` or
    /// `tempauth` (including the empty string) selects [`AuthMethod::Basic`].
    pub fn from_setting(method: &str, tenant_name: &str, tenant_id: &str) -> Self {
        match method.trim().to_ascii_lowercase().as_str() {
            "keystone" => Self::Keystone {
                tenant_name: tenant_name.to_string(),
                tenant_id: tenant_id.to_string(),
            },
            "tempauth" => Self::TempAuth,
            _ => Self::Basic,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::TempAuth => "tempauth",
            Self::Keystone { .. } => "keystone",
        }
    }
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
