use serde::{Deserialize, Serialize};

use crate::{error::AppError, middleware::auth::AuthUser};

/// Role carried in the principal's token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Staff => "staff",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "customer" => Some(Role::Customer),
            "staff" => Some(Role::Staff),
            _ => None,
        }
    }
}

/// Operations that are not open to every principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ManageCatalog,
    ModerateReviews,
    ManageTags,
    ManageInventory,
    ViewAllOrders,
    UpdateOrders,
    DeleteOrders,
    ViewCustomers,
}

pub fn allows(role: Role, capability: Capability) -> bool {
    match role {
        Role::Staff => true,
        Role::Customer => match capability {
            Capability::ManageCatalog
            | Capability::ModerateReviews
            | Capability::ManageTags
            | Capability::ManageInventory
            | Capability::ViewAllOrders
            | Capability::UpdateOrders
            | Capability::DeleteOrders
            | Capability::ViewCustomers => false,
        },
    }
}

pub fn ensure(user: &AuthUser, capability: Capability) -> Result<(), AppError> {
    if !allows(user.role, capability) {
        tracing::debug!(user_id = user.user_id, ?capability, "capability denied");
        return Err(AppError::Forbidden);
    }
    Ok(())
}
