//! # Authorization Policy
//!
//! One function decides whether a caller may perform an action on a target.
//! Engine operations call it after loading the target and before mutating.
//!
//! ## Rules
//! ```text
//! ┌──────────────────────┬───────────┬──────────┬─────────┐
//! │ Action               │ SalesRep  │ Manager  │ Admin   │
//! ├──────────────────────┼───────────┼──────────┼─────────┤
//! │ CreateOrder          │ ✅        │ ✅       │ ✅      │
//! │ View/Update/Submit/  │ own only  │ ✅       │ ✅      │
//! │ Delete order         │           │          │         │
//! │ ListAllOrders        │ ❌        │ ✅       │ ✅      │
//! │ RequestDiscount      │ own only  │ ✅       │ ✅      │
//! │ ResolveDiscount      │ ❌        │ ✅       │ ✅      │
//! │ Create/Confirm       │ own only  │ ✅       │ ✅      │
//! │ payment              │           │          │         │
//! │ AdjustStock          │ ❌        │ ✅       │ ✅      │
//! │ ViewInventory        │ ✅        │ ✅       │ ✅      │
//! └──────────────────────┴───────────┴──────────┴─────────┘
//! ```
//! "own" means the caller is the order's `sales_rep_id`.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SalesRep,
    Manager,
    Admin,
}

impl Role {
    #[inline]
    pub const fn is_privileged(&self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }
}

/// Identity handed to the engine by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Caller {
    pub id: String,
    pub role: Role,
}

impl Caller {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Caller {
            id: id.into(),
            role,
        }
    }

    pub fn sales_rep(id: impl Into<String>) -> Self {
        Caller::new(id, Role::SalesRep)
    }

    pub fn manager(id: impl Into<String>) -> Self {
        Caller::new(id, Role::Manager)
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Caller::new(id, Role::Admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateOrder,
    ViewOrder,
    UpdateOrder,
    SubmitOrder,
    DeleteOrder,
    ListAllOrders,
    RequestDiscount,
    ResolveDiscount,
    CreatePayment,
    ConfirmPayment,
    AdjustStock,
    ViewInventory,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::CreateOrder => "create orders",
            Action::ViewOrder => "view this order",
            Action::UpdateOrder => "update this order",
            Action::SubmitOrder => "submit this order",
            Action::DeleteOrder => "delete this order",
            Action::ListAllOrders => "list other users' orders",
            Action::RequestDiscount => "request a discount on this order",
            Action::ResolveDiscount => "resolve discount requests",
            Action::CreatePayment => "create a payment for this order",
            Action::ConfirmPayment => "confirm this payment",
            Action::AdjustStock => "adjust stock",
            Action::ViewInventory => "view inventory",
        };
        f.write_str(s)
    }
}

/// Decides whether `caller` may perform `action`.
///
/// `owner_id` is the `sales_rep_id` of the order the action targets, or
/// `None` for actions without a target order.
pub fn authorize(caller: &Caller, action: Action, owner_id: Option<&str>) -> Result<(), CoreError> {
    if caller.role.is_privileged() {
        return Ok(());
    }

    let allowed = match action {
        Action::CreateOrder | Action::ViewInventory => true,
        Action::ListAllOrders | Action::ResolveDiscount | Action::AdjustStock => false,
        Action::ViewOrder
        | Action::UpdateOrder
        | Action::SubmitOrder
        | Action::DeleteOrder
        | Action::RequestDiscount
        | Action::CreatePayment
        | Action::ConfirmPayment => owner_id == Some(caller.id.as_str()),
    };

    if allowed {
        Ok(())
    } else {
        Err(CoreError::Forbidden {
            caller_id: caller.id.clone(),
            action: action.to_string(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
