//! Identity carried by the `auth-token` cookie.

use serde::{Deserialize, Serialize};

use loyalty_core::{Email, UserId, UserRole};

/// The signed-in user, as resolved from a verified token and a live
/// account lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Role at the time of the request, not at token issue.
    pub role: UserRole,
}

impl CurrentUser {
    #[must_use]
    pub const fn has_role(&self, required: UserRole) -> bool {
        self.role.has_at_least(required)
    }
}
