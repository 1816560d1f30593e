//! Best-effort member activity log.

use sqlx::PgPool;

use loyalty_core::UserId;

use super::{Pagination, RepositoryError};
use crate::models::history::ActivityEntry;

/// Kinds of activity recorded in `user_activity_log`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Register,
    Login,
    Logout,
    ProfileUpdate,
    PasswordChange,
    PromotionEnroll,
}

impl ActivityKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Login => "login",
            Self::Logout => "logout",
            Self::ProfileUpdate => "profile_update",
            Self::PasswordChange => "password_change",
            Self::PromotionEnroll => "promotion_enroll",
        }
    }
}

/// Access to `user_activity_log`.
///
/// Write failures never propagate: the caller's request succeeds whether or
/// not the audit row lands.
pub struct ActivityLog<'a> {
    pool: &'a PgPool,
}

impl<'a> ActivityLog<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an activity row, logging and discarding any error.
    pub async fn record(
        &self,
        user_id: UserId,
        kind: ActivityKind,
        description: &str,
        ip_address: &str,
        user_agent: Option<&str>,
    ) {
        let result = sqlx::query(
            r"
            INSERT INTO user_activity_log (user_id, activity_type, description, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(description)
        .bind(ip_address)
        .bind(user_agent)
        .execute(self.pool)
        .await;

        if let Err(e) = result {
            tracing::warn!(
                error = %e,
                user_id = %user_id,
                activity = kind.as_str(),
                "Failed to record user activity"
            );
        }
    }

    /// One page of a user's activity, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        page: Pagination,
    ) -> Result<(Vec<ActivityEntry>, i64), RepositoryError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM user_activity_log WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        let entries = sqlx::query_as::<_, ActivityEntry>(
            r"
            SELECT id, activity_type, description, ip_address, created_at
            FROM user_activity_log
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok((entries, total))
    }
}
