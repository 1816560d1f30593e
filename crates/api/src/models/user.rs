//! User and membership domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use loyalty_core::{CustomerId, CustomerTier, Email, MemberStatus, UserId, UserRole};

/// An account that can sign in.
///
/// The password hash is never part of this type; it is loaded separately
/// only where credentials are checked.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A user row together with its stored Argon2 hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// A user joined with the loyalty fields of their customer record.
///
/// Staff accounts have no customer record, so every membership field is
/// optional.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    pub id: UserId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub customer_id: Option<CustomerId>,
    pub points: Option<i32>,
    pub total_spent: Option<Decimal>,
    pub visit_count: Option<i32>,
    pub tier: Option<CustomerTier>,
    pub member_status: Option<MemberStatus>,
    pub enrollment_date: Option<NaiveDate>,
}

/// The loyalty half of a member.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub user_id: Option<UserId>,
    pub name: String,
    pub points: i32,
    pub total_spent: Decimal,
    pub visit_count: i32,
    pub tier: CustomerTier,
    pub member_status: MemberStatus,
    pub enrollment_date: NaiveDate,
}

/// Fields for a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub marketing_consent: bool,
}

/// Editable profile fields.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}
