//! User and customer repository.
//!
//! A member is a `users` row (sign-in) plus a `customers` row (loyalty
//! balance). Customers may exist before the member registers, e.g. from
//! point-of-sale purchases, and are linked by email on registration.

use sqlx::PgPool;

use loyalty_core::{CustomerId, Email, UserId};

use super::RepositoryError;
use crate::models::user::{
    Customer, MemberProfile, NewUser, ProfileUpdate, User, UserCredentials,
};

const USER_COLUMNS: &str = "u.id, u.email, u.first_name, u.last_name, u.phone, u.role, \
                            u.is_active, u.last_login, u.created_at";

/// Repository for user and customer database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user and their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS}, u.password_hash FROM users u WHERE u.email = $1");
        let row = sqlx::query_as::<_, UserCredentials>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1");
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Get a user joined with their customer record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_profile(&self, id: UserId) -> Result<Option<MemberProfile>, RepositoryError> {
        let row = sqlx::query_as::<_, MemberProfile>(
            r"
            SELECT u.id, u.email, u.first_name, u.last_name, u.phone, u.role,
                   u.last_login, u.created_at,
                   c.id AS customer_id, c.points, c.total_spent, c.visit_count,
                   c.tier, c.member_status, c.enrollment_date
            FROM users u
            LEFT JOIN customers c ON c.user_id = u.id
            WHERE u.id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Get the customer record linked to a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_customer(&self, user_id: UserId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, Customer>(
            r"
            SELECT id, user_id, name, points, total_spent, visit_count,
                   tier, member_status, enrollment_date
            FROM customers
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Get the ID of the customer record linked to a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn customer_id(&self, user_id: UserId) -> Result<Option<CustomerId>, RepositoryError> {
        let id = sqlx::query_scalar::<_, CustomerId>("SELECT id FROM customers WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(id)
    }

    /// Create a user and attach a customer record in one transaction.
    ///
    /// An unlinked customer with the same email is claimed; otherwise a new
    /// Bronze customer with zero points is created. Staff roles get a
    /// customer record too so they can book services for themselves.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_member(
        &self,
        new_user: &NewUser,
    ) -> Result<(User, CustomerId), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r"
            INSERT INTO users (email, password_hash, first_name, last_name, phone, role, marketing_consent)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, email, first_name, last_name, phone, role, is_active, last_login, created_at
            ",
        )
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.phone)
        .bind(new_user.role)
        .bind(new_user.marketing_consent)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "email already exists"))?;

        let linked = sqlx::query_scalar::<_, CustomerId>(
            r"
            UPDATE customers
            SET user_id = $1, updated_at = NOW()
            WHERE email = $2 AND user_id IS NULL
            RETURNING id
            ",
        )
        .bind(user.id)
        .bind(&user.email)
        .fetch_optional(&mut *tx)
        .await?;

        let customer_id = match linked {
            Some(id) => {
                tracing::info!(user_id = %user.id, customer_id = %id, "Linked existing customer");
                id
            }
            None => sqlx::query_scalar::<_, CustomerId>(
                r"
                INSERT INTO customers (user_id, name, email, phone, points, tier, member_status)
                VALUES ($1, $2, $3, $4, 0, 'Bronze', 'Active')
                RETURNING id
                ",
            )
            .bind(user.id)
            .bind(user.full_name())
            .bind(&user.email)
            .bind(&user.phone)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_unique(e, "customer email already linked"))?,
        };

        tx.commit().await?;
        Ok((user, customer_id))
    }

    /// Stamp a successful sign-in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn touch_last_login(&self, id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Update name, email and phone on both the user and its customer record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new email belongs to another account.
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r"
            UPDATE users
            SET first_name = $1, last_name = $2, email = $3, phone = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING id, email, first_name, last_name, phone, role, is_active, last_login, created_at
            ",
        )
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.email)
        .bind(&update.phone)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "email already exists"))?
        .ok_or(RepositoryError::NotFound)?;

        sqlx::query(
            r"
            UPDATE customers
            SET name = $1, email = $2, phone = $3, updated_at = NOW()
            WHERE user_id = $4
            ",
        )
        .bind(user.full_name())
        .bind(&user.email)
        .bind(&user.phone)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "email already exists"))?;

        tx.commit().await?;
        Ok(user)
    }

    /// Get a user's stored password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let hash = sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(hash)
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET password_hash = $1, password_changed_at = NOW(), updated_at = NOW()
            WHERE id = $2
            ",
        )
        .bind(password_hash)
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
