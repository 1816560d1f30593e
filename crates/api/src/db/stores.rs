//! Store locator queries.

use sqlx::{PgPool, Postgres, QueryBuilder};

use loyalty_core::{ServiceId, StoreId};

use super::RepositoryError;
use crate::models::store::{Store, StoreFilter, StoreService};

const STORE_SELECT: &str = r"
    SELECT s.id, s.name, s.address, s.city, s.state, s.zip_code, s.phone, s.email,
           s.website, s.description, s.latitude, s.longitude, s.hours, s.rating,
           s.review_count, s.is_open, s.has_parking, s.is_wheelchair_accessible,
           s.has_wifi, s.is_featured
    FROM store_locations s
    WHERE s.is_active";

const SERVICE_SELECT: &str = r"
    SELECT id, store_id, name, description, category, duration_minutes, price,
           is_available, requires_booking
    FROM store_services";

/// Repository for stores and their services.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active stores, featured and best rated first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &StoreFilter) -> Result<Vec<Store>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(STORE_SELECT);

        if !filter.services.is_empty() {
            query
                .push(
                    " AND EXISTS (SELECT 1 FROM store_services ss \
                     WHERE ss.store_id = s.id AND ss.is_available AND ss.name = ANY(",
                )
                .push_bind(filter.services.clone())
                .push("))");
        }
        if let Some(rating) = filter.min_rating {
            query.push(" AND s.rating >= ").push_bind(rating);
        }
        for (column, value) in [
            ("s.is_open", filter.is_open),
            ("s.has_parking", filter.has_parking),
            ("s.is_wheelchair_accessible", filter.is_wheelchair_accessible),
            ("s.has_wifi", filter.has_wifi),
        ] {
            if let Some(value) = value {
                query.push(" AND ").push(column).push(" = ").push_bind(value);
            }
        }
        query.push(" ORDER BY s.is_featured DESC, s.rating DESC, s.name ASC");

        let stores = query.build_query_as::<Store>().fetch_all(self.pool).await?;
        Ok(stores)
    }

    /// Get an active store by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let sql = format!("{STORE_SELECT} AND s.id = $1");
        let store = sqlx::query_as::<_, Store>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(store)
    }

    /// Available services offered by a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn services(&self, store_id: StoreId) -> Result<Vec<StoreService>, RepositoryError> {
        let sql = format!("{SERVICE_SELECT} WHERE store_id = $1 AND is_available ORDER BY category, name");
        let services = sqlx::query_as::<_, StoreService>(&sql)
            .bind(store_id)
            .fetch_all(self.pool)
            .await?;
        Ok(services)
    }

    /// A specific service, only if the given store offers it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn service(
        &self,
        store_id: StoreId,
        service_id: ServiceId,
    ) -> Result<Option<StoreService>, RepositoryError> {
        let sql = format!("{SERVICE_SELECT} WHERE store_id = $1 AND id = $2");
        let service = sqlx::query_as::<_, StoreService>(&sql)
            .bind(store_id)
            .bind(service_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(service)
    }

    /// Whether an active store exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: StoreId) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM store_locations WHERE id = $1 AND is_active)",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }
}
