//! Appointment queries.

use chrono::{NaiveDate, NaiveTime};
use sqlx::{PgPool, Postgres, QueryBuilder};

use loyalty_core::{AppointmentId, CustomerId, StoreId};

use super::RepositoryError;
use crate::models::booking::{Appointment, AppointmentFilter, AppointmentUpdate, NewAppointment};

const APPOINTMENT_SELECT: &str = r"
    SELECT a.id, a.customer_id, a.store_id, s.name AS store_name,
           a.service_id, ss.name AS service_name, a.appointment_date,
           a.appointment_time, a.duration_minutes, a.status, a.payment_status,
           a.notes, a.created_at, a.updated_at
    FROM appointments a
    JOIN store_locations s ON s.id = a.store_id
    JOIN store_services ss ON ss.id = a.service_id";

const SLOT_TAKEN: &str = "Time slot not available";

/// Repository for appointments.
pub struct AppointmentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AppointmentRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A customer's appointments, most recent slot first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
        filter: AppointmentFilter,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(APPOINTMENT_SELECT);
        query.push(" WHERE a.customer_id = ").push_bind(customer_id);
        if let Some(status) = filter.status {
            query.push(" AND a.status = ").push_bind(status);
        }
        if let Some(store_id) = filter.store_id {
            query.push(" AND a.store_id = ").push_bind(store_id);
        }
        query.push(" ORDER BY a.appointment_date DESC, a.appointment_time DESC");

        let rows = query
            .build_query_as::<Appointment>()
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Get an appointment by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: AppointmentId) -> Result<Option<Appointment>, RepositoryError> {
        let sql = format!("{APPOINTMENT_SELECT} WHERE a.id = $1");
        let row = sqlx::query_as::<_, Appointment>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Whether a store slot is held by an appointment that is neither
    /// cancelled nor a no-show.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn slot_taken(
        &self,
        store_id: StoreId,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<bool, RepositoryError> {
        let taken = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1 FROM appointments
                WHERE store_id = $1 AND appointment_date = $2 AND appointment_time = $3
                  AND status NOT IN ('cancelled', 'no_show')
            )
            ",
        )
        .bind(store_id)
        .bind(date)
        .bind(time)
        .fetch_one(self.pool)
        .await?;
        Ok(taken)
    }

    /// Book a slot with status `scheduled` and payment `pending`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slot is already held.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewAppointment) -> Result<Appointment, RepositoryError> {
        if self
            .slot_taken(new.store_id, new.appointment_date, new.appointment_time)
            .await?
        {
            return Err(RepositoryError::Conflict(SLOT_TAKEN.to_owned()));
        }

        // The partial unique index still guards concurrent bookings.
        let id = sqlx::query_scalar::<_, AppointmentId>(
            r"
            INSERT INTO appointments
                (customer_id, store_id, service_id, appointment_date, appointment_time,
                 duration_minutes, status, payment_status, notes)
            VALUES ($1, $2, $3, $4, $5, $6, 'scheduled', 'pending', $7)
            RETURNING id
            ",
        )
        .bind(new.customer_id)
        .bind(new.store_id)
        .bind(new.service_id)
        .bind(new.appointment_date)
        .bind(new.appointment_time)
        .bind(new.duration_minutes)
        .bind(&new.notes)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, SLOT_TAKEN))?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the appointment does not exist.
    /// Returns `RepositoryError::Conflict` if reinstating it collides with a booked slot.
    pub async fn update(
        &self,
        id: AppointmentId,
        update: &AppointmentUpdate,
    ) -> Result<Appointment, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE appointments
            SET status = COALESCE($1, status),
                notes = COALESCE($2, notes),
                updated_at = NOW()
            WHERE id = $3
            ",
        )
        .bind(update.status)
        .bind(&update.notes)
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, SLOT_TAKEN))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }
}
