//! Appointment and work order types.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use loyalty_core::{
    AppointmentId, AppointmentStatus, CustomerId, PaymentStatus, ServiceId, StoreId,
    WorkOrderId, WorkOrderPriority, WorkOrderStatus,
};

/// An appointment joined with its store and service names.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: AppointmentId,
    pub customer_id: CustomerId,
    pub store_id: StoreId,
    pub store_name: String,
    pub service_id: ServiceId,
    pub service_name: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub customer_id: CustomerId,
    pub store_id: StoreId,
    pub service_id: ServiceId,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub duration_minutes: i32,
    pub notes: Option<String>,
}

/// Partial update; `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct AppointmentUpdate {
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

impl AppointmentUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none() && self.notes.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub store_id: Option<StoreId>,
}

/// A work order joined with its store name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: WorkOrderId,
    pub customer_id: CustomerId,
    pub store_id: StoreId,
    pub store_name: String,
    #[serde(rename = "type")]
    pub work_type: String,
    pub priority: WorkOrderPriority,
    pub title: String,
    pub description: String,
    pub status: WorkOrderStatus,
    pub customer_notes: Option<String>,
    pub estimated_cost: Option<Decimal>,
    pub estimated_completion: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWorkOrder {
    pub customer_id: CustomerId,
    pub store_id: StoreId,
    pub work_type: String,
    pub priority: WorkOrderPriority,
    pub title: String,
    pub description: String,
    pub customer_notes: Option<String>,
}

/// Partial update; `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct WorkOrderUpdate {
    pub status: Option<WorkOrderStatus>,
    pub customer_notes: Option<String>,
    pub estimated_cost: Option<Decimal>,
    pub estimated_completion: Option<NaiveDate>,
}

impl WorkOrderUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.customer_notes.is_none()
            && self.estimated_cost.is_none()
            && self.estimated_completion.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkOrderFilter {
    pub status: Option<WorkOrderStatus>,
    pub store_id: Option<StoreId>,
    pub work_type: Option<String>,
}
