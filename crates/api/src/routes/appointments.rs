//! Appointment booking route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use loyalty_core::{AppointmentId, AppointmentStatus, ServiceId, StoreId};

use crate::db::{AppointmentRepository, StoreRepository};
use crate::error::{AppError, FieldError, Result, add_breadcrumb};
use crate::middleware::RequireMember;
use crate::models::booking::{Appointment, AppointmentFilter, AppointmentUpdate, NewAppointment};
use crate::state::AppState;

use super::{ApiJson, ApiQuery, non_blank};

/// Query parameters for `GET /api/appointments`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppointmentQuery {
    pub status: Option<AppointmentStatus>,
    pub store_id: Option<StoreId>,
}

/// Booking form. Every field but `notes` is required.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub store_id: Option<StoreId>,
    pub service_id: Option<ServiceId>,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    pub notes: Option<String>,
}

/// Partial update body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateAppointmentRequest {
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<Appointment>,
}

#[derive(Debug, Serialize)]
pub struct AppointmentResponse {
    pub appointment: Appointment,
}

/// A validated booking request.
#[derive(Debug, PartialEq, Eq)]
struct Slot {
    store_id: StoreId,
    service_id: ServiceId,
    date: NaiveDate,
    time: NaiveTime,
}

/// Parse `HH:MM` or `HH:MM:SS`.
fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

impl CreateAppointmentRequest {
    fn slot(&self) -> Result<Slot> {
        let date = self
            .appointment_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok());
        let time = self.appointment_time.as_deref().and_then(parse_time);

        match (self.store_id, self.service_id, date, time) {
            (Some(store_id), Some(service_id), Some(date), Some(time)) => Ok(Slot {
                store_id,
                service_id,
                date,
                time,
            }),
            _ => {
                let mut details = Vec::new();
                if self.store_id.is_none() {
                    details.push(FieldError::new("storeId", "Store is required"));
                }
                if self.service_id.is_none() {
                    details.push(FieldError::new("serviceId", "Service is required"));
                }
                if date.is_none() {
                    details.push(FieldError::new(
                        "appointmentDate",
                        "Appointment date is required (YYYY-MM-DD)",
                    ));
                }
                if time.is_none() {
                    details.push(FieldError::new(
                        "appointmentTime",
                        "Appointment time is required (HH:MM)",
                    ));
                }
                Err(AppError::Validation {
                    message: "Missing required fields".to_string(),
                    details,
                })
            }
        }
    }
}

/// Load an appointment the member owns.
async fn owned(
    repo: &AppointmentRepository<'_>,
    id: AppointmentId,
    member: &RequireMember,
) -> Result<Appointment> {
    let appointment = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;
    if appointment.customer_id != member.customer_id {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }
    Ok(appointment)
}

/// The member's appointments, latest slot first.
///
/// GET /api/appointments
#[instrument(skip_all, fields(customer_id = %member.customer_id))]
pub async fn index(
    State(state): State<AppState>,
    member: RequireMember,
    ApiQuery(query): ApiQuery<AppointmentQuery>,
) -> Result<Json<AppointmentsResponse>> {
    let appointments = AppointmentRepository::new(state.pool())
        .list_for_customer(
            member.customer_id,
            AppointmentFilter {
                status: query.status,
                store_id: query.store_id,
            },
        )
        .await?;
    Ok(Json(AppointmentsResponse { appointments }))
}

/// Book an appointment.
///
/// POST /api/appointments
#[instrument(skip_all, fields(customer_id = %member.customer_id))]
pub async fn create(
    State(state): State<AppState>,
    member: RequireMember,
    ApiJson(req): ApiJson<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentResponse>)> {
    let slot = req.slot()?;

    let service = StoreRepository::new(state.pool())
        .service(slot.store_id, slot.service_id)
        .await?
        .filter(|s| s.is_available)
        .ok_or_else(|| AppError::NotFound("Service not available at this store".to_string()))?;

    let appointment = AppointmentRepository::new(state.pool())
        .create(&NewAppointment {
            customer_id: member.customer_id,
            store_id: slot.store_id,
            service_id: slot.service_id,
            appointment_date: slot.date,
            appointment_time: slot.time,
            duration_minutes: service.duration_minutes,
            notes: non_blank(req.notes),
        })
        .await?;

    tracing::info!(appointment_id = %appointment.id, "Appointment booked");
    add_breadcrumb("booking", "Appointment booked");
    Ok((StatusCode::CREATED, Json(AppointmentResponse { appointment })))
}

/// Update an appointment's status or notes.
///
/// PATCH /api/appointments/{id}
#[instrument(skip_all, fields(customer_id = %member.customer_id, appointment_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    member: RequireMember,
    Path(id): Path<AppointmentId>,
    ApiJson(req): ApiJson<UpdateAppointmentRequest>,
) -> Result<Json<AppointmentResponse>> {
    let repo = AppointmentRepository::new(state.pool());
    owned(&repo, id, &member).await?;

    let update = AppointmentUpdate {
        status: req.status,
        notes: req.notes,
    };
    if update.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    let appointment = repo.update(id, &update).await?;
    Ok(Json(AppointmentResponse { appointment }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_accepts_both_forms() {
        assert_eq!(parse_time("09:30"), NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(parse_time("14:05:00"), NaiveTime::from_hms_opt(14, 5, 0));
        assert_eq!(parse_time("25:00"), None);
    }

    #[test]
    fn test_slot_requires_every_field() {
        let err = CreateAppointmentRequest {
            store_id: Some(StoreId::new(1)),
            appointment_time: Some("10:00".to_string()),
            ..CreateAppointmentRequest::default()
        }
        .slot()
        .unwrap_err();

        match err {
            AppError::Validation { message, details } => {
                assert_eq!(message, "Missing required fields");
                let fields: Vec<_> = details.iter().map(|d| d.field).collect();
                assert_eq!(fields, ["serviceId", "appointmentDate"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_slot_parses_complete_request() {
        let slot = CreateAppointmentRequest {
            store_id: Some(StoreId::new(2)),
            service_id: Some(ServiceId::new(7)),
            appointment_date: Some("2026-11-02".to_string()),
            appointment_time: Some("13:15".to_string()),
            notes: None,
        }
        .slot()
        .unwrap();
        assert_eq!(slot.date, NaiveDate::from_ymd_opt(2026, 11, 2).unwrap());
        assert_eq!(slot.time, NaiveTime::from_hms_opt(13, 15, 0).unwrap());
    }
}
