//! Appointments.
//!
//! - `POST /api/appointments`
//! - `GET /api/appointments?skip&limit&patient_id&doctor_id&status&from_date&to_date`
//! - `GET/PUT/DELETE /api/appointments/:id`
//!
//! New and rescheduled appointment dates must lie in the future.

use axum::extract::{Path, Query as QueryParams, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use carebase_contracts::{
    appointment::{Appointment, AppointmentCreate, AppointmentStatus, AppointmentUpdate},
    auth::Principal,
    store::Query,
};

use super::default_limit;
use crate::context::ApiContext;
use crate::error::ApiError;
use crate::extract::JsonBody;

const APPOINTMENT_NOT_FOUND: &str = "Appointment not found";

#[derive(Debug, Deserialize)]
pub struct AppointmentListQuery {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
}

impl AppointmentListQuery {
    fn to_query(&self) -> Query {
        let mut query = Query::page(self.skip, self.limit);
        if let Some(patient_id) = &self.patient_id {
            query = query.eq("patient_id", patient_id.as_str());
        }
        if let Some(doctor_id) = &self.doctor_id {
            query = query.eq("doctor_id", doctor_id.as_str());
        }
        if let Some(status) = self.status {
            query = query.eq("status", status.as_str());
        }
        if let Some(from) = self.from_date {
            query = query.gte("appointment_date", from.to_rfc3339());
        }
        if let Some(to) = self.to_date {
            query = query.lte("appointment_date", to.to_rfc3339());
        }
        query
    }
}

fn ensure_future(date: DateTime<Utc>) -> Result<(), ApiError> {
    if date < Utc::now() {
        return Err(ApiError::BadRequest("Appointment date must be in the future".into()));
    }
    Ok(())
}

/// `POST /api/appointments`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    JsonBody(body): JsonBody,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    let input: AppointmentCreate = ctx.gate.admit(
        &principal,
        "create",
        "appointment",
        body,
        &ctx.schemas.appointment_create,
    )?;
    ensure_future(input.appointment_date)?;

    let appointment = ctx.appointments().create(&input.into_record())?;
    info!(
        appointment_id = %appointment.id,
        patient_id = %appointment.patient_id,
        "appointment scheduled"
    );
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// `GET /api/appointments`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    QueryParams(params): QueryParams<AppointmentListQuery>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    ctx.gate.authorize(&principal, "list", "appointment")?;
    Ok(Json(ctx.appointments().get_multi(&params.to_query())?))
}

/// `GET /api/appointments/:id`
pub async fn read(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, ApiError> {
    ctx.gate.authorize(&principal, "read", "appointment")?;
    let appointment = ctx
        .appointments()
        .get(&id)?
        .ok_or_else(|| ApiError::NotFound(APPOINTMENT_NOT_FOUND.into()))?;
    Ok(Json(appointment))
}

/// `PUT /api/appointments/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<Json<Appointment>, ApiError> {
    let update: AppointmentUpdate = ctx.gate.admit(
        &principal,
        "update",
        "appointment",
        body,
        &ctx.schemas.appointment_update,
    )?;

    let appointments = ctx.appointments();
    if appointments.get(&id)?.is_none() {
        return Err(ApiError::NotFound(APPOINTMENT_NOT_FOUND.into()));
    }
    if let Some(date) = update.appointment_date {
        ensure_future(date)?;
    }

    let appointment = appointments
        .update(&id, &update)?
        .ok_or_else(|| ApiError::NotFound(APPOINTMENT_NOT_FOUND.into()))?;
    info!(appointment_id = %appointment.id, status = appointment.status.as_str(), "appointment updated");
    Ok(Json(appointment))
}

/// `DELETE /api/appointments/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.gate.authorize(&principal, "delete", "appointment")?;
    if !ctx.appointments().delete(&id)? {
        return Err(ApiError::NotFound(APPOINTMENT_NOT_FOUND.into()));
    }
    info!(appointment_id = %id, "appointment deleted");
    Ok(StatusCode::NO_CONTENT)
}
