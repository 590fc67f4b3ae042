//! Prescriptions and their medication lines.
//!
//! - `POST /api/prescriptions`
//! - `GET /api/prescriptions?skip&limit&patient_id&doctor_id`
//! - `GET/PUT/DELETE /api/prescriptions/:id`
//! - `POST /api/prescriptions/:id/upload` (multipart `file`)
//! - `GET /api/prescriptions/:id/interactions`
//!
//! Every response carries the prescription's medication rows. Updating with
//! a `medications` list replaces the whole list.

use axum::extract::{Multipart, Path, Query as QueryParams, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use carebase_contracts::{
    advisory::{InteractionResult, MedicationEntry},
    auth::Principal,
    prescription::{
        MedicationBase, Prescription, PrescriptionCreate, PrescriptionUpdate,
        PrescriptionWithMedications,
    },
    store::Query,
};

use super::default_limit;
use crate::context::ApiContext;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::upload::{read_file_field, store_upload, PRESCRIPTION_DEFAULT_EXT};

const PRESCRIPTION_NOT_FOUND: &str = "Prescription not found";

#[derive(Debug, Deserialize)]
pub struct PrescriptionListQuery {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
}

fn not_found() -> ApiError {
    ApiError::NotFound(PRESCRIPTION_NOT_FOUND.into())
}

fn with_medications(
    ctx: &ApiContext,
    prescription: Prescription,
) -> Result<PrescriptionWithMedications, ApiError> {
    let query = Query::page(0, usize::MAX).eq("prescription_id", prescription.id.as_str());
    let medications = ctx.medications().get_multi(&query)?;
    Ok(PrescriptionWithMedications {
        prescription,
        medications,
    })
}

fn attach_medications(
    ctx: &ApiContext,
    prescription_id: &str,
    lines: Vec<MedicationBase>,
) -> Result<(), ApiError> {
    let medications = ctx.medications();
    for line in lines {
        medications.create(&line.into_record(prescription_id))?;
    }
    Ok(())
}

fn load(ctx: &ApiContext, id: &str) -> Result<Prescription, ApiError> {
    ctx.prescriptions().get(id)?.ok_or_else(not_found)
}

/// `POST /api/prescriptions`: `doctor_id` defaults to the caller.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    JsonBody(body): JsonBody,
) -> Result<(StatusCode, Json<PrescriptionWithMedications>), ApiError> {
    let input: PrescriptionCreate = ctx.gate.admit(
        &principal,
        "create",
        "prescription",
        body,
        &ctx.schemas.prescription_create,
    )?;

    let (prescription, lines) = input.into_parts(&principal.user_id);
    let prescription = ctx.prescriptions().create(&prescription)?;
    let count = lines.len();
    attach_medications(&ctx, &prescription.id, lines)?;

    info!(
        prescription_id = %prescription.id,
        patient_id = %prescription.patient_id,
        medications = count,
        "prescription created"
    );
    Ok((StatusCode::CREATED, Json(with_medications(&ctx, prescription)?)))
}

/// `GET /api/prescriptions`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    QueryParams(params): QueryParams<PrescriptionListQuery>,
) -> Result<Json<Vec<PrescriptionWithMedications>>, ApiError> {
    ctx.gate.authorize(&principal, "list", "prescription")?;

    let mut query = Query::page(params.skip, params.limit);
    if let Some(patient_id) = &params.patient_id {
        query = query.eq("patient_id", patient_id.as_str());
    }
    if let Some(doctor_id) = &params.doctor_id {
        query = query.eq("doctor_id", doctor_id.as_str());
    }

    let prescriptions = ctx
        .prescriptions()
        .get_multi(&query)?
        .into_iter()
        .map(|p| with_medications(&ctx, p))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(prescriptions))
}

/// `GET /api/prescriptions/:id`
pub async fn read(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<PrescriptionWithMedications>, ApiError> {
    ctx.gate.authorize(&principal, "read", "prescription")?;
    let prescription = load(&ctx, &id)?;
    Ok(Json(with_medications(&ctx, prescription)?))
}

/// `PUT /api/prescriptions/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<Json<PrescriptionWithMedications>, ApiError> {
    let mut update: PrescriptionUpdate = ctx.gate.admit(
        &principal,
        "update",
        "prescription",
        body,
        &ctx.schemas.prescription_update,
    )?;

    let existing = load(&ctx, &id)?;
    let replacement = update.medications.take();

    let has_row_changes =
        update.diagnosis.is_some() || update.notes.is_some() || update.file_url.is_some();
    let prescription = if has_row_changes {
        ctx.prescriptions().update(&id, &update)?.ok_or_else(not_found)?
    } else {
        existing
    };

    if let Some(lines) = replacement {
        let removed = ctx.medications().delete_where("prescription_id", id.as_str())?;
        let added = lines.len();
        attach_medications(&ctx, &id, lines)?;
        info!(prescription_id = %id, removed, added, "medications replaced");
    }

    info!(prescription_id = %id, "prescription updated");
    Ok(Json(with_medications(&ctx, prescription)?))
}

/// `DELETE /api/prescriptions/:id`: removes the medication rows first.
pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.gate.authorize(&principal, "delete", "prescription")?;
    load(&ctx, &id)?;

    let removed = ctx.medications().delete_where("prescription_id", id.as_str())?;
    if !ctx.prescriptions().delete(&id)? {
        return Err(not_found());
    }
    info!(prescription_id = %id, medications = removed, "prescription deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/prescriptions/:id/upload`: stores the file and sets `file_url`.
pub async fn upload(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<PrescriptionWithMedications>, ApiError> {
    ctx.gate.authorize(&principal, "upload", "prescription")?;
    load(&ctx, &id)?;

    let file = read_file_field(&mut multipart, ctx.settings.max_upload_bytes).await?;
    let url = store_upload(
        &ctx,
        &ctx.settings.prescription_bucket,
        &id,
        &file,
        PRESCRIPTION_DEFAULT_EXT,
    )?;

    let prescription = ctx
        .prescriptions()
        .update(&id, &json!({ "file_url": url }))?
        .ok_or_else(not_found)?;
    info!(prescription_id = %id, "prescription file attached");
    Ok(Json(with_medications(&ctx, prescription)?))
}

/// `GET /api/prescriptions/:id/interactions`
pub async fn interactions(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<InteractionResult>, ApiError> {
    ctx.gate.authorize(&principal, "read", "prescription")?;
    ctx.gate.authorize(&principal, "check-interactions", "advisor")?;

    let full = with_medications(&ctx, load(&ctx, &id)?)?;
    let entries: Vec<MedicationEntry> = full.medications.iter().map(MedicationEntry::from).collect();
    Ok(Json(ctx.advisor.check_interactions(&entries)))
}
