//! Advisory helpers over HTTP.
//!
//! - `POST /api/advisor/symptoms`
//! - `POST /api/advisor/tests`
//! - `POST /api/advisor/interactions`
//! - `POST /api/advisor/alternatives`
//!
//! Results are informational and never persisted.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use carebase_contracts::{
    advisory::{Alternative, DiagnosisResult, InteractionResult, MedicationEntry},
    auth::Principal,
};

use crate::context::ApiContext;
use crate::error::ApiError;
use crate::extract::JsonBody;

const RESOURCE: &str = "advisor";

#[derive(Debug, Deserialize)]
pub struct SymptomsRequest {
    pub symptoms: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TestsRequest {
    pub symptoms: Vec<String>,
    pub age: u32,
    pub gender: String,
}

#[derive(Debug, Deserialize)]
pub struct InteractionsRequest {
    pub medications: Vec<MedicationEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AlternativesRequest {
    pub medication: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct TestsResponse {
    pub tests: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AlternativesResponse {
    pub alternatives: Vec<Alternative>,
}

/// `POST /api/advisor/symptoms`
pub async fn analyze(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    JsonBody(body): JsonBody,
) -> Result<Json<DiagnosisResult>, ApiError> {
    let req: SymptomsRequest = ctx
        .gate
        .admit(&principal, "analyze", RESOURCE, body, &ctx.schemas.advisor_symptoms)?;
    Ok(Json(ctx.advisor.analyze_symptoms(&req.symptoms)))
}

/// `POST /api/advisor/tests`
pub async fn tests(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    JsonBody(body): JsonBody,
) -> Result<Json<TestsResponse>, ApiError> {
    let req: TestsRequest = ctx
        .gate
        .admit(&principal, "suggest-tests", RESOURCE, body, &ctx.schemas.advisor_tests)?;
    let tests = ctx.advisor.suggest_tests(&req.symptoms, req.age, &req.gender);
    Ok(Json(TestsResponse { tests }))
}

/// `POST /api/advisor/interactions`
pub async fn interactions(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    JsonBody(body): JsonBody,
) -> Result<Json<InteractionResult>, ApiError> {
    let req: InteractionsRequest = ctx.gate.admit(
        &principal,
        "check-interactions",
        RESOURCE,
        body,
        &ctx.schemas.advisor_interactions,
    )?;
    Ok(Json(ctx.advisor.check_interactions(&req.medications)))
}

/// `POST /api/advisor/alternatives`
pub async fn alternatives(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    JsonBody(body): JsonBody,
) -> Result<Json<AlternativesResponse>, ApiError> {
    let req: AlternativesRequest = ctx.gate.admit(
        &principal,
        "suggest-alternatives",
        RESOURCE,
        body,
        &ctx.schemas.advisor_alternatives,
    )?;
    let alternatives = ctx.advisor.suggest_alternatives(&req.medication, &req.reason);
    Ok(Json(AlternativesResponse { alternatives }))
}
