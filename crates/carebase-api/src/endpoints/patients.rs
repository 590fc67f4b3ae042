//! Patient records.
//!
//! - `POST /api/patients`
//! - `GET /api/patients?skip&limit&search`
//! - `GET/PUT/DELETE /api/patients/:id`

use axum::extract::{Path, Query as QueryParams, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use tracing::info;

use carebase_contracts::{
    auth::Principal,
    patient::{Patient, PatientCreate, PatientUpdate},
    store::Query,
};

use super::default_limit;
use crate::context::ApiContext;
use crate::error::ApiError;
use crate::extract::JsonBody;

const PATIENT_NOT_FOUND: &str = "Patient not found";

#[derive(Debug, Deserialize)]
pub struct PatientListQuery {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Case-insensitive substring of the first or last name.
    pub search: Option<String>,
}

/// `POST /api/patients`: `created_by` is the caller.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    JsonBody(body): JsonBody,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let input: PatientCreate = ctx
        .gate
        .admit(&principal, "create", "patient", body, &ctx.schemas.patient_create)?;
    let patient = ctx.patients().create(&input.into_record(&principal.user_id))?;
    info!(patient_id = %patient.id, created_by = %principal.user_id, "patient created");
    Ok((StatusCode::CREATED, Json(patient)))
}

/// `GET /api/patients`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    QueryParams(params): QueryParams<PatientListQuery>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    ctx.gate.authorize(&principal, "list", "patient")?;

    let mut query = Query::page(params.skip, params.limit);
    if let Some(search) = params.search.filter(|s| !s.trim().is_empty()) {
        query = query.contains_any(&["first_name", "last_name"], search.trim());
    }
    Ok(Json(ctx.patients().get_multi(&query)?))
}

/// `GET /api/patients/:id`
pub async fn read(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    ctx.gate.authorize(&principal, "read", "patient")?;
    let patient = ctx
        .patients()
        .get(&id)?
        .ok_or_else(|| ApiError::NotFound(PATIENT_NOT_FOUND.into()))?;
    Ok(Json(patient))
}

/// `PUT /api/patients/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<Json<Patient>, ApiError> {
    let update: PatientUpdate = ctx
        .gate
        .admit(&principal, "update", "patient", body, &ctx.schemas.patient_update)?;
    let patient = ctx
        .patients()
        .update(&id, &update)?
        .ok_or_else(|| ApiError::NotFound(PATIENT_NOT_FOUND.into()))?;
    info!(patient_id = %patient.id, "patient updated");
    Ok(Json(patient))
}

/// `DELETE /api/patients/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.gate.authorize(&principal, "delete", "patient")?;
    if !ctx.patients().delete(&id)? {
        return Err(ApiError::NotFound(PATIENT_NOT_FOUND.into()));
    }
    info!(patient_id = %id, "patient deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::testing::{body_json, empty_request, json_request, login_token, seed_user, send, test_context};

    fn patient(first: &str, last: &str) -> Value {
        json!({
            "first_name": first,
            "last_name": last,
            "date_of_birth": "1980-04-12T00:00:00Z",
            "gender": "female",
            "phone_number": "555-0100"
        })
    }

    #[tokio::test]
    async fn create_stamps_creator() {
        let (ctx, _dir) = test_context();
        let user = seed_user(&ctx, "ann@clinic.test", "pw", false);
        let token = login_token(&ctx, &user);

        let resp = send(&ctx, json_request("POST", "/api/patients", Some(&token), patient("Jane", "Doe"))).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        assert_eq!(body["created_by"], user.id.as_str());
        assert_eq!(body["first_name"], "Jane");
        assert!(body["id"].as_str().is_some());
    }

    #[tokio::test]
    async fn create_missing_required_field_is_422() {
        let (ctx, _dir) = test_context();
        let user = seed_user(&ctx, "ann@clinic.test", "pw", false);
        let token = login_token(&ctx, &user);

        let mut body = patient("Jane", "Doe");
        body.as_object_mut().unwrap().remove("phone_number");
        let resp = send(&ctx, json_request("POST", "/api/patients", Some(&token), body)).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn create_with_unparseable_date_is_422() {
        let (ctx, _dir) = test_context();
        let user = seed_user(&ctx, "ann@clinic.test", "pw", false);
        let token = login_token(&ctx, &user);

        let mut body = patient("Jane", "Doe");
        body["date_of_birth"] = json!("last spring");
        let resp = send(&ctx, json_request("POST", "/api/patients", Some(&token), body)).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn search_matches_first_or_last_name() {
        let (ctx, _dir) = test_context();
        let user = seed_user(&ctx, "ann@clinic.test", "pw", false);
        let token = login_token(&ctx, &user);

        for (first, last) in [("Jane", "Doe"), ("John", "Smith"), ("Ada", "Janssen")] {
            send(&ctx, json_request("POST", "/api/patients", Some(&token), patient(first, last))).await;
        }

        let resp = send(&ctx, empty_request("GET", "/api/patients?search=JAN", Some(&token))).await;
        let body = body_json(resp).await;
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["first_name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Jane", "Ada"]);

        let resp = send(&ctx, empty_request("GET", "/api/patients?skip=1&limit=1", Some(&token))).await;
        let body = body_json(resp).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["first_name"], "John");
    }

    #[tokio::test]
    async fn update_read_delete_cycle() {
        let (ctx, _dir) = test_context();
        let user = seed_user(&ctx, "ann@clinic.test", "pw", false);
        let token = login_token(&ctx, &user);

        let resp = send(&ctx, json_request("POST", "/api/patients", Some(&token), patient("Jane", "Doe"))).await;
        let id = body_json(resp).await["id"].as_str().unwrap().to_string();
        let uri = format!("/api/patients/{id}");

        let resp = send(&ctx, json_request("PUT", &uri, Some(&token), json!({ "allergies": "penicillin" }))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["allergies"], "penicillin");
        assert_eq!(body["last_name"], "Doe");

        let resp = send(&ctx, empty_request("DELETE", &uri, Some(&token))).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        for method in ["GET", "DELETE"] {
            let resp = send(&ctx, empty_request(method, &uri, Some(&token))).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        }
        let resp = send(&ctx, json_request("PUT", &uri, Some(&token), json!({ "gender": "f" }))).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn patients_require_auth() {
        let (ctx, _dir) = test_context();
        let resp = send(&ctx, empty_request("GET", "/api/patients", None)).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
