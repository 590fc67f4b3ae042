//! Request body extraction.

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde_json::Value;

use crate::error::ApiError;

/// A JSON request body. Unlike `Json<Value>`, a malformed body or a wrong
/// content type is rejected with the usual 422 error envelope.
#[derive(Debug)]
pub struct JsonBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Unprocessable(vec![format!("[body] {}", rejection.body_text())])
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};

    use crate::testing::{body_json, login_token, seed_user, send, test_context};

    fn raw_post(uri: &str, token: Option<&str>, content_type: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn malformed_json_is_422_envelope() {
        let (ctx, _dir) = test_context();
        let user = seed_user(&ctx, "ann@clinic.test", "pw", false);
        let token = login_token(&ctx, &user);

        let resp = send(
            &ctx,
            raw_post("/api/patients", Some(&token), Some("application/json"), "{\"first_name\": "),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(resp).await;
        assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
        assert!(body["error"]["details"][0].as_str().unwrap().starts_with("[body]"));
    }

    #[tokio::test]
    async fn missing_content_type_is_422_envelope() {
        let (ctx, _dir) = test_context();
        let resp = send(
            &ctx,
            raw_post("/api/auth/login", None, None, r#"{"email":"a@b.c","password":"x"}"#),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(resp).await["error"]["code"], "VALIDATION_FAILED");
    }
}
