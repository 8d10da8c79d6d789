use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequest, State},
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use headers::{authorization::Bearer, Authorization, HeaderMapExt};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::jwt::validate_token;

/// Pulls the bearer token out of the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    if !headers.contains_key(AUTHORIZATION) {
        return Err(AppError::Auth("Missing authorization header".to_string()));
    }

    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))
}

/// Rejects the request with 401 unless it carries a valid token, then stores
/// the decoded `AuthUser` in the request extensions.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;

    let user = validate_token(&token, &config.jwt_secret).map_err(AppError::Auth)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// JSON request body whose rejections (bad syntax, wrong field types,
/// missing content type) surface as 400 [`AppError::BadRequest`].
#[derive(FromRequest, Debug)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_missing() {
        let headers = HeaderMap::new();
        assert_matches!(bearer_token(&headers), Err(AppError::Auth(msg)) if msg == "Missing authorization header");
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_matches!(bearer_token(&headers), Err(AppError::Auth(msg)) if msg == "Invalid authorization header format");
    }

    #[tokio::test]
    async fn test_json_body_rejections_are_bad_request() {
        let wrong_type = Request::builder()
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name": 123}"#))
            .unwrap();
        let result = JsonBody::<std::collections::HashMap<String, String>>::from_request(wrong_type, &()).await;
        assert_matches!(result, Err(AppError::BadRequest(_)));

        let no_content_type = Request::builder().body(Body::from("{}")).unwrap();
        let result = JsonBody::<serde_json::Value>::from_request(no_content_type, &()).await;
        assert_matches!(result, Err(AppError::BadRequest(msg)) if msg.contains("Content-Type"));

        let valid = Request::builder()
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name": "x"}"#))
            .unwrap();
        let JsonBody(value) = JsonBody::<serde_json::Value>::from_request(valid, &()).await.unwrap();
        assert_eq!(value["name"], "x");
    }

    #[test]
    fn test_bearer_token_present() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }
}
