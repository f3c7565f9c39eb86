//! Shared response and request-parsing helpers for route handlers.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http_body_util::{BodyExt, Full, Limited};
use hyper::{Request, Response, StatusCode, Uri};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::types::ApiError;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Maximum accepted JSON body size (blog content included).
const MAX_JSON_BODY: usize = 262_144;

/// Envelope for mutations and simple acknowledgements.
#[derive(Debug, Serialize)]
pub struct StandardResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Envelope for paginated list endpoints.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse {
    pub items: Vec<Value>,
    pub total: u64,
    pub page: u64,
    pub size: i64,
    pub pages: u64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    let response = Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization, X-Auth-Token")
        .body(full_body(json));

    match response {
        Ok(r) => r,
        // Builder only fails on invalid header values, which are constants here.
        Err(_) => Response::new(empty_body()),
    }
}

/// Render an [`ApiError`] as a JSON error response.
///
/// Rate-limit errors additionally carry a Retry-After header.
pub fn error_response(err: &ApiError) -> Response<BoxBody> {
    let mut builder = Response::builder()
        .status(err.status_code())
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*");

    if let ApiError::RateLimited { retry_after_secs } = err {
        builder = builder.header("Retry-After", retry_after_secs.to_string());
    }

    let body = serde_json::to_string(&ErrorResponse {
        success: false,
        error: err.to_string(),
        code: err.code().to_string(),
    })
    .unwrap_or_else(|_| "{}".to_string());

    match builder.body(full_body(body)) {
        Ok(r) => r,
        Err(_) => Response::new(empty_body()),
    }
}

pub fn ok_response<T: Serialize>(body: &T) -> Response<BoxBody> {
    json_response(StatusCode::OK, body)
}

pub fn cors_preflight() -> Response<BoxBody> {
    let response = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization, X-Auth-Token")
        .header("Access-Control-Max-Age", "86400")
        .body(empty_body());

    match response {
        Ok(r) => r,
        Err(_) => Response::new(empty_body()),
    }
}

/// Declared Content-Length, if the header is present and parseable.
pub fn declared_length<B>(req: &Request<B>) -> Option<u64> {
    req.headers()
        .get(hyper::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Parse a JSON request body, refusing oversized payloads before they are
/// buffered: the declared Content-Length is checked first, and the stream
/// itself is capped so a missing or lying header cannot bypass the limit.
pub async fn parse_json_body<T, B>(req: Request<B>) -> Result<T, ApiError>
where
    T: for<'de> Deserialize<'de>,
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if declared_length(&req).is_some_and(|len| len > MAX_JSON_BODY as u64) {
        return Err(ApiError::BadRequest("Request body too large".into()));
    }

    let body = Limited::new(req.into_body(), MAX_JSON_BODY)
        .collect()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read body: {}", e)))?;

    serde_json::from_slice(&body.to_bytes())
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON: {}", e)))
}

/// Minimal percent-decoding for query values ('+' and %XX escapes).
fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    out.push(byte);
                    i += 3;
                } else {
                    out.push(b'%');
                    i += 1;
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Look up a single query parameter by name.
pub fn query_param(uri: &Uri, name: &str) -> Option<String> {
    uri.query()?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| percent_decode(value))
        .filter(|value| !value.is_empty())
}

/// Page/size parameters with clamped defaults.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub page: u64,
    pub size: i64,
}

impl Pagination {
    pub fn from_uri(uri: &Uri) -> Self {
        let page = query_param(uri, "page")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let size = query_param(uri, "size")
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|s| (1..=100).contains(s))
            .unwrap_or(10);
        Self { page, size }
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1) * self.size as u64
    }

    /// Total page count, rounded up.
    pub fn pages(&self, total: u64) -> u64 {
        total.div_ceil(self.size as u64)
    }
}

/// Serialize a document for API responses, flattening BSON extended JSON:
/// `{"$oid": "..."}` becomes the plain hex string and `{"$date": ...}`
/// becomes an RFC 3339 timestamp.
pub fn doc_json<T: Serialize>(doc: &T) -> Value {
    let mut value = serde_json::to_value(doc).unwrap_or_else(|_| json!({}));
    normalize_extended_json(&mut value);
    value
}

fn normalize_extended_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(Value::String(hex)) = map.get("$oid") {
                    *value = Value::String(hex.clone());
                    return;
                }
                if let Some(inner) = map.get("$date") {
                    if let Value::String(s) = inner {
                        *value = Value::String(s.clone());
                        return;
                    }
                    if let Some(millis) = extract_millis(inner) {
                        *value = match DateTime::<Utc>::from_timestamp_millis(millis) {
                            Some(dt) => Value::String(dt.to_rfc3339()),
                            None => Value::Null,
                        };
                        return;
                    }
                }
            }
            for v in map.values_mut() {
                normalize_extended_json(v);
            }
        }
        Value::Array(items) => {
            for v in items {
                normalize_extended_json(v);
            }
        }
        _ => {}
    }
}

fn extract_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Object(map) => map
            .get("$numberLong")
            .and_then(|n| n.as_str())
            .and_then(|s| s.parse().ok()),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn test_query_param() {
        let u = uri("/api/v1/projects?category=web&featured=true");
        assert_eq!(query_param(&u, "category"), Some("web".to_string()));
        assert_eq!(query_param(&u, "featured"), Some("true".to_string()));
        assert_eq!(query_param(&u, "missing"), None);
    }

    #[test]
    fn test_query_param_decoding() {
        let u = uri("/api/v1/blog/posts?q=rust+web%20services");
        assert_eq!(query_param(&u, "q"), Some("rust web services".to_string()));
    }

    #[test]
    fn test_pagination_defaults_and_clamps() {
        let p = Pagination::from_uri(&uri("/x"));
        assert_eq!((p.page, p.size), (1, 10));

        let p = Pagination::from_uri(&uri("/x?page=3&size=25"));
        assert_eq!((p.page, p.size), (3, 25));
        assert_eq!(p.skip(), 50);

        // Out-of-range values fall back to defaults.
        let p = Pagination::from_uri(&uri("/x?page=0&size=999"));
        assert_eq!((p.page, p.size), (1, 10));
    }

    #[test]
    fn test_pages_rounds_up() {
        let p = Pagination { page: 1, size: 10 };
        assert_eq!(p.pages(0), 0);
        assert_eq!(p.pages(1), 1);
        assert_eq!(p.pages(10), 1);
        assert_eq!(p.pages(11), 2);
        assert_eq!(p.pages(95), 10);
    }

    #[test]
    fn test_doc_json_flattens_oid_and_date() {
        let raw = json!({
            "_id": { "$oid": "507f1f77bcf86cd799439011" },
            "metadata": {
                "created_at": { "$date": { "$numberLong": "1700000000000" } }
            },
            "title": "hello"
        });
        let mut value = raw;
        normalize_extended_json(&mut value);

        assert_eq!(value["_id"], json!("507f1f77bcf86cd799439011"));
        assert_eq!(value["title"], json!("hello"));
        let created = value["metadata"]["created_at"].as_str().unwrap();
        assert!(created.starts_with("2023-11-14T"));
    }

    #[tokio::test]
    async fn test_parse_json_body_accepts_small_body() {
        let req = Request::builder()
            .body(Full::new(Bytes::from_static(br#"{"ok":true}"#)))
            .unwrap();
        let parsed: Value = parse_json_body(req).await.unwrap();
        assert_eq!(parsed["ok"], json!(true));
    }

    #[tokio::test]
    async fn test_parse_json_body_rejects_oversized_content_length() {
        // The declared length alone is enough to refuse.
        let req = Request::builder()
            .header("content-length", (MAX_JSON_BODY + 1).to_string())
            .body(Full::new(Bytes::from_static(b"{}")))
            .unwrap();
        let parsed: Result<Value, _> = parse_json_body(req).await;
        assert!(matches!(parsed, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_parse_json_body_caps_undeclared_stream() {
        // No Content-Length header: the capped stream stops the read.
        let req = Request::builder()
            .body(Full::new(Bytes::from(vec![b'a'; MAX_JSON_BODY + 1])))
            .unwrap();
        let parsed: Result<Value, _> = parse_json_body(req).await;
        assert!(matches!(parsed, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_error_response_shape() {
        let resp = error_response(&ApiError::RateLimited {
            retry_after_secs: 42,
        });
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(resp.headers().get("Retry-After").unwrap(), "42");
    }
}
