//! Contact message routes
//!
//! - POST   /api/v1/contacts                 - public form submission
//! - GET    /api/v1/admin/contacts           - paginated list, status filter
//! - PUT    /api/v1/admin/contacts/{id}/status - triage status change
//! - DELETE /api/v1/admin/contacts/{id}      - delete

use bson::{doc, DateTime, Document};
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::auth::client_ip;
use crate::db::parse_object_id;
use crate::db::schemas::{ContactDoc, ContactStatus, CONTACT_COLLECTION};
use crate::routes::respond::{
    doc_json, json_response, ok_response, parse_json_body, query_param, BoxBody,
    PaginatedResponse, Pagination, StandardResponse,
};
use crate::server::AppState;
use crate::services::ContactMessage;
use crate::types::{ApiError, Result};

#[derive(Debug, Deserialize)]
pub struct ContactCreateRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

fn validate(body: &ContactCreateRequest) -> Result<()> {
    if body.name.trim().is_empty() || body.subject.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Name and subject are required".to_string(),
        ));
    }
    if !body.email.contains('@') || body.email.len() > 320 {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    if body.message.trim().len() < 10 {
        return Err(ApiError::BadRequest(
            "Message must be at least 10 characters".to_string(),
        ));
    }
    Ok(())
}

/// POST /api/v1/contacts
pub async fn create(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    peer: SocketAddr,
) -> Result<Response<BoxBody>> {
    let ip = client_ip(&req, peer).to_string();
    let user_agent = req
        .headers()
        .get(hyper::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body: ContactCreateRequest = parse_json_body(req).await?;
    validate(&body)?;

    let contact = ContactDoc {
        _id: None,
        metadata: Default::default(),
        name: body.name.trim().to_string(),
        email: body.email.trim().to_string(),
        subject: body.subject.trim().to_string(),
        message: body.message.trim().to_string(),
        company: body.company,
        phone: body.phone,
        status: ContactStatus::New,
        ip_address: Some(ip.clone()),
        user_agent,
    };

    let notification = ContactMessage {
        name: contact.name.clone(),
        email: contact.email.clone(),
        subject: contact.subject.clone(),
        message: contact.message.clone(),
        ip_address: Some(ip),
    };

    let collection = state
        .mongo
        .collection::<ContactDoc>(CONTACT_COLLECTION)
        .await?;
    let id = collection.insert_one(contact).await?;

    // Delivery failures must not affect the stored message.
    state.notifier.notify(notification);

    Ok(json_response(
        StatusCode::CREATED,
        &StandardResponse {
            success: true,
            message: "Message sent successfully".to_string(),
            data: Some(json!({ "contact_id": id.to_hex() })),
        },
    ))
}

/// GET /api/v1/admin/contacts
pub async fn list(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let pagination = Pagination::from_uri(req.uri());

    let mut filter = Document::new();
    if let Some(status) = query_param(req.uri(), "status") {
        filter.insert("status", status);
    }

    let collection = state
        .mongo
        .collection::<ContactDoc>(CONTACT_COLLECTION)
        .await?;

    let total = collection.count(filter.clone()).await?;
    let items = collection
        .find_page(
            filter,
            doc! { "metadata.created_at": -1 },
            pagination.skip(),
            pagination.size,
        )
        .await?;

    Ok(ok_response(&PaginatedResponse {
        items: items.iter().map(doc_json).collect(),
        total,
        page: pagination.page,
        size: pagination.size,
        pages: pagination.pages(total),
    }))
}

/// GET /api/v1/admin/contacts/{id}
pub async fn get(id: &str, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let oid = parse_object_id(id)?;

    let collection = state
        .mongo
        .collection::<ContactDoc>(CONTACT_COLLECTION)
        .await?;
    let contact = collection
        .find_one(doc! { "_id": oid })
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Contact '{}'", id)))?;

    Ok(ok_response(&doc_json(&contact)))
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: ContactStatus,
}

/// PUT /api/v1/admin/contacts/{id}/status
pub async fn set_status(
    id: &str,
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let oid = parse_object_id(id)?;
    let body: StatusChangeRequest = parse_json_body(req).await?;

    let collection = state
        .mongo
        .collection::<ContactDoc>(CONTACT_COLLECTION)
        .await?;
    let result = collection
        .update_one(
            doc! { "_id": oid },
            doc! { "$set": {
                "status": bson::to_bson(&body.status)?,
                "metadata.updated_at": DateTime::now(),
            }},
        )
        .await?;

    if result.matched_count == 0 {
        return Err(ApiError::NotFound(format!("Contact '{}'", id)));
    }

    Ok(ok_response(&StandardResponse {
        success: true,
        message: "Contact status updated".to_string(),
        data: None,
    }))
}

/// DELETE /api/v1/admin/contacts/{id}
pub async fn delete(id: &str, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let oid = parse_object_id(id)?;

    let collection = state
        .mongo
        .collection::<ContactDoc>(CONTACT_COLLECTION)
        .await?;
    let result = collection.delete_one(doc! { "_id": oid }).await?;

    if result.deleted_count == 0 {
        return Err(ApiError::NotFound(format!("Contact '{}'", id)));
    }

    Ok(ok_response(&StandardResponse {
        success: true,
        message: "Contact deleted successfully".to_string(),
        data: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(message_len: usize) -> ContactCreateRequest {
        ContactCreateRequest {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            subject: "Hello".to_string(),
            message: "x".repeat(message_len),
            company: None,
            phone: None,
        }
    }

    #[test]
    fn test_validate_accepts_good_input() {
        assert!(validate(&request(50)).is_ok());
    }

    #[test]
    fn test_validate_rejects_short_message() {
        assert!(validate(&request(5)).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_email() {
        let mut body = request(50);
        body.email = "not-an-email".to_string();
        assert!(validate(&body).is_err());
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let mut body = request(50);
        body.name = "   ".to_string();
        assert!(validate(&body).is_err());
    }

    #[test]
    fn test_single_contact_response_shape() {
        let contact = ContactDoc {
            _id: Some(bson::oid::ObjectId::new()),
            metadata: Default::default(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            subject: "Hello".to_string(),
            message: "A long enough message".to_string(),
            company: None,
            phone: None,
            status: ContactStatus::New,
            ip_address: Some("203.0.113.7".to_string()),
            user_agent: Some("test".to_string()),
        };

        let value = doc_json(&contact);
        assert_eq!(value["status"], json!("new"));
        assert_eq!(value["email"], json!("alice@example.com"));
        // ObjectId is flattened to its hex string for API consumers.
        assert!(value["_id"].is_string());
    }
}
