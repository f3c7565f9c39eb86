//! Admin notification routes (all behind the auth gate)
//!
//! - GET    /api/v1/admin/notifications            - paginated list
//! - POST   /api/v1/admin/notifications            - create
//! - GET    /api/v1/admin/notifications/stats      - counts by kind/priority
//! - PUT    /api/v1/admin/notifications/read-all   - mark everything read
//! - PUT    /api/v1/admin/notifications/{id}/read  - mark one read
//! - DELETE /api/v1/admin/notifications/{id}       - delete

use bson::{doc, DateTime, Document};
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::auth::Claims;
use crate::db::parse_object_id;
use crate::db::schemas::{
    NotificationDoc, NotificationKind, NotificationPriority, NOTIFICATION_COLLECTION,
};
use crate::routes::respond::{
    doc_json, json_response, ok_response, parse_json_body, query_param, BoxBody, Pagination,
    StandardResponse,
};
use crate::server::AppState;
use crate::types::{ApiError, Result};

/// GET /api/v1/admin/notifications
pub async fn list(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let pagination = Pagination::from_uri(req.uri());

    let mut filter = Document::new();
    if query_param(req.uri(), "unread_only").as_deref() == Some("true") {
        filter.insert("read", false);
    }
    if let Some(kind) = query_param(req.uri(), "kind") {
        filter.insert("kind", kind);
    }

    let collection = state
        .mongo
        .collection::<NotificationDoc>(NOTIFICATION_COLLECTION)
        .await?;

    let total = collection.count(filter.clone()).await?;
    let unread = collection.count(doc! { "read": false }).await?;
    let items = collection
        .find_page(
            filter,
            doc! { "metadata.created_at": -1 },
            pagination.skip(),
            pagination.size,
        )
        .await?;

    Ok(ok_response(&json!({
        "items": items.iter().map(doc_json).collect::<Vec<_>>(),
        "total": total,
        "unread": unread,
        "page": pagination.page,
        "size": pagination.size,
        "pages": pagination.pages(total),
    })))
}

#[derive(Debug, Deserialize)]
pub struct NotificationCreateRequest {
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub kind: NotificationKind,
    #[serde(default)]
    pub priority: NotificationPriority,
    #[serde(default)]
    pub action_url: Option<String>,
}

fn build_notification(body: NotificationCreateRequest, created_by: &str) -> NotificationDoc {
    NotificationDoc {
        _id: None,
        metadata: Default::default(),
        title: body.title,
        message: body.message,
        kind: body.kind,
        priority: body.priority,
        read: false,
        action_url: body.action_url,
        created_by: Some(created_by.to_string()),
    }
}

/// POST /api/v1/admin/notifications
pub async fn create(
    claims: &Claims,
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let body: NotificationCreateRequest = parse_json_body(req).await?;

    if body.title.trim().is_empty() || body.message.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Title and message are required".to_string(),
        ));
    }

    let notification = build_notification(body, &claims.sub);

    let collection = state
        .mongo
        .collection::<NotificationDoc>(NOTIFICATION_COLLECTION)
        .await?;
    let id = collection.insert_one(notification).await?;

    Ok(json_response(
        StatusCode::CREATED,
        &StandardResponse {
            success: true,
            message: "Notification created".to_string(),
            data: Some(json!({ "notification_id": id.to_hex() })),
        },
    ))
}

/// GET /api/v1/admin/notifications/stats
pub async fn stats(state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let collection = state
        .mongo
        .collection::<NotificationDoc>(NOTIFICATION_COLLECTION)
        .await?;

    let total = collection.count(doc! {}).await?;
    let unread = collection.count(doc! { "read": false }).await?;

    let mut by_kind = Map::new();
    for kind in NotificationKind::ALL {
        let key = bson::to_bson(&kind)?;
        let count = collection.count(doc! { "kind": &key }).await?;
        if let bson::Bson::String(name) = key {
            by_kind.insert(name, Value::from(count));
        }
    }

    let mut by_priority = Map::new();
    for priority in NotificationPriority::ALL {
        let key = bson::to_bson(&priority)?;
        let count = collection.count(doc! { "priority": &key }).await?;
        if let bson::Bson::String(name) = key {
            by_priority.insert(name, Value::from(count));
        }
    }

    Ok(ok_response(&json!({
        "total": total,
        "unread": unread,
        "by_kind": by_kind,
        "by_priority": by_priority,
    })))
}

/// PUT /api/v1/admin/notifications/{id}/read
pub async fn mark_read(id: &str, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let oid = parse_object_id(id)?;

    let collection = state
        .mongo
        .collection::<NotificationDoc>(NOTIFICATION_COLLECTION)
        .await?;
    let result = collection
        .update_one(
            doc! { "_id": oid },
            doc! { "$set": { "read": true, "metadata.updated_at": DateTime::now() } },
        )
        .await?;

    if result.matched_count == 0 {
        return Err(ApiError::NotFound(format!("Notification '{}'", id)));
    }

    Ok(ok_response(&StandardResponse {
        success: true,
        message: "Notification marked as read".to_string(),
        data: None,
    }))
}

/// PUT /api/v1/admin/notifications/read-all
pub async fn mark_all_read(state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let collection = state
        .mongo
        .collection::<NotificationDoc>(NOTIFICATION_COLLECTION)
        .await?;
    let result = collection
        .update_many(
            doc! { "read": false },
            doc! { "$set": { "read": true, "metadata.updated_at": DateTime::now() } },
        )
        .await?;

    Ok(ok_response(&StandardResponse {
        success: true,
        message: format!("{} notifications marked as read", result.modified_count),
        data: Some(json!({ "modified": result.modified_count })),
    }))
}

/// DELETE /api/v1/admin/notifications/{id}
pub async fn delete(id: &str, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let oid = parse_object_id(id)?;

    let collection = state
        .mongo
        .collection::<NotificationDoc>(NOTIFICATION_COLLECTION)
        .await?;
    let result = collection.delete_one(doc! { "_id": oid }).await?;

    if result.deleted_count == 0 {
        return Err(ApiError::NotFound(format!("Notification '{}'", id)));
    }

    Ok(ok_response(&StandardResponse {
        success: true,
        message: "Notification deleted".to_string(),
        data: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_notification_stamps_creator() {
        let body = NotificationCreateRequest {
            title: "Deploy finished".to_string(),
            message: "v0.1.0 is live".to_string(),
            kind: Default::default(),
            priority: Default::default(),
            action_url: None,
        };

        let doc = build_notification(body, "admin");
        assert_eq!(doc.created_by.as_deref(), Some("admin"));
        assert!(!doc.read);
        assert!(doc._id.is_none());
    }
}
