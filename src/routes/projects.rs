//! Project routes
//!
//! Public reads plus admin-gated mutations (the gate lives in the router):
//! - GET    /api/v1/projects           - paginated list with filters
//! - GET    /api/v1/projects/featured  - featured projects
//! - GET    /api/v1/projects/{id}      - single project (increments views)
//! - POST   /api/v1/admin/projects     - create
//! - PUT    /api/v1/admin/projects/{id} - partial update
//! - DELETE /api/v1/admin/projects/{id} - delete

use bson::{doc, DateTime, Document};
use hyper::{Request, Response, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::db::parse_object_id;
use crate::db::schemas::{ProjectDoc, ProjectUpdate, PROJECT_COLLECTION};
use crate::routes::respond::{
    doc_json, json_response, ok_response, parse_json_body, query_param, BoxBody,
    PaginatedResponse, Pagination, StandardResponse,
};
use crate::server::AppState;
use crate::types::{ApiError, Result};

fn list_filter(req: &Request<hyper::body::Incoming>) -> Document {
    let mut filter = doc! {};
    if let Some(category) = query_param(req.uri(), "category") {
        filter.insert("category", category);
    }
    if let Some(featured) = query_param(req.uri(), "featured") {
        if let Ok(flag) = featured.parse::<bool>() {
            filter.insert("featured", flag);
        }
    }
    if let Some(tech) = query_param(req.uri(), "technology") {
        filter.insert("technologies", tech);
    }
    if let Some(status) = query_param(req.uri(), "status") {
        filter.insert("status", status);
    }
    filter
}

/// GET /api/v1/projects
pub async fn list(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let pagination = Pagination::from_uri(req.uri());
    let filter = list_filter(&req);

    let collection = state
        .mongo
        .collection::<ProjectDoc>(PROJECT_COLLECTION)
        .await?;

    let total = collection.count(filter.clone()).await?;
    let items = collection
        .find_page(
            filter,
            doc! { "featured": -1, "metadata.created_at": -1 },
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

/// GET /api/v1/projects/featured
pub async fn featured(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let limit = query_param(req.uri(), "limit")
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|l| (1..=50).contains(l))
        .unwrap_or(6);

    let collection = state
        .mongo
        .collection::<ProjectDoc>(PROJECT_COLLECTION)
        .await?;

    let items = collection
        .find_page(
            doc! { "featured": true },
            doc! { "metadata.created_at": -1 },
            0,
            limit,
        )
        .await?;

    Ok(ok_response(&json!({
        "items": items.iter().map(doc_json).collect::<Vec<_>>()
    })))
}

/// GET /api/v1/projects/{id}
pub async fn get(
    id: &str,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let oid = parse_object_id(id)?;

    let collection = state
        .mongo
        .collection::<ProjectDoc>(PROJECT_COLLECTION)
        .await?;

    let project = collection
        .find_one(doc! { "_id": oid })
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Project '{}'", id)))?;

    // View count is best-effort; the read already succeeded.
    let _ = collection
        .update_one(doc! { "_id": oid }, doc! { "$inc": { "views": 1 } })
        .await;

    Ok(ok_response(&doc_json(&project)))
}

/// POST /api/v1/admin/projects
pub async fn create(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let mut project: ProjectDoc = parse_json_body(req).await?;
    project._id = None;

    if project.title.trim().is_empty() || project.description.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Title and description are required".to_string(),
        ));
    }

    let collection = state
        .mongo
        .collection::<ProjectDoc>(PROJECT_COLLECTION)
        .await?;
    let id = collection.insert_one(project).await?;

    info!(project_id = %id, "Project created");

    Ok(json_response(
        StatusCode::CREATED,
        &StandardResponse {
            success: true,
            message: "Project created successfully".to_string(),
            data: Some(json!({ "project_id": id.to_hex() })),
        },
    ))
}

/// PUT /api/v1/admin/projects/{id}
pub async fn update(
    id: &str,
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let oid = parse_object_id(id)?;
    let changes: ProjectUpdate = parse_json_body(req).await?;

    let mut set = bson::to_document(&changes)?;
    if set.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }
    set.insert("metadata.updated_at", DateTime::now());

    let collection = state
        .mongo
        .collection::<ProjectDoc>(PROJECT_COLLECTION)
        .await?;
    let result = collection
        .update_one(doc! { "_id": oid }, doc! { "$set": set })
        .await?;

    if result.matched_count == 0 {
        return Err(ApiError::NotFound(format!("Project '{}'", id)));
    }

    Ok(ok_response(&StandardResponse {
        success: true,
        message: "Project updated successfully".to_string(),
        data: None,
    }))
}

/// DELETE /api/v1/admin/projects/{id}
pub async fn delete(id: &str, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let oid = parse_object_id(id)?;

    let collection = state
        .mongo
        .collection::<ProjectDoc>(PROJECT_COLLECTION)
        .await?;
    let result = collection.delete_one(doc! { "_id": oid }).await?;

    if result.deleted_count == 0 {
        return Err(ApiError::NotFound(format!("Project '{}'", id)));
    }

    info!(project_id = %id, "Project deleted");

    Ok(ok_response(&StandardResponse {
        success: true,
        message: "Project deleted successfully".to_string(),
        data: None,
    }))
}
