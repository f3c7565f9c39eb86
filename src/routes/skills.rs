//! Skill routes
//!
//! - GET    /api/v1/skills             - list with filters, ordered for display
//! - GET    /api/v1/skills/categories  - known category values
//! - GET    /api/v1/skills/{id}        - single skill
//! - POST   /api/v1/admin/skills       - create
//! - PUT    /api/v1/admin/skills/{id}  - partial update
//! - DELETE /api/v1/admin/skills/{id}  - delete

use bson::{doc, DateTime};
use hyper::{Request, Response, StatusCode};
use serde_json::json;
use std::sync::Arc;

use crate::db::parse_object_id;
use crate::db::schemas::{SkillCategory, SkillDoc, SkillUpdate, SKILL_COLLECTION};
use crate::routes::respond::{
    doc_json, json_response, ok_response, parse_json_body, query_param, BoxBody, StandardResponse,
};
use crate::server::AppState;
use crate::types::{ApiError, Result};

/// GET /api/v1/skills
pub async fn list(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let mut filter = doc! {};
    if let Some(category) = query_param(req.uri(), "category") {
        filter.insert("category", category);
    }
    if let Some(featured) = query_param(req.uri(), "featured") {
        if let Ok(flag) = featured.parse::<bool>() {
            filter.insert("featured", flag);
        }
    }

    let collection = state.mongo.collection::<SkillDoc>(SKILL_COLLECTION).await?;
    let items = collection
        .find_page(filter, doc! { "category": 1, "order": 1 }, 0, 500)
        .await?;

    Ok(ok_response(&json!({
        "items": items.iter().map(doc_json).collect::<Vec<_>>(),
        "total": items.len(),
    })))
}

/// GET /api/v1/skills/categories
pub async fn categories() -> Result<Response<BoxBody>> {
    Ok(ok_response(&json!({
        "categories": SkillCategory::ALL,
    })))
}

/// GET /api/v1/skills/{id}
pub async fn get(id: &str, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let oid = parse_object_id(id)?;

    let collection = state.mongo.collection::<SkillDoc>(SKILL_COLLECTION).await?;
    let skill = collection
        .find_one(doc! { "_id": oid })
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Skill '{}'", id)))?;

    Ok(ok_response(&doc_json(&skill)))
}

/// POST /api/v1/admin/skills
pub async fn create(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let mut skill: SkillDoc = parse_json_body(req).await?;
    skill._id = None;

    if skill.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Skill name is required".to_string()));
    }
    if !(0..=100).contains(&skill.proficiency) {
        return Err(ApiError::BadRequest(
            "Proficiency must be between 0 and 100".to_string(),
        ));
    }

    let collection = state.mongo.collection::<SkillDoc>(SKILL_COLLECTION).await?;

    // Unset display order: append after the current last in the category.
    if skill.order == 0 {
        let last = collection
            .find_page(
                doc! { "category": bson::to_bson(&skill.category)? },
                doc! { "order": -1 },
                0,
                1,
            )
            .await?;
        skill.order = last.first().map(|s| s.order + 1).unwrap_or(1);
    }

    let id = collection.insert_one(skill).await?;

    Ok(json_response(
        StatusCode::CREATED,
        &StandardResponse {
            success: true,
            message: "Skill created successfully".to_string(),
            data: Some(json!({ "skill_id": id.to_hex() })),
        },
    ))
}

/// PUT /api/v1/admin/skills/{id}
pub async fn update(
    id: &str,
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let oid = parse_object_id(id)?;
    let changes: SkillUpdate = parse_json_body(req).await?;

    if let Some(p) = changes.proficiency {
        if !(0..=100).contains(&p) {
            return Err(ApiError::BadRequest(
                "Proficiency must be between 0 and 100".to_string(),
            ));
        }
    }

    let mut set = bson::to_document(&changes)?;
    if set.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }
    set.insert("metadata.updated_at", DateTime::now());

    let collection = state.mongo.collection::<SkillDoc>(SKILL_COLLECTION).await?;
    let result = collection
        .update_one(doc! { "_id": oid }, doc! { "$set": set })
        .await?;

    if result.matched_count == 0 {
        return Err(ApiError::NotFound(format!("Skill '{}'", id)));
    }

    Ok(ok_response(&StandardResponse {
        success: true,
        message: "Skill updated successfully".to_string(),
        data: None,
    }))
}

/// DELETE /api/v1/admin/skills/{id}
pub async fn delete(id: &str, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let oid = parse_object_id(id)?;

    let collection = state.mongo.collection::<SkillDoc>(SKILL_COLLECTION).await?;
    let result = collection.delete_one(doc! { "_id": oid }).await?;

    if result.deleted_count == 0 {
        return Err(ApiError::NotFound(format!("Skill '{}'", id)));
    }

    Ok(ok_response(&StandardResponse {
        success: true,
        message: "Skill deleted successfully".to_string(),
        data: None,
    }))
}
