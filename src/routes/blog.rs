//! Blog routes
//!
//! Public readers only ever see published posts; the admin list shows
//! everything. Posts are addressable by ObjectId or slug, and slugs are
//! generated from titles with numeric suffixes on collision.
//!
//! - GET    /api/v1/blog/posts            - published posts, paginated
//! - GET    /api/v1/blog/posts/featured   - featured published posts
//! - GET    /api/v1/blog/categories       - known category values
//! - GET    /api/v1/blog/stats            - aggregate view/like counts
//! - GET    /api/v1/blog/posts/{id|slug}  - single published post (counts a view)
//! - GET    /api/v1/admin/blog/posts      - all posts regardless of status
//! - POST   /api/v1/admin/blog/posts      - create
//! - PUT    /api/v1/admin/blog/posts/{id} - partial update
//! - DELETE /api/v1/admin/blog/posts/{id} - delete

use bson::{doc, oid::ObjectId, DateTime, Document};
use futures_util::StreamExt;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::db::mongo::MongoCollection;
use crate::db::parse_object_id;
use crate::db::schemas::{
    BlogCategory, BlogPostDoc, BlogPostUpdate, BlogStatus, BLOG_COLLECTION,
};
use crate::routes::respond::{
    doc_json, json_response, ok_response, parse_json_body, query_param, BoxBody,
    PaginatedResponse, Pagination, StandardResponse,
};
use crate::server::AppState;
use crate::types::{ApiError, Result};

/// Turn a title into a URL-safe slug: lowercase ASCII alphanumerics with
/// single dashes, no leading or trailing dash.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut prev_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        "post".to_string()
    } else {
        slug
    }
}

/// Find the first free slug: `base`, then `base-1`, `base-2`, ...
///
/// `exclude` skips the post being renamed so saving without a title change
/// never bumps its own slug.
async fn unique_slug(
    collection: &MongoCollection<BlogPostDoc>,
    base: &str,
    exclude: Option<ObjectId>,
) -> Result<String> {
    let mut candidate = base.to_string();
    let mut suffix = 0u32;
    loop {
        let mut filter = doc! { "slug": &candidate };
        if let Some(oid) = exclude {
            filter.insert("_id", doc! { "$ne": oid });
        }
        if collection.find_one(filter).await?.is_none() {
            return Ok(candidate);
        }
        suffix += 1;
        candidate = format!("{}-{}", base, suffix);
    }
}

/// Escapes regex metacharacters so user search terms match literally.
fn escape_regex(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(
            c,
            '.' | '^' | '$' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '\\'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

async fn paginated_list(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    published_only: bool,
) -> Result<Response<BoxBody>> {
    let pagination = Pagination::from_uri(req.uri());

    let mut filter = Document::new();
    if published_only {
        filter.insert("status", "published");
    } else if let Some(status) = query_param(req.uri(), "status") {
        filter.insert("status", status);
    }
    if let Some(category) = query_param(req.uri(), "category") {
        filter.insert("category", category);
    }
    if let Some(tag) = query_param(req.uri(), "tag") {
        filter.insert("tags", tag);
    }
    if query_param(req.uri(), "featured").as_deref() == Some("true") {
        filter.insert("featured", true);
    }
    if let Some(term) = query_param(req.uri(), "search") {
        let pattern = escape_regex(&term);
        filter.insert(
            "$or",
            vec![
                doc! { "title": { "$regex": &pattern, "$options": "i" } },
                doc! { "excerpt": { "$regex": &pattern, "$options": "i" } },
                doc! { "content": { "$regex": &pattern, "$options": "i" } },
            ],
        );
    }

    let collection = state
        .mongo
        .collection::<BlogPostDoc>(BLOG_COLLECTION)
        .await?;

    let total = collection.count(filter.clone()).await?;
    let items = collection
        .find_page(
            filter,
            doc! { "published_at": -1, "metadata.created_at": -1 },
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

/// GET /api/v1/blog/posts
pub async fn list_published(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    paginated_list(req, state, true).await
}

/// GET /api/v1/admin/blog/posts
pub async fn list_all(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    paginated_list(req, state, false).await
}

/// GET /api/v1/blog/posts/featured
pub async fn featured(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let limit = query_param(req.uri(), "limit")
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|l| (1..=20).contains(l))
        .unwrap_or(3);

    let collection = state
        .mongo
        .collection::<BlogPostDoc>(BLOG_COLLECTION)
        .await?;

    let items = collection
        .find_page(
            doc! { "status": "published", "featured": true },
            doc! { "published_at": -1 },
            0,
            limit,
        )
        .await?;

    Ok(ok_response(&json!({
        "items": items.iter().map(doc_json).collect::<Vec<_>>()
    })))
}

/// GET /api/v1/blog/categories
pub async fn categories() -> Result<Response<BoxBody>> {
    Ok(ok_response(&json!({
        "categories": BlogCategory::ALL,
    })))
}

/// GET /api/v1/blog/stats
pub async fn stats(state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let collection = state
        .mongo
        .collection::<BlogPostDoc>(BLOG_COLLECTION)
        .await?;

    let pipeline = vec![
        doc! { "$match": { "status": "published" } },
        doc! { "$group": {
            "_id": null,
            "total_views": { "$sum": "$views" },
            "total_likes": { "$sum": "$likes" },
            "published_posts": { "$sum": 1 },
        }},
    ];

    let mut cursor = collection.inner().aggregate(pipeline).await?;
    let totals = cursor.next().await.transpose()?;

    let drafts = collection.count(doc! { "status": "draft" }).await?;

    let (views, likes, published) = totals
        .map(|d| {
            (
                d.get_i64("total_views").unwrap_or_default(),
                d.get_i64("total_likes").unwrap_or_default(),
                d.get_i32("published_posts").unwrap_or_default() as i64,
            )
        })
        .unwrap_or((0, 0, 0));

    Ok(ok_response(&json!({
        "published_posts": published,
        "draft_posts": drafts,
        "total_views": views,
        "total_likes": likes,
    })))
}

/// GET /api/v1/blog/posts/{id|slug}
pub async fn get_published(
    identifier: &str,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let collection = state
        .mongo
        .collection::<BlogPostDoc>(BLOG_COLLECTION)
        .await?;

    let mut filter = match ObjectId::parse_str(identifier) {
        Ok(oid) => doc! { "_id": oid },
        Err(_) => doc! { "slug": identifier },
    };
    filter.insert("status", "published");

    let post = collection
        .find_one(filter.clone())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Blog post '{}'", identifier)))?;

    let _ = collection
        .update_one(filter, doc! { "$inc": { "views": 1 } })
        .await;

    Ok(ok_response(&doc_json(&post)))
}

#[derive(Debug, Deserialize)]
pub struct BlogPostCreateRequest {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    #[serde(default)]
    pub category: BlogCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: BlogStatus,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub read_time: Option<i32>,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
}

/// POST /api/v1/admin/blog/posts
pub async fn create(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let body: BlogPostCreateRequest = parse_json_body(req).await?;

    if body.title.trim().is_empty() || body.content.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Title and content are required".to_string(),
        ));
    }

    let collection = state
        .mongo
        .collection::<BlogPostDoc>(BLOG_COLLECTION)
        .await?;

    let slug = unique_slug(&collection, &slugify(&body.title), None).await?;
    let published_at = (body.status == BlogStatus::Published).then(DateTime::now);

    let post = BlogPostDoc {
        _id: None,
        metadata: Default::default(),
        title: body.title.trim().to_string(),
        slug: slug.clone(),
        excerpt: body.excerpt,
        content: body.content,
        category: body.category,
        tags: body.tags,
        status: body.status,
        featured: body.featured,
        featured_image: body.featured_image,
        read_time: body.read_time,
        meta_title: body.meta_title,
        meta_description: body.meta_description,
        published_at,
        views: 0,
        likes: 0,
    };

    let id = collection.insert_one(post).await?;

    info!(post_id = %id, %slug, "Blog post created");

    Ok(json_response(
        StatusCode::CREATED,
        &StandardResponse {
            success: true,
            message: "Blog post created successfully".to_string(),
            data: Some(json!({ "post_id": id.to_hex(), "slug": slug })),
        },
    ))
}

/// PUT /api/v1/admin/blog/posts/{id}
pub async fn update(
    id: &str,
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let oid = parse_object_id(id)?;
    let changes: BlogPostUpdate = parse_json_body(req).await?;

    let collection = state
        .mongo
        .collection::<BlogPostDoc>(BLOG_COLLECTION)
        .await?;

    let existing = collection
        .find_one(doc! { "_id": oid })
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Blog post '{}'", id)))?;

    let mut set = bson::to_document(&changes)?;
    if set.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    // A new title regenerates the slug, skipping this post's own entry.
    if let Some(ref title) = changes.title {
        if *title != existing.title {
            let slug = unique_slug(&collection, &slugify(title), Some(oid)).await?;
            set.insert("slug", slug);
        }
    }

    // First transition to published stamps the publication time.
    if changes.status == Some(BlogStatus::Published) && existing.published_at.is_none() {
        set.insert("published_at", DateTime::now());
    }

    set.insert("metadata.updated_at", DateTime::now());

    collection
        .update_one(doc! { "_id": oid }, doc! { "$set": set })
        .await?;

    Ok(ok_response(&StandardResponse {
        success: true,
        message: "Blog post updated successfully".to_string(),
        data: None,
    }))
}

/// DELETE /api/v1/admin/blog/posts/{id}
pub async fn delete(id: &str, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let oid = parse_object_id(id)?;

    let collection = state
        .mongo
        .collection::<BlogPostDoc>(BLOG_COLLECTION)
        .await?;
    let result = collection.delete_one(doc! { "_id": oid }).await?;

    if result.deleted_count == 0 {
        return Err(ApiError::NotFound(format!("Blog post '{}'", id)));
    }

    info!(post_id = %id, "Blog post deleted");

    Ok(ok_response(&StandardResponse {
        success: true,
        message: "Blog post deleted successfully".to_string(),
        data: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Rust & WebAssembly!"), "rust-webassembly");
        assert_eq!(slugify("  spaces   everywhere  "), "spaces-everywhere");
    }

    #[test]
    fn test_slugify_collapses_punctuation_runs() {
        assert_eq!(slugify("C++ --- rocks?!"), "c-rocks");
        assert_eq!(slugify("a...b"), "a-b");
    }

    #[test]
    fn test_slugify_strips_edges() {
        assert_eq!(slugify("---title---"), "title");
        assert_eq!(slugify("!!!"), "post");
        assert_eq!(slugify(""), "post");
    }

    #[test]
    fn test_slugify_preserves_digits() {
        assert_eq!(slugify("Top 10 Tips for 2024"), "top-10-tips-for-2024");
    }

    #[test]
    fn test_escape_regex_literals_metacharacters() {
        assert_eq!(escape_regex("a.b*c"), "a\\.b\\*c");
        assert_eq!(escape_regex("(rust)"), "\\(rust\\)");
        assert_eq!(escape_regex("plain words"), "plain words");
    }
}
