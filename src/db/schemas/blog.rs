//! Blog post document schema

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for blog posts
pub const BLOG_COLLECTION: &str = "blog_posts";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BlogStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlogCategory {
    #[default]
    Technology,
    Security,
    WebDevelopment,
    CyberSecurity,
    Programming,
    Tutorial,
    News,
}

impl BlogCategory {
    pub const ALL: [BlogCategory; 7] = [
        BlogCategory::Technology,
        BlogCategory::Security,
        BlogCategory::WebDevelopment,
        BlogCategory::CyberSecurity,
        BlogCategory::Programming,
        BlogCategory::Tutorial,
        BlogCategory::News,
    ];
}

/// Blog post stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct BlogPostDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    pub title: String,

    /// URL-safe identifier, unique across all posts
    pub slug: String,

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

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,

    /// Estimated read time in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_time: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,

    /// Set the first time the post transitions to published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime>,

    #[serde(default)]
    pub views: i64,

    #[serde(default)]
    pub likes: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct BlogPostUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<BlogCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BlogStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_time: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
}

impl IntoIndexes for BlogPostDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "slug": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("slug_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "status": 1, "published_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("status_published".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "category": 1 },
                Some(
                    IndexOptions::builder()
                        .name("category_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for BlogPostDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
