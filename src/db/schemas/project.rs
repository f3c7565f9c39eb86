//! Project document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for projects
pub const PROJECT_COLLECTION: &str = "projects";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Planning,
    Development,
    Testing,
    Deployed,
    Maintenance,
}

/// Project document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ProjectDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    pub title: String,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,

    #[serde(default)]
    pub technologies: Vec<String>,

    pub category: String,

    #[serde(default)]
    pub status: ProjectStatus,

    #[serde(default)]
    pub featured: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub views: i64,

    #[serde(default)]
    pub likes: i64,
}

/// Partial update payload; only present fields reach the `$set` document.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technologies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl IntoIndexes for ProjectDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "featured": -1, "metadata.created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("featured_recent".to_string())
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
            (
                doc! { "technologies": 1 },
                Some(
                    IndexOptions::builder()
                        .name("technologies_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for ProjectDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
