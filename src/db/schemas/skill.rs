//! Skill document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for skills
pub const SKILL_COLLECTION: &str = "skills";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    #[default]
    Frontend,
    Backend,
    Database,
    Devops,
    Tools,
    SoftSkills,
}

impl SkillCategory {
    pub const ALL: [SkillCategory; 6] = [
        SkillCategory::Frontend,
        SkillCategory::Backend,
        SkillCategory::Database,
        SkillCategory::Devops,
        SkillCategory::Tools,
        SkillCategory::SoftSkills,
    ];
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

/// Skill document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SkillDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    pub name: String,

    #[serde(default)]
    pub category: SkillCategory,

    #[serde(default)]
    pub level: SkillLevel,

    /// Self-assessed proficiency, 0-100
    #[serde(default)]
    pub proficiency: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_experience: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub featured: bool,

    /// Display order within a category
    #[serde(default)]
    pub order: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SkillUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<SkillCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<SkillLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proficiency: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_experience: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
}

impl IntoIndexes for SkillDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "category": 1, "order": 1 },
                Some(
                    IndexOptions::builder()
                        .name("category_order".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "featured": -1 },
                Some(
                    IndexOptions::builder()
                        .name("featured_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for SkillDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
