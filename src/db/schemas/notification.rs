//! Admin notification document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for notifications
pub const NOTIFICATION_COLLECTION: &str = "notifications";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
    Security,
    System,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 6] = [
        NotificationKind::Info,
        NotificationKind::Success,
        NotificationKind::Warning,
        NotificationKind::Error,
        NotificationKind::Security,
        NotificationKind::System,
    ];
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl NotificationPriority {
    pub const ALL: [NotificationPriority; 4] = [
        NotificationPriority::Low,
        NotificationPriority::Medium,
        NotificationPriority::High,
        NotificationPriority::Critical,
    ];
}

/// Notification shown in the admin dashboard
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct NotificationDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    pub title: String,

    pub message: String,

    #[serde(default)]
    pub kind: NotificationKind,

    #[serde(default)]
    pub priority: NotificationPriority,

    #[serde(default)]
    pub read: bool,

    /// Optional link target for the dashboard entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,

    /// Username of the admin who created the notification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl IntoIndexes for NotificationDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "read": 1, "metadata.created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("read_recent".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "kind": 1 },
                Some(
                    IndexOptions::builder()
                        .name("kind_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for NotificationDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
