//! Database schemas for the portfolio API
//!
//! Defines MongoDB document structures for projects, skills, contact
//! messages, blog posts, and admin notifications.

mod blog;
mod contact;
mod metadata;
mod notification;
mod project;
mod skill;

pub use blog::{BlogCategory, BlogPostDoc, BlogPostUpdate, BlogStatus, BLOG_COLLECTION};
pub use contact::{ContactDoc, ContactStatus, CONTACT_COLLECTION};
pub use metadata::Metadata;
pub use notification::{
    NotificationDoc, NotificationKind, NotificationPriority, NOTIFICATION_COLLECTION,
};
pub use project::{ProjectDoc, ProjectStatus, ProjectUpdate, PROJECT_COLLECTION};
pub use skill::{SkillCategory, SkillDoc, SkillLevel, SkillUpdate, SKILL_COLLECTION};
