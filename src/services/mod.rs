//! Services layer
//!
//! - **Notifier**: contact message delivery (log-backed by default)
//! - **FileStore**: local disk storage for uploaded images

pub mod notifier;
pub mod upload;

pub use notifier::{ContactMessage, ContactNotifier, LogNotifier};
pub use upload::{content_type_for_file, extension_for_content_type, FileStore};
