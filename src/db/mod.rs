//! MongoDB persistence layer

pub mod mongo;
pub mod schemas;

pub use mongo::{parse_object_id, IntoIndexes, MongoClient, MongoCollection, MutMetadata};
