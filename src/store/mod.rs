//! External document store: the only place persistent state lives.
//!
//! Handlers never talk to a backend directly; they receive an
//! `Arc<dyn DocumentStore>` through application state so the Postgres store
//! and the in-memory store are interchangeable.

pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::filter::FilterData;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

/// A stored document: a flat JSON object with `id`, `created_at`, `updated_at`
pub type Document = Map<String, Value>;

/// Fields the store owns; callers cannot set them
pub const SYSTEM_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Workspaces,
    Members,
    Projects,
    Tasks,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Workspaces,
        Collection::Members,
        Collection::Projects,
        Collection::Tasks,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Workspaces => "workspaces",
            Collection::Members => "members",
            Collection::Projects => "projects",
            Collection::Tasks => "tasks",
        }
    }

    pub fn singular(&self) -> &'static str {
        match self {
            Collection::Workspaces => "Workspace",
            Collection::Members => "Member",
            Collection::Projects => "Project",
            Collection::Tasks => "Task",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// One page of documents plus the number of matches ignoring paging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentList<T> {
    pub documents: Vec<T>,
    pub total: usize,
}

impl<T> DocumentList<T> {
    pub fn empty() -> Self {
        Self { documents: vec![], total: 0 }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> DocumentList<U> {
        DocumentList {
            documents: self.documents.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

impl DocumentList<Document> {
    /// Deserialize every document into a typed model
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<DocumentList<T>, StoreError> {
        let documents = self
            .documents
            .into_iter()
            .map(from_document)
            .collect::<Result<Vec<T>, _>>()?;
        Ok(DocumentList { documents, total: self.total })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{collection} document not found: {id}")]
    NotFound { collection: Collection, id: String },

    #[error("Store connection error: {0}")]
    Connection(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<crate::filter::error::FilterError> for StoreError {
    fn from(err: crate::filter::error::FilterError) -> Self {
        StoreError::InvalidQuery(err.to_string())
    }
}

/// CRUD over named collections with the JSON filter language
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_documents(&self, collection: Collection, filter: FilterData) -> Result<DocumentList<Document>, StoreError>;

    async fn get_document(&self, collection: Collection, id: &str) -> Result<Document, StoreError>;

    /// Inserts `data`; the store assigns `id`, `created_at` and `updated_at`
    async fn create_document(&self, collection: Collection, data: Document) -> Result<Document, StoreError>;

    /// Merges `data` into the stored document and bumps `updated_at`
    async fn update_document(&self, collection: Collection, id: &str, data: Document) -> Result<Document, StoreError>;

    async fn delete_document(&self, collection: Collection, id: &str) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

/// Serialize a model into document fields, dropping store-owned fields
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(mut map) => {
            for field in SYSTEM_FIELDS {
                map.remove(field);
            }
            Ok(map)
        }
        other => Err(StoreError::InvalidQuery(format!("document must be an object, got {}", other))),
    }
}
