use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use super::{new_document_id, Collection, Document, DocumentList, DocumentStore, StoreError, SYSTEM_FIELDS};
use crate::filter::{FilterData, FilterMatcher};

/// Kind of call recorded in the operation log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOpKind {
    List,
    Get,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOp {
    pub kind: StoreOpKind,
    pub collection: Collection,
}

#[derive(Default)]
struct Collections {
    docs: HashMap<Collection, Vec<Document>>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Collections {
    /// Strictly increasing timestamps so `created_at` ordering is stable
    fn next_timestamp(&mut self) -> String {
        let mut now = Utc::now();
        if let Some(last) = self.last_timestamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_timestamp = Some(now);
        now.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

/// In-process document store. Keeps an operation log so callers can verify
/// which store calls an operation issued.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<Collections>,
    ops: Mutex<Vec<StoreOp>>,
    unavailable: AtomicBool,
    max_limit: Option<i32>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_limit(mut self, max_limit: Option<i32>) -> Self {
        self.max_limit = max_limit;
        self
    }

    /// Every call fails with a connection error while set
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn operations(&self) -> Vec<StoreOp> {
        self.ops.lock().map(|ops| ops.clone()).unwrap_or_default()
    }

    pub fn clear_operations(&self) {
        if let Ok(mut ops) = self.ops.lock() {
            ops.clear();
        }
    }

    /// Number of logged calls of `kind` against `collection`
    pub fn count_operations(&self, kind: StoreOpKind, collection: Collection) -> usize {
        self.operations()
            .iter()
            .filter(|op| op.kind == kind && op.collection == collection)
            .count()
    }

    fn record(&self, kind: StoreOpKind, collection: Collection) -> Result<(), StoreError> {
        if let Ok(mut ops) = self.ops.lock() {
            ops.push(StoreOp { kind, collection });
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("memory store marked unavailable".to_string()));
        }
        Ok(())
    }

    fn not_found(collection: Collection, id: &str) -> StoreError {
        StoreError::NotFound { collection, id: id.to_string() }
    }
}

fn strip_system_fields(mut data: Document) -> Document {
    for field in SYSTEM_FIELDS {
        data.remove(field);
    }
    data
}

fn doc_id(doc: &Document) -> Option<&str> {
    doc.get("id").and_then(Value::as_str)
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list_documents(&self, collection: Collection, filter: FilterData) -> Result<DocumentList<Document>, StoreError> {
        self.record(StoreOpKind::List, collection)?;
        let matcher = FilterMatcher::new(&filter, self.max_limit)?;

        let state = self.collections.read().await;
        let docs = state.docs.get(&collection).map(|v| v.as_slice()).unwrap_or(&[]);
        let (documents, total) = matcher.apply(docs.iter())?;
        Ok(DocumentList { documents, total })
    }

    async fn get_document(&self, collection: Collection, id: &str) -> Result<Document, StoreError> {
        self.record(StoreOpKind::Get, collection)?;
        let state = self.collections.read().await;
        state
            .docs
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| doc_id(d) == Some(id)))
            .cloned()
            .ok_or_else(|| Self::not_found(collection, id))
    }

    async fn create_document(&self, collection: Collection, data: Document) -> Result<Document, StoreError> {
        self.record(StoreOpKind::Create, collection)?;
        let mut state = self.collections.write().await;
        let timestamp = state.next_timestamp();

        let mut doc = strip_system_fields(data);
        doc.insert("id".to_string(), Value::String(new_document_id()));
        doc.insert("created_at".to_string(), Value::String(timestamp.clone()));
        doc.insert("updated_at".to_string(), Value::String(timestamp));

        state.docs.entry(collection).or_default().push(doc.clone());
        Ok(doc)
    }

    async fn update_document(&self, collection: Collection, id: &str, data: Document) -> Result<Document, StoreError> {
        self.record(StoreOpKind::Update, collection)?;
        let mut state = self.collections.write().await;
        let timestamp = state.next_timestamp();

        let doc = state
            .docs
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|d| doc_id(d) == Some(id)))
            .ok_or_else(|| Self::not_found(collection, id))?;

        doc.extend(strip_system_fields(data));
        doc.insert("updated_at".to_string(), Value::String(timestamp));
        Ok(doc.clone())
    }

    async fn delete_document(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        self.record(StoreOpKind::Delete, collection)?;
        let mut state = self.collections.write().await;
        let docs = state.docs.entry(collection).or_default();
        let before = docs.len();
        docs.retain(|d| doc_id(d) != Some(id));
        if docs.len() == before {
            return Err(Self::not_found(collection, id));
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("memory store marked unavailable".to_string()));
        }
        Ok(())
    }
}
