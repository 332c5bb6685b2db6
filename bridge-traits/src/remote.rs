//! Remote Object Store Abstraction
//!
//! Capability set for a remote hierarchical object store: a tree of
//! containers addressed by opaque IDs, holding file objects and
//! provider-native documents.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Kind of a remote entry.
///
/// Provider-native documents have no binary representation and are
/// permanently excluded from synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteEntryKind {
    /// A container holding child objects
    Folder,
    /// An ordinary file with downloadable content
    File,
    /// A provider-native document with no binary export
    NativeDocument,
}

/// Metadata of one remote object
#[derive(Debug, Clone)]
pub struct RemoteEntry {
    /// Opaque object ID
    pub id: String,
    /// Object name within its parent container
    pub name: String,
    /// Tagged kind (folder / file / native document)
    pub kind: RemoteEntryKind,
    /// Modification time as Unix seconds
    pub modified_at: i64,
    /// Parent container IDs
    pub parent_ids: Vec<String>,
}

impl RemoteEntry {
    pub fn is_folder(&self) -> bool {
        self.kind == RemoteEntryKind::Folder
    }

    /// Whether this entry participates in file reconciliation.
    pub fn is_syncable_file(&self) -> bool {
        self.kind == RemoteEntryKind::File
    }
}

/// One page of a container listing
#[derive(Debug, Clone)]
pub struct ChildPage {
    pub entries: Vec<RemoteEntry>,
    /// Cursor for the next page, `None` when exhausted
    pub next_cursor: Option<String>,
}

/// Result of creating a new remote object
#[derive(Debug, Clone)]
pub struct UploadedObject {
    pub id: String,
    /// Server-reported modification time (Unix seconds), authoritative for
    /// the sync baseline
    pub modified_at: i64,
}

/// Result of updating an existing remote object
#[derive(Debug, Clone)]
pub struct UpdatedObject {
    pub modified_at: i64,
}

/// Remote store trait
///
/// Every call implicitly requires a valid bearer credential; implementations
/// are responsible for transparent refresh and fail with an authentication
/// error when refresh is impossible.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// List one page of direct children of a container
    async fn list_children(
        &self,
        container_id: &str,
        cursor: Option<String>,
    ) -> Result<ChildPage>;

    /// Download the full content of an object
    async fn download(&self, id: &str) -> Result<Bytes>;

    /// Create a new object under a container
    async fn upload(&self, name: &str, parent_id: &str, content: Bytes)
        -> Result<UploadedObject>;

    /// Replace the content of an existing object
    async fn update(&self, id: &str, content: Bytes) -> Result<UpdatedObject>;

    /// Create a new container under a parent, returning its ID
    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String>;

    /// Look up an existing child container by name
    ///
    /// Consulted before `create_folder` to avoid duplicating containers
    /// after state loss.
    async fn find_folder(&self, name: &str, parent_id: &str) -> Result<Option<String>>;

    /// Delete an object
    ///
    /// Idempotent: an already-absent object counts as success.
    async fn delete(&self, id: &str) -> Result<()>;
}
