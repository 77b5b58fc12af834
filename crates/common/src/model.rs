use std::fmt;

use object_store::BlobId;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::content_type::DIRECTORY_CONTENT_TYPE;
use crate::hash::ContentHash;
use crate::path;

/// Identity of the tenant a node belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for OwnerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// File or directory, without any payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    File,
    Directory,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::File => "file",
            NodeType::Directory => "directory",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "file" => Some(NodeType::File),
            "directory" => Some(NodeType::Directory),
            _ => None,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    File { blob_id: BlobId },
    Directory,
}

/// An entry in an owner's tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Last path segment (`/` for the root)
    pub name: String,
    /// Canonical absolute path; unique per owner
    pub path: String,
    pub size: u64,
    pub content_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub owner_id: OwnerId,
    pub kind: NodeKind,
}

impl Node {
    pub(crate) fn directory(owner_id: &OwnerId, path: &str, now: OffsetDateTime) -> Self {
        Self {
            name: path::basename(path),
            path: path.to_string(),
            size: 0,
            content_type: DIRECTORY_CONTENT_TYPE.to_string(),
            created_at: now,
            updated_at: now,
            owner_id: owner_id.clone(),
            kind: NodeKind::Directory,
        }
    }

    pub(crate) fn file(
        owner_id: &OwnerId,
        path: &str,
        blob_id: BlobId,
        size: u64,
        content_type: String,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            name: path::basename(path),
            path: path.to_string(),
            size,
            content_type,
            created_at: now,
            updated_at: now,
            owner_id: owner_id.clone(),
            kind: NodeKind::File { blob_id },
        }
    }

    /// The same node re-addressed at `new_path`.
    pub(crate) fn relocated(&self, new_path: &str, now: OffsetDateTime) -> Self {
        Self {
            name: path::basename(new_path),
            path: new_path.to_string(),
            updated_at: now,
            ..self.clone()
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self.kind {
            NodeKind::File { .. } => NodeType::File,
            NodeKind::Directory => NodeType::Directory,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory)
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File { .. })
    }

    pub fn blob_id(&self) -> Option<&BlobId> {
        match &self.kind {
            NodeKind::File { blob_id } => Some(blob_id),
            NodeKind::Directory => None,
        }
    }
}

/// A physical content object as recorded in the reference-count ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub blob_id: BlobId,
    pub content_hash: ContentHash,
    pub size: u64,
    /// Number of live file nodes pointing here; `<= 0` means reclaimable
    pub reference_count: i64,
    pub created_at: OffsetDateTime,
}

impl Blob {
    pub fn is_orphaned(&self) -> bool {
        self.reference_count <= 0
    }
}
