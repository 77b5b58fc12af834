/**
 * Path normalization and resolution against a
 *  working directory. Pure string logic.
 */
pub mod path;
/**
 * Content digests used as the deduplication key.
 */
pub mod hash;
/**
 * Pluggable content-type inference and the
 *  text-vs-binary test.
 */
pub mod content_type;
/**
 * Nodes, blobs and owner identities.
 */
pub mod model;
/**
 * SQLite metadata index and reference-count ledger.
 */
pub mod database;
/**
 * The filesystem engine: per-owner sessions over
 *  a shared store, plus the orphan collector.
 */
pub mod fs;

pub mod prelude {
    pub use crate::content_type::{ContentTypeResolver, GuessFromExtension};
    pub use crate::database::{BlobStats, Database, DatabaseSetupError};
    pub use crate::fs::{
        ErrorKind, FileContent, FileSystem, FsError, OrphanCollector, Store, SweepReport,
    };
    pub use crate::hash::ContentHash;
    pub use crate::model::{Blob, Node, NodeKind, NodeType, OwnerId};
    pub use object_store::{BlobId, BlobStorage, ObjectStore, ObjectStoreConfig};
}
