//! Persistent backends for the ProofPix collaborator traits.
//!
//! - [`FsBlobStore`]: blobs as files under a root directory, written
//!   atomically through a temp file and rename
//! - [`RocksDbDocumentStore`]: JSON documents in RocksDB, one column family
//!   per collection
//!
//! ```rust
//! use proofpix_storage::RocksDbDocumentStore;
//! use tempfile::TempDir;
//!
//! let tmp = TempDir::new().unwrap();
//! let store = RocksDbDocumentStore::open(tmp.path()).unwrap();
//! assert_eq!(store.path(), tmp.path().to_string_lossy());
//! ```

pub mod column_families;
pub mod error;
pub mod fs_blob;
pub mod rocksdb_documents;

pub use column_families::cf_names;
pub use error::{StorageError, StorageResult};
pub use fs_blob::FsBlobStore;
pub use rocksdb_documents::{RocksDbConfig, RocksDbDocumentStore};
