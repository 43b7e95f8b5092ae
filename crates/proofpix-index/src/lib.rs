//! Nearest-neighbour index over image embeddings.
//!
//! - [`VectorIndex`]: exact flat index, squared-L2 distance, append-only
//!   `sequence_id -> external_id` map
//! - [`snapshot`]: the `PPXFLAT1` binary snapshot codec
//! - [`IndexManager`]: process-wide owner of the index; load, build, save,
//!   search and add under a single reader/writer lock
//!
//! ```
//! use proofpix_index::VectorIndex;
//!
//! let mut index = VectorIndex::new(2);
//! index.add("a", &[0.0, 0.0]).unwrap();
//! index.add("b", &[3.0, 4.0]).unwrap();
//!
//! let hits = index.search(&[3.0, 3.0], 1).unwrap();
//! assert_eq!(hits, vec![(1.0, 1)]);
//! ```

pub mod error;
pub mod flat;
pub mod manager;
pub mod snapshot;

pub use error::{IndexError, IndexResult};
pub use flat::VectorIndex;
pub use manager::{AddOutcome, BuildReport, IndexManager, SearchHits, StartupSource};
