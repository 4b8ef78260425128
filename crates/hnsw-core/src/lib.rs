//! An embeddable approximate-nearest-neighbor index over dense float
//! vectors, built on the Hierarchical Navigable Small World (HNSW)
//! graph.
//!
//! [`HnswEngine`] is the entry point: construct one over either an
//! in-memory or durable single-file backing, then insert, remove, and
//! query it. See [`engine`] for the full operation contracts.

pub mod cancel;
pub mod codec;
pub mod distance;
pub mod engine;
pub mod error;
pub mod export;
pub mod params;
pub mod search_context;
pub mod storage;
pub mod vector;

pub use cancel::Cancellation;
pub use distance::Distance;
pub use engine::{HnswEngine, SearchResult};
pub use error::{Error, ErrorKind, Result};
pub use export::{ExportNode, ExportParameters, ExportState};
pub use params::{IndexParameters, SearchQuality};
pub use vector::NodeId;
