// Database module
// Vector index boundary, LanceDB vectors and the SQLite profile store

pub mod index;
pub mod lancedb;
pub mod sqlite;

pub use index::{
    ArtisanMetadata, DistanceMetric, InMemoryIndex, IndexFilter, IndexInfo, IndexMatch,
    IndexQuery, StoredVector, VectorIndex,
};
pub use self::lancedb::LanceIndex;
pub use sqlite::*;
