//! Multi-source genre classification
//!
//! Weighted voting across independent providers produces one primary
//! genre per artist plus finer-grained subgenre tags, both persisted per
//! song.

pub mod aggregate;
pub mod batch;
pub mod hierarchy;
pub mod stored;
pub mod subgenre;

pub use aggregate::{aggregate, GenreAssignment, SourceVote};
pub use batch::{ClassifyOptions, ClassifyStats, GenreClassifier};
pub use hierarchy::{is_primary_genre, map_to_primary, PRIMARY_GENRES};
pub use stored::StoredGenres;
pub use subgenre::{extract_subgenres, SubgenreTag, SUBGENRE_DENY_LIST};
