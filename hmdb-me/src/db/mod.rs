//! Database access for hmdb-me
//!
//! Per-entity query modules over the shared SQLite store. Schema creation
//! lives in `hmdb-common`; these modules only read and write rows.

pub mod credits;
pub mod genres;
pub mod songs;
