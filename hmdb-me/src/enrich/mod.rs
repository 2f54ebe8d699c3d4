//! Credit enrichment pipeline
//!
//! Candidate search, fuzzy acceptance, credit extraction, and the per-song
//! batch loop that ties them together.

pub mod batch;
pub mod credits;
pub mod search;

pub use batch::{CreditEnricher, EnrichOptions, EnrichStats};
pub use credits::{extract_credits, normalize_person_name, ExtractedCredit, Role};
pub use search::{query_formulations, Candidate, CandidateSearch};
