//! Complaint classification and institution ranking.
//!
//! `rules::evaluate` turns free text into a [`ComplaintAnalysis`]; `rank::rank`
//! orders a [`Catalog`] by tag overlap with that analysis. Both are total,
//! synchronous and allocation-light, so a single immutable catalog can be
//! shared across any number of concurrent requests.

pub mod catalog;
pub mod error;
pub mod model;
pub mod rank;
pub mod rules;

pub use catalog::{Catalog, CatalogStore};
pub use error::CatalogError;
pub use model::{ComplaintAnalysis, Institution, Rule, ScoredInstitution, TagRule};
pub use rank::{rank, rank_scored, score, DEFAULT_LIMIT};
pub use rules::evaluate;
