/// Error types shared by the complaint routing services.
///
/// Binary crates define their own `AppError` and wrap `CommonError` via `#[from]`.
use complaint_engine::CatalogError;

use crate::advisory::AdvisoryError;

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("complaint text must not be empty")]
    EmptyText,

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("no catalog path configured, nothing to reload")]
    NoCatalogPath,

    #[error("advisory error: {0}")]
    Advisory(#[from] AdvisoryError),

    #[error("config error: {0}")]
    Config(String),
}
