/// Failures while building a [`crate::Catalog`].
///
/// Classification and ranking never fail; only catalog loading touches I/O
/// or untrusted input.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("institution at index {index} has an empty name")]
    EmptyName { index: usize },

    #[error("duplicate institution name: {0}")]
    DuplicateName(String),
}
