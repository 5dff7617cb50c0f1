//! The institution catalog and its atomically swappable holder.
//!
//! A [`Catalog`] is built once and never mutated. Services hold it through a
//! [`CatalogStore`], whose reload swaps the whole catalog in a single pointer
//! store so a request always ranks against one consistent snapshot.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Deserialize;
use tracing::info;

use crate::error::CatalogError;
use crate::model::{Institution, ScoredInstitution};
use crate::rank::rank_scored;

const BUILTIN_CATALOG: &str = include_str!("../data/institutions.json");

/// Accepts both a bare array and `{ "institutions": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    List(Vec<Institution>),
    Wrapped { institutions: Vec<Institution> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    institutions: Vec<Institution>,
}

impl Catalog {
    /// Validate and normalize a list of institutions.
    ///
    /// Names must be non-empty and unique. Tags are trimmed and lowercased;
    /// blank tags are dropped.
    pub fn new(institutions: Vec<Institution>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(institutions.len());

        for (index, mut inst) in institutions.into_iter().enumerate() {
            inst.name = inst.name.trim().to_string();
            if inst.name.is_empty() {
                return Err(CatalogError::EmptyName { index });
            }
            if !seen.insert(inst.name.clone()) {
                return Err(CatalogError::DuplicateName(inst.name));
            }
            inst.tags = inst
                .tags
                .into_iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect();
            normalized.push(inst);
        }

        Ok(Self {
            institutions: normalized,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let institutions = match serde_json::from_str::<CatalogDocument>(json)? {
            CatalogDocument::List(list) => list,
            CatalogDocument::Wrapped { institutions } => institutions,
        };
        Self::new(institutions)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            institutions = catalog.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn institutions(&self) -> &[Institution] {
        &self.institutions
    }

    pub fn get(&self, name: &str) -> Option<&Institution> {
        self.institutions.iter().find(|i| i.name == name)
    }

    pub fn len(&self) -> usize {
        self.institutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.institutions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Institution> {
        self.institutions.iter()
    }

    /// Rank this catalog against a tag list. See [`crate::rank::rank_scored`].
    pub fn rank<S: AsRef<str>>(&self, tags: &[S], limit: usize) -> Vec<ScoredInstitution<'_>> {
        rank_scored(tags, self, limit)
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Institution;
    type IntoIter = std::slice::Iter<'a, Institution>;

    fn into_iter(self) -> Self::IntoIter {
        self.institutions.iter()
    }
}

/// Shared handle to the current catalog.
///
/// Readers take an `Arc` snapshot with [`CatalogStore::current`]; writers
/// replace the whole catalog. There is no partial update.
#[derive(Debug)]
pub struct CatalogStore {
    current: ArcSwap<Catalog>,
}

impl CatalogStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            current: ArcSwap::from_pointee(catalog),
        }
    }

    pub fn current(&self) -> Arc<Catalog> {
        self.current.load_full()
    }

    /// Swap in a new catalog, returning the previous one.
    pub fn replace(&self, catalog: Catalog) -> Arc<Catalog> {
        self.current.swap(Arc::new(catalog))
    }

    /// Load a catalog from disk and swap it in. On error the current catalog
    /// is left untouched.
    pub fn reload_from_path(&self, path: impl AsRef<Path>) -> Result<usize, CatalogError> {
        let catalog = Catalog::from_path(path)?;
        let count = catalog.len();
        self.replace(catalog);
        Ok(count)
    }
}
