//! Complaint routing: evaluate the rules, rank the catalog, and apply the
//! fallback policy.
//!
//! The engine returns an empty ranking when nothing matches; choosing a
//! default institution is this layer's job.

use std::path::PathBuf;
use std::sync::Arc;

use complaint_engine::{evaluate, Catalog, CatalogStore, ComplaintAnalysis, DEFAULT_LIMIT};
use tracing::{info, warn};

use crate::advisory::AdvisoryClient;
use crate::api::{ComplaintRoutingResponse, InstitutionInfo, InstitutionMatch};
use crate::cache::AdviceCache;
use crate::error::CommonError;

pub const DEFAULT_FALLBACK_INSTITUTION: &str = "Public Complaints Commission (PCC)";
pub const MAX_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct RouterSettings {
    /// Number of institutions returned when the request does not ask for a limit.
    pub limit: usize,
    /// Catalog entry used when no institution matches.
    pub fallback_institution: String,
    /// Where the catalog was loaded from. `None` means the built-in catalog.
    pub catalog_path: Option<PathBuf>,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            fallback_institution: DEFAULT_FALLBACK_INSTITUTION.to_string(),
            catalog_path: None,
        }
    }
}

pub struct ComplaintRouter {
    catalog: Arc<CatalogStore>,
    settings: RouterSettings,
    advisory: Option<AdvisoryClient>,
    cache: AdviceCache,
}

impl ComplaintRouter {
    pub fn new(catalog: Arc<CatalogStore>, settings: RouterSettings) -> Self {
        Self {
            catalog,
            settings,
            advisory: None,
            cache: AdviceCache::disabled(),
        }
    }

    /// Load the catalog named by `settings.catalog_path`, or the built-in one.
    pub fn load(settings: RouterSettings) -> Result<Self, CommonError> {
        let catalog = match &settings.catalog_path {
            Some(path) => Catalog::from_path(path)?,
            None => Catalog::builtin()?,
        };
        if catalog.get(&settings.fallback_institution).is_none() {
            warn!(
                fallback = %settings.fallback_institution,
                "fallback institution not in catalog, using built-in record"
            );
        }
        Ok(Self::new(Arc::new(CatalogStore::new(catalog)), settings))
    }

    pub fn with_advisory(mut self, client: AdvisoryClient, cache: AdviceCache) -> Self {
        self.advisory = Some(client);
        self.cache = cache;
        self
    }

    pub fn has_advisory(&self) -> bool {
        self.advisory.is_some()
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.current()
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    /// Classify and rank without contacting the advisory endpoint.
    pub fn classify(
        &self,
        text: &str,
        limit: Option<usize>,
    ) -> Result<ComplaintRoutingResponse, CommonError> {
        let text = validate_text(text)?;
        let analysis = evaluate(text);
        Ok(self.respond(text, &analysis, limit))
    }

    /// Classify, rank and, when configured, attach advisory text.
    pub async fn route(
        &self,
        text: &str,
        limit: Option<usize>,
    ) -> Result<ComplaintRoutingResponse, CommonError> {
        let text = validate_text(text)?;
        let analysis = evaluate(text);
        let mut response = self.respond(text, &analysis, limit);
        response.ai_advice = self.advise(text, &analysis).await;
        Ok(response)
    }

    /// Re-read the catalog file and swap it in atomically.
    pub fn reload_catalog(&self) -> Result<usize, CommonError> {
        let path = self
            .settings
            .catalog_path
            .as_ref()
            .ok_or(CommonError::NoCatalogPath)?;
        let count = self.catalog.reload_from_path(path)?;
        info!(path = %path.display(), institutions = count, "catalog reloaded");
        Ok(count)
    }

    fn respond(
        &self,
        text: &str,
        analysis: &ComplaintAnalysis,
        limit: Option<usize>,
    ) -> ComplaintRoutingResponse {
        let limit = limit.unwrap_or(self.settings.limit).clamp(1, MAX_LIMIT);
        let catalog = self.catalog.current();

        let mut institutions: Vec<InstitutionMatch> = catalog
            .rank(&analysis.tags, limit)
            .into_iter()
            .map(InstitutionMatch::from)
            .collect();

        let fallback = institutions.is_empty();
        if fallback {
            institutions.push(InstitutionMatch {
                score: 0,
                institution: self.fallback_institution(&catalog),
            });
        }

        info!(
            classification = %analysis.classification,
            tags = analysis.tags.len(),
            matches = institutions.len(),
            fallback,
            "complaint routed"
        );

        ComplaintRoutingResponse {
            success: true,
            text: text.to_string(),
            classification: analysis.classification.clone(),
            advice: analysis.advice.clone(),
            recommendation: analysis.recommendation.clone(),
            tags: analysis.tags.clone(),
            institutions,
            fallback,
            ai_advice: None,
        }
    }

    fn fallback_institution(&self, catalog: &Catalog) -> InstitutionInfo {
        catalog
            .get(&self.settings.fallback_institution)
            .map(InstitutionInfo::from)
            .unwrap_or_else(builtin_fallback)
    }

    async fn advise(&self, text: &str, analysis: &ComplaintAnalysis) -> Option<String> {
        let client = self.advisory.as_ref()?;

        if let Some(cached) = self.cache.get_advice(&analysis.classification, text).await {
            info!("advisory cache hit");
            return Some(cached);
        }

        match client.advise(text, analysis).await {
            Ok(advice) => {
                self.cache
                    .set_advice(&analysis.classification, text, &advice)
                    .await;
                Some(advice)
            }
            Err(e) => {
                warn!(error = %e, "advisory unavailable, continuing without it");
                None
            }
        }
    }
}

fn validate_text(text: &str) -> Result<&str, CommonError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CommonError::EmptyText);
    }
    Ok(trimmed)
}

fn builtin_fallback() -> InstitutionInfo {
    InstitutionInfo {
        name: DEFAULT_FALLBACK_INSTITUTION.to_string(),
        category: "Ombudsman".to_string(),
        tags: Vec::new(),
        title: Some("Honourable Chief Commissioner".to_string()),
        email: Some("complaints@pcc.gov.ng".to_string()),
        phone: Some("+234-708-000-0000".to_string()),
        whatsapp: None,
        address: None,
        website: Some("https://pcc.gov.ng".to_string()),
    }
}
