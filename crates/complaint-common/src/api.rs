use complaint_engine::{Institution, ScoredInstitution};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ClassifyComplaintParams {
    /// Free-text complaint body.
    pub text: String,
    /// Maximum number of institutions to return (default from server config, max 50).
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetInstitutionParams {
    /// Exact institution name as listed by `list_institutions`.
    pub name: String,
}

/// Contact details of an institution as exposed to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InstitutionInfo {
    pub name: String,
    pub category: String,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl From<&Institution> for InstitutionInfo {
    fn from(inst: &Institution) -> Self {
        Self {
            name: inst.name.clone(),
            category: inst.category.clone(),
            tags: inst.tags.iter().cloned().collect(),
            title: inst.title.clone(),
            email: inst.email.clone(),
            phone: inst.phone.clone(),
            whatsapp: inst.whatsapp.clone(),
            address: inst.address.clone(),
            website: inst.website.clone(),
        }
    }
}

/// A ranked institution. `score` is the number of shared tags; the fallback
/// institution is reported with score 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InstitutionMatch {
    pub score: usize,
    #[serde(flatten)]
    pub institution: InstitutionInfo,
}

impl From<ScoredInstitution<'_>> for InstitutionMatch {
    fn from(scored: ScoredInstitution<'_>) -> Self {
        Self {
            score: scored.score,
            institution: scored.institution.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ComplaintRoutingResponse {
    pub success: bool,
    pub text: String,
    pub classification: String,
    pub advice: String,
    pub recommendation: String,
    pub tags: Vec<String>,
    pub institutions: Vec<InstitutionMatch>,
    /// `true` when no institution matched and the fallback was substituted.
    pub fallback: bool,
    #[serde(default)]
    pub ai_advice: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstitutionListResponse {
    pub count: usize,
    pub institutions: Vec<InstitutionInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReloadCatalogResponse {
    pub success: bool,
    pub institutions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    pub status: String,
    pub institutions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_flattens_contact_fields() {
        let mut inst = Institution::new("EFCC", "Financial crime", ["fraud"]);
        inst.email = Some("info@efcc.gov.ng".to_string());
        inst.title = Some("Executive Chairman, EFCC".to_string());
        let m = InstitutionMatch::from(ScoredInstitution {
            institution: &inst,
            score: 1,
        });
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["name"], "EFCC");
        assert_eq!(json["score"], 1);
        assert_eq!(json["email"], "info@efcc.gov.ng");
        assert_eq!(json["title"], "Executive Chairman, EFCC");
        assert!(json.get("phone").is_none());
        assert!(json.get("institution").is_none());
    }
}
