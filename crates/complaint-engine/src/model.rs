use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A keyword-triggered classification rule.
///
/// A rule matches when any one of its keywords occurs as a substring of the
/// lowercased complaint text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    /// Lowercase substrings that trigger the rule.
    pub keywords: &'static [&'static str],
    /// Label emitted when this rule is the last match in table order.
    pub classification: &'static str,
    pub advice: &'static str,
    pub recommendation: &'static str,
    /// Semantic tags contributed on match, in declared order.
    pub tags: &'static [&'static str],
}

impl Rule {
    pub fn matches(&self, normalized: &str) -> bool {
        keywords_match(self.keywords, normalized)
    }
}

/// A rule that only contributes tags and never touches the scalar fields
/// of an analysis (e.g. forcing `human_rights` on violence keywords).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagRule {
    pub keywords: &'static [&'static str],
    pub tags: &'static [&'static str],
}

impl TagRule {
    pub fn matches(&self, normalized: &str) -> bool {
        keywords_match(self.keywords, normalized)
    }
}

fn keywords_match(keywords: &[&str], normalized: &str) -> bool {
    keywords.iter().any(|k| normalized.contains(k))
}

pub const DEFAULT_CLASSIFICATION: &str = "General complaint";
pub const DEFAULT_ADVICE: &str =
    "Describe what happened, when and where, and keep copies of any evidence.";
pub const DEFAULT_RECOMMENDATION: &str =
    "Submit the complaint to the Public Complaints Commission.";
pub const GENERAL_TAG: &str = "general";

/// Result of evaluating the rule table against one complaint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintAnalysis {
    pub classification: String,
    pub advice: String,
    pub recommendation: String,
    /// Tags in first-seen order, without duplicates.
    pub tags: Vec<String>,
}

impl ComplaintAnalysis {
    /// The analysis returned when no rule matches.
    pub fn general() -> Self {
        let mut analysis = Self::untagged();
        analysis.add_tag(GENERAL_TAG);
        analysis
    }

    pub(crate) fn untagged() -> Self {
        Self {
            classification: DEFAULT_CLASSIFICATION.to_string(),
            advice: DEFAULT_ADVICE.to_string(),
            recommendation: DEFAULT_RECOMMENDATION.to_string(),
            tags: Vec::new(),
        }
    }

    /// Append a tag unless it is already present. Returns `true` if added.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        if self.has_tag(tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn is_general(&self) -> bool {
        self.classification == DEFAULT_CLASSIFICATION
    }
}

impl Default for ComplaintAnalysis {
    fn default() -> Self {
        Self::general()
    }
}

/// A government or oversight body that can receive complaints.
///
/// Contact fields are passthrough metadata; only `name` and `tags` take part
/// in ranking. A record without `tags` deserializes with an empty set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Addressee of a complaint letter, e.g. "Chairman, Police Service Commission".
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

impl Institution {
    /// Build an institution with the given tags and no contact metadata.
    pub fn new<I, S>(name: impl Into<String>, category: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            category: category.into(),
            tags: tags.into_iter().map(Into::into).collect(),
            title: None,
            email: None,
            phone: None,
            whatsapp: None,
            address: None,
            website: None,
        }
    }
}

/// An institution paired with its tag-overlap score. Only lives during ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredInstitution<'a> {
    pub institution: &'a Institution,
    pub score: usize,
}
