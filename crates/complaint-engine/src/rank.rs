//! Tag-overlap scoring and ranking of institutions.

use std::collections::HashSet;

use crate::model::{Institution, ScoredInstitution};

/// Number of institutions returned when the caller has no preference.
pub const DEFAULT_LIMIT: usize = 8;

/// Cardinality of the intersection between `tags` and the institution's tags.
pub fn score(tags: &HashSet<&str>, institution: &Institution) -> usize {
    institution
        .tags
        .iter()
        .filter(|t| tags.contains(t.as_str()))
        .count()
}

/// Score every institution, drop the zero scores, and order by descending
/// score. Equal scores keep their input order. At most `limit` entries are
/// returned.
pub fn rank_scored<'a, S, I>(tags: &[S], institutions: I, limit: usize) -> Vec<ScoredInstitution<'a>>
where
    S: AsRef<str>,
    I: IntoIterator<Item = &'a Institution>,
{
    let tag_set: HashSet<&str> = tags.iter().map(AsRef::as_ref).collect();

    let mut scored: Vec<ScoredInstitution<'a>> = institutions
        .into_iter()
        .map(|institution| ScoredInstitution {
            institution,
            score: score(&tag_set, institution),
        })
        .filter(|s| s.score > 0)
        .collect();

    // `sort_by` is stable: ties stay in catalog order.
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(limit);
    scored
}

/// Like [`rank_scored`] but yields only the institutions.
pub fn rank<'a, S, I>(tags: &[S], institutions: I, limit: usize) -> Vec<&'a Institution>
where
    S: AsRef<str>,
    I: IntoIterator<Item = &'a Institution>,
{
    rank_scored(tags, institutions, limit)
        .into_iter()
        .map(|s| s.institution)
        .collect()
}
