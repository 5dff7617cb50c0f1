//! Declarative keyword rules and the interpreter that applies them.
//!
//! Every primary rule is tested in declared order. Scalar fields
//! (classification, advice, recommendation) are overwritten by each match, so
//! the last matching rule wins; tags accumulate across all matches. Tag-only
//! override rules run afterwards.

use crate::model::{ComplaintAnalysis, Rule, TagRule, GENERAL_TAG};

pub static PRIMARY_RULES: &[Rule] = &[
    Rule {
        keywords: &["police", "officer", "arrest", "checkpoint", "sars", "custody"],
        classification: "Police misconduct / human rights violation",
        advice: "Write down the officers' names, badge numbers, the station and the time. \
Keep any receipts, photos or medical reports.",
        recommendation: "Report to the Police Complaint Response Unit and the Police Service \
Commission; escalate to the National Human Rights Commission if you were harmed or detained.",
        tags: &["police", "human_rights"],
    },
    Rule {
        keywords: &[
            "my land",
            "our land",
            "land dispute",
            "plot of land",
            "landlord",
            "property",
            "ownership",
            "eviction",
            "tenancy",
        ],
        classification: "Land or property dispute",
        advice: "Gather title documents, survey plans, receipts and tenancy agreements.",
        recommendation: "Contact the state Ministry of Lands or seek mediation before going to court.",
        tags: &["land", "property"],
    },
    Rule {
        keywords: &[
            "employer",
            "salary",
            "workplace",
            "wages",
            "minimum wage",
            "sacked",
            "dismissed",
            "my pension",
            "pension arrears",
            "unpaid pension",
            "pensioner",
        ],
        classification: "Employment / labour issue",
        advice: "Keep your appointment letter, payslips and any written communication \
with your employer.",
        recommendation: "File with the Federal Ministry of Labour & Employment; unresolved \
disputes go to the National Industrial Court.",
        tags: &["labour", "employment"],
    },
    Rule {
        keywords: &["fraud", "scam", "419", "fake alert", "impersonat"],
        classification: "Fraud / financial crime",
        advice: "Do not send more money. Save messages, account numbers and transfer receipts.",
        recommendation: "Report to the Economic and Financial Crimes Commission.",
        tags: &["fraud", "financial_crime"],
    },
    Rule {
        keywords: &["bribe", "bribery", "corruption", "embezzle", "kickback", "extort"],
        classification: "Corruption / abuse of office",
        advice: "Record who asked for money, how much, and where. Do not pay.",
        recommendation: "Report to the Independent Corrupt Practices Commission or the EFCC.",
        tags: &["corruption"],
    },
    Rule {
        keywords: &[
            "my bank",
            "the bank",
            "bank account",
            "bank charges",
            "atm card",
            "debit",
            "deducted",
            "bank transfer",
            "failed transfer",
        ],
        classification: "Banking / financial services complaint",
        advice: "Raise a complaint with your bank first and keep the ticket or reference number.",
        recommendation: "If the bank does not resolve it, escalate to the Central Bank's \
consumer protection department.",
        tags: &["bank", "consumer"],
    },
    Rule {
        keywords: &[
            "refund",
            "overcharged",
            "defective",
            "faulty product",
            "fake product",
            "telecom",
            "network provider",
        ],
        classification: "Consumer protection complaint",
        advice: "Keep receipts, warranties and the seller's details.",
        recommendation: "Report to the Federal Competition and Consumer Protection Commission.",
        tags: &["consumer"],
    },
    Rule {
        keywords: &[
            "the hospital",
            "a hospital",
            "hospital bill",
            "the doctor",
            "a doctor",
            "doctors",
            "the nurse",
            "a nurse",
            "nurses",
            "clinic",
            "medical",
        ],
        classification: "Health services complaint",
        advice: "Request copies of your medical records and note the staff involved.",
        recommendation: "Complain to the hospital management and the Medical and Dental Council.",
        tags: &["health"],
    },
    Rule {
        keywords: &["school", "university", "examination", "teacher", "lecturer"],
        classification: "Education complaint",
        advice: "Keep admission letters, fee receipts and result slips.",
        recommendation: "Escalate to the institution's governing council or the Ministry of Education.",
        tags: &["education"],
    },
];

pub static OVERRIDE_RULES: &[TagRule] = &[
    TagRule {
        keywords: &[
            "torture",
            "beat me",
            "beat him",
            "beat her",
            "beat us",
            "beaten",
            "beating",
            "assault",
            "violence",
            "brutality",
            "detain",
            "detention",
        ],
        tags: &["human_rights"],
    },
    TagRule {
        keywords: &["child", "minors", "underage"],
        tags: &["human_rights", "child_rights"],
    },
];

/// Classify `text` against the built-in rule tables.
pub fn evaluate(text: &str) -> ComplaintAnalysis {
    evaluate_with(text, PRIMARY_RULES, OVERRIDE_RULES)
}

/// Classify `text` against arbitrary rule tables. Total over any input,
/// including the empty string.
pub fn evaluate_with(text: &str, primary: &[Rule], overrides: &[TagRule]) -> ComplaintAnalysis {
    let normalized = text.to_lowercase();
    let mut analysis = ComplaintAnalysis::untagged();

    for rule in primary.iter().filter(|r| r.matches(&normalized)) {
        analysis.classification = rule.classification.to_string();
        analysis.advice = rule.advice.to_string();
        analysis.recommendation = rule.recommendation.to_string();
        for tag in rule.tags {
            analysis.add_tag(tag);
        }
    }

    for rule in overrides.iter().filter(|r| r.matches(&normalized)) {
        for tag in rule.tags {
            analysis.add_tag(tag);
        }
    }

    if analysis.tags.is_empty() {
        analysis.add_tag(GENERAL_TAG);
    }
    analysis
}
