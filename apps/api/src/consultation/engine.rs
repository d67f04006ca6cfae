//! Response engine — deterministic keyword-to-advice lookup for the career coach.
//!
//! The input is lowercased and checked against an ordered rule table. The first
//! rule with any matching keyword wins; there is no scoring and no merging of
//! multiple matches. Anything unmatched (including empty input) gets the
//! general goal-setting advice.

use serde::Serialize;

use crate::consultation::prompts::{
    CAREER_TRANSITION_ADVICE, GENERAL_ADVICE, INTERVIEW_ADVICE, RESUME_ADVICE,
    SALARY_NEGOTIATION_ADVICE, SKILL_DEVELOPMENT_ADVICE,
};

/// Which advice block a query resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceTopic {
    CareerTransition,
    Resume,
    Interview,
    SkillDevelopment,
    SalaryNegotiation,
    General,
}

impl AdviceTopic {
    pub fn advice(self) -> &'static str {
        match self {
            AdviceTopic::CareerTransition => CAREER_TRANSITION_ADVICE,
            AdviceTopic::Resume => RESUME_ADVICE,
            AdviceTopic::Interview => INTERVIEW_ADVICE,
            AdviceTopic::SkillDevelopment => SKILL_DEVELOPMENT_ADVICE,
            AdviceTopic::SalaryNegotiation => SALARY_NEGOTIATION_ADVICE,
            AdviceTopic::General => GENERAL_ADVICE,
        }
    }
}

// Order is precedence.
const RULES: &[(AdviceTopic, &[&str])] = &[
    (AdviceTopic::CareerTransition, &["career change", "transition"]),
    (AdviceTopic::Resume, &["resume", "cv"]),
    (AdviceTopic::Interview, &["interview"]),
    (AdviceTopic::SkillDevelopment, &["skill", "learning"]),
    (AdviceTopic::SalaryNegotiation, &["salary", "negotiation"]),
];

/// Returns the topic of the first rule whose keywords appear in `query`.
pub fn classify(query: &str) -> AdviceTopic {
    let query_lower = query.to_lowercase();
    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| query_lower.contains(kw)))
        .map(|(topic, _)| *topic)
        .unwrap_or(AdviceTopic::General)
}

/// Maps free text to the coach's canned reply. Total and pure.
pub fn generate_response(query: &str) -> &'static str {
    classify(query).advice()
}
