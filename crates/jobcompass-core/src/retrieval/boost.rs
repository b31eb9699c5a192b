//! Content-type boost profiles (§4.9 step 8, §9 "the four built-in
//! profiles"): a per-intent multiplier table applied to each candidate's
//! current score.

use crate::intent::QueryIntent;
use std::collections::HashMap;

/// Returns the boost table for one query intent. Unlisted content types
/// default to a neutral `1.0` multiplier.
pub fn boost_table_for(intent: QueryIntent) -> HashMap<&'static str, f64> {
    match intent {
        QueryIntent::EsReview => HashMap::new(),
        QueryIntent::Deadline => HashMap::from([
            ("new_grad_recruitment", 1.4),
            ("midcareer_recruitment", 1.3),
            ("structured", 1.5),
        ]),
        QueryIntent::Culture => HashMap::from([
            ("employee_interviews", 1.4),
            ("ceo_message", 1.1),
            ("csr_sustainability", 1.1),
        ]),
        QueryIntent::Business => HashMap::from([
            ("corporate_site", 1.3),
            ("ir_materials", 1.3),
            ("midterm_plan", 1.4),
            ("press_release", 1.1),
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn es_review_is_neutral() {
        let table = boost_table_for(QueryIntent::EsReview);
        assert_eq!(table.get("corporate_site").copied().unwrap_or(1.0), 1.0);
    }

    #[test]
    fn deadline_favors_recruitment_and_structured() {
        let table = boost_table_for(QueryIntent::Deadline);
        assert!(table["structured"] > table.get("corporate_site").copied().unwrap_or(1.0));
    }
}
