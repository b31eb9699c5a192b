//! Content-type vocabulary (§6): nine new labels, one reserved label, four
//! legacy aliases, and the expansion rules between them.

use std::collections::HashSet;

/// The nine content-type labels a chunk can be classified into.
pub const CONTENT_TYPES_NEW: &[&str] = &[
    "new_grad_recruitment",
    "midcareer_recruitment",
    "corporate_site",
    "ir_materials",
    "ceo_message",
    "employee_interviews",
    "press_release",
    "csr_sustainability",
    "midterm_plan",
];

/// Reserved for structured chunks (deadline/documents/application/process).
pub const CONTENT_TYPE_STRUCTURED: &str = "structured";

/// Legacy labels accepted on the filter side for backward compatibility.
pub const LEGACY_CONTENT_TYPES: &[&str] =
    &["recruitment", "corporate_ir", "corporate_business", "corporate_general"];

/// Maps a legacy label to its new-vocabulary equivalent.
pub fn legacy_to_new(legacy: &str) -> Option<&'static str> {
    match legacy {
        "recruitment" => Some("new_grad_recruitment"),
        "corporate_ir" => Some("ir_materials"),
        "corporate_business" => Some("corporate_site"),
        "corporate_general" => Some("corporate_site"),
        _ => None,
    }
}

/// Maps a new-vocabulary label to the legacy aliases that should also match it.
pub fn new_to_legacy(new_label: &str) -> &'static [&'static str] {
    match new_label {
        "new_grad_recruitment" => &["recruitment"],
        "midcareer_recruitment" => &["recruitment"],
        "ir_materials" => &["corporate_ir"],
        "corporate_site" => &["corporate_business", "corporate_general"],
        _ => &[],
    }
}

/// Human-readable label for a content type, used for context formatting (§4.4).
pub fn content_type_label(content_type: &str) -> &'static str {
    match normalize_content_type(content_type) {
        "new_grad_recruitment" | "midcareer_recruitment" => "募集区分",
        "ir_materials" => "IR情報",
        "ceo_message" => "社長メッセージ",
        "employee_interviews" => "社員インタビュー",
        "press_release" => "プレスリリース",
        "csr_sustainability" => "CSR・サステナビリティ",
        "midterm_plan" => "中期経営計画",
        "structured" => "提出物",
        _ => "企業情報",
    }
}

/// Normalizes a legacy label to its new-vocabulary equivalent; leaves
/// already-new labels and `structured` untouched.
pub fn normalize_content_type(content_type: &str) -> &str {
    legacy_to_new(content_type).unwrap_or(content_type)
}

/// Expands a requested filter set to include legacy aliases in both
/// directions (I2 / §6 "Filter expansion").
pub fn expand_content_type_filter(requested: &[String]) -> HashSet<String> {
    let mut expanded = HashSet::new();
    for label in requested {
        expanded.insert(label.clone());
        if let Some(new_label) = legacy_to_new(label) {
            expanded.insert(new_label.to_string());
        }
        for alias in new_to_legacy(label) {
            expanded.insert((*alias).to_string());
        }
    }
    expanded
}

/// Mirrors the original's `_matches_allowed_types`: a chunk matches an
/// expanded allow-set if its normalized primary type is in it, or any of its
/// normalized secondary types are (§4.9 step 8, §6 "Chunk metadata contract").
pub fn matches_allowed_types(content_type: &str, secondary_types: &[String], allowed: &HashSet<String>) -> bool {
    if allowed.contains(content_type) || allowed.contains(normalize_content_type(content_type)) {
        return true;
    }
    secondary_types.iter().any(|t| allowed.contains(t.as_str()) || allowed.contains(normalize_content_type(t)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recruitment_expands_to_both_new_labels() {
        let expanded = expand_content_type_filter(&["recruitment".to_string()]);
        assert!(expanded.contains("new_grad_recruitment"));
        assert!(expanded.contains("recruitment"));
    }

    #[test]
    fn ir_materials_admits_legacy_alias() {
        let expanded = expand_content_type_filter(&["ir_materials".to_string()]);
        assert!(expanded.contains("ir_materials"));
        assert!(expanded.contains("corporate_ir"));
    }

    #[test]
    fn unknown_label_passes_through_unexpanded() {
        let expanded = expand_content_type_filter(&["structured".to_string()]);
        assert_eq!(expanded.len(), 1);
        assert!(expanded.contains("structured"));
    }

    #[test]
    fn matches_allowed_types_admits_on_secondary_type() {
        let allowed = expand_content_type_filter(&["csr_sustainability".to_string()]);
        assert!(matches_allowed_types("corporate_site", &["csr_sustainability".to_string()], &allowed));
    }

    #[test]
    fn matches_allowed_types_normalizes_legacy_primary() {
        let allowed = expand_content_type_filter(&["ir_materials".to_string()]);
        assert!(matches_allowed_types("corporate_ir", &[], &allowed));
    }

    #[test]
    fn matches_allowed_types_rejects_unrelated_chunk() {
        let allowed = expand_content_type_filter(&["ir_materials".to_string()]);
        assert!(!matches_allowed_types("press_release", &["ceo_message".to_string()], &allowed));
    }
}
