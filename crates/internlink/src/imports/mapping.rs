use std::collections::HashMap;
use std::sync::OnceLock;

use super::normalizer::normalize_label;
use crate::marketplace::postings::FieldOfWork;

static FIELD_SYNONYMS: OnceLock<HashMap<String, FieldOfWork>> = OnceLock::new();

/// Resolve the discipline label an ATS export carries. Labels are matched
/// after normalization; anything the table does not know lands in `Other`.
pub(crate) fn field_for_label(value: &str) -> FieldOfWork {
    let normalized = normalize_label(value);
    if normalized.is_empty() {
        return FieldOfWork::Other;
    }
    field_synonyms()
        .get(&normalized)
        .copied()
        .unwrap_or(FieldOfWork::Other)
}

fn field_synonyms() -> &'static HashMap<String, FieldOfWork> {
    FIELD_SYNONYMS.get_or_init(|| {
        const LABEL_TO_FIELD: &[(&str, FieldOfWork)] = &[
            ("software engineering", FieldOfWork::SoftwareEngineering),
            ("software_engineering", FieldOfWork::SoftwareEngineering),
            ("software development", FieldOfWork::SoftwareEngineering),
            ("software", FieldOfWork::SoftwareEngineering),
            ("swe", FieldOfWork::SoftwareEngineering),
            ("engineering", FieldOfWork::SoftwareEngineering),
            ("backend", FieldOfWork::SoftwareEngineering),
            ("frontend", FieldOfWork::SoftwareEngineering),
            ("full stack", FieldOfWork::SoftwareEngineering),
            ("data science", FieldOfWork::DataScience),
            ("data_science", FieldOfWork::DataScience),
            ("data", FieldOfWork::DataScience),
            ("ds", FieldOfWork::DataScience),
            ("machine learning", FieldOfWork::DataScience),
            ("ml", FieldOfWork::DataScience),
            ("analytics", FieldOfWork::DataScience),
            ("design", FieldOfWork::Design),
            ("ux", FieldOfWork::Design),
            ("ui", FieldOfWork::Design),
            ("ux/ui", FieldOfWork::Design),
            ("product design", FieldOfWork::Design),
            ("graphic design", FieldOfWork::Design),
            ("marketing", FieldOfWork::Marketing),
            ("growth", FieldOfWork::Marketing),
            ("social media", FieldOfWork::Marketing),
            ("content", FieldOfWork::Marketing),
            ("finance", FieldOfWork::Finance),
            ("accounting", FieldOfWork::Finance),
            ("banking", FieldOfWork::Finance),
            ("fintech", FieldOfWork::Finance),
            ("operations", FieldOfWork::Operations),
            ("ops", FieldOfWork::Operations),
            ("logistics", FieldOfWork::Operations),
            ("supply chain", FieldOfWork::Operations),
            ("research", FieldOfWork::Research),
            ("r&d", FieldOfWork::Research),
            ("science", FieldOfWork::Research),
        ];

        LABEL_TO_FIELD
            .iter()
            .map(|(label, field)| (normalize_label(label), *field))
            .collect()
    })
}
