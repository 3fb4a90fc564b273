use serde::Serialize;

use crate::view::DocumentResponse;

pub const IDENTITY_DOCS_TAG: &str = "identity-docs";

pub const PREDEFINED_DOCUMENTS: &[&str] = &[
    "Passport",
    "National ID",
    "Voter ID",
    "Driving License",
    "Bank Passbook",
    "Ration Card",
    "PAN Card",
    "Birth Certificate",
    "Marriage Certificate",
    "X Marksheet",
    "XII Marksheet",
    "College Degree",
    "College Marksheet",
];

pub fn slug(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

pub fn find_entry(slug_value: &str) -> Option<&'static str> {
    PREDEFINED_DOCUMENTS
        .iter()
        .copied()
        .find(|name| slug(name) == slug_value)
}

pub fn matches_entry(document: &DocumentResponse, name: &str, owner: &str) -> bool {
    document.user_email_id == owner
        && document.tags.iter().any(|tag| tag == IDENTITY_DOCS_TAG)
        && (document.file_name == name || document.file_name.starts_with(&format!("{name}.")))
}

#[derive(Debug, Clone, Serialize)]
pub struct ChecklistEntry {
    pub slug: String,
    pub name: &'static str,
    pub document: Option<DocumentResponse>,
}

/// One entry per predefined document, with the first matching upload if any.
pub fn build(owner: &str, documents: &[DocumentResponse]) -> Vec<ChecklistEntry> {
    PREDEFINED_DOCUMENTS
        .iter()
        .copied()
        .map(|name| ChecklistEntry {
            slug: slug(name),
            name,
            document: documents
                .iter()
                .find(|document| matches_entry(document, name, owner))
                .cloned(),
        })
        .collect()
}
