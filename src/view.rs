//! Filter, sort and facet composition over a fetched document list.
//!
//! Nothing here touches storage: handlers load the caller's documents and run
//! them through [`apply`] and [`facets`] on every request.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Document;
use crate::tags;

#[derive(Debug, Clone, Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub user_email_id: String,
    pub owner_name: Option<String>,
    pub file_name: String,
    pub storage_path: String,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub tags: Vec<String>,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentResponse {
    pub fn from_document(document: Document, owner_name: Option<String>) -> Self {
        Self {
            id: document.id,
            tags: tags::parse(document.category.as_deref()),
            user_email_id: document.user_email_id,
            owner_name,
            file_name: document.file_name,
            storage_path: document.storage_path,
            file_size: document.file_size,
            mime_type: document.mime_type,
            uploaded_at: DateTime::from_naive_utc_and_offset(document.uploaded_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(document.updated_at, Utc),
        }
    }

    /// Account name when set, otherwise the owner's email.
    pub fn owner_label(&self) -> &str {
        self.owner_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.user_email_id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    FileName,
    #[default]
    UploadedAt,
    FileSize,
    Owner,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewQuery {
    pub tag: Option<String>,
    #[serde(rename = "type")]
    pub mime_type: Option<String>,
    pub owner: Option<String>,
    #[serde(default)]
    pub sort: SortField,
    #[serde(default)]
    pub direction: SortDirection,
}

fn active(filter: &Option<String>) -> Option<&str> {
    filter.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn matches(document: &DocumentResponse, query: &ViewQuery) -> bool {
    if let Some(tag) = active(&query.tag) {
        if !document.tags.iter().any(|candidate| candidate.contains(tag)) {
            return false;
        }
    }

    if let Some(prefix) = active(&query.mime_type) {
        let mime = document.mime_type.as_deref().unwrap_or_default();
        if !mime.starts_with(prefix) {
            return false;
        }
    }

    if let Some(owner) = active(&query.owner) {
        if document.user_email_id != owner {
            return false;
        }
    }

    true
}

fn compare(a: &DocumentResponse, b: &DocumentResponse, field: SortField) -> Ordering {
    match field {
        SortField::FileName => a
            .file_name
            .to_lowercase()
            .cmp(&b.file_name.to_lowercase()),
        SortField::UploadedAt => a.uploaded_at.cmp(&b.uploaded_at),
        SortField::FileSize => a.file_size.unwrap_or(0).cmp(&b.file_size.unwrap_or(0)),
        SortField::Owner => a
            .owner_label()
            .to_lowercase()
            .cmp(&b.owner_label().to_lowercase()),
    }
}

/// Filters then stable-sorts.
pub fn apply(documents: Vec<DocumentResponse>, query: &ViewQuery) -> Vec<DocumentResponse> {
    let mut selected: Vec<DocumentResponse> = documents
        .into_iter()
        .filter(|document| matches(document, query))
        .collect();

    selected.sort_by(|a, b| {
        let ordering = compare(a, b, query.sort);
        match query.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    selected
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OwnerFacet {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Facets {
    pub tags: Vec<String>,
    pub types: Vec<String>,
    pub owners: Vec<OwnerFacet>,
}

/// Filter options present in an unfiltered list.
pub fn facets(documents: &[DocumentResponse]) -> Facets {
    let mut tag_set = BTreeSet::new();
    let mut type_set = BTreeSet::new();
    let mut owner_map = BTreeMap::new();

    for document in documents {
        tag_set.extend(document.tags.iter().cloned());
        if let Some(top_level) = document
            .mime_type
            .as_deref()
            .and_then(|mime| mime.split('/').next())
            .filter(|top| !top.is_empty())
        {
            type_set.insert(top_level.to_string());
        }
        owner_map
            .entry(document.user_email_id.clone())
            .or_insert_with(|| document.owner_label().to_string());
    }

    let mut owners: Vec<OwnerFacet> = owner_map
        .into_iter()
        .map(|(email, name)| OwnerFacet { email, name })
        .collect();
    owners.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    Facets {
        tags: tag_set.into_iter().collect(),
        types: type_set.into_iter().collect(),
        owners,
    }
}
