//! Saved templates, unique by name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::JsonCollection;
use crate::document::{Template, validate_for_save};
use crate::error::CardpressError;

/// A stored template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    /// JPEG data URL of a half-size render.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub template_data: Template,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List entry: everything but the template body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub element_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&TemplateRecord> for TemplateSummary {
    fn from(record: &TemplateRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            thumbnail: record.thumbnail.clone(),
            element_count: record.template_data.elements.len(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Body of a create or save request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplate {
    pub name: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    pub template_data: Template,
}

impl NewTemplate {
    fn checked_name(&self) -> Result<String, CardpressError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CardpressError::Validation("Template name is required".into()));
        }
        validate_for_save(&self.template_data)?;
        Ok(name.to_string())
    }
}

pub struct TemplateStore {
    records: JsonCollection<TemplateRecord>,
}

impl TemplateStore {
    pub fn new(records: JsonCollection<TemplateRecord>) -> Self {
        Self { records }
    }

    /// Summaries, most recently updated first.
    pub async fn list(&self) -> Vec<TemplateSummary> {
        let records = self.records.read().await;
        let mut list: Vec<TemplateSummary> = records.iter().map(TemplateSummary::from).collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        list
    }

    pub async fn get(&self, id: &str) -> Result<TemplateRecord, CardpressError> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| CardpressError::NotFound(format!("template '{}'", id)))
    }

    pub async fn get_by_name(&self, name: &str) -> Result<TemplateRecord, CardpressError> {
        let name = name.trim();
        self.records
            .read()
            .await
            .iter()
            .find(|r| r.name == name)
            .cloned()
            .ok_or_else(|| CardpressError::NotFound(format!("template named '{}'", name)))
    }

    /// Create a template; the name must not be taken.
    pub async fn create(&self, new: NewTemplate) -> Result<TemplateRecord, CardpressError> {
        let name = new.checked_name()?;
        self.records
            .update(|records| {
                if records.iter().any(|r| r.name == name) {
                    return Err(CardpressError::Conflict(format!(
                        "Template '{}' already exists",
                        name
                    )));
                }
                let now = Utc::now();
                let record = TemplateRecord {
                    id: Uuid::new_v4().to_string(),
                    name,
                    thumbnail: new.thumbnail,
                    template_data: new.template_data,
                    created_at: now,
                    updated_at: now,
                };
                records.push(record.clone());
                Ok(record)
            })
            .await
    }

    /// Save by name: replace the existing template's body and thumbnail, or
    /// create it. Returns the record and whether it was created.
    pub async fn upsert(&self, new: NewTemplate) -> Result<(TemplateRecord, bool), CardpressError> {
        let name = new.checked_name()?;
        self.records
            .update(|records| {
                let now = Utc::now();
                if let Some(existing) = records.iter_mut().find(|r| r.name == name) {
                    existing.template_data = new.template_data;
                    if new.thumbnail.is_some() {
                        existing.thumbnail = new.thumbnail;
                    }
                    existing.updated_at = now;
                    return Ok((existing.clone(), false));
                }
                let record = TemplateRecord {
                    id: Uuid::new_v4().to_string(),
                    name,
                    thumbnail: new.thumbnail,
                    template_data: new.template_data,
                    created_at: now,
                    updated_at: now,
                };
                records.push(record.clone());
                Ok((record, true))
            })
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<TemplateRecord, CardpressError> {
        self.records
            .update(|records| {
                let index = records
                    .iter()
                    .position(|r| r.id == id)
                    .ok_or_else(|| CardpressError::NotFound(format!("template '{}'", id)))?;
                Ok(records.remove(index))
            })
            .await
    }
}
