//! Card holders: field values saved against a template.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::JsonCollection;
use crate::document::FieldValues;
use crate::error::CardpressError;

/// Default and largest page size of a user listing.
pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

/// A stored card holder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(alias = "_id")]
    pub id: String,
    /// Field values keyed like [`FieldValues`]; kept as raw JSON so values
    /// written by other clients round-trip untouched.
    #[serde(default)]
    pub user_data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn values(&self) -> FieldValues {
        FieldValues::from_json(&self.user_data)
    }

    pub fn display_name(&self) -> String {
        display_name(&self.id, &self.user_data)
    }

    fn matches(&self, needle: &str) -> bool {
        let data = Value::Object(self.user_data.clone()).to_string().to_lowercase();
        data.contains(needle)
            || self
                .template_name
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(needle))
    }
}

/// How a user is named in lists: `Name`, then `Employee ID`, then `Email`,
/// then `User` plus the last six characters of the id.
///
/// ```
/// use cardpress::store::display_name;
/// use serde_json::json;
///
/// let data = json!({"Email": "ada@example.com"});
/// assert_eq!(display_name("abc", data.as_object().unwrap()), "ada@example.com");
/// assert_eq!(display_name("0123456789", &Default::default()), "User 456789");
/// ```
pub fn display_name(id: &str, user_data: &Map<String, Value>) -> String {
    for key in ["Name", "Employee ID", "Email"] {
        if let Some(Value::String(s)) = user_data.get(key)
            && !s.trim().is_empty()
        {
            return s.clone();
        }
    }
    let tail: String = {
        let chars: Vec<char> = id.chars().collect();
        chars[chars.len().saturating_sub(6)..].iter().collect()
    };
    format!("User {}", tail)
}

/// Body of a create or update request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default)]
    pub user_data: Map<String, Value>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub template_name: Option<String>,
}

/// Listing filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    /// 1-based page number.
    pub page: Option<usize>,
    pub limit: Option<usize>,
    /// Case-insensitive substring over the user data and template name.
    pub search: Option<String>,
    /// Exact template name.
    pub template_name: Option<String>,
}

/// One page of users.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    pub users: Vec<UserRecord>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

pub struct UserStore {
    records: JsonCollection<UserRecord>,
}

impl UserStore {
    pub fn new(records: JsonCollection<UserRecord>) -> Self {
        Self { records }
    }

    /// Filtered page, most recently updated first.
    pub async fn list(&self, query: &UserQuery) -> UserPage {
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let page = query.page.unwrap_or(1).max(1);
        let needle = query
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let template = query.template_name.as_deref().filter(|s| !s.is_empty());

        let records = self.records.read().await;
        let mut matching: Vec<&UserRecord> = records
            .iter()
            .filter(|u| template.is_none_or(|t| u.template_name.as_deref() == Some(t)))
            .filter(|u| needle.as_deref().is_none_or(|n| u.matches(n)))
            .collect();
        matching.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let total = matching.len();
        let users = matching
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .cloned()
            .collect();
        UserPage {
            users,
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit),
        }
    }

    pub async fn get(&self, id: &str) -> Result<UserRecord, CardpressError> {
        self.records
            .read()
            .await
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| CardpressError::NotFound(format!("user '{}'", id)))
    }

    /// First user with a string field equal to `name` (case-insensitive).
    pub async fn get_by_name(&self, name: &str) -> Result<UserRecord, CardpressError> {
        let wanted = name.trim().to_lowercase();
        self.records
            .read()
            .await
            .iter()
            .find(|u| {
                u.user_data
                    .values()
                    .any(|v| v.as_str().is_some_and(|s| s.trim().to_lowercase() == wanted))
            })
            .cloned()
            .ok_or_else(|| CardpressError::NotFound(format!("user named '{}'", name)))
    }

    pub async fn create(&self, new: NewUser) -> Result<UserRecord, CardpressError> {
        self.records
            .update(|records| {
                let now = Utc::now();
                let record = UserRecord {
                    id: Uuid::new_v4().to_string(),
                    user_data: new.user_data,
                    template_id: new.template_id,
                    template_name: new.template_name,
                    created_at: now,
                    updated_at: now,
                };
                records.push(record.clone());
                Ok(record)
            })
            .await
    }

    /// Replace the user data; template references change only when given.
    pub async fn update(&self, id: &str, new: NewUser) -> Result<UserRecord, CardpressError> {
        self.records
            .update(|records| {
                let record = records
                    .iter_mut()
                    .find(|u| u.id == id)
                    .ok_or_else(|| CardpressError::NotFound(format!("user '{}'", id)))?;
                record.user_data = new.user_data;
                if new.template_id.is_some() {
                    record.template_id = new.template_id;
                }
                if new.template_name.is_some() {
                    record.template_name = new.template_name;
                }
                record.updated_at = Utc::now();
                Ok(record.clone())
            })
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<UserRecord, CardpressError> {
        self.records
            .update(|records| {
                let index = records
                    .iter()
                    .position(|u| u.id == id)
                    .ok_or_else(|| CardpressError::NotFound(format!("user '{}'", id)))?;
                Ok(records.remove(index))
            })
            .await
    }
}
