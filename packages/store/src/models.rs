//! # Domain models for the portfolio
//!
//! The record types persisted by both the local collections and the remote
//! document store, plus the operator [`User`].
//!
//! ## Types
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`RecordId`] | A record identifier. Seeded projects carry numbers, everything else strings. Local ids start with [`RecordId::LOCAL_PREFIX`]. |
//! | [`Project`] / [`ProjectDraft`] | A gallery item, with and without its id. |
//! | [`Message`] / [`MessageDraft`] | A contact-form inquiry, with and without its id. |
//! | [`User`] / [`ProfileUpdate`] | The authenticated operator and a partial edit of their profile. |
//!
//! Field names serialize in camelCase so records written by earlier versions of
//! the site (`imageUrl`, `photoUrl`) read back unchanged.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{Record, SortOrder};

/// Identifier of a stored record.
#[derive(Clone, Debug, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl RecordId {
    /// Prefix of every id minted by a local collection.
    pub const LOCAL_PREFIX: &'static str = "local_";

    /// Whether this id was minted by a local collection and only exists there.
    pub fn is_local(&self) -> bool {
        match self {
            RecordId::Text(s) => s.starts_with(Self::LOCAL_PREFIX),
            RecordId::Number(_) => false,
        }
    }
}

/// Ids compare by their string form, so `1` and `"1"` are the same record.
impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RecordId::Number(a), RecordId::Number(b)) => a == b,
            (RecordId::Text(a), RecordId::Text(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{n}"),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::Text(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Number(n)
    }
}

/// Gallery category. The site filters on exactly these two.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Architecture,
    #[default]
    Development,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Architecture => "Architecture",
            Category::Development => "Development",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Architecture" | "architecture" => Ok(Category::Architecture),
            "Development" | "development" => Ok(Category::Development),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

fn default_link() -> String {
    "#".to_string()
}

fn default_visible() -> bool {
    true
}

/// A showcased work item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default = "default_link")]
    pub link: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

/// A project that has not been stored yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default = "default_link")]
    pub link: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

impl Project {
    /// Case-insensitive match on title, description or category.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self.category.as_str().to_lowercase().contains(&query)
    }
}

impl Record for Project {
    type Draft = ProjectDraft;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn from_draft(id: RecordId, draft: ProjectDraft) -> Self {
        Project {
            id,
            title: draft.title,
            description: draft.description,
            technologies: draft.technologies,
            image_url: draft.image_url,
            link: draft.link,
            category: draft.category,
            visible: draft.visible,
        }
    }
}

/// A visitor inquiry from the contact form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub content: String,
    /// Send time, ISO 8601 in UTC.
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageDraft {
    pub name: String,
    pub email: String,
    pub content: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

impl MessageDraft {
    /// A fresh, unread message stamped with the current time.
    pub fn new(name: String, email: String, content: String) -> Self {
        Self {
            name,
            email,
            content,
            date: Utc::now(),
            read: false,
        }
    }
}

impl Record for Message {
    type Draft = MessageDraft;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn from_draft(id: RecordId, draft: MessageDraft) -> Self {
        Message {
            id,
            name: draft.name,
            email: draft.email,
            content: draft.content,
            date: draft.date,
            read: draft.read,
        }
    }

    fn sort_order() -> Option<SortOrder> {
        Some(SortOrder::descending("date"))
    }

    fn sort(records: &mut [Self]) {
        records.sort_by(|a, b| b.date.cmp(&a.date));
    }
}

/// The authenticated operator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl User {
    /// Merge the present fields of `update` into this user.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(photo_url) = &update.photo_url {
            self.photo_url = Some(photo_url.clone());
        }
        if let Some(title) = &update.title {
            self.title = Some(title.clone());
        }
    }
}

/// Partial profile edit from the dashboard.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_compares_by_string_form() {
        assert_eq!(RecordId::Number(3), RecordId::from("3"));
        assert_ne!(RecordId::Number(3), RecordId::from("4"));
        assert!(RecordId::from("local_1_abc").is_local());
        assert!(!RecordId::from("aBc123").is_local());
        assert!(!RecordId::Number(1).is_local());
    }

    #[test]
    fn test_project_defaults_when_fields_absent() {
        let project: Project = serde_json::from_str(
            r#"{"id": 7, "title": "T", "description": "D", "category": "Architecture"}"#,
        )
        .unwrap();
        assert_eq!(project.id, RecordId::Number(7));
        assert_eq!(project.link, "#");
        assert!(project.visible);
        assert!(project.technologies.is_empty());
        assert_eq!(project.category, Category::Architecture);
    }

    #[test]
    fn test_project_uses_camel_case_fields() {
        let project = Project::from_draft(
            RecordId::from("x"),
            ProjectDraft {
                title: "T".into(),
                description: "D".into(),
                technologies: vec!["Rust".into()],
                image_url: "https://img".into(),
                link: "#".into(),
                category: Category::Development,
                visible: false,
            },
        );
        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["imageUrl"], "https://img");
        assert_eq!(json["visible"], false);
        assert_eq!(json["category"], "Development");
    }

    #[test]
    fn test_matches_query() {
        let project: Project = serde_json::from_str(
            r#"{"id": 1, "title": "Urban Eco-Center", "description": "Green", "category": "Architecture"}"#,
        )
        .unwrap();
        assert!(project.matches_query("eco"));
        assert!(project.matches_query("ARCHITECTURE"));
        assert!(project.matches_query("  "));
        assert!(!project.matches_query("dashboard"));
    }

    #[test]
    fn test_user_apply_profile_update() {
        let mut user = User {
            email: "op@example.com".into(),
            name: "op".into(),
            photo_url: None,
            title: Some("Administrator".into()),
            token: None,
        };
        user.apply(&ProfileUpdate {
            name: Some("Operator".into()),
            photo_url: None,
            title: Some("Architect".into()),
        });
        assert_eq!(user.name, "Operator");
        assert_eq!(user.photo_url, None);
        assert_eq!(user.title.as_deref(), Some("Architect"));
    }
}
