use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Numeric page identifier. `0` never names a page; it marks "no parent".
pub type PageId = i64;

/// View permission of a page or of the whole site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CanViewType {
    Anyone,
    LoggedInUsers,
    OnlyTheseUsers,
    /// Defer to the parent page, or to the site when at the root.
    #[default]
    Inherit,
}

impl CanViewType {
    /// Permissions that hide a page regardless of its ancestors.
    pub fn is_restricted(&self) -> bool {
        matches!(self, CanViewType::LoggedInUsers | CanViewType::OnlyTheseUsers)
    }
}

/// A content page from the site tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    /// Page type name (e.g. `Page`, `ErrorPage`).
    pub class_name: String,
    pub title: String,
    /// Main HTML body.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url_segment: String,
    pub last_edited: DateTime<Utc>,
    /// Values of the custom fields declared by the page type, keyed by field name.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub can_view_type: CanViewType,
    #[serde(default)]
    pub parent_id: PageId,
    #[serde(default = "default_show_in_search")]
    pub show_in_search: bool,
    /// `1` once the page has been added to the remote index, `0` otherwise.
    #[serde(default)]
    pub index_state: i32,
}

fn default_show_in_search() -> bool {
    true
}

impl Page {
    pub fn parent(&self) -> Option<PageId> {
        (self.parent_id != 0).then_some(self.parent_id)
    }

    pub fn is_indexed(&self) -> bool {
        self.index_state != 0
    }

    /// Value of a custom field, if present and not blank.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// A field declared by a page type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    /// Declared field type, e.g. `HTMLText`, `Varchar(255)`, `Boolean`.
    pub field_type: String,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
        }
    }
}

/// The ordered field declarations of one page type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSchema {
    pub class_name: String,
    pub fields: Vec<FieldSpec>,
}

/// Site-wide settings consulted when no ancestor grants public access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Settings document key (always "global").
    pub key: String,
    #[serde(default = "default_site_can_view")]
    pub can_view_type: CanViewType,
}

fn default_site_can_view() -> CanViewType {
    CanViewType::Anyone
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            key: "global".to_string(),
            can_view_type: default_site_can_view(),
        }
    }
}
