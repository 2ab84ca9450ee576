use crate::db::models::{Page, PageSchema};
use crate::rendering::markup::html_to_text;

/// Structural fields that never carry indexable prose.
pub const EXCLUDED_FIELDS: &[&str] = &[
    "URLSegment",
    "MenuTitle",
    "ExtraMeta",
    "ShowInMenus",
    "ShowInSearch",
    "Sort",
    "HasBrokenFile",
    "HasBrokenLink",
    "ReportClass",
    "CanViewType",
    "CanEditType",
    "Version",
    "Content",
    "Title",
];

/// Always indexed when present, whatever its declared type.
pub const META_DESCRIPTION: &str = "MetaDescription";

const RICH_TEXT_TYPE: &str = "HTMLText";
const FRAGMENT_SEPARATOR: &str = "<br/><br/>";

/// Extract the plain text to index for a page.
///
/// With discovery disabled (or nothing declared beyond the structural fields)
/// this is the page body. Otherwise every populated `HTMLText` field and the
/// meta description are appended to the body, in declaration order.
/// Relationships are not followed.
pub fn discover(page: &Page, schema: Option<&PageSchema>, discover_enabled: bool) -> String {
    let schema = match schema {
        Some(schema) if discover_enabled => schema,
        _ => return html_to_text(&page.content),
    };

    let candidates: Vec<_> = schema
        .fields
        .iter()
        .filter(|f| !EXCLUDED_FIELDS.contains(&f.name.as_str()))
        .collect();

    if candidates.is_empty() {
        return html_to_text(&page.content);
    }

    let mut fragments = vec![page.content.as_str()];
    for field in candidates {
        if field.name != META_DESCRIPTION && !field.field_type.contains(RICH_TEXT_TYPE) {
            continue;
        }
        if let Some(value) = page.field(&field.name) {
            fragments.push(value);
        }
    }

    html_to_text(&fragments.join(FRAGMENT_SEPARATOR))
}
