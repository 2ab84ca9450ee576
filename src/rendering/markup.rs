use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static BLOCK_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*<(?:h[1-6]|p|div)(?:[^a-z0-9>][^>]*)?> *").unwrap()
});
static EXCESS_BREAKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\n\n+").unwrap());
static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(?:br|tr)(?:[^a-z0-9>][^>]*)?> *").unwrap());
static CELL_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</td(?:[^a-z0-9>][^>]*)?> *").unwrap());
static PARAGRAPH_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</p>").unwrap());

/// Convert an HTML fragment into plain text.
///
/// Whitespace is collapsed first, then block elements become blank lines and
/// `<br>`/`<tr>` become line breaks. Remaining tags are dropped (together with
/// the contents of `<script>` and `<style>`), entities are decoded and runs of
/// blank lines are folded into one.
pub fn html_to_text(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let text = WHITESPACE.replace_all(html, " ");
    let text = BLOCK_OPEN.replace_all(&text, "\n\n");
    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = CELL_CLOSE.replace_all(&text, "    ");
    let text = PARAGRAPH_CLOSE.replace_all(&text, "\n\n");

    let stripped = ammonia::Builder::empty()
        .clean_content_tags(HashSet::from(["script", "style"]))
        .clean(&text)
        .to_string();
    let decoded = html_escape::decode_html_entities(&stripped);
    let collapsed = EXCESS_BREAKS.replace_all(&decoded, "\n\n");

    collapsed.trim().to_string()
}
