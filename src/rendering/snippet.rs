use regex::{Regex, RegexBuilder};

const PREFIX: &str = "... ";
const SUFFIX: &str = "...";
const HIGHLIGHT_OPEN: &str = r#"<span class="highlight">"#;
const HIGHLIGHT_CLOSE: &str = "</span>";

/// Cut a window of `characters` chars out of `text`, centred on the first
/// query keyword found, and highlight the query words inside it.
///
/// `text` is plain text; the returned snippet is HTML. Query words shorter
/// than three characters are not highlighted.
pub fn context_summary(text: &str, query: &str, characters: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    let folded: Vec<char> = chars.iter().map(|c| fold(*c)).collect();

    let mut position = query
        .split_whitespace()
        .find_map(|keyword| {
            let needle: Vec<char> = keyword.chars().map(fold).collect();
            find(&folded, &needle)
        })
        .unwrap_or(0);

    // Keep the keyword in the middle, starting on a word boundary.
    position = position.saturating_sub(characters / 2);
    if position > 0 {
        position = chars[..position]
            .iter()
            .rposition(|c| *c == ' ' || *c == '\n')
            .unwrap_or(0);
    }

    let end = (position + characters).min(chars.len());
    let window: String = chars[position..end].iter().collect();
    let window = window.trim();

    let mut summary = match highlighter(query) {
        Some(re) => highlight(&re, window),
        None => html_escape::encode_text(window).into_owned(),
    };

    if position > 0 {
        summary.insert_str(0, PREFIX);
    }
    if chars.len() > characters + position {
        summary.push_str(SUFFIX);
    }

    summary
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn find(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Escape `text` for HTML, wrapping every match of `re` in a highlight span.
/// Matching runs on the raw text so entities are never split.
fn highlight(re: &Regex, text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for m in re.find_iter(text) {
        out.push_str(&html_escape::encode_text(&text[last..m.start()]));
        out.push_str(HIGHLIGHT_OPEN);
        out.push_str(&html_escape::encode_text(m.as_str()));
        out.push_str(HIGHLIGHT_CLOSE);
        last = m.end();
    }
    out.push_str(&html_escape::encode_text(&text[last..]));

    out
}

/// One case-insensitive alternation over the highlightable query words,
/// longest first so that overlapping words prefer the longer match.
fn highlighter(query: &str) -> Option<Regex> {
    let mut words: Vec<String> = query
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .map(regex::escape)
        .collect();

    if words.is_empty() {
        return None;
    }

    words.sort_by_key(|w| std::cmp::Reverse(w.len()));
    words.dedup();

    RegexBuilder::new(&words.join("|"))
        .case_insensitive(true)
        .build()
        .ok()
}
