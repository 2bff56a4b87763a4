//! Plain-text extraction from raw HTML.
//!
//! Used by the HTTP fetch strategy, which sees markup exactly as served and
//! cannot run scripts. The document is parsed with `scraper` and every text
//! node under `<body>` is kept except those inside `script`, `style`,
//! `noscript` and `template`. Whitespace is compacted.

use scraper::{ElementRef, Html, Selector};

const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Text of the first `<title>` element, or an empty string.
pub fn extract_title(html: &str) -> String {
    let document = Html::parse_document(html);
    Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next().map(visible_text))
        .unwrap_or_default()
}

/// Visible text of an HTML document, truncated to `max_chars` characters.
pub fn html_to_text(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);
    let root = first_match(&document, "body").unwrap_or_else(|| document.root_element());
    truncate_chars(&visible_text(root), max_chars)
}

/// First `max_chars` characters of `text` (never splits a code point).
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

fn first_match<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    Selector::parse(selector)
        .ok()
        .and_then(|sel| document.select(&sel).next())
}

fn visible_text(elem: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    collect_text(elem, &mut parts);
    compact_ws(&parts.join(" "))
}

fn collect_text<'a>(elem: ElementRef<'a>, parts: &mut Vec<&'a str>) {
    for child in elem.children() {
        if let Some(text) = child.value().as_text() {
            parts.push(&**text);
        } else if let Some(child_elem) = ElementRef::wrap(child) {
            if !SKIPPED_ELEMENTS.contains(&child_elem.value().name()) {
                collect_text(child_elem, parts);
            }
        }
    }
}

fn compact_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!doctype html>
<html>
<head>
  <title>  Acme &amp; Co
  </title>
  <style>body { color: red; }</style>
  <script type="text/javascript">var secret = "<b>hidden</b>";</script>
</head>
<body>
  <!-- tracking pixel -->
  <h1>Build&nbsp;faster</h1>
  <p>Plans from &#36;9 &#x2014; cancel anytime.</p>
  <noscript>Enable JS</noscript>
  <script>document.write("injected")</script>
</body>
</html>"#;

    #[test]
    fn test_extract_title() {
        assert_eq!(extract_title(PAGE), "Acme & Co");
        assert_eq!(extract_title("<html><body>none</body></html>"), "");
    }

    #[test]
    fn test_html_to_text_strips_markup_and_scripts() {
        let text = html_to_text(PAGE, 5000);
        assert!(text.contains("Build faster"));
        assert!(text.contains("Plans from $9 \u{2014} cancel anytime."));
        assert!(!text.contains("secret"));
        assert!(!text.contains("injected"));
        assert!(!text.contains("color: red"));
        assert!(!text.contains("tracking pixel"));
        assert!(!text.contains("Enable JS"));
        assert!(!text.contains('<'));
        assert!(!text.contains("  "));
    }

    #[test]
    fn test_html_to_text_keeps_all_body_text() {
        let html = "<body><nav>Home Pricing</nav><main><p>Boards for <b>teams</b></p></main></body>";
        assert_eq!(html_to_text(html, 100), "Home Pricing Boards for teams");
    }

    #[test]
    fn test_html_to_text_handles_fragments() {
        assert_eq!(html_to_text("plain words, no markup", 100), "plain words, no markup");
        assert_eq!(html_to_text("", 100), "");
    }

    #[test]
    fn test_truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_html_to_text_truncates() {
        let html = format!("<p>{}</p>", "word ".repeat(2000));
        assert_eq!(html_to_text(&html, 5000).chars().count(), 5000);
    }

    #[test]
    fn test_unknown_entity_left_alone() {
        assert_eq!(html_to_text("<p>a &bogus; b</p>", 100), "a &bogus; b");
    }
}
