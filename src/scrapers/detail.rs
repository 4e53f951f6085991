//! Detail-page body extraction.
//!
//! Boilerplate subtrees are removed first, then known body containers are
//! tried in order. If none holds enough text, the whole `<body>` is used with
//! short lines (menus, breadcrumbs, footers that survived) dropped.

use crate::utils::truncate_chars;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

/// Bound on body length handed to the analyzer.
pub const MAX_BODY_CHARS: usize = 5000;
/// A container must carry more text than this to count as the article body.
pub const MIN_BODY_CHARS: usize = 100;
/// Fallback path: lines shorter than this are navigation residue.
pub const MIN_LINE_CHARS: usize = 15;
/// Fallback path: number of lines kept.
pub const MAX_FALLBACK_LINES: usize = 80;

const BODY_SELECTORS: &[&str] = &[
    "div.article-content",
    "div.content",
    "div.TRS_Editor",
    "div.article",
    "div.detail-content",
    "div.news-content",
    "div.main-text",
    "div.text",
    "div.con_text",
    "div.artical",
    "article",
    "div#content",
    "div.pages_content",
    "div.Custom_UniformBlock",
    "div.article-body",
];

static BODIES: Lazy<Vec<Selector>> = Lazy::new(|| {
    BODY_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
});

static NOISE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script, style, nav, header, footer").expect("valid selector"));

static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").expect("valid selector"));

/// Extract the plain-text body of a detail page.
///
/// Returns an empty string when the page has no usable text; the caller
/// substitutes the title.
pub fn extract_detail(html: &str) -> String {
    let mut document = Html::parse_document(html);
    strip_noise(&mut document);

    for selector in BODIES.iter() {
        if let Some(container) = document.select(selector).next() {
            let text = text_lines(container).join("\n");
            if text.chars().count() > MIN_BODY_CHARS {
                return truncate_chars(&text, MAX_BODY_CHARS);
            }
        }
    }

    let Some(body) = document.select(&BODY).next() else {
        return String::new();
    };
    let lines: Vec<&str> = text_lines(body)
        .into_iter()
        .filter(|line| line.chars().count() >= MIN_LINE_CHARS)
        .take(MAX_FALLBACK_LINES)
        .collect();
    truncate_chars(&lines.join("\n"), MAX_BODY_CHARS)
}

fn strip_noise(document: &mut Html) {
    let ids: Vec<_> = document.select(&NOISE).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Non-empty trimmed lines of every text node under `element`.
fn text_lines(element: ElementRef<'_>) -> Vec<&str> {
    element
        .text()
        .flat_map(str::lines)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_container_with_enough_text_wins() {
        let long = "Export licence requirements for passenger vehicles change next quarter. ".repeat(3);
        let html = format!(
            r#"<html><body>
                <div class="article-content">Too short.</div>
                <div class="content"><p>{long}</p></div>
                <div class="article"><p>Should not be used at all, even though long enough to qualify as a body text block.</p></div>
            </body></html>"#
        );
        let text = extract_detail(&html);
        assert!(text.starts_with("Export licence requirements"));
        assert!(!text.contains("Should not be used"));
    }

    #[test]
    fn test_scripts_and_chrome_removed() {
        let para = "The ministry announced revised technical standards for exported vehicles. ".repeat(2);
        let html = format!(
            r#"<html><body>
                <header>Site header navigation bar text</header>
                <div class="TRS_Editor">
                    <script>var tracking = "should never appear in output at all";</script>
                    <style>.x {{ color: red; }}</style>
                    <p>{para}</p>
                </div>
                <footer>Copyright notice for the website footer</footer>
            </body></html>"#
        );
        let text = extract_detail(&html);
        assert!(text.contains("revised technical standards"));
        assert!(!text.contains("tracking"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn test_container_text_capped() {
        let huge = "汽".repeat(MAX_BODY_CHARS + 500);
        let html = format!(r#"<html><body><article><p>{huge}</p></article></body></html>"#);
        assert_eq!(extract_detail(&html).chars().count(), MAX_BODY_CHARS);
    }

    #[test]
    fn test_fallback_keeps_first_80_long_lines() {
        let mut body = String::new();
        for i in 0..100 {
            body.push_str(&format!("<p>Fallback body line number {i:03}</p>\n"));
        }
        let html = format!(r#"<html><body><div class="wrapper">{body}</div></body></html>"#);

        let text = extract_detail(&html);
        let lines: Vec<&str> = text.lines().collect();
        assert!(!text.is_empty());
        assert_eq!(lines.len(), MAX_FALLBACK_LINES);
        assert_eq!(lines[0], "Fallback body line number 000");
        assert_eq!(lines[79], "Fallback body line number 079");
        assert!(text.chars().count() <= MAX_BODY_CHARS);
    }

    #[test]
    fn test_fallback_drops_short_lines() {
        let html = r#"<html><body>
            <div><a href="/">Home</a> <a href="/en">English</a></div>
            <p>This line is certainly long enough to keep.</p>
        </body></html>"#;
        assert_eq!(extract_detail(html), "This line is certainly long enough to keep.");
    }

    #[test]
    fn test_fallback_line_cutoff_is_inclusive() {
        let html = r#"<html><body>
            <p>fourteen chars</p>
            <p>fifteen chars!!</p>
        </body></html>"#;
        assert_eq!("fourteen chars".chars().count(), MIN_LINE_CHARS - 1);
        assert_eq!("fifteen chars!!".chars().count(), MIN_LINE_CHARS);
        assert_eq!(extract_detail(html), "fifteen chars!!");
    }

    #[test]
    fn test_empty_page_yields_empty_text() {
        assert_eq!(extract_detail("<html><body><nav>Menu</nav></body></html>"), "");
    }
}
