//! Markup helpers shared by the encyclopedia provider, the page renderer and
//! the text extractor.

use std::sync::OnceLock;

use regex::Regex;

/// Column width used when turning HTML into plain text
pub const TEXT_WIDTH: usize = 100;

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("static regex"))
}

/// Remove every `<...>` tag sequence, keeping the text between tags.
///
/// Entities are left untouched: decoding `&lt;b&gt;` would re-introduce a tag.
pub fn strip_tags(fragment: &str) -> String {
    tag_pattern().replace_all(fragment, "").into_owned()
}

/// Heuristic check whether a document body is HTML
pub fn looks_like_html(body: &str) -> bool {
    let head = body.trim_start_matches('\u{FEFF}').trim_start();
    let lower: String = head.chars().take(512).collect::<String>().to_lowercase();
    lower.starts_with("<!doctype html")
        || lower.starts_with("<html")
        || (lower.starts_with('<')
            && (lower.contains("<head") || lower.contains("<body") || lower.contains("<title")))
}

/// Convert an HTML document into readable, line-oriented text.
///
/// Falls back to plain tag stripping when `html2text` cannot handle the input.
pub fn html_to_text(html: &str) -> String {
    match html2text::from_read(html.as_bytes(), TEXT_WIDTH) {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => String::new(),
        Err(e) => {
            tracing::debug!(error = %e, "html2text failed, falling back to tag stripping");
            strip_tags(html)
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_tags(r#"The <span class="searchmatch">Transformer</span> model"#),
            "The Transformer model"
        );
        assert_eq!(strip_tags("no markup"), "no markup");
        assert_eq!(strip_tags("<b>a</b><i>b</i>"), "ab");
    }

    #[test]
    fn test_strip_tags_keeps_entities() {
        assert_eq!(strip_tags("&lt;b&gt; literal"), "&lt;b&gt; literal");
    }

    #[test]
    fn test_looks_like_html() {
        assert!(looks_like_html("<!DOCTYPE html><html><body>x</body></html>"));
        assert!(looks_like_html("\u{FEFF}  <html lang=\"en\">"));
        assert!(looks_like_html("<div><title>t</title></div>"));
        assert!(!looks_like_html("%PDF-1.5"));
        assert!(!looks_like_html("plain text with a < sign"));
    }

    #[test]
    fn test_html_to_text_keeps_reading_order() {
        let text = html_to_text(
            "<html><body><h1>Title</h1><p>First paragraph.</p><p>Second paragraph.</p></body></html>",
        );
        let first = text.find("First").unwrap();
        let second = text.find("Second").unwrap();
        assert!(text.contains("Title"));
        assert!(first < second);
    }
}
