//! Allowlist HTML sanitizer for model-written rich text.

use std::collections::HashSet;

/// Tags kept in sanitized output. Every attribute is removed.
pub const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "strong", "em", "b", "i", "u", "ul", "ol", "li", "blockquote", "h1", "h2", "h3",
    "h4", "hr",
];

/// Elements dropped together with everything inside them.
const CLEAN_CONTENT_TAGS: &[&str] = &["script", "style", "textarea", "option", "iframe"];

/// Sanitize model output into the allowed HTML subset.
///
/// An outer markdown code fence is removed first. Disallowed tags are
/// discarded but their text is kept.
pub fn sanitize_html(input: &str) -> String {
    let cleaned = ammonia::Builder::empty()
        .tags(ALLOWED_TAGS.iter().copied().collect::<HashSet<_>>())
        .clean_content_tags(CLEAN_CONTENT_TAGS.iter().copied().collect::<HashSet<_>>())
        .strip_comments(true)
        .clean(strip_outer_fence(input))
        .to_string();
    cleaned.trim().to_string()
}

/// Remove a fence only when it wraps the whole input on its own lines.
fn strip_outer_fence(input: &str) -> &str {
    let trimmed = input.trim();
    if !trimmed.starts_with("```") {
        return input;
    }
    let lines: Vec<&str> = trimmed.lines().collect();
    if lines.len() < 3 || lines[lines.len() - 1].trim() != "```" {
        return input;
    }
    let start = lines[0].len();
    let end = trimmed.len() - lines[lines.len() - 1].len();
    trimmed[start..end].trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_scripts_and_event_handlers() {
        let input = "<p>Hello</p><img src=x onerror=alert(1) /><script>alert(1)</script>";
        assert_eq!(sanitize_html(input), "<p>Hello</p>");
    }

    #[test]
    fn strips_all_attributes_from_allowed_tags() {
        let input = r#"<p class="x" style="color:red">Hi <strong onclick="evil()">there</strong></p>"#;
        assert_eq!(sanitize_html(input), "<p>Hi <strong>there</strong></p>");
    }

    #[test]
    fn removes_outer_code_fence() {
        assert_eq!(sanitize_html("```html\n<p>Hi</p>\n```"), "<p>Hi</p>");
    }

    #[test]
    fn keeps_text_of_disallowed_tags() {
        let input = r#"<div><a href="https://evil.example">Visit</a> the <span>tavern</span></div>"#;
        assert_eq!(sanitize_html(input), "Visit the tavern");
    }

    #[test]
    fn drops_blocked_elements_with_contents() {
        let input = "<h2>Menu</h2><style>p{color:red}</style><iframe src=x>inner</iframe><textarea>typed</textarea><ul><li>Ale</li></ul>";
        assert_eq!(sanitize_html(input), "<h2>Menu</h2><ul><li>Ale</li></ul>");
    }

    #[test]
    fn option_contents_are_dropped() {
        let input = "<select><option>secret</option></select><p>Shown</p>";
        assert_eq!(sanitize_html(input), "<p>Shown</p>");
    }

    #[test]
    fn unclosed_script_drops_rest() {
        assert_eq!(sanitize_html("<p>ok</p><script>alert(1)"), "<p>ok</p>");
    }

    #[test]
    fn drops_comments_and_keeps_void_tags() {
        let input = "<!-- note --><p>One<BR>Two</p><hr class=\"x\"/>";
        assert_eq!(sanitize_html(input), "<p>One<br>Two</p><hr>");
    }

    #[test]
    fn escapes_stray_brackets() {
        assert_eq!(sanitize_html("<p>3 < 4</p>"), "<p>3 &lt; 4</p>");
    }

    #[test]
    fn markup_inside_attribute_value_keeps_paragraphs() {
        let input = r#"<p title="<script>">The Rusty Flagon</p><p>Second paragraph.</p>"#;
        assert_eq!(
            sanitize_html(input),
            "<p>The Rusty Flagon</p><p>Second paragraph.</p>"
        );
    }

    #[test]
    fn empty_after_sanitizing() {
        assert_eq!(sanitize_html("  <script>x</script>  "), "");
    }
}
