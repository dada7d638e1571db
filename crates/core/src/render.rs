//! Markdown to HTML for lesson bodies and editor previews.

use comrak::{Options, markdown_to_html};

use crate::types::CodeSnippet;

/// Render lesson markdown to HTML with GitHub Flavored Markdown extensions.
///
/// Raw HTML in the source is omitted. Fenced code blocks keep their language
/// as a `language-*` class for client-side highlighting.
#[must_use]
pub fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.header_ids = Some(String::new());

    markdown_to_html(content, &options)
}

/// Render stored code snippets as fenced blocks, in order.
#[must_use]
pub fn render_snippets(snippets: &[CodeSnippet]) -> Vec<(String, String)> {
    snippets
        .iter()
        .map(|snippet| (snippet.title.clone(), render_markdown(&snippet.to_markdown())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_block_keeps_language_class() {
        let html = render_markdown("```c\nint main() {}\n```");
        assert!(html.contains(r#"<code class="language-c">"#));
    }

    #[test]
    fn test_raw_html_is_not_emitted() {
        let html = render_markdown("Hello <script>alert(1)</script>");
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_gfm_table() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_snippets_render_in_order() {
        let snippets = vec![
            CodeSnippet {
                id: "a".to_string(),
                code: "print(1)".to_string(),
                language: "python".to_string(),
                title: "First".to_string(),
            },
            CodeSnippet {
                id: "b".to_string(),
                code: "puts 2".to_string(),
                language: "ruby".to_string(),
                title: "Second".to_string(),
            },
        ];
        let rendered = render_snippets(&snippets);
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered.first().map(|(t, _)| t.as_str()), Some("First"));
        assert!(rendered.iter().all(|(_, html)| html.contains("language-")));
    }
}
