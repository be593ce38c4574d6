pub const TITLE_PLACEHOLDER: &str = "{{TITLE}}";
pub const CONTENT_PLACEHOLDER: &str = "{{CONTENT}}";

/// Fills every title placeholder, then the first content placeholder.
/// Both values are inserted verbatim.
pub fn apply_template(template: &str, title: &str, content: &str) -> String {
    template
        .replace(TITLE_PLACEHOLDER, title)
        .replacen(CONTENT_PLACEHOLDER, content, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_all_titles_and_first_content() {
        let out = apply_template(
            "<title>{{TITLE}}</title><h1>{{TITLE}}</h1>{{CONTENT}}<footer>{{CONTENT}}</footer>",
            "Demo",
            "<p>body</p>",
        );

        assert_eq!(
            out,
            "<title>Demo</title><h1>Demo</h1><p>body</p><footer>{{CONTENT}}</footer>"
        );
    }

    #[test]
    fn inserts_values_literally() {
        let out = apply_template("{{TITLE}}|{{CONTENT}}", "$1 & $&", "{{TITLE}} $$");
        assert_eq!(out, "$1 & $&|{{TITLE}} $$");
    }
}
