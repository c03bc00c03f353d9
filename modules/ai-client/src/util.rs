/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Strip a markdown code fence wrapped around a JSON response.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Collapse every run of whitespace into a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_never_splits_a_multibyte_char() {
        let text = "Café olé";
        let truncated = truncate_to_char_boundary(text, 4);
        assert_eq!(truncated, "Caf");
    }

    #[test]
    fn short_text_is_returned_whole() {
        assert_eq!(truncate_to_char_boundary("menu", 3000), "menu");
    }

    #[test]
    fn code_fences_are_removed() {
        assert_eq!(strip_code_blocks("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_blocks("  {}  "), "{}");
    }

    #[test]
    fn whitespace_runs_collapse() {
        assert_eq!(collapse_whitespace("Fresh\n\n  tortillas\tdaily "), "Fresh tortillas daily");
    }
}
