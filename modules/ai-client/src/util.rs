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

/// Strip a surrounding markdown code fence, with or without a language tag.
pub fn strip_code_blocks(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag line, if any.
    let body = match rest.find('\n') {
        Some(idx) if !rest[..idx].contains('{') && !rest[..idx].contains('[') => &rest[idx + 1..],
        _ => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_multibyte_chars() {
        let text = "라멘 맛집";
        let truncated = truncate_to_char_boundary(text, 4);
        assert!(truncated.len() <= 4);
        assert!(text.starts_with(truncated));
        assert_eq!(truncated, "라");
    }

    #[test]
    fn truncate_within_bounds_is_identity() {
        assert_eq!(truncate_to_char_boundary("Hello", 100), "Hello");
    }

    #[test]
    fn strips_fences_with_and_without_language() {
        assert_eq!(strip_code_blocks("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_blocks("  {}  "), "{}");
    }

    #[test]
    fn inline_fence_keeps_payload() {
        assert_eq!(strip_code_blocks("```{\"a\":1}```"), "{\"a\":1}");
    }
}
