pub fn approx_tokens(s: &str) -> usize {
    // heuristic ~4 chars/token
    (s.chars().count() + 3) / 4
}

/// Trim `text` to at most `max_tokens` (approx), cutting on a char boundary.
pub fn cap_text(text: &str, max_tokens: usize) -> &str {
    if approx_tokens(text) <= max_tokens {
        return text;
    }
    let max_chars = max_tokens * 4;
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}
