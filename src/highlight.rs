use std::ops::Range;

/// Byte range of the first case-insensitive occurrence of `needle` in
/// `haystack`. Lowercasing is applied per character, so offsets always land on
/// the original string's char boundaries. An empty needle matches at `0..0`,
/// so every phrase contains it.
pub fn find_ci(haystack: &str, needle: &str) -> Option<Range<usize>> {
    if needle.is_empty() {
        return Some(0..0);
    }
    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    haystack
        .char_indices()
        .find_map(|(start, _)| match_len(&haystack[start..], &needle).map(|len| start..start + len))
}

pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    find_ci(haystack, needle).is_some()
}

// Bytes of `s` consumed by a match of `needle` anchored at its start.
fn match_len(s: &str, needle: &[char]) -> Option<usize> {
    let mut i = 0;
    for (pos, c) in s.char_indices() {
        if i == needle.len() {
            return Some(pos);
        }
        for lc in c.to_lowercase() {
            if needle.get(i) != Some(&lc) {
                return None;
            }
            i += 1;
        }
    }
    (i == needle.len()).then_some(s.len())
}

/// A phrase split around the first occurrence of a term. Later occurrences are
/// left unmarked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlighted<'a> {
    pub before: &'a str,
    pub matched: Option<&'a str>,
    pub after: &'a str,
}

pub fn highlight<'a>(phrase: &'a str, term: &str) -> Highlighted<'a> {
    match find_ci(phrase, term) {
        Some(r) => Highlighted {
            before: &phrase[..r.start],
            matched: Some(&phrase[r.clone()]),
            after: &phrase[r.end..],
        },
        None => Highlighted {
            before: phrase,
            matched: None,
            after: "",
        },
    }
}

impl Highlighted<'_> {
    pub fn is_match(&self) -> bool {
        self.matched.is_some()
    }

    /// Markdown metacharacters in the phrase are escaped; an empty match adds
    /// no emphasis markers.
    pub fn to_markdown(&self) -> String {
        match self.matched {
            Some(m) if !m.is_empty() => format!(
                "{}**{}**{}",
                escape_markdown(self.before),
                escape_markdown(m),
                escape_markdown(self.after)
            ),
            _ => format!("{}{}", escape_markdown(self.before), escape_markdown(self.after)),
        }
    }

    pub fn to_html(&self) -> String {
        match self.matched {
            Some(m) if !m.is_empty() => format!(
                "{}<mark class=\"mark-highlight\">{}</mark>{}",
                escape_html(self.before),
                escape_html(m),
                escape_html(self.after)
            ),
            _ => format!("{}{}", escape_html(self.before), escape_html(self.after)),
        }
    }
}

/// Backslash-escape the characters that would open emphasis, code or links.
pub fn escape_markdown(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '*' | '_' | '`' | '~' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn marks_first_occurrence_only() {
        let h = highlight("great service, great price", "great");
        assert_eq!(h.before, "");
        assert_eq!(h.matched, Some("great"));
        assert_eq!(h.after, " service, great price");
        assert_eq!(h.to_markdown(), "**great** service, great price");
    }

    #[test]
    fn keeps_original_casing() {
        let h = highlight("Really GREAT help", "great");
        assert_eq!(h.to_markdown(), "Really **GREAT** help");
    }

    #[test]
    fn no_match_is_unmodified() {
        let h = highlight("slow refund", "great");
        assert!(!h.is_match());
        assert_eq!(h.to_markdown(), "slow refund");
        assert_eq!(h.to_html(), "slow refund");
    }

    #[test]
    fn empty_term_matches_at_start_without_markers() {
        assert_eq!(find_ci("anything", ""), Some(0..0));
        assert_eq!(find_ci("", ""), Some(0..0));
        assert!(contains_ci("", ""));
        let h = highlight("any_thing", "");
        assert!(h.is_match());
        assert_eq!(h.to_markdown(), "any\\_thing");
        assert_eq!(h.to_html(), "any_thing");
    }

    #[test]
    fn markdown_metacharacters_are_escaped() {
        let h = highlight("**bold** claim_with [link]", "bold");
        assert_eq!(h.to_markdown(), "\\*\\***bold**\\*\\* claim\\_with \\[link\\]");
        assert_eq!(highlight("a*b", "zzz").to_markdown(), "a\\*b");
        assert_eq!(escape_markdown(r"back\slash `code`"), r"back\\slash \`code\`");
    }

    #[test]
    fn substring_inside_word() {
        assert_eq!(find_ci("ungreatful", "great"), Some(2..7));
    }

    #[test]
    fn offsets_stay_on_char_boundaries() {
        let phrase = "Ärger über WARTEZEIT";
        let r = find_ci(phrase, "über").unwrap();
        assert_eq!(&phrase[r], "über");
        let r = find_ci(phrase, "wartezeit").unwrap();
        assert_eq!(&phrase[r], "WARTEZEIT");
    }

    #[test]
    fn html_is_escaped() {
        let h = highlight("<b>fast</b> & easy", "fast");
        assert_eq!(
            h.to_html(),
            "&lt;b&gt;<mark class=\"mark-highlight\">fast</mark>&lt;/b&gt; &amp; easy"
        );
    }

    #[test]
    fn term_at_end() {
        let h = highlight("wait was long", "LONG");
        assert_eq!(h.before, "wait was ");
        assert_eq!(h.after, "");
        assert_eq!(h.to_markdown(), "wait was **long**");
    }
}
