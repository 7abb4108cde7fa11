use itertools::Itertools;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Longest span the extractor produces by default.
pub const DEFAULT_MAX_NGRAM: usize = 3;

/// Tokens (or joined n-grams) this short carry no meaning on their own.
const SHORT_LEN: usize = 2;

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "and", "a", "an", "to", "of", "in", "on", "for", "with", "is", "it", "was", "i",
        "we", "they", "that", "this", "are", "be", "but", "not", "have", "has", "my", "our",
    ]
    .into_iter()
    .collect()
});

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

/// Lowercase, blank out everything that is not `[a-z0-9]` or whitespace, split.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned
        .split_whitespace()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Every contiguous span of 1..=max_n tokens, unigrams first, each size in
/// position order.
pub fn ngrams<S: AsRef<str>>(tokens: &[S], max_n: usize) -> Vec<String> {
    let n = tokens.len();
    let mut out = Vec::new();
    for size in 1..=max_n.min(n) {
        for window in tokens.windows(size) {
            out.push(window.iter().map(|t| t.as_ref()).join(" "));
        }
    }
    out
}

/// Single-token rule: drop stop words and anything of two characters or less.
pub fn keep_token(token: &str) -> bool {
    token.chars().count() > SHORT_LEN && !is_stop_word(token)
}

/// N-gram rule: one stop word is tolerated ("wait time") as long as the span
/// still has a real word in it.
pub fn keep_ngram(ngram: &str) -> bool {
    if ngram.chars().count() <= SHORT_LEN {
        return false;
    }
    let mut all_stop = true;
    let mut any_long = false;
    for p in ngram.split(' ') {
        all_stop &= is_stop_word(p);
        any_long |= p.chars().count() > SHORT_LEN;
    }
    !all_stop && any_long
}

/// Tokenize one phrase and return its surviving n-grams, duplicates included.
pub fn phrase_ngrams(phrase: &str, max_n: usize) -> Vec<String> {
    let tokens = tokenize(phrase);
    ngrams(&tokens[..], max_n)
        .into_iter()
        .filter(|ng| keep_ngram(ng))
        .collect()
}

/// Tokenize one phrase and return its surviving single tokens.
pub fn phrase_tokens(phrase: &str) -> Vec<String> {
    tokenize(phrase).into_iter().filter(|t| keep_token(t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tokenize_strips_punctuation_and_case() {
        assert_eq!(
            tokenize("Great SERVICE, really!! (5 stars)"),
            vec!["great", "service", "really", "5", "stars"]
        );
    }

    #[test]
    fn tokenize_splits_contractions() {
        assert_eq!(tokenize("didn't call-back"), vec!["didn", "t", "call", "back"]);
    }

    #[test]
    fn tokenize_empty_inputs() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t\n").is_empty());
        assert!(tokenize("?!... --- ***").is_empty());
    }

    #[test]
    fn tokenize_drops_non_ascii_letters() {
        assert_eq!(tokenize("café olé"), vec!["caf", "ol"]);
    }

    #[test]
    fn tokens_are_lowercase_alphanumeric() {
        for input in ["Ünïcödé & CO.", "x_y-z 42%", "Tab\tSeparated\u{00a0}words"] {
            for t in tokenize(input) {
                assert!(!t.is_empty());
                assert!(t.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()), "{t}");
            }
        }
    }

    #[test]
    fn ngram_order_and_content() {
        let toks = ["long", "wait", "time"];
        assert_eq!(
            ngrams(&toks[..], 3),
            vec!["long", "wait", "time", "long wait", "wait time", "long wait time"]
        );
    }

    #[test]
    fn ngram_count_formula() {
        let toks: Vec<String> = (0..7).map(|i| format!("t{i}")).collect();
        for k in 0..=9usize {
            for n in 0..=toks.len() {
                let expected: usize = (1..=k.min(n)).map(|s| n - s + 1).sum();
                assert_eq!(ngrams(&toks[..n], k).len(), expected, "n={n} k={k}");
            }
        }
    }

    #[test]
    fn keep_token_rules() {
        assert!(keep_token("service"));
        assert!(!keep_token("ok"));
        assert!(!keep_token("the"));
        assert!(!keep_token("have"));
    }

    #[test]
    fn keep_ngram_rules() {
        assert!(keep_ngram("wait time"));
        assert!(keep_ngram("the wait"));
        assert!(!keep_ngram("the"));
        assert!(!keep_ngram("and the"));
        assert!(!keep_ngram("ok so"));
        assert!(!keep_ngram("ab"));
        // stop word longer than two chars still doesn't rescue an all-stop span
        assert!(!keep_ngram("this that"));
    }

    #[test]
    fn phrase_ngrams_filters() {
        assert_eq!(phrase_ngrams("The wait", 3), vec!["wait", "the wait"]);
    }

    #[test]
    fn phrase_tokens_counts_repeats() {
        assert_eq!(phrase_tokens("great, great service ok"), vec!["great", "great", "service"]);
    }
}
