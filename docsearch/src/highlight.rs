//! Highlight snippets for search results.
//!
//! The snippet is a window of context around the first query term found in
//! the content (terms tried in query order), with every occurrence of that
//! term inside the window wrapped in markers. Matching is case-insensitive
//! and works on chars, never on bytes.

use crate::tokenizer::DocTokenizer;

/// Context chars on each side of the match
pub const DEFAULT_CONTEXT_CHARS: usize = 100;

/// Length of the plain preview used when nothing can be highlighted
pub const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightOptions {
    pub context_chars: usize,
    pub pre_tag: String,
    pub post_tag: String,
    pub ellipsis: String,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            context_chars: DEFAULT_CONTEXT_CHARS,
            pre_tag: "<mark>".to_string(),
            post_tag: "</mark>".to_string(),
            ellipsis: "...".to_string(),
        }
    }
}

impl HighlightOptions {
    pub fn with_context_chars(mut self, context_chars: usize) -> Self {
        self.context_chars = context_chars;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Highlighter {
    tokenizer: DocTokenizer,
    options: HighlightOptions,
}

impl Highlighter {
    pub fn new(tokenizer: DocTokenizer, options: HighlightOptions) -> Self {
        Self { tokenizer, options }
    }

    pub fn options(&self) -> &HighlightOptions {
        &self.options
    }

    pub fn highlight(&self, content: &str, query: &str) -> String {
        if content.is_empty() {
            return String::new();
        }
        if query.trim().is_empty() {
            return content.chars().take(PREVIEW_CHARS).collect();
        }

        let chars: Vec<char> = content.chars().collect();
        let folded = Folded::new(&chars);
        for term in self.tokenizer.unique_terms(query) {
            let needle: Vec<char> = term.chars().flat_map(fold).collect();
            let spans = folded.find_all(&needle);
            if let Some(&first) = spans.first() {
                return self.window(&chars, first, &spans);
            }
        }

        self.preview(content)
    }

    /// First `PREVIEW_CHARS` chars, with a trailing ellipsis when cut.
    pub fn preview(&self, content: &str) -> String {
        let mut chars = content.chars();
        let mut preview: String = chars.by_ref().take(PREVIEW_CHARS).collect();
        if chars.next().is_some() {
            preview.push_str(&self.options.ellipsis);
        }
        preview
    }

    /// `first` and `spans` are `[start, end)` ranges of original chars.
    fn window(&self, chars: &[char], first: (usize, usize), spans: &[(usize, usize)]) -> String {
        let opts = &self.options;
        let start = first.0.saturating_sub(opts.context_chars);
        let end = (first.1 + opts.context_chars).min(chars.len());

        let mut out = String::with_capacity((end - start) + opts.pre_tag.len() + opts.post_tag.len());
        if start > 0 {
            out.push_str(&opts.ellipsis);
        }

        let mut marks = spans.iter().filter(|(s, e)| *s >= start && *e <= end).peekable();
        let mut i = start;
        while i < end {
            match marks.peek() {
                Some(&&(s, e)) if s == i => {
                    out.push_str(&opts.pre_tag);
                    out.extend(&chars[s..e]);
                    out.push_str(&opts.post_tag);
                    i = e;
                    marks.next();
                }
                _ => {
                    out.push(chars[i]);
                    i += 1;
                }
            }
        }

        if end < chars.len() {
            out.push_str(&opts.ellipsis);
        }
        out
    }
}

/// Case fold used for both content and query terms. Some chars lowercase
/// to more than one char; final sigma folds to the medial form.
fn fold(c: char) -> impl Iterator<Item = char> {
    c.to_lowercase().map(|l| if l == 'ς' { 'σ' } else { l })
}

/// Content after folding, with the original char index of every folded char.
struct Folded {
    chars: Vec<char>,
    origin: Vec<usize>,
}

impl Folded {
    fn new(content: &[char]) -> Self {
        let mut chars = Vec::with_capacity(content.len());
        let mut origin = Vec::with_capacity(content.len());
        for (i, c) in content.iter().enumerate() {
            for f in fold(*c) {
                chars.push(f);
                origin.push(i);
            }
        }
        Self { chars, origin }
    }

    /// Non-overlapping occurrences of `needle`, left to right, as original
    /// char ranges. Matches that split a folded char are skipped.
    fn find_all(&self, needle: &[char]) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        if needle.is_empty() {
            return spans;
        }
        let n = needle.len();
        let mut k = 0;
        while k + n <= self.chars.len() {
            if self.chars[k..k + n] == *needle && self.on_boundaries(k, k + n) {
                spans.push((self.origin[k], self.origin[k + n - 1] + 1));
                k += n;
            } else {
                k += 1;
            }
        }
        spans
    }

    fn on_boundaries(&self, from: usize, to: usize) -> bool {
        let starts = from == 0 || self.origin[from - 1] != self.origin[from];
        let ends = to == self.origin.len() || self.origin[to] != self.origin[to - 1];
        starts && ends
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highlighter() -> Highlighter {
        Highlighter::new(DocTokenizer::default(), HighlightOptions::default())
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(highlighter().highlight("", "hello"), "");
        assert_eq!(highlighter().highlight("", ""), "");
    }

    #[test]
    fn test_empty_query_returns_plain_prefix() {
        let content = "x".repeat(500);
        let out = highlighter().highlight(&content, "   ");
        assert_eq!(out, "x".repeat(200));
    }

    #[test]
    fn test_match_at_start() {
        assert_eq!(highlighter().highlight("hello world", "hello"), "<mark>hello</mark> world");
    }

    #[test]
    fn test_case_insensitive_keeps_original_casing() {
        assert_eq!(
            highlighter().highlight("Say Hello there", "HELLO"),
            "Say <mark>Hello</mark> there"
        );
    }

    #[test]
    fn test_window_adds_ellipsis_both_sides() {
        let content = format!("{} needle {}", "a".repeat(150), "b".repeat(150));
        let out = highlighter().highlight(&content, "needle");

        assert!(out.starts_with("..."));
        assert!(out.ends_with("..."));
        assert!(out.contains("<mark>needle</mark>"));

        let before = out.trim_start_matches("...").split("<mark>").next().unwrap();
        assert_eq!(before.chars().count(), 100);
    }

    #[test]
    fn test_no_match_falls_back_to_preview() {
        let short = "nothing to see";
        assert_eq!(highlighter().highlight(short, "absent"), short);

        let long = "z".repeat(250);
        let out = highlighter().highlight(&long, "absent");
        assert_eq!(out, format!("{}...", "z".repeat(200)));
    }

    #[test]
    fn test_terms_tried_in_query_order() {
        assert_eq!(
            highlighter().highlight("hello world", "world hello"),
            "hello <mark>world</mark>"
        );
    }

    #[test]
    fn test_all_occurrences_in_window_marked() {
        assert_eq!(
            highlighter().highlight("Rust and rust and RUST", "rust"),
            "<mark>Rust</mark> and <mark>rust</mark> and <mark>RUST</mark>"
        );
    }

    #[test]
    fn test_multibyte_window_counts_chars() {
        let content = format!("{}搜索{}", "字".repeat(120), "尾".repeat(5));
        let out = highlighter().highlight(&content, "搜索");
        assert!(out.starts_with("..."));
        assert!(out.contains("<mark>搜索</mark>"));
        assert!(!out.ends_with("..."));
    }

    #[test]
    fn test_custom_context_chars() {
        let hl = Highlighter::new(
            DocTokenizer::default(),
            HighlightOptions::default().with_context_chars(3),
        );
        assert_eq!(hl.highlight("the quick brown fox", "brown"), "...ck <mark>brown</mark> fo...");
    }

    #[test]
    fn test_multi_char_lowercase_still_marks() {
        // 'İ' lowercases to 'i' plus a combining dot
        assert_eq!(
            highlighter().highlight("Visit İstanbul soon", "İstanbul"),
            "Visit <mark>İstanbul</mark> soon"
        );
        assert_eq!(
            highlighter().highlight("ΟΔΟΣ", "οδος"),
            "<mark>ΟΔΟΣ</mark>"
        );
    }

    #[test]
    fn test_match_never_splits_a_folded_char() {
        // "i" alone must not match the first half of 'İ'
        assert_eq!(highlighter().highlight("İ i", "i"), "İ <mark>i</mark>");
    }
}
