//! Script-aware tokenizer shared by indexing, query parsing and highlighting.
//!
//! Whitespace-delimited scripts split on anything that is not alphanumeric.
//! Ideographic, kana and hangul runs carry no word boundaries, so every such
//! character is emitted as an overlapping bigram with its successor, then on
//! its own. The overlap favours recall: a query for any sub-phrase of a run
//! shares terms with the indexed text.
//!
//! Both the index (via the tantivy [`Tokenizer`] impl) and the query side go
//! through [`DocTokenizer::tokens`], so term boundaries are identical.

use serde::{Deserialize, Serialize};
use std::iter::Peekable;
use std::str::CharIndices;
use tantivy::tokenizer::{Token, TokenStream, Tokenizer};

/// How text is cut into terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segmentation {
    /// Alphanumeric words plus unigram/bigram segmentation of CJK runs.
    #[default]
    Script,
    /// Naive whitespace splitting. Lower recall, never fails.
    Whitespace,
}

/// A single normalized term with its place in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermToken {
    /// Lowercased term text
    pub text: String,
    /// Monotonically increasing token index within one text
    pub position: usize,
    /// Char offset of the first char (inclusive)
    pub char_start: usize,
    /// Char offset past the last char (exclusive)
    pub char_end: usize,
    pub byte_start: usize,
    pub byte_end: usize,
}

/// Lazy token sequence over a borrowed text.
///
/// Cloning yields an independent cursor at the same point, so a sequence can
/// be restarted by cloning it before consumption.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
    /// Char index of the next char `chars` will yield
    char_pos: usize,
    position: usize,
    mode: Segmentation,
    /// Unigram queued behind the bigram that was just returned
    pending: Option<TermToken>,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str, mode: Segmentation) -> Self {
        Self {
            text,
            chars: text.char_indices().peekable(),
            char_pos: 0,
            position: 0,
            mode,
            pending: None,
        }
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next()?;
        self.char_pos += 1;
        Some(next)
    }

    fn emit(&mut self, char_start: usize, char_end: usize, byte_start: usize, byte_end: usize) -> TermToken {
        let token = TermToken {
            text: self.text[byte_start..byte_end].to_lowercase(),
            position: self.position,
            char_start,
            char_end,
            byte_start,
            byte_end,
        };
        self.position += 1;
        token
    }

    fn next_script(&mut self) -> Option<TermToken> {
        loop {
            let (byte_start, ch) = self.bump()?;
            let char_start = self.char_pos - 1;

            if is_cjk_char(ch) {
                let byte_end = byte_start + ch.len_utf8();
                let bigram_end = match self.chars.peek() {
                    Some(&(next_byte, next)) if is_cjk_char(next) => Some(next_byte + next.len_utf8()),
                    _ => None,
                };
                return Some(match bigram_end {
                    Some(bigram_end) => {
                        let bigram = self.emit(char_start, char_start + 2, byte_start, bigram_end);
                        self.pending = Some(self.emit(char_start, char_start + 1, byte_start, byte_end));
                        bigram
                    }
                    None => self.emit(char_start, char_start + 1, byte_start, byte_end),
                });
            }

            if ch.is_alphanumeric() {
                let mut byte_end = byte_start + ch.len_utf8();
                while let Some(&(b, c)) = self.chars.peek() {
                    if !c.is_alphanumeric() || is_cjk_char(c) {
                        break;
                    }
                    byte_end = b + c.len_utf8();
                    self.bump();
                }
                let char_end = self.char_pos;
                return Some(self.emit(char_start, char_end, byte_start, byte_end));
            }
        }
    }

    fn next_whitespace(&mut self) -> Option<TermToken> {
        loop {
            let (byte_start, ch) = self.bump()?;
            if ch.is_whitespace() {
                continue;
            }
            let char_start = self.char_pos - 1;
            let mut byte_end = byte_start + ch.len_utf8();
            while let Some(&(b, c)) = self.chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                byte_end = b + c.len_utf8();
                self.bump();
            }
            let char_end = self.char_pos;
            return Some(self.emit(char_start, char_end, byte_start, byte_end));
        }
    }
}

impl Iterator for Tokens<'_> {
    type Item = TermToken;

    fn next(&mut self) -> Option<TermToken> {
        if let Some(token) = self.pending.take() {
            return Some(token);
        }
        match self.mode {
            Segmentation::Script => self.next_script(),
            Segmentation::Whitespace => self.next_whitespace(),
        }
    }
}

/// Characters from scripts written without spaces between words.
pub(crate) fn is_cjk_char(c: char) -> bool {
    let cp = c as u32;
    // CJK Unified Ideographs
    (0x4E00..=0x9FFF).contains(&cp)
    // CJK Extension A
    || (0x3400..=0x4DBF).contains(&cp)
    // CJK Extension B
    || (0x20000..=0x2A6DF).contains(&cp)
    // CJK Compatibility Ideographs
    || (0xF900..=0xFAFF).contains(&cp)
    // Hiragana, Katakana
    || (0x3040..=0x30FF).contains(&cp)
    // Halfwidth Katakana
    || (0xFF66..=0xFF9F).contains(&cp)
    // Hangul Syllables
    || (0xAC00..=0xD7AF).contains(&cp)
    // Hangul Jamo
    || (0x1100..=0x11FF).contains(&cp)
    // Hangul Compatibility Jamo
    || (0x3130..=0x318F).contains(&cp)
}

/// Tokenizer used for document content and queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocTokenizer {
    mode: Segmentation,
}

impl DocTokenizer {
    /// Name the tokenizer is registered under in the tantivy index.
    pub const NAME: &'static str = "docsearch";

    pub fn new(mode: Segmentation) -> Self {
        Self { mode }
    }

    /// Whitespace-only tokenizer used when script segmentation is turned off.
    pub fn fallback() -> Self {
        Self::new(Segmentation::Whitespace)
    }

    pub fn mode(&self) -> Segmentation {
        self.mode
    }

    pub fn tokens<'a>(&self, text: &'a str) -> Tokens<'a> {
        Tokens::new(text, self.mode)
    }

    /// Distinct terms of `text` in first-occurrence order.
    pub fn unique_terms(&self, text: &str) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.tokens(text)
            .filter(|t| seen.insert(t.text.clone()))
            .map(|t| t.text)
            .collect()
    }
}

impl Tokenizer for DocTokenizer {
    type TokenStream<'a> = DocTokenStream<'a>;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        DocTokenStream {
            inner: self.tokens(text),
            token: Token::default(),
        }
    }
}

/// Adapts [`Tokens`] to tantivy's token stream. Offsets are byte offsets.
pub struct DocTokenStream<'a> {
    inner: Tokens<'a>,
    token: Token,
}

impl TokenStream for DocTokenStream<'_> {
    fn advance(&mut self) -> bool {
        match self.inner.next() {
            Some(t) => {
                self.token = Token {
                    offset_from: t.byte_start,
                    offset_to: t.byte_end,
                    position: t.position,
                    text: t.text,
                    position_length: 1,
                };
                true
            }
            None => false,
        }
    }

    fn token(&self) -> &Token {
        &self.token
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.token
    }
}
