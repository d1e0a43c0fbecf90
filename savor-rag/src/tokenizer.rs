//! Tokenizers used to bound chunk sizes.
//!
//! Token counts only need to be consistent between splitting and budget
//! checks; they are not meant to match any particular model's tokenizer.

/// Splits text into tokens.
///
/// The returned slices must cover the input exactly: concatenating them in
/// order yields the original text.
pub trait Tokenizer: Send + Sync {
    fn encode<'a>(&self, text: &'a str) -> Vec<&'a str>;

    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }
}

/// A word tokenizer aware of scripts written without spaces.
///
/// A token is a run of non-whitespace characters together with the
/// whitespace that follows it. CJK ideographs, kana, hangul and full-width
/// punctuation are one token per character.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer;

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3000}'..='\u{303F}'
        | '\u{3040}'..='\u{30FF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{AC00}'..='\u{D7AF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{FF00}'..='\u{FFEF}')
}

impl Tokenizer for WordTokenizer {
    fn encode<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut tokens = Vec::new();
        let mut start = 0;
        let mut prev: Option<char> = None;

        for (i, c) in text.char_indices() {
            if let Some(p) = prev {
                let boundary = if c.is_whitespace() {
                    false
                } else {
                    p.is_whitespace() || is_cjk(c) || (is_cjk(p) && !p.is_whitespace())
                };
                if boundary && i > start {
                    tokens.push(&text[start..i]);
                    start = i;
                }
            }
            prev = Some(c);
        }

        if start < text.len() {
            tokens.push(&text[start..]);
        }
        tokens
    }
}
