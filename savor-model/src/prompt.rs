//! Prompt templates and retrieval context assembly.
//!
//! Templates use `{identifier}` placeholders where the identifier is made of
//! ASCII letters, digits and underscores. Any other brace is literal text,
//! so JSON examples can be embedded in a template without escaping.

use std::collections::HashMap;

use crate::error::{ModelError, Result};

/// Separator placed between retrieved chunks in an assembled context.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Slot(&'a str),
}

fn is_slot_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find('{') {
        let open = cursor + offset;
        let rest = &text[open + 1..];
        let ident_len = rest.find(|c: char| !is_slot_char(c)).unwrap_or(rest.len());
        if ident_len > 0 && rest[ident_len..].starts_with('}') {
            if literal_start < open {
                out.push(Segment::Literal(&text[literal_start..open]));
            }
            out.push(Segment::Slot(&rest[..ident_len]));
            cursor = open + 1 + ident_len + 1;
            literal_start = cursor;
        } else {
            cursor = open + 1;
        }
    }
    if literal_start < text.len() {
        out.push(Segment::Literal(&text[literal_start..]));
    }
    out
}

/// A prompt with named `{slot}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Slot names in order of first appearance.
    pub fn slots(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in segments(&self.text) {
            if let Segment::Slot(name) = segment {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Substitute every slot with its bound value.
    ///
    /// Values are inserted verbatim and never re-expanded. Extra values are
    /// ignored.
    ///
    /// # Errors
    ///
    /// [`ModelError::Template`] naming the first slot without a value.
    pub fn render<V: AsRef<str>>(&self, values: &HashMap<&str, V>) -> Result<String> {
        let mut out = String::with_capacity(self.text.len());
        for segment in segments(&self.text) {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(name) => {
                    let value = values.get(name).ok_or_else(|| {
                        ModelError::Template(format!("no value bound for slot '{name}'"))
                    })?;
                    out.push_str(value.as_ref());
                }
            }
        }
        Ok(out)
    }
}

impl From<&str> for PromptTemplate {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Render `template` against `values` in one step.
pub fn render<V: AsRef<str>>(template: &str, values: &HashMap<&str, V>) -> Result<String> {
    PromptTemplate::new(template).render(values)
}

/// Join retrieved chunk texts in rank order, separated by a blank line.
pub fn assemble_context<S: AsRef<str>>(texts: &[S]) -> String {
    texts.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(CONTEXT_SEPARATOR)
}

/// Like [`assemble_context`], but stops before the chunk that would push
/// the running token count past `max_tokens`.
///
/// Chunks are kept whole; `count_tokens` measures each one.
pub fn assemble_within_budget<S, F>(texts: &[S], max_tokens: usize, count_tokens: F) -> String
where
    S: AsRef<str>,
    F: Fn(&str) -> usize,
{
    let mut used = 0;
    let mut kept: Vec<&str> = Vec::new();
    for text in texts.iter().map(AsRef::as_ref) {
        let cost = count_tokens(text);
        if used + cost > max_tokens {
            break;
        }
        used += cost;
        kept.push(text);
    }
    assemble_context(&kept)
}
