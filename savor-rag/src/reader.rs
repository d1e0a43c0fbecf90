//! Markdown document loading.
//!
//! [`DocumentLoader`] resolves a caller-supplied path against a document
//! root and hands the file to [`MarkdownReader`], which splits it into
//! section [`Document`]s at headings and horizontal rules.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};
use tracing::debug;

use crate::document::Document;
use crate::error::{RagError, Result};

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Options controlling how markdown structure maps onto sections.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownReaderConfig {
    /// A horizontal rule ends the current section.
    pub horizontal_rule_creates_document: bool,
    /// Keep code blocks inline; otherwise each becomes its own section.
    pub include_code_block: bool,
    /// Keep block quotes inline; otherwise each becomes its own section.
    pub include_blockquote: bool,
    /// Metadata copied onto every section.
    pub additional_metadata: HashMap<String, String>,
}

impl Default for MarkdownReaderConfig {
    fn default() -> Self {
        Self {
            horizontal_rule_creates_document: true,
            include_code_block: false,
            include_blockquote: false,
            additional_metadata: HashMap::new(),
        }
    }
}

/// Splits markdown text into section documents.
///
/// Headings close the current section and become the `title` (and
/// `category = header_N`) of the text that follows. A horizontal rule closes
/// the section and clears the title. Excluded code blocks and block quotes
/// are emitted as separate sections tagged `category = code_block` (with
/// `lang`) or `category = blockquote`.
#[derive(Debug, Clone, Default)]
pub struct MarkdownReader {
    config: MarkdownReaderConfig,
}

#[derive(Default)]
struct SectionState {
    body: String,
    title: Option<(String, usize)>,
    heading: Option<(usize, String)>,
    code: Option<(String, String)>,
    quote_depth: usize,
    quote: String,
}

impl SectionState {
    fn buffer(&mut self, config: &MarkdownReaderConfig) -> &mut String {
        if let Some((_, text)) = self.heading.as_mut() {
            text
        } else if let Some((_, text)) = self.code.as_mut() {
            text
        } else if self.quote_depth > 0 && !config.include_blockquote {
            &mut self.quote
        } else {
            &mut self.body
        }
    }
}

impl MarkdownReader {
    pub fn new(config: MarkdownReaderConfig) -> Self {
        Self { config }
    }

    /// Parse `source` into sections whose ids are `document_id`.
    pub fn read(&self, document_id: &str, source: &str) -> Vec<Document> {
        let mut sections = Vec::new();
        let mut state = SectionState::default();

        for event in Parser::new(source) {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    self.flush(document_id, &mut state, &mut sections);
                    state.heading = Some((level as usize, String::new()));
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((level, text)) = state.heading.take() {
                        let title = text.trim().to_string();
                        state.title = (!title.is_empty()).then_some((title, level));
                    }
                }
                Event::Start(Tag::CodeBlock(kind)) if !self.config.include_code_block => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => {
                            info.split_whitespace().next().unwrap_or_default().to_string()
                        }
                        CodeBlockKind::Indented => String::new(),
                    };
                    state.code = Some((lang, String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, text)) = state.code.take() {
                        let mut metadata = self.base_metadata();
                        metadata.insert("category".to_string(), "code_block".to_string());
                        if !lang.is_empty() {
                            metadata.insert("lang".to_string(), lang);
                        }
                        push_section(document_id, &text, metadata, &mut sections);
                    } else {
                        state.buffer(&self.config).push('\n');
                    }
                }
                Event::Start(Tag::BlockQuote(_)) => {
                    state.quote_depth += 1;
                }
                Event::End(TagEnd::BlockQuote(_)) => {
                    state.quote_depth = state.quote_depth.saturating_sub(1);
                    if state.quote_depth == 0 && !self.config.include_blockquote {
                        let text = std::mem::take(&mut state.quote);
                        let mut metadata = self.base_metadata();
                        metadata.insert("category".to_string(), "blockquote".to_string());
                        push_section(document_id, &text, metadata, &mut sections);
                    }
                }
                Event::Rule if self.config.horizontal_rule_creates_document => {
                    self.flush(document_id, &mut state, &mut sections);
                    state.title = None;
                }
                Event::Text(text) | Event::Code(text) => {
                    state.buffer(&self.config).push_str(&text);
                }
                Event::SoftBreak => state.buffer(&self.config).push(' '),
                Event::HardBreak | Event::End(TagEnd::Paragraph) | Event::End(TagEnd::Item) => {
                    state.buffer(&self.config).push('\n');
                }
                _ => {}
            }
        }

        self.flush(document_id, &mut state, &mut sections);
        sections
    }

    fn base_metadata(&self) -> HashMap<String, String> {
        self.config.additional_metadata.clone()
    }

    fn flush(&self, document_id: &str, state: &mut SectionState, sections: &mut Vec<Document>) {
        let body = std::mem::take(&mut state.body);
        let mut metadata = self.base_metadata();
        if let Some((title, level)) = &state.title {
            metadata.insert("title".to_string(), title.clone());
            metadata.insert("category".to_string(), format!("header_{level}"));
        }
        push_section(document_id, &body, metadata, sections);
    }
}

fn push_section(
    document_id: &str,
    text: &str,
    metadata: HashMap<String, String>,
    sections: &mut Vec<Document>,
) {
    let text = text.trim();
    if !text.is_empty() {
        sections.push(Document { id: document_id.to_string(), text: text.to_string(), metadata });
    }
}

/// Resolves document paths and reads markdown files into sections.
///
/// Paths may carry a `file:` prefix (used as-is after stripping) or a
/// `classpath:` prefix (relative to the document root). Other relative
/// paths are also resolved against the root.
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    root: PathBuf,
    reader_config: MarkdownReaderConfig,
}

impl DocumentLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), reader_config: MarkdownReaderConfig::default() }
    }

    pub fn with_reader_config(mut self, config: MarkdownReaderConfig) -> Self {
        self.reader_config = config;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a caller-supplied path onto the filesystem.
    pub fn resolve(&self, raw: &str) -> PathBuf {
        let raw = raw.trim();
        if let Some(path) = raw.strip_prefix("file:") {
            return PathBuf::from(path);
        }
        let relative = raw.strip_prefix("classpath:").unwrap_or(raw).trim_start_matches('/');
        let candidate = Path::new(raw);
        if candidate.is_absolute() && !raw.starts_with("classpath:") {
            candidate.to_path_buf()
        } else {
            self.root.join(relative)
        }
    }

    /// Read and parse the document at `raw`.
    ///
    /// `extra_metadata` is added to every section along with `filename`.
    ///
    /// # Errors
    ///
    /// - [`RagError::NotFound`] if the path does not name a readable file
    ///   (missing, a directory, or permission denied).
    /// - [`RagError::Format`] if the file is not markdown or not UTF-8.
    pub async fn load(
        &self,
        raw: &str,
        extra_metadata: &HashMap<String, String>,
    ) -> Result<Vec<Document>> {
        let path = self.resolve(raw);

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !MARKDOWN_EXTENSIONS.contains(&extension.as_str()) {
            return Err(RagError::Format {
                path,
                message: "expected a markdown file (.md or .markdown)".to_string(),
            });
        }

        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            debug!(path = %path.display(), error = %e, "document is not readable");
            RagError::NotFound { path: path.clone() }
        })?;
        let source = String::from_utf8(bytes).map_err(|e| RagError::Format {
            path: path.clone(),
            message: format!("content is not valid UTF-8: {e}"),
        })?;

        let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
        let mut config = self.reader_config.clone();
        config.additional_metadata.extend(extra_metadata.clone());
        config.additional_metadata.insert("filename".to_string(), filename);

        let document_id = path.display().to_string();
        let sections = MarkdownReader::new(config).read(&document_id, &source);
        debug!(path = %document_id, section_count = sections.len(), "read markdown document");
        Ok(sections)
    }
}
