//! Splitting raw input into YAML documents and reading the per-document
//! details that must come from the text itself (start line, Helm source).

use crate::analyzer::kubescore::types::FileLocation;
use std::borrow::Cow;

const HELM_SOURCE_PREFIX: &str = "# Source: ";

/// One YAML document and the line it starts on in its input. The text is
/// still raw bytes; it is checked for UTF-8 one document at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawDocument<'a> {
    pub text: &'a [u8],
    pub line: u32,
}

/// Convert CRLF line endings to LF.
pub fn normalize_newlines(content: &[u8]) -> Cow<'_, [u8]> {
    if !content.windows(2).any(|w| w == b"\r\n") {
        return Cow::Borrowed(content);
    }

    let mut normalized = Vec::with_capacity(content.len());
    let mut bytes = content.iter().peekable();
    while let Some(&b) = bytes.next() {
        if b == b'\r' && bytes.peek() == Some(&&b'\n') {
            continue;
        }
        normalized.push(b);
    }
    Cow::Owned(normalized)
}

/// Split normalized content on `---` separator lines.
///
/// Line numbers are 1-indexed. A leading separator moves the first document
/// to line 2. Documents holding only comments or whitespace are skipped, but
/// still count towards the offsets of later documents.
pub fn split_documents(content: &[u8]) -> Vec<RawDocument<'_>> {
    let mut documents = Vec::new();
    let mut start = 0usize;
    let mut start_line = 1u32;
    let mut pos = 0usize;
    let mut line = 1u32;

    for text in content.split(|&b| b == b'\n') {
        let next = pos + text.len() + 1;
        if text == b"---" {
            // The newline before the separator belongs to neither document.
            let end = if pos > start { pos - 1 } else { start };
            push_document(&mut documents, &content[start..end], start_line);
            start = next.min(content.len());
            start_line = line + 1;
        }
        pos = next;
        line += 1;
    }
    push_document(&mut documents, &content[start..], start_line);
    documents
}

fn push_document<'a>(documents: &mut Vec<RawDocument<'a>>, text: &'a [u8], line: u32) {
    if !is_blank_document(text) {
        documents.push(RawDocument { text, line });
    }
}

fn is_blank_document(text: &[u8]) -> bool {
    text.split(|&b| b == b'\n').all(|line| {
        let line = line.trim_ascii();
        line.is_empty() || line.starts_with(b"#")
    })
}

/// Where a document came from. A Helm `# Source: <path>` comment on the
/// first non-blank line names the template; the line stays the document's
/// offset in the physical input.
pub fn detect_file_location(input_name: &str, line: u32, text: &str) -> FileLocation {
    let first_line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    match first_line.strip_prefix(HELM_SOURCE_PREFIX) {
        Some(source) if !source.trim().is_empty() => FileLocation::new(source.trim(), line),
        _ => FileLocation::new(input_name, line),
    }
}

/// Parse a YAML 1.1 boolean the way Kubernetes annotation values are
/// commonly written.
pub fn parse_yaml_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "y" => Some(true),
        "false" | "no" | "off" | "n" => Some(false),
        _ => None,
    }
}
