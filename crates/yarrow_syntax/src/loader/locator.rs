//! Source positions for YAML nodes.
//!
//! `serde_yaml` values carry no positions, so the loader recovers them from the text: each block-style line is
//! indexed by indentation, sequence dash and mapping key, and a node is found by following its key/index path
//! down the indentation levels.
//!
//! ## Notes
//! - Lookups are best effort. Nodes inside flow collections (`{...}`, `[...]`) resolve to the nearest enclosing
//!   block-style node.
//! - Head comments (`# ...` lines directly above a key) are recorded with the `# ` prefix stripped.

use std::ops::Range;
use std::sync::Arc;

use crate::ast::SourceLocation;

/// One step of a path from a document root to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone)]
struct LineInfo {
    /// 1-based line number in the file.
    number: usize,
    /// 0-based column of the first non-blank character.
    indent: usize,
    /// 0-based column of the last `- ` sequence marker on the line.
    dash: Option<usize>,
    /// 0-based column and text of a mapping key.
    key: Option<(usize, String)>,
    /// 0-based column of inline content: after `key: ` or after the last `- `.
    value: Option<usize>,
    comment: String,
}

#[derive(Debug)]
pub struct Locator {
    file: Arc<str>,
    lines: Vec<LineInfo>,
    documents: Vec<Range<usize>>,
}

/// Resolved position of one node.
#[derive(Debug, Clone)]
struct Found {
    line: usize,
    key_column: usize,
    value_column: usize,
    comment: String,
}

impl Locator {
    pub fn new(file: Arc<str>, source: &str) -> Self {
        let mut lines = Vec::new();
        let mut documents = Vec::new();
        let mut document_start = 0;
        let mut pending_comment: Vec<String> = Vec::new();

        for (index, raw) in source.lines().enumerate() {
            let trimmed = raw.trim_start();
            if raw.starts_with("---") {
                if lines.len() > document_start {
                    documents.push(document_start..lines.len());
                }
                document_start = lines.len();
                pending_comment.clear();
                continue;
            }
            if trimmed.is_empty() {
                pending_comment.clear();
                continue;
            }
            if let Some(comment) = trimmed.strip_prefix('#') {
                pending_comment.push(comment.strip_prefix(' ').unwrap_or(comment).to_string());
                continue;
            }

            let mut info = scan_line(raw);
            info.number = index + 1;
            info.comment = pending_comment.join("\n");
            pending_comment.clear();
            lines.push(info);
        }
        if lines.len() > document_start || documents.is_empty() {
            documents.push(document_start..lines.len());
        }

        Self { file, lines, documents }
    }

    pub fn file(&self) -> &Arc<str> {
        &self.file
    }

    /// Location of the document itself (its first line).
    pub fn document(&self, document: usize) -> SourceLocation {
        let line = self
            .document_range(document)
            .and_then(|range| self.lines.get(range.start))
            .map_or(1, |l| l.number);
        SourceLocation::new(self.file.clone(), line, 1)
    }

    /// Location of the key (or sequence item) at `path`.
    pub fn key(&self, document: usize, path: &[Segment]) -> SourceLocation {
        match self.find(document, path) {
            Some(found) => SourceLocation::new(self.file.clone(), found.line, found.key_column + 1),
            None => self.document(document),
        }
    }

    /// Location of the inline value at `path`, falling back to its key.
    pub fn value(&self, document: usize, path: &[Segment]) -> SourceLocation {
        match self.find(document, path) {
            Some(found) => SourceLocation::new(self.file.clone(), found.line, found.value_column + 1),
            None => self.document(document),
        }
    }

    /// Head comment of the key at `path`, or an empty string.
    pub fn comment(&self, document: usize, path: &[Segment]) -> String {
        match self.find_exact(document, path) {
            Some(found) => found.comment,
            None => String::new(),
        }
    }

    /// Locations of every entry named `key` directly inside the mapping at `path`, in source order.
    pub fn key_occurrences(&self, document: usize, path: &[Segment], key: &str) -> Vec<SourceLocation> {
        let Some(range) = self.children(document, path) else {
            return Vec::new();
        };
        let Some(level) = self.key_level(range.clone()) else {
            return Vec::new();
        };
        range
            .filter(|i| matches!(&self.lines[*i].key, Some((column, text)) if *column == level && text == key))
            .map(|i| SourceLocation::new(self.file.clone(), self.lines[i].number, level + 1))
            .collect()
    }

    /// Lines below the node at `path`, when every segment of the path is found.
    fn children(&self, document: usize, path: &[Segment]) -> Option<Range<usize>> {
        let mut range = self.document_range(document)?;
        for segment in path {
            let (_, next) = match segment {
                Segment::Key(key) => self.find_key(range, key),
                Segment::Index(index) => self.find_item(range, *index),
            }?;
            range = next;
        }
        Some(range)
    }

    /// Column of the keys at the top of `range`.
    fn key_level(&self, range: Range<usize>) -> Option<usize> {
        self.lines[range].iter().filter_map(|l| l.key.as_ref().map(|(column, _)| *column)).min()
    }

    fn document_range(&self, document: usize) -> Option<Range<usize>> {
        self.documents.get(document).cloned()
    }

    fn find_exact(&self, document: usize, path: &[Segment]) -> Option<Found> {
        let (found, depth) = self.walk(document, path)?;
        (depth == path.len()).then_some(found)
    }

    fn find(&self, document: usize, path: &[Segment]) -> Option<Found> {
        self.walk(document, path).map(|(found, _)| found)
    }

    /// Follow `path` as far as the block structure allows, returning the deepest node reached and how many
    /// segments were matched.
    fn walk(&self, document: usize, path: &[Segment]) -> Option<(Found, usize)> {
        let mut range = self.document_range(document)?;
        let mut current: Option<Found> = None;
        let mut depth = 0;

        for segment in path {
            let step = match segment {
                Segment::Key(key) => self.find_key(range.clone(), key),
                Segment::Index(index) => self.find_item(range.clone(), *index),
            };
            let Some((found, next_range)) = step else {
                break;
            };
            current = Some(found);
            range = next_range;
            depth += 1;
        }

        current.map(|found| (found, depth))
    }

    fn find_key(&self, range: Range<usize>, key: &str) -> Option<(Found, Range<usize>)> {
        let level = self.key_level(range.clone())?;
        let index = range.clone().find(|i| {
            matches!(&self.lines[*i].key, Some((column, text)) if *column == level && text == key)
        })?;

        let line = &self.lines[index];
        let end = (index + 1..range.end)
            .find(|j| {
                let other = &self.lines[*j];
                other.indent < level || (other.indent == level && other.dash != Some(level))
            })
            .unwrap_or(range.end);

        Some((
            Found {
                line: line.number,
                key_column: level,
                value_column: line.value.unwrap_or(level),
                comment: line.comment.clone(),
            },
            index + 1..end,
        ))
    }

    fn find_item(&self, range: Range<usize>, item: usize) -> Option<(Found, Range<usize>)> {
        let level = self.lines[range.clone()].iter().filter_map(|l| l.dash).min()?;
        let index = range.clone().filter(|i| self.lines[*i].dash == Some(level)).nth(item)?;

        let line = &self.lines[index];
        let end = (index + 1..range.end)
            .find(|j| self.lines[*j].indent <= level)
            .unwrap_or(range.end);
        let content = line.value.unwrap_or(level + 2);

        Some((
            Found {
                line: line.number,
                key_column: content,
                value_column: content,
                comment: line.comment.clone(),
            },
            index..end,
        ))
    }
}

fn scan_line(raw: &str) -> LineInfo {
    let chars: Vec<char> = raw.chars().collect();
    let indent = chars.iter().take_while(|c| **c == ' ').count();
    let mut position = indent;
    let mut dash = None;

    while position < chars.len() && chars[position] == '-' && chars.get(position + 1).is_none_or(|c| *c == ' ') {
        dash = Some(position);
        position += 1;
        while position < chars.len() && chars[position] == ' ' {
            position += 1;
        }
    }

    let mut info = LineInfo {
        number: 0,
        indent,
        dash,
        key: None,
        value: (position < chars.len()).then_some(position),
        comment: String::new(),
    };

    if let Some((key_start, key, after)) = scan_key(&chars, position) {
        info.key = Some((key_start, key));
        let mut value = after;
        while value < chars.len() && chars[value] == ' ' {
            value += 1;
        }
        info.value = (value < chars.len() && chars[value] != '#').then_some(value);
    }

    info
}

/// Recognize `key:` at `start`, returning the key column, the key text (tags stripped) and the position after
/// the colon.
fn scan_key(chars: &[char], start: usize) -> Option<(usize, String, usize)> {
    let first = *chars.get(start)?;
    if matches!(first, '{' | '[' | '#' | '|' | '>') {
        return None;
    }

    let mut position = start;
    let mut key = String::new();

    if first == '"' || first == '\'' {
        position += 1;
        while position < chars.len() && chars[position] != first {
            if chars[position] == '\\' && first == '"' {
                position += 1;
            }
            if let Some(c) = chars.get(position) {
                key.push(*c);
            }
            position += 1;
        }
        position += 1;
        if chars.get(position) != Some(&':') {
            return None;
        }
        return Some((start, key, position + 1));
    }

    while position < chars.len() {
        let c = chars[position];
        if c == ':' && chars.get(position + 1).is_none_or(|n| *n == ' ') {
            let text = strip_tag(key.trim_end());
            return Some((start, text, position + 1));
        }
        if c == '#' && position > start && chars[position - 1] == ' ' {
            return None;
        }
        if matches!(c, '{' | '[' | '"' | '\'') && !key.trim().is_empty() && key.trim_start().starts_with('!') {
            // tagged flow value on a sequence item, e.g. `- !vector {items: int}`
            return None;
        }
        key.push(c);
        position += 1;
    }
    None
}

fn strip_tag(key: &str) -> String {
    match key.strip_prefix('!') {
        Some(rest) => match rest.split_once(' ') {
            Some((_, after)) => after.trim().to_string(),
            None => String::new(),
        },
        None => key.to_string(),
    }
}
