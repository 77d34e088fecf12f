//! Diagnostic rendering for the terminal.

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use miette::{NamedSource, SourceSpan};

use crate::frontend::diagnostics::Diagnostic;

/// Install miette as the global report handler.
pub fn setup_error_reporting() -> Result<(), miette::InstallError> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
}

/// How diagnostics are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// miette reports with source excerpts.
    #[default]
    Fancy,
    /// One `file:line:column: message` line per diagnostic.
    Plain,
}

/// A diagnostic attached to the text of the file it points into.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("{message}")]
struct SourceReport {
    message: String,
    #[source_code]
    src: NamedSource<String>,
    #[label("here")]
    span: SourceSpan,
    #[help]
    help: Option<String>,
}

/// Render diagnostics in order, followed by an error count.
pub fn render_diagnostics(diagnostics: &[Diagnostic], mode: RenderMode) -> String {
    let mut sources: HashMap<Arc<str>, Option<String>> = HashMap::new();
    let mut out = String::new();

    for diagnostic in diagnostics {
        let fancy = match (mode, &diagnostic.location) {
            (RenderMode::Fancy, Some(location)) => sources
                .entry(location.file.clone())
                .or_insert_with(|| fs::read_to_string(&*location.file).ok())
                .as_ref()
                .map(|source| {
                    let report = SourceReport {
                        message: diagnostic.render(),
                        src: NamedSource::new(&*location.file, source.clone()),
                        span: SourceSpan::new(byte_offset(source, location.line, location.column).into(), 1),
                        help: (!diagnostic.notes.is_empty()).then(|| diagnostic.notes.join("\n")),
                    };
                    format!("{:?}", miette::Report::new(report))
                }),
            _ => None,
        };
        match fancy {
            Some(text) => out.push_str(&text),
            None => out.push_str(&diagnostic.render()),
        }
        out.push('\n');
    }

    let count = diagnostics.len();
    out.push_str(&format!("{count} error{}", if count == 1 { "" } else { "s" }));
    out
}

/// Byte offset of a 1-based line and character column, clamped to the source.
fn byte_offset(source: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (index, text) in source.split_inclusive('\n').enumerate() {
        if index + 1 == line {
            let within = text
                .char_indices()
                .nth(column.saturating_sub(1))
                .map_or(text.trim_end_matches('\n').len(), |(i, _)| i);
            return offset + within;
        }
        offset += text.len();
    }
    source.len().saturating_sub(1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::frontend::ast::SourceLocation;

    #[test]
    fn test_byte_offset() {
        let source = "a: 1\nbé: 2\n";
        assert_eq!(byte_offset(source, 1, 1), 0);
        assert_eq!(byte_offset(source, 2, 1), 5);
        assert_eq!(byte_offset(source, 2, 3), 8);
        assert_eq!(byte_offset(source, 9, 1), source.len() - 1);
    }

    #[test]
    fn test_plain_rendering() {
        let diagnostics = vec![
            Diagnostic::structural("the type 'Foo' is not recognized", &SourceLocation::new("m.yml", 3, 7)),
            Diagnostic::internal("broken", None),
        ];
        assert_eq!(
            render_diagnostics(&diagnostics, RenderMode::Plain),
            "m.yml:3:7: the type 'Foo' is not recognized\nbroken\n2 errors"
        );
    }

    #[test]
    fn test_fancy_rendering_falls_back_without_source() {
        let diagnostics = vec![Diagnostic::structural("oops", &SourceLocation::new("/no/such/file.yml", 1, 1))];
        let text = render_diagnostics(&diagnostics, RenderMode::Fancy);
        assert_eq!(text, "/no/such/file.yml:1:1: oops\n1 error");
    }
}
