//! Diagnostics shared by the loader, the parser and the validation passes.
//!
//! Every problem found in a model is a [`Diagnostic`]: a message plus an optional [`SourceLocation`]. Passes push
//! diagnostics into a [`DiagnosticSink`] instead of failing fast, so one run reports as many independent problems as
//! it safely can.
//!
//! ## Notes
//! - Output order is deterministic: [`DiagnosticSink::into_sorted`] orders by file, line, column, then message.
//! - [`Diagnostic`] implements [`miette::Diagnostic`], so the CLI can render it as a fancy report.

use std::fmt;

use crate::ast::SourceLocation;

/// Category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Malformed YAML, type strings or expressions.
    Syntax,
    /// Unresolved names, malformed unions/arrays/maps/enums, illegal cycles.
    Structural,
    /// Computed-field expression errors.
    Expression,
    /// A broken invariant; reaching one means an earlier pass has a bug.
    Internal,
}

impl DiagnosticKind {
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::Syntax => "yarrow::syntax",
            DiagnosticKind::Structural => "yarrow::structure",
            DiagnosticKind::Expression => "yarrow::expression",
            DiagnosticKind::Internal => "yarrow::internal",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::Syntax => write!(f, "syntax error"),
            DiagnosticKind::Structural => write!(f, "error"),
            DiagnosticKind::Expression => write!(f, "expression error"),
            DiagnosticKind::Internal => write!(f, "internal error"),
        }
    }
}

/// A positioned model error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct Diagnostic {
    pub message: String,
    pub location: Option<SourceLocation>,
    pub kind: DiagnosticKind,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, location: Option<SourceLocation>) -> Self {
        Self {
            message: message.into(),
            location,
            kind,
            notes: Vec::new(),
        }
    }

    pub fn syntax(message: impl Into<String>, location: &SourceLocation) -> Self {
        Self::new(DiagnosticKind::Syntax, message, Some(location.clone()))
    }

    pub fn structural(message: impl Into<String>, location: &SourceLocation) -> Self {
        Self::new(DiagnosticKind::Structural, message, Some(location.clone()))
    }

    pub fn expression(message: impl Into<String>, location: &SourceLocation) -> Self {
        Self::new(DiagnosticKind::Expression, message, Some(location.clone()))
    }

    pub fn internal(message: impl Into<String>, location: Option<&SourceLocation>) -> Self {
        Self::new(DiagnosticKind::Internal, message, location.cloned())
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// `file:line:column: message`, or just the message when the position is unknown.
    pub fn render(&self) -> String {
        match &self.location {
            Some(location) if !location.file.is_empty() => format!("{location}: {}", self.message),
            _ => self.message.clone(),
        }
    }

    fn sort_key(&self) -> (&str, usize, usize, &str) {
        match &self.location {
            Some(l) => (&l.file, l.line, l.column, &self.message),
            None => ("", 0, 0, &self.message),
        }
    }
}

impl miette::Diagnostic for Diagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.kind.code()))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        if self.notes.is_empty() {
            None
        } else {
            Some(Box::new(self.notes.join("\n")))
        }
    }
}

/// Append-only collector shared by every pass of one validation run.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::trace!(message = %diagnostic.message, "diagnostic");
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.push(diagnostic);
        }
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consume the sink, returning its diagnostics ordered by file, line, column and message.
    pub fn into_sorted(self) -> Vec<Diagnostic> {
        let mut diagnostics = self.diagnostics;
        sort_diagnostics(&mut diagnostics);
        diagnostics
    }
}

/// Stable sort by file, line, column, then message.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_with_and_without_location() {
        let located = Diagnostic::structural("bad", &SourceLocation::new("a.yml", 3, 7));
        assert_eq!(located.render(), "a.yml:3:7: bad");
        let bare = Diagnostic::internal("broken", None);
        assert_eq!(bare.render(), "broken");
    }

    #[test]
    fn test_sink_orders_by_position_then_message() {
        let mut sink = DiagnosticSink::new();
        sink.push(Diagnostic::structural("z", &SourceLocation::new("b.yml", 1, 1)));
        sink.push(Diagnostic::structural("b", &SourceLocation::new("a.yml", 2, 1)));
        sink.push(Diagnostic::structural("a", &SourceLocation::new("a.yml", 2, 1)));
        sink.push(Diagnostic::structural("c", &SourceLocation::new("a.yml", 1, 9)));
        let rendered: Vec<_> = sink.into_sorted().iter().map(Diagnostic::render).collect();
        assert_eq!(rendered, vec!["a.yml:1:9: c", "a.yml:2:1: a", "a.yml:2:1: b", "b.yml:1:1: z"]);
    }
}
