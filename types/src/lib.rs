//! Core domain types for PSCode.
//!
//! This crate contains pure domain types with no IO, no async, and minimal
//! dependencies. Both front-ends (the editor shell and the LSP bootstrap)
//! consume these from any layer.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// LSP language identifier for PowerShell documents.
pub const POWERSHELL_LANGUAGE_ID: &str = "powershell";

/// Map a file path to a language id by extension.
///
/// This is the file-extension-to-content-type association consumed by any
/// hosting editor infrastructure: `.ps1`, `.psm1` and `.psd1` all map to the
/// `powershell` content type.
#[must_use]
pub fn language_id_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?;
    match ext.to_ascii_lowercase().as_str() {
        "ps1" | "psm1" | "psd1" => Some(POWERSHELL_LANGUAGE_ID),
        _ => None,
    }
}

// ============================================================================
// Source spans
// ============================================================================

/// A half-open byte range `[start, end)` into a document buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    start: usize,
    end: usize,
}

#[derive(Debug, Error)]
#[error("span end {end} precedes start {start}")]
pub struct InvalidSpanError {
    start: usize,
    end: usize,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> Result<Self, InvalidSpanError> {
        if end < start {
            Err(InvalidSpanError { start, end })
        } else {
            Ok(Self { start, end })
        }
    }

    #[must_use]
    pub fn start(self) -> usize {
        self.start
    }

    #[must_use]
    pub fn end(self) -> usize {
        self.end
    }

    #[must_use]
    pub fn len(self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Whether `offset` falls inside the span.
    #[must_use]
    pub fn contains(self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

// ============================================================================
// Tokens
// ============================================================================

/// Coarse token classification used for syntax coloring.
///
/// The embedded engine reports its own (much finer) token taxonomy; the
/// boundary collapses it into these buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PsTokenKind {
    Command,
    Parameter,
    Variable,
    StringLiteral,
    Number,
    Comment,
    Keyword,
    Operator,
    Member,
    Plain,
}

impl PsTokenKind {
    /// Collapse a host tokenizer kind name into a coloring bucket.
    ///
    /// Unknown kinds fall back to [`PsTokenKind::Plain`] — the boundary
    /// decides the fallback, display code never sees a gap.
    #[must_use]
    pub fn from_host_kind(kind: &str) -> Self {
        match kind {
            "Command" | "CommandArgument" | "Generic" | "Identifier" => Self::Command,
            "Parameter" | "CommandParameter" => Self::Parameter,
            "Variable" | "SplattedVariable" => Self::Variable,
            "String" | "StringLiteral" | "StringExpandable" | "HereStringLiteral"
            | "HereStringExpandable" => Self::StringLiteral,
            "Number" => Self::Number,
            "Comment" => Self::Comment,
            "Keyword" => Self::Keyword,
            "Operator" | "Redirection" => Self::Operator,
            "Member" | "Property" | "Method" | "Type" | "Attribute" => Self::Member,
            _ => Self::Plain,
        }
    }
}

/// A single classified token with its buffer span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PsToken {
    pub kind: PsTokenKind,
    pub span: SourceSpan,
}

// ============================================================================
// Parse errors
// ============================================================================

/// A parse error reported by the embedded engine.
///
/// Fields are private; construction goes through [`ParseErrorInfo::new`] so a
/// marker can never exist without a span and a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseErrorInfo {
    span: SourceSpan,
    message: String,
}

impl ParseErrorInfo {
    #[must_use]
    pub fn new(span: SourceSpan, message: String) -> Self {
        Self { span, message }
    }

    #[must_use]
    pub fn span(&self) -> SourceSpan {
        self.span
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

// ============================================================================
// Completion
// ============================================================================

/// Kind of a completion candidate, mirroring the engine's result types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    Command,
    ParameterName,
    ParameterValue,
    Variable,
    Property,
    Method,
    Keyword,
    Type,
    Other,
}

impl CompletionKind {
    /// Convert from the engine's numeric result type.
    ///
    /// Returns `None` for values outside the engine-defined range; callers
    /// at the boundary decide the fallback.
    #[must_use]
    pub fn from_result_type(value: u32) -> Option<Self> {
        match value {
            0 | 1 | 8 => Some(Self::ParameterValue),
            2 => Some(Self::Command),
            5 => Some(Self::Property),
            6 => Some(Self::Method),
            7 => Some(Self::ParameterName),
            9 => Some(Self::Variable),
            11 => Some(Self::Type),
            12 | 13 => Some(Self::Keyword),
            3 | 4 | 10 => Some(Self::Other),
            _ => None,
        }
    }

    #[must_use]
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Command => "f",
            Self::ParameterName | Self::ParameterValue => "p",
            Self::Variable => "$",
            Self::Property => ".",
            Self::Method => "m",
            Self::Keyword => "k",
            Self::Type => "T",
            Self::Other => " ",
        }
    }
}

/// One completion candidate.
///
/// Display text and insert text are distinct: the popup shows `list_text`
/// while committing inserts `completion_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCandidate {
    list_text: String,
    completion_text: String,
    kind: CompletionKind,
    tooltip: String,
}

impl CompletionCandidate {
    #[must_use]
    pub fn new(
        list_text: String,
        completion_text: String,
        kind: CompletionKind,
        tooltip: String,
    ) -> Self {
        Self {
            list_text,
            completion_text,
            kind,
            tooltip,
        }
    }

    #[must_use]
    pub fn list_text(&self) -> &str {
        &self.list_text
    }

    #[must_use]
    pub fn completion_text(&self) -> &str {
        &self.completion_text
    }

    #[must_use]
    pub fn kind(&self) -> CompletionKind {
        self.kind
    }

    #[must_use]
    pub fn tooltip(&self) -> &str {
        &self.tooltip
    }
}

// ============================================================================
// Invocation
// ============================================================================

/// Result of submitting the buffer to the scripting engine.
///
/// Carries captured output plus zero or more error records; each record
/// surfaces as its own dialog in the shell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvokeOutcome {
    output: String,
    errors: Vec<String>,
}

impl InvokeOutcome {
    #[must_use]
    pub fn new(output: String, errors: Vec<String>) -> Self {
        Self { output, errors }
    }

    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    #[must_use]
    pub fn had_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_language_id_known_extensions() {
        for name in ["a.ps1", "b.psm1", "c.psd1", "UPPER.PS1"] {
            assert_eq!(
                language_id_for_path(&PathBuf::from(name)),
                Some(POWERSHELL_LANGUAGE_ID),
                "{name} must map to powershell"
            );
        }
    }

    #[test]
    fn test_language_id_unknown_extension() {
        assert_eq!(language_id_for_path(Path::new("a.rs")), None);
        assert_eq!(language_id_for_path(Path::new("script")), None);
        assert_eq!(language_id_for_path(Path::new("a.ps1.bak")), None);
    }

    #[test]
    fn test_span_rejects_inverted_range() {
        assert!(SourceSpan::new(5, 3).is_err());
    }

    #[test]
    fn test_span_contains() {
        let span = SourceSpan::new(2, 5).unwrap();
        assert!(!span.contains(1));
        assert!(span.contains(2));
        assert!(span.contains(4));
        assert!(!span.contains(5));
        assert_eq!(span.len(), 3);
    }

    #[test]
    fn test_empty_span() {
        let span = SourceSpan::new(4, 4).unwrap();
        assert!(span.is_empty());
        assert!(!span.contains(4));
    }

    #[test]
    fn test_token_kind_from_host_kind() {
        assert_eq!(
            PsTokenKind::from_host_kind("Variable"),
            PsTokenKind::Variable
        );
        assert_eq!(
            PsTokenKind::from_host_kind("StringExpandable"),
            PsTokenKind::StringLiteral
        );
        assert_eq!(PsTokenKind::from_host_kind("Comment"), PsTokenKind::Comment);
        assert_eq!(
            PsTokenKind::from_host_kind("SomethingNew"),
            PsTokenKind::Plain
        );
    }

    #[test]
    fn test_completion_kind_from_result_type() {
        assert_eq!(
            CompletionKind::from_result_type(2),
            Some(CompletionKind::Command)
        );
        assert_eq!(
            CompletionKind::from_result_type(9),
            Some(CompletionKind::Variable)
        );
        assert_eq!(
            CompletionKind::from_result_type(7),
            Some(CompletionKind::ParameterName)
        );
        assert_eq!(CompletionKind::from_result_type(99), None);
    }

    #[test]
    fn test_invoke_outcome_error_flag() {
        let clean = InvokeOutcome::new("hi".into(), vec![]);
        assert!(!clean.had_errors());

        let failed = InvokeOutcome::new(String::new(), vec!["Attempted to divide by zero.".into()]);
        assert!(failed.had_errors());
        assert_eq!(failed.errors().len(), 1);
    }
}
