//! Diagnostics shared by every pipeline stage.
//!
//! All failure modes in the core are expressed as [`Diagnostic`] values
//! attached to a source range; no stage aborts a build. The hosting editor
//! decides how to render them (markers, problem panes, CLI output).

use serde::Serialize;

use crate::document::Range;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Must be fixed - the document is incorrect
    Error,
    /// Should probably be fixed - potential mistake
    Warning,
}

/// Classification of a diagnostic (the error taxonomy).
///
/// The code appears verbatim in editor markers, so the rendered ids are
/// stable strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCode {
    /// Malformed underlying document, passed through from the parser
    SyntaxError,
    /// Missing, invalid or mutually-exclusive fields
    StructuralError,
    /// Dangling goto/retry/workflow/dependsOn/component reference
    ReferenceError,
    /// Malformed `$...` syntax or unresolvable well-known segment
    ExpressionError,
    /// Structural oddity in the derived transition graph
    GraphWarning,
}

impl DiagnosticCode {
    /// Stable string id, used in marker codes and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::SyntaxError => "syntax-error",
            DiagnosticCode::StructuralError => "structural-error",
            DiagnosticCode::ReferenceError => "reference-error",
            DiagnosticCode::ExpressionError => "expression-error",
            DiagnosticCode::GraphWarning => "graph-warning",
        }
    }
}

/// A single finding, anchored to its originating node's range.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub range: Range,
    pub code: DiagnosticCode,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(code: DiagnosticCode, range: Range, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            range,
            code,
        }
    }

    /// Create a new warning diagnostic
    pub fn warning(code: DiagnosticCode, range: Range, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            range,
            code,
        }
    }

    /// Check if this is an error (not a warning)
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(
            f,
            "{} at {}..{}: {} [{}]",
            severity,
            self.range.start,
            self.range.end,
            self.message,
            self.code.as_str()
        )
    }
}
