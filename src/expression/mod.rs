//! Runtime-expression parsing and resolution.
//!
//! Arazzo documents reference runtime data with `$`-prefixed expressions:
//! `$statusCode`, `$inputs.username`, `$steps.loginStep.outputs.token`,
//! `$components.parameters.pageSize`, `$response.body#/pets/0/id`. This
//! module parses them into a typed form and checks the symbolic parts
//! against the document model. It is invoked by the structural validator for
//! every expression-valued field, and exposed directly for on-demand checks
//! (hover, completion) outside the rebuild cycle.
//!
//! Severity policy: malformed syntax and unknown well-known segments are
//! hard errors; names that may legitimately exist outside the document (an
//! undeclared step output, an input not listed in a partial schema) are
//! warnings.

#[cfg(test)]
mod tests;

use serde::Serialize;
use thiserror::Error;

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::document::Range;
use crate::model::{DocumentModel, Step, Workflow};

/// Recognized expression prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpressionPrefix {
    Url,
    Method,
    StatusCode,
    Request,
    Response,
    Inputs,
    Steps,
    Components,
}

impl ExpressionPrefix {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "url" => Some(ExpressionPrefix::Url),
            "method" => Some(ExpressionPrefix::Method),
            "statusCode" => Some(ExpressionPrefix::StatusCode),
            "request" => Some(ExpressionPrefix::Request),
            "response" => Some(ExpressionPrefix::Response),
            "inputs" => Some(ExpressionPrefix::Inputs),
            "steps" => Some(ExpressionPrefix::Steps),
            "components" => Some(ExpressionPrefix::Components),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpressionPrefix::Url => "url",
            ExpressionPrefix::Method => "method",
            ExpressionPrefix::StatusCode => "statusCode",
            ExpressionPrefix::Request => "request",
            ExpressionPrefix::Response => "response",
            ExpressionPrefix::Inputs => "inputs",
            ExpressionPrefix::Steps => "steps",
            ExpressionPrefix::Components => "components",
        }
    }
}

/// Parsed form of a runtime expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    pub prefix: ExpressionPrefix,
    /// Dotted segments after the prefix
    pub segments: Vec<String>,
    /// JSON-pointer tail after `#`, e.g. `/pets/0/id`
    pub pointer: Option<String>,
    pub raw: String,
}

/// Classification returned alongside resolution results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpressionKind {
    Url,
    Method,
    StatusCode,
    Request,
    Response,
    Inputs,
    StepOutput,
    Components,
    Invalid,
}

impl From<ExpressionPrefix> for ExpressionKind {
    fn from(prefix: ExpressionPrefix) -> Self {
        match prefix {
            ExpressionPrefix::Url => ExpressionKind::Url,
            ExpressionPrefix::Method => ExpressionKind::Method,
            ExpressionPrefix::StatusCode => ExpressionKind::StatusCode,
            ExpressionPrefix::Request => ExpressionKind::Request,
            ExpressionPrefix::Response => ExpressionKind::Response,
            ExpressionPrefix::Inputs => ExpressionKind::Inputs,
            ExpressionPrefix::Steps => ExpressionKind::StepOutput,
            ExpressionPrefix::Components => ExpressionKind::Components,
        }
    }
}

/// Syntax error in a runtime expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionSyntaxError {
    #[error("runtime expressions start with `$`")]
    MissingDollar,
    #[error("expression has no prefix")]
    Empty,
    #[error("unknown prefix `{0}`")]
    UnknownPrefix(String),
    #[error("empty segment")]
    EmptySegment,
}

/// Parse a runtime-expression string.
pub fn parse(raw: &str) -> Result<Expression, ExpressionSyntaxError> {
    let Some(body) = raw.strip_prefix('$') else {
        return Err(ExpressionSyntaxError::MissingDollar);
    };
    if body.is_empty() {
        return Err(ExpressionSyntaxError::Empty);
    }

    let (body, pointer) = match body.split_once('#') {
        Some((head, tail)) => (head, Some(tail.to_string())),
        None => (body, None),
    };

    let mut parts = body.split('.');
    let prefix_token = parts.next().unwrap_or("");
    let prefix = ExpressionPrefix::parse(prefix_token)
        .ok_or_else(|| ExpressionSyntaxError::UnknownPrefix(prefix_token.to_string()))?;

    let segments: Vec<String> = parts.map(str::to_string).collect();
    if segments.iter().any(String::is_empty) {
        return Err(ExpressionSyntaxError::EmptySegment);
    }

    Ok(Expression {
        prefix,
        segments,
        pointer,
        raw: raw.to_string(),
    })
}

/// Scope an expression is resolved in.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionContext<'a> {
    pub model: &'a DocumentModel,
    pub workflow: Option<&'a Workflow>,
    pub step: Option<&'a Step>,
}

impl<'a> ResolutionContext<'a> {
    pub fn new(model: &'a DocumentModel) -> Self {
        Self {
            model,
            workflow: None,
            step: None,
        }
    }

    pub fn in_workflow(model: &'a DocumentModel, workflow: &'a Workflow) -> Self {
        Self {
            model,
            workflow: Some(workflow),
            step: None,
        }
    }

    pub fn in_step(model: &'a DocumentModel, workflow: &'a Workflow, step: &'a Step) -> Self {
        Self {
            model,
            workflow: Some(workflow),
            step: Some(step),
        }
    }
}

/// Result of resolving one expression.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// False when any error-severity diagnostic was produced
    pub valid: bool,
    pub kind: ExpressionKind,
    pub diagnostics: Vec<Diagnostic>,
}

impl Resolution {
    fn finish(kind: ExpressionKind, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            valid: !diagnostics.iter().any(Diagnostic::is_error),
            kind,
            diagnostics,
        }
    }
}

/// Resolve an expression string against the model.
///
/// `range` anchors any diagnostics; callers pass the range of the field the
/// expression was read from.
pub fn resolve(raw: &str, range: Range, ctx: &ResolutionContext) -> Resolution {
    let expr = match parse(raw) {
        Ok(expr) => expr,
        Err(err) => {
            return Resolution {
                valid: false,
                kind: ExpressionKind::Invalid,
                diagnostics: vec![Diagnostic::error(
                    DiagnosticCode::ExpressionError,
                    range,
                    format!("Invalid runtime expression `{raw}`: {err}"),
                )],
            };
        }
    };

    let kind = ExpressionKind::from(expr.prefix);
    let mut diagnostics = Vec::new();

    match expr.prefix {
        ExpressionPrefix::Url | ExpressionPrefix::Method | ExpressionPrefix::StatusCode => {
            if !expr.segments.is_empty() || expr.pointer.is_some() {
                diagnostics.push(Diagnostic::error(
                    DiagnosticCode::ExpressionError,
                    range,
                    format!("`${}` does not take a path", expr.prefix.as_str()),
                ));
            }
        }

        ExpressionPrefix::Request | ExpressionPrefix::Response => {
            if let Some(first) = expr.segments.first() {
                const SOURCES: [&str; 4] = ["header", "query", "path", "body"];
                if !SOURCES.contains(&first.as_str()) {
                    diagnostics.push(Diagnostic::error(
                        DiagnosticCode::ExpressionError,
                        range,
                        format!(
                            "`${}` is followed by one of header/query/path/body, not `{first}`",
                            expr.prefix.as_str()
                        ),
                    ));
                }
            }
        }

        ExpressionPrefix::Inputs => resolve_inputs(&expr, range, ctx, &mut diagnostics),
        ExpressionPrefix::Steps => resolve_steps(&expr, range, ctx, &mut diagnostics),
        ExpressionPrefix::Components => resolve_components(&expr, range, ctx, &mut diagnostics),
    }

    Resolution::finish(kind, diagnostics)
}

fn resolve_inputs(
    expr: &Expression,
    range: Range,
    ctx: &ResolutionContext,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(name) = expr.segments.first() else {
        diagnostics.push(Diagnostic::error(
            DiagnosticCode::ExpressionError,
            range,
            "`$inputs` expects an input name, e.g. `$inputs.username`",
        ));
        return;
    };

    // Soft check only: the inputs schema may be partial, so an undeclared
    // name is a warning, and no schema at all checks nothing.
    if let Some(workflow) = ctx.workflow {
        let declared = workflow.declared_input_names();
        if !declared.is_empty() && !declared.contains(&name.as_str()) {
            diagnostics.push(Diagnostic::warning(
                DiagnosticCode::ExpressionError,
                range,
                format!("Input `{name}` is not declared in the workflow's inputs schema"),
            ));
        }
    }
}

fn resolve_steps(
    expr: &Expression,
    range: Range,
    ctx: &ResolutionContext,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(step_id) = expr.segments.first() else {
        diagnostics.push(Diagnostic::error(
            DiagnosticCode::ExpressionError,
            range,
            "`$steps` expects a step id, e.g. `$steps.loginStep.outputs.token`",
        ));
        return;
    };

    // Without a workflow scope (on-demand resolution) membership can't be
    // checked; syntax alone decides.
    let Some(workflow) = ctx.workflow else {
        return;
    };

    let step = workflow.step(step_id).or_else(|| {
        // Step outputs of dependency workflows are in scope via dependsOn.
        workflow.depends_on.iter().find_map(|dep| {
            ctx.model
                .workflow(&dep.node)
                .and_then(|dep_wf| dep_wf.step(step_id))
        })
    });

    let Some(step) = step else {
        diagnostics.push(Diagnostic::error(
            DiagnosticCode::ExpressionError,
            range,
            format!("Expression references unknown step `{step_id}`"),
        ));
        return;
    };

    match expr.segments.get(1).map(String::as_str) {
        None | Some("outputs") => {}
        Some(other) => {
            diagnostics.push(Diagnostic::warning(
                DiagnosticCode::ExpressionError,
                range,
                format!("Expected `outputs` after the step id, found `{other}`"),
            ));
            return;
        }
    }

    if let Some(output_name) = expr.segments.get(2) {
        // Soft check: the output may reference a response field the step
        // never declared locally.
        if !step.declares_output(output_name) {
            diagnostics.push(Diagnostic::warning(
                DiagnosticCode::ExpressionError,
                range,
                format!("Step `{step_id}` does not declare an output named `{output_name}`"),
            ));
        }
    }
}

fn resolve_components(
    expr: &Expression,
    range: Range,
    ctx: &ResolutionContext,
    diagnostics: &mut Vec<Diagnostic>,
) {
    const CATEGORIES: [&str; 4] = ["parameters", "successActions", "failureActions", "inputs"];

    let (Some(category), Some(name)) = (expr.segments.first(), expr.segments.get(1)) else {
        diagnostics.push(Diagnostic::error(
            DiagnosticCode::ExpressionError,
            range,
            "`$components` expects a category and a name, e.g. `$components.parameters.pageSize`",
        ));
        return;
    };

    if !CATEGORIES.contains(&category.as_str()) {
        diagnostics.push(Diagnostic::error(
            DiagnosticCode::ExpressionError,
            range,
            format!(
                "Unknown components category `{category}`; expected one of parameters, successActions, failureActions, inputs"
            ),
        ));
        return;
    }

    let defined = ctx
        .model
        .components
        .as_ref()
        .is_some_and(|c| c.contains(category, name));
    if !defined {
        diagnostics.push(Diagnostic::error(
            DiagnosticCode::ReferenceError,
            range,
            format!("`{name}` is not defined in `components.{category}`"),
        ));
    }
}

/// Characters that can appear inside an expression token.
fn is_expression_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | '#' | '/')
}

/// Extract embedded expressions from free-form text.
///
/// Simple-type criterion conditions mix expressions with operators
/// (`$statusCode == 200`); this scans out each `$token` with its byte offset
/// within the text so they can be resolved individually.
pub fn extract(text: &str) -> Vec<(String, usize)> {
    let mut found = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c != '$' {
            continue;
        }
        let mut end = start + c.len_utf8();
        while let Some((i, c)) = chars.peek().copied() {
            if !is_expression_char(c) {
                break;
            }
            end = i + c.len_utf8();
            chars.next();
        }
        let token = text[start..end].trim_end_matches('.');
        if token.len() > 1 {
            found.push((token.to_string(), start));
        }
    }
    found
}
