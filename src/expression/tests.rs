//! Tests for runtime-expression parsing and resolution

use serde_json::json;

use crate::diagnostics::{DiagnosticCode, Severity};
use crate::document::{from_json, Range};
use crate::expression::{
    extract, parse, resolve, ExpressionKind, ExpressionPrefix, ExpressionSyntaxError,
    Resolution, ResolutionContext,
};
use crate::model::{builder, DocumentModel};

// ============================================================================
// Helper Functions
// ============================================================================

fn model(doc: serde_json::Value) -> DocumentModel {
    builder::build(&from_json(&doc)).model
}

/// A document with a login workflow declaring `sessionToken`, plus a
/// dependency workflow and components.
fn fixture() -> DocumentModel {
    model(json!({
        "workflows": [
            {
                "workflowId": "purchase",
                "dependsOn": ["authenticate"],
                "inputs": {"type": "object", "properties": {"petId": {}}},
                "steps": [
                    {"stepId": "loginStep", "operationId": "login",
                     "outputs": {"sessionToken": "$response.body#/token"}},
                    {"stepId": "getPetStep", "operationId": "getPet"}
                ]
            },
            {
                "workflowId": "authenticate",
                "steps": [{"stepId": "issueToken", "operationId": "token",
                           "outputs": {"token": "$response.body"}}]
            }
        ],
        "components": {
            "parameters": {"pageSize": {"name": "pageSize", "in": "query", "value": 10}}
        }
    }))
}

fn resolve_in_workflow(model: &DocumentModel, expr: &str) -> Resolution {
    let workflow = &model.workflows[0];
    let ctx = ResolutionContext::in_workflow(model, workflow);
    resolve(expr, Range::default(), &ctx)
}

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_parse_bare_prefix() {
    let expr = parse("$statusCode").unwrap();
    assert_eq!(expr.prefix, ExpressionPrefix::StatusCode);
    assert!(expr.segments.is_empty());
    assert!(expr.pointer.is_none());
}

#[test]
fn test_parse_segments() {
    let expr = parse("$steps.loginStep.outputs.sessionToken").unwrap();
    assert_eq!(expr.prefix, ExpressionPrefix::Steps);
    assert_eq!(expr.segments, ["loginStep", "outputs", "sessionToken"]);
}

#[test]
fn test_parse_pointer_tail() {
    let expr = parse("$response.body#/pets/0/id").unwrap();
    assert_eq!(expr.prefix, ExpressionPrefix::Response);
    assert_eq!(expr.segments, ["body"]);
    assert_eq!(expr.pointer.as_deref(), Some("/pets/0/id"));
}

#[test]
fn test_parse_errors() {
    assert_eq!(parse("statusCode"), Err(ExpressionSyntaxError::MissingDollar));
    assert_eq!(parse("$"), Err(ExpressionSyntaxError::Empty));
    assert_eq!(
        parse("$bogus.x"),
        Err(ExpressionSyntaxError::UnknownPrefix("bogus".to_string()))
    );
    assert_eq!(parse("$steps."), Err(ExpressionSyntaxError::EmptySegment));
    assert_eq!(parse("$steps..a"), Err(ExpressionSyntaxError::EmptySegment));
}

// ============================================================================
// Step references
// ============================================================================

#[test]
fn test_declared_step_output_is_valid() {
    let model = fixture();
    let res = resolve_in_workflow(&model, "$steps.loginStep.outputs.sessionToken");
    assert!(res.valid);
    assert_eq!(res.kind, ExpressionKind::StepOutput);
    assert!(res.diagnostics.is_empty());
}

#[test]
fn test_undeclared_output_is_warning_only() {
    let model = fixture();
    let res = resolve_in_workflow(&model, "$steps.loginStep.outputs.missingName");
    assert!(res.valid, "undeclared output names are a soft check");
    assert_eq!(res.diagnostics.len(), 1);
    assert_eq!(res.diagnostics[0].severity, Severity::Warning);
    assert!(res.diagnostics[0].message.contains("missingName"));
}

#[test]
fn test_unknown_step_is_hard_error() {
    let model = fixture();
    let res = resolve_in_workflow(&model, "$steps.noSuchStep.outputs.x");
    assert!(!res.valid);
    assert_eq!(res.diagnostics[0].code, DiagnosticCode::ExpressionError);
    assert_eq!(res.diagnostics[0].severity, Severity::Error);
    assert!(res.diagnostics[0].message.contains("noSuchStep"));
}

#[test]
fn test_step_of_dependency_workflow_is_in_scope() {
    let model = fixture();
    let res = resolve_in_workflow(&model, "$steps.issueToken.outputs.token");
    assert!(res.valid);
    assert!(res.diagnostics.is_empty());
}

#[test]
fn test_step_reference_without_workflow_scope_passes_syntax_only() {
    let model = fixture();
    let ctx = ResolutionContext::new(&model);
    let res = resolve("$steps.anything.outputs.x", Range::default(), &ctx);
    assert!(res.valid);
}

// ============================================================================
// Components
// ============================================================================

#[test]
fn test_component_reference_resolves() {
    let model = fixture();
    let res = resolve_in_workflow(&model, "$components.parameters.pageSize");
    assert!(res.valid);
    assert_eq!(res.kind, ExpressionKind::Components);
}

#[test]
fn test_unknown_component_name_is_reference_error() {
    let model = fixture();
    let res = resolve_in_workflow(&model, "$components.parameters.nope");
    assert!(!res.valid);
    assert_eq!(res.diagnostics[0].code, DiagnosticCode::ReferenceError);
}

#[test]
fn test_unknown_component_category_is_hard_error() {
    let model = fixture();
    let res = resolve_in_workflow(&model, "$components.schemas.Pet");
    assert!(!res.valid);
    assert_eq!(res.diagnostics[0].code, DiagnosticCode::ExpressionError);
    assert!(res.diagnostics[0].message.contains("schemas"));
}

#[test]
fn test_component_reference_needs_category_and_name() {
    let model = fixture();
    let res = resolve_in_workflow(&model, "$components.parameters");
    assert!(!res.valid);
}

// ============================================================================
// Inputs and HTTP carriers
// ============================================================================

#[test]
fn test_declared_input_is_valid() {
    let model = fixture();
    assert!(resolve_in_workflow(&model, "$inputs.petId").valid);
}

#[test]
fn test_undeclared_input_is_warning() {
    let model = fixture();
    let res = resolve_in_workflow(&model, "$inputs.quantity");
    assert!(res.valid);
    assert_eq!(res.diagnostics.len(), 1);
    assert_eq!(res.diagnostics[0].severity, Severity::Warning);
}

#[test]
fn test_input_without_schema_checks_nothing() {
    let model = model(json!({
        "workflows": [{"workflowId": "w", "steps": [{"stepId": "a"}]}]
    }));
    let res = resolve_in_workflow(&model, "$inputs.anything");
    assert!(res.valid);
    assert!(res.diagnostics.is_empty());
}

#[test]
fn test_status_code_takes_no_path() {
    let model = fixture();
    assert!(resolve_in_workflow(&model, "$statusCode").valid);
    let res = resolve_in_workflow(&model, "$statusCode.value");
    assert!(!res.valid);
    assert!(res.diagnostics[0].message.contains("does not take a path"));
}

#[test]
fn test_request_sources() {
    let model = fixture();
    assert!(resolve_in_workflow(&model, "$request.header.authorization").valid);
    assert!(resolve_in_workflow(&model, "$response.body#/pets/0").valid);
    let res = resolve_in_workflow(&model, "$request.cookie.session");
    assert!(!res.valid);
}

#[test]
fn test_malformed_expression_reports_syntax() {
    let model = fixture();
    let res = resolve_in_workflow(&model, "plainText");
    assert!(!res.valid);
    assert_eq!(res.kind, ExpressionKind::Invalid);
    assert_eq!(res.diagnostics[0].code, DiagnosticCode::ExpressionError);
}

// ============================================================================
// Embedded expressions
// ============================================================================

#[test]
fn test_extract_from_condition() {
    let found = extract("$statusCode == 200");
    assert_eq!(found, vec![("$statusCode".to_string(), 0)]);
}

#[test]
fn test_extract_multiple_tokens() {
    let found = extract("$steps.a.outputs.x != $inputs.limit");
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].0, "$steps.a.outputs.x");
    assert_eq!(found[1].0, "$inputs.limit");
    assert_eq!(found[1].1, 22);
}

#[test]
fn test_extract_trims_trailing_dot() {
    let found = extract("ends with $statusCode.");
    assert_eq!(found[0].0, "$statusCode");
}

#[test]
fn test_extract_nothing() {
    assert!(extract("count > 3").is_empty());
    assert!(extract("a $ b").is_empty());
}
