//! Tests for the validation system

use serde_json::json;

use crate::diagnostics::{Diagnostic, DiagnosticCode, Severity};
use crate::document::from_json;
use crate::model::{builder, DocumentModel};
use crate::validation::{validate_document, Validator};

// ============================================================================
// Helper Functions
// ============================================================================

fn build(doc: serde_json::Value) -> DocumentModel {
    builder::build(&from_json(&doc)).model
}

fn validate(doc: serde_json::Value) -> Vec<Diagnostic> {
    validate_document(&build(doc))
}

fn has_message(diagnostics: &[Diagnostic], needle: &str) -> bool {
    diagnostics.iter().any(|d| d.message.contains(needle))
}

fn with_message<'a>(diagnostics: &'a [Diagnostic], needle: &str) -> Vec<&'a Diagnostic> {
    diagnostics
        .iter()
        .filter(|d| d.message.contains(needle))
        .collect()
}

/// A complete, conforming document.
fn minimal() -> serde_json::Value {
    json!({
        "arazzo": "1.0.0",
        "info": {"title": "Pet purchase", "version": "1.0.0"},
        "sourceDescriptions": [{"name": "petstore", "url": "./petstore.yaml", "type": "openapi"}],
        "workflows": [{
            "workflowId": "buyPet",
            "steps": [{"stepId": "loginStep", "operationId": "login"}]
        }]
    })
}

// ============================================================================
// Root and info
// ============================================================================

#[test]
fn test_minimal_document_is_clean() {
    assert!(validate(minimal()).is_empty());
}

#[test]
fn test_missing_root_fields() {
    let diagnostics = validate(json!({}));
    assert!(has_message(&diagnostics, "Missing required field: arazzo"));
    assert!(has_message(&diagnostics, "Missing required field: info"));
    assert!(has_message(&diagnostics, "at least one source description"));
    assert!(has_message(&diagnostics, "at least one workflow"));
}

#[test]
fn test_info_requires_title_and_version() {
    let mut doc = minimal();
    doc["info"] = json!({"summary": "no title or version"});
    let diagnostics = validate(doc);
    assert!(has_message(&diagnostics, "Missing required field: title"));
    assert!(has_message(&diagnostics, "Missing required field: version"));
}

#[test]
fn test_source_description_rules() {
    let mut doc = minimal();
    doc["sourceDescriptions"] = json!([
        {"url": "./a.yaml"},
        {"name": "dup", "url": "./b.yaml", "type": "grpc"},
        {"name": "dup", "url": "./c.yaml"}
    ]);
    let diagnostics = validate(doc);
    assert!(has_message(&diagnostics, "Missing required field: name"));
    assert!(has_message(&diagnostics, "`openapi` or `arazzo`"));
    assert!(has_message(&diagnostics, "Duplicate source description name: `dup`"));
}

// ============================================================================
// Workflows
// ============================================================================

#[test]
fn test_workflow_requires_id_and_steps() {
    let mut doc = minimal();
    doc["workflows"] = json!([{"summary": "neither id nor steps"}]);
    let diagnostics = validate(doc);
    assert!(has_message(&diagnostics, "Missing required field: workflowId"));
    assert!(has_message(&diagnostics, "at least one step"));
}

#[test]
fn test_duplicate_workflow_ids() {
    let mut doc = minimal();
    doc["workflows"] = json!([
        {"workflowId": "same", "steps": [{"stepId": "a", "operationId": "op"}]},
        {"workflowId": "same", "steps": [{"stepId": "a", "operationId": "op"}]}
    ]);
    let diagnostics = validate(doc);
    assert_eq!(with_message(&diagnostics, "Duplicate workflowId").len(), 1);
}

#[test]
fn test_depends_on_self_and_unknown() {
    let mut doc = minimal();
    doc["workflows"] = json!([{
        "workflowId": "w",
        "dependsOn": ["w", "ghost"],
        "steps": [{"stepId": "a", "operationId": "op"}]
    }]);
    let diagnostics = validate(doc);
    assert!(has_message(&diagnostics, "cannot depend on itself"));
    let unknown = with_message(&diagnostics, "Unknown workflow in dependsOn: `ghost`");
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].code, DiagnosticCode::ReferenceError);
}

#[test]
fn test_workflow_output_expression_is_resolved() {
    let mut doc = minimal();
    doc["workflows"][0]["outputs"] = json!({"token": "$steps.ghostStep.outputs.token"});
    let diagnostics = validate(doc);
    assert!(has_message(&diagnostics, "unknown step `ghostStep`"));
}

// ============================================================================
// Steps
// ============================================================================

#[test]
fn test_step_missing_id_reports_once_at_step_range() {
    let model = build(json!({
        "arazzo": "1.0.0",
        "info": {"title": "t", "version": "1"},
        "sourceDescriptions": [{"name": "s", "url": "./s.yaml"}],
        "workflows": [{
            "workflowId": "w",
            "steps": [{"operationId": "op"}]
        }]
    }));
    let diagnostics = validate_document(&model);

    let missing = with_message(&diagnostics, "Missing required field: stepId");
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].severity, Severity::Error);
    assert_eq!(missing[0].code, DiagnosticCode::StructuralError);
    assert_eq!(missing[0].range, model.workflows[0].steps[0].range);
}

#[test]
fn test_step_with_no_operation_reference() {
    let mut doc = minimal();
    doc["workflows"][0]["steps"] = json!([{"stepId": "a"}]);
    let diagnostics = validate(doc);

    let found = with_message(&diagnostics, "exactly one of");
    assert_eq!(found.len(), 1);
    // The message names all three alternatives
    assert!(found[0].message.contains("operationId"));
    assert!(found[0].message.contains("operationPath"));
    assert!(found[0].message.contains("workflowId"));
}

#[test]
fn test_step_with_two_operation_references() {
    let mut doc = minimal();
    doc["workflows"][0]["steps"] =
        json!([{"stepId": "a", "operationId": "op", "operationPath": "{$sourceDescriptions.petstore.url}#/paths/~1pets/get"}]);
    let diagnostics = validate(doc);
    let found = with_message(&diagnostics, "mutually exclusive");
    assert_eq!(found.len(), 1);
    assert!(!has_message(&diagnostics, "exactly one of"));
}

#[test]
fn test_duplicate_step_ids_within_workflow() {
    let mut doc = minimal();
    doc["workflows"][0]["steps"] = json!([
        {"stepId": "a", "operationId": "op1"},
        {"stepId": "a", "operationId": "op2"}
    ]);
    let diagnostics = validate(doc);
    assert_eq!(with_message(&diagnostics, "Duplicate stepId: `a`").len(), 1);
}

#[test]
fn test_same_step_id_in_different_workflows_is_fine() {
    let mut doc = minimal();
    doc["workflows"] = json!([
        {"workflowId": "w1", "steps": [{"stepId": "a", "operationId": "op"}]},
        {"workflowId": "w2", "steps": [{"stepId": "a", "operationId": "op"}]}
    ]);
    assert!(validate(doc).is_empty());
}

#[test]
fn test_sub_workflow_reference_must_resolve() {
    let mut doc = minimal();
    doc["workflows"][0]["steps"] = json!([{"stepId": "a", "workflowId": "ghost"}]);
    let diagnostics = validate(doc);
    let found = with_message(&diagnostics, "Unknown workflow: `ghost`");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].code, DiagnosticCode::ReferenceError);
}

#[test]
fn test_step_output_expressions_are_checked() {
    let mut doc = minimal();
    doc["workflows"][0]["steps"] = json!([{
        "stepId": "a",
        "operationId": "op",
        "outputs": {"x": "$nonsense.path"}
    }]);
    let diagnostics = validate(doc);
    assert!(has_message(&diagnostics, "unknown prefix `nonsense`"));
}

// ============================================================================
// Criteria
// ============================================================================

#[test]
fn test_criterion_requires_condition() {
    let mut doc = minimal();
    doc["workflows"][0]["steps"][0]["successCriteria"] = json!([{"type": "regex"}]);
    let diagnostics = validate(doc);
    assert!(has_message(&diagnostics, "Missing required field: condition"));
}

#[test]
fn test_regex_criterion_requires_context() {
    let mut doc = minimal();
    doc["workflows"][0]["steps"][0]["successCriteria"] =
        json!([{"condition": "^ok$", "type": "regex"}]);
    let diagnostics = validate(doc);
    assert!(has_message(&diagnostics, "require `context`"));
}

#[test]
fn test_unknown_criterion_type() {
    let mut doc = minimal();
    doc["workflows"][0]["steps"][0]["successCriteria"] =
        json!([{"condition": "x", "type": "prolog"}]);
    let diagnostics = validate(doc);
    assert!(has_message(&diagnostics, "Unknown criterion type `prolog`"));
}

#[test]
fn test_simple_condition_embedded_expressions_are_checked() {
    let mut doc = minimal();
    doc["workflows"][0]["steps"][0]["successCriteria"] =
        json!([{"condition": "$steps.ghost.outputs.x == 1"}]);
    let diagnostics = validate(doc);
    assert!(has_message(&diagnostics, "unknown step `ghost`"));
}

#[test]
fn test_criterion_context_expression_is_checked() {
    let mut doc = minimal();
    doc["workflows"][0]["steps"][0]["successCriteria"] =
        json!([{"condition": "^ok$", "type": "regex", "context": "$response.trailer.x"}]);
    let diagnostics = validate(doc);
    assert!(has_message(&diagnostics, "header/query/path/body"));
}

// ============================================================================
// Actions
// ============================================================================

#[test]
fn test_end_action_takes_no_target() {
    let mut doc = minimal();
    doc["workflows"][0]["steps"][0]["onSuccess"] =
        json!([{"type": "end", "stepId": "loginStep"}]);
    let diagnostics = validate(doc);
    assert!(has_message(&diagnostics, "`end` actions do not take a target"));
}

#[test]
fn test_goto_requires_a_target() {
    let mut doc = minimal();
    doc["workflows"][0]["steps"][0]["onSuccess"] = json!([{"type": "goto"}]);
    let diagnostics = validate(doc);
    assert!(has_message(&diagnostics, "`goto` requires exactly one of stepId or workflowId"));
}

#[test]
fn test_goto_targets_are_mutually_exclusive() {
    let mut doc = minimal();
    doc["workflows"][0]["steps"][0]["onSuccess"] =
        json!([{"type": "goto", "stepId": "loginStep", "workflowId": "buyPet"}]);
    let diagnostics = validate(doc);
    assert!(has_message(&diagnostics, "stepId and workflowId are mutually exclusive"));
}

#[test]
fn test_unknown_action_type() {
    let mut doc = minimal();
    doc["workflows"][0]["steps"][0]["onFailure"] = json!([{"type": "escalate"}]);
    let diagnostics = validate(doc);
    assert!(has_message(&diagnostics, "Unknown action type `escalate`"));
}

#[test]
fn test_action_missing_type() {
    let mut doc = minimal();
    doc["workflows"][0]["steps"][0]["onFailure"] = json!([{"stepId": "loginStep"}]);
    let diagnostics = validate(doc);
    assert!(has_message(&diagnostics, "Missing required field: type"));
}

#[test]
fn test_retry_only_in_failure_position() {
    let mut doc = minimal();
    doc["workflows"][0]["steps"][0]["onSuccess"] =
        json!([{"type": "retry", "stepId": "loginStep"}]);
    let diagnostics = validate(doc);
    assert!(has_message(&diagnostics, "`retry` is only allowed in failure actions"));
}

#[test]
fn test_retry_limit_must_be_positive_integer() {
    let mut doc = minimal();
    doc["workflows"][0]["steps"][0]["onFailure"] =
        json!([{"type": "retry", "stepId": "loginStep", "retryLimit": 0}]);
    let diagnostics = validate(doc);
    assert!(has_message(&diagnostics, "`retryLimit` must be an integer"));

    let mut doc = minimal();
    doc["workflows"][0]["steps"][0]["onFailure"] =
        json!([{"type": "retry", "stepId": "loginStep", "retryLimit": "three"}]);
    assert!(has_message(&validate(doc), "`retryLimit` must be an integer"));
}

#[test]
fn test_retry_limit_absent_is_fine() {
    let mut doc = minimal();
    doc["workflows"][0]["steps"][0]["onFailure"] =
        json!([{"type": "retry", "stepId": "loginStep"}]);
    assert!(validate(doc).is_empty());
}

#[test]
fn test_retry_after_must_be_non_negative() {
    let mut doc = minimal();
    doc["workflows"][0]["steps"][0]["onFailure"] =
        json!([{"type": "retry", "stepId": "loginStep", "retryAfter": -1}]);
    let diagnostics = validate(doc);
    assert!(has_message(&diagnostics, "`retryAfter` must be a non-negative number"));
}

#[test]
fn test_workflow_default_action_target_is_resolved_here() {
    let mut doc = minimal();
    doc["workflows"][0]["failureActions"] = json!([{"type": "goto", "stepId": "ghost"}]);
    let diagnostics = validate(doc);
    let found = with_message(&diagnostics, "Unknown step: `ghost`");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].code, DiagnosticCode::ReferenceError);
}

#[test]
fn test_step_action_targets_are_left_to_the_graph() {
    // Step-level target resolution is the graph builder's job; the
    // validator alone stays quiet about this dangling goto.
    let mut doc = minimal();
    doc["workflows"][0]["steps"][0]["onSuccess"] = json!([{"type": "goto", "stepId": "ghost"}]);
    assert!(validate(doc).is_empty());
}

#[test]
fn test_component_action_skips_target_resolution() {
    let mut doc = minimal();
    doc["components"] = json!({
        "failureActions": {"tryAgain": {"type": "retry", "stepId": "anywhere", "retryLimit": 2}}
    });
    assert!(validate(doc).is_empty());
}

// ============================================================================
// Parameters
// ============================================================================

#[test]
fn test_parameter_requires_name_and_value() {
    let mut doc = minimal();
    doc["workflows"][0]["steps"][0]["parameters"] = json!([{"in": "query"}]);
    let diagnostics = validate(doc);
    assert!(has_message(&diagnostics, "Missing required field: name"));
    assert!(has_message(&diagnostics, "Missing required field: value"));
}

#[test]
fn test_parameter_location_is_checked() {
    let mut doc = minimal();
    doc["workflows"][0]["steps"][0]["parameters"] =
        json!([{"name": "p", "in": "belly", "value": 1}]);
    let diagnostics = validate(doc);
    assert!(has_message(&diagnostics, "path, query, header, cookie"));
}

#[test]
fn test_reusable_parameter_reference_resolves() {
    let mut doc = minimal();
    doc["components"] = json!({
        "parameters": {"pageSize": {"name": "pageSize", "in": "query", "value": 10}}
    });
    doc["workflows"][0]["steps"][0]["parameters"] =
        json!([{"reference": "$components.parameters.pageSize"}]);
    assert!(validate(doc).is_empty());

    let mut doc = minimal();
    doc["workflows"][0]["steps"][0]["parameters"] =
        json!([{"reference": "$components.parameters.ghost"}]);
    assert!(has_message(&validate(doc), "not defined in `components.parameters`"));
}

// ============================================================================
// Validator plumbing
// ============================================================================

#[test]
fn test_validator_runs_all_rules() {
    let validator = Validator::new();
    let rules: Vec<_> = validator.rules().collect();
    assert!(rules.len() >= 4);
    assert!(rules.iter().any(|(id, _)| *id == "document-root"));
    assert!(rules.iter().any(|(id, _)| *id == "workflow-structure"));
    assert!(rules.iter().any(|(id, _)| *id == "step-structure"));
    assert!(rules.iter().any(|(id, _)| *id == "action-rules"));
}

#[test]
fn test_validation_does_not_short_circuit() {
    let diagnostics = validate(json!({
        "workflows": [
            {"steps": [{"stepId": "a"}]},
            {"workflowId": "w2", "steps": []}
        ]
    }));
    // Problems from the root, the first workflow and the second workflow
    // are all present in one pass.
    assert!(has_message(&diagnostics, "Missing required field: arazzo"));
    assert!(has_message(&diagnostics, "Missing required field: workflowId"));
    assert!(has_message(&diagnostics, "at least one step"));
    assert!(has_message(&diagnostics, "exactly one of"));
}
