//! Rule: Workflow Structure
//!
//! Every workflow needs a document-wide unique `workflowId` and a non-empty
//! step list. `dependsOn` entries must name other workflows that exist, and
//! never the workflow itself. Workflow-level outputs and parameters are
//! expression-checked in workflow scope.

use std::collections::HashSet;

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::expression::ResolutionContext;
use crate::model::DocumentModel;
use crate::validation::ValidationRule;

use super::common;

pub struct WorkflowStructureRule;

impl ValidationRule for WorkflowStructureRule {
    fn id(&self) -> &'static str {
        "workflow-structure"
    }

    fn description(&self) -> &'static str {
        "Workflows have unique ids, steps, and sound dependsOn references"
    }

    fn validate(&self, model: &DocumentModel) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        let mut seen_ids = HashSet::new();

        for workflow in &model.workflows {
            if !workflow.is_valid {
                continue;
            }

            match &workflow.workflow_id {
                None => out.push(Diagnostic::error(
                    DiagnosticCode::StructuralError,
                    workflow.range,
                    "Missing required field: workflowId",
                )),
                Some(id) => {
                    if !seen_ids.insert(id.node.clone()) {
                        out.push(Diagnostic::error(
                            DiagnosticCode::StructuralError,
                            id.range,
                            format!("Duplicate workflowId: `{}`", id.node),
                        ));
                    }
                }
            }

            if workflow.steps.is_empty() {
                out.push(Diagnostic::error(
                    DiagnosticCode::StructuralError,
                    workflow.range,
                    "Workflow must declare at least one step",
                ));
            }

            for dep in &workflow.depends_on {
                if workflow.id() == Some(dep.node.as_str()) {
                    out.push(Diagnostic::error(
                        DiagnosticCode::StructuralError,
                        dep.range,
                        "Workflow cannot depend on itself",
                    ));
                } else if !model.has_workflow(&dep.node) {
                    out.push(Diagnostic::error(
                        DiagnosticCode::ReferenceError,
                        dep.range,
                        format!("Unknown workflow in dependsOn: `{}`", dep.node),
                    ));
                }
            }

            let ctx = ResolutionContext::in_workflow(model, workflow);
            common::check_outputs(&workflow.outputs, &ctx, &mut out);
            for param in &workflow.parameters {
                common::check_parameter(param, &ctx, &mut out);
            }
        }

        out
    }
}
