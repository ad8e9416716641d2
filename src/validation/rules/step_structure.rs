//! Rule: Step Structure
//!
//! Steps need a workflow-unique `stepId` and exactly one operation
//! reference (`operationId`, `operationPath` or `workflowId`). "None set"
//! and "more than one set" are distinct mistakes and get distinct messages.
//! Sub-workflow references must name an existing workflow. Parameters,
//! success criteria and outputs are expression-checked in step scope.

use std::collections::HashSet;

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::expression::ResolutionContext;
use crate::model::DocumentModel;
use crate::validation::ValidationRule;

use super::common;

pub struct StepStructureRule;

impl ValidationRule for StepStructureRule {
    fn id(&self) -> &'static str {
        "step-structure"
    }

    fn description(&self) -> &'static str {
        "Steps have unique ids and exactly one operation reference"
    }

    fn validate(&self, model: &DocumentModel) -> Vec<Diagnostic> {
        let mut out = Vec::new();

        for workflow in &model.workflows {
            if !workflow.is_valid {
                continue;
            }
            let mut seen_ids = HashSet::new();

            for step in &workflow.steps {
                if !step.is_valid {
                    continue;
                }

                match &step.step_id {
                    None => out.push(Diagnostic::error(
                        DiagnosticCode::StructuralError,
                        step.range,
                        "Missing required field: stepId",
                    )),
                    Some(id) => {
                        if !seen_ids.insert(id.node.clone()) {
                            out.push(Diagnostic::error(
                                DiagnosticCode::StructuralError,
                                id.range,
                                format!("Duplicate stepId: `{}`", id.node),
                            ));
                        }
                    }
                }

                match step.operation_ref_count() {
                    0 => out.push(Diagnostic::error(
                        DiagnosticCode::StructuralError,
                        step.range,
                        "Step must set exactly one of operationId, operationPath or workflowId",
                    )),
                    1 => {}
                    _ => out.push(Diagnostic::error(
                        DiagnosticCode::StructuralError,
                        step.range,
                        "operationId, operationPath and workflowId are mutually exclusive",
                    )),
                }

                // A sub-workflow invocation must point at a declared workflow.
                if let Some(workflow_id) = &step.workflow_id {
                    if !model.has_workflow(&workflow_id.node) {
                        out.push(Diagnostic::error(
                            DiagnosticCode::ReferenceError,
                            workflow_id.range,
                            format!("Unknown workflow: `{}`", workflow_id.node),
                        ));
                    }
                }

                let ctx = ResolutionContext::in_step(model, workflow, step);
                for param in &step.parameters {
                    common::check_parameter(param, &ctx, &mut out);
                }
                for criterion in &step.success_criteria {
                    common::check_criterion(criterion, &ctx, &mut out);
                }
                common::check_outputs(&step.outputs, &ctx, &mut out);
            }
        }

        out
    }
}
