//! Rule: Actions
//!
//! Success/failure actions are tagged variants: `end` terminates and takes
//! no target, `goto` and `retry` need exactly one of `stepId`/`workflowId`,
//! and `retry` additionally carries `retryLimit` (integer ≥ 1, defaulting to
//! 1) and `retryAfter` (non-negative seconds). Retrying is a failure-path
//! mechanism; success actions are `end` or `goto`.
//!
//! Target resolution for step-level actions happens in the transition graph
//! builder, which resolves them anyway to decide whether to draw an edge.
//! This rule resolves the targets the graph never looks at: workflow-level
//! default actions. Component-level reusable actions have no workflow scope
//! and keep their targets unresolved.

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::document::Range;
use crate::expression::ResolutionContext;
use crate::model::{Action, ActionKind, ActionTarget, DocumentModel, Workflow};
use crate::validation::ValidationRule;

use super::common;

pub struct ActionRule;

#[derive(Clone, Copy, PartialEq)]
enum Position {
    Success,
    Failure,
}

impl ValidationRule for ActionRule {
    fn id(&self) -> &'static str {
        "action-rules"
    }

    fn description(&self) -> &'static str {
        "Actions have a recognized type, sound targets and retry settings"
    }

    fn validate(&self, model: &DocumentModel) -> Vec<Diagnostic> {
        let mut out = Vec::new();

        for workflow in &model.workflows {
            if !workflow.is_valid {
                continue;
            }

            for step in &workflow.steps {
                if !step.is_valid {
                    continue;
                }
                let ctx = ResolutionContext::in_step(model, workflow, step);
                for action in &step.on_success {
                    // Graph construction resolves these targets.
                    check_action(action, Position::Success, None, model, &ctx, &mut out);
                }
                for action in &step.on_failure {
                    check_action(action, Position::Failure, None, model, &ctx, &mut out);
                }
            }

            let ctx = ResolutionContext::in_workflow(model, workflow);
            for action in &workflow.success_actions {
                check_action(action, Position::Success, Some(workflow), model, &ctx, &mut out);
            }
            for action in &workflow.failure_actions {
                check_action(action, Position::Failure, Some(workflow), model, &ctx, &mut out);
            }
        }

        if let Some(components) = &model.components {
            let ctx = ResolutionContext::new(model);
            for (_, action) in &components.success_actions {
                check_action(action, Position::Success, None, model, &ctx, &mut out);
            }
            for (_, action) in &components.failure_actions {
                check_action(action, Position::Failure, None, model, &ctx, &mut out);
            }
        }

        out
    }
}

fn check_action(
    action: &Action,
    position: Position,
    resolve_in: Option<&Workflow>,
    model: &DocumentModel,
    ctx: &ResolutionContext,
    out: &mut Vec<Diagnostic>,
) {
    if !action.is_valid {
        return;
    }

    match &action.kind {
        ActionKind::Unknown(Some(raw)) => out.push(Diagnostic::error(
            DiagnosticCode::StructuralError,
            action.range,
            format!("Unknown action type `{raw}`; expected end, goto or retry"),
        )),
        ActionKind::Unknown(None) => out.push(Diagnostic::error(
            DiagnosticCode::StructuralError,
            action.range,
            "Missing required field: type",
        )),

        ActionKind::End => {
            if let Some(range) = target_range(action) {
                out.push(Diagnostic::error(
                    DiagnosticCode::StructuralError,
                    range,
                    "`end` actions do not take a target",
                ));
            }
        }

        ActionKind::Goto | ActionKind::Retry => {
            let type_name = if action.kind == ActionKind::Goto {
                "goto"
            } else {
                "retry"
            };
            match action.target() {
                ActionTarget::None => out.push(Diagnostic::error(
                    DiagnosticCode::StructuralError,
                    action.range,
                    format!("`{type_name}` requires exactly one of stepId or workflowId"),
                )),
                ActionTarget::Both => out.push(Diagnostic::error(
                    DiagnosticCode::StructuralError,
                    action.range,
                    "stepId and workflowId are mutually exclusive",
                )),
                ActionTarget::Step(target) => {
                    if let Some(workflow) = resolve_in {
                        if workflow.step(&target.node).is_none() {
                            out.push(Diagnostic::error(
                                DiagnosticCode::ReferenceError,
                                target.range,
                                format!("Unknown step: `{}`", target.node),
                            ));
                        }
                    }
                }
                ActionTarget::Workflow(target) => {
                    if resolve_in.is_some() && !model.has_workflow(&target.node) {
                        out.push(Diagnostic::error(
                            DiagnosticCode::ReferenceError,
                            target.range,
                            format!("Unknown workflow: `{}`", target.node),
                        ));
                    }
                }
            }

            if action.kind == ActionKind::Retry && position == Position::Success {
                out.push(Diagnostic::error(
                    DiagnosticCode::StructuralError,
                    action.range,
                    "`retry` is only allowed in failure actions",
                ));
            }
        }
    }

    if let Some(retry_limit) = &action.retry_limit {
        let sound = retry_limit.node.as_int().is_some_and(|v| v >= 1);
        if !sound {
            out.push(Diagnostic::error(
                DiagnosticCode::StructuralError,
                retry_limit.range,
                "`retryLimit` must be an integer greater than or equal to 1",
            ));
        }
    }
    if let Some(retry_after) = &action.retry_after {
        let sound = retry_after.node.as_number().is_some_and(|v| v >= 0.0);
        if !sound {
            out.push(Diagnostic::error(
                DiagnosticCode::StructuralError,
                retry_after.range,
                "`retryAfter` must be a non-negative number",
            ));
        }
    }

    for criterion in &action.criteria {
        common::check_criterion(criterion, ctx, out);
    }
    common::check_outputs(&action.outputs, ctx, out);
}

/// Range of whichever target field is set, for anchoring "no target allowed"
/// diagnostics.
fn target_range(action: &Action) -> Option<Range> {
    match action.target() {
        ActionTarget::Step(target) | ActionTarget::Workflow(target) => Some(target.range),
        ActionTarget::Both => Some(action.range),
        ActionTarget::None => None,
    }
}
