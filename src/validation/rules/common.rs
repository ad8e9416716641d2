//! Checks shared by several rules: expression-valued fields, output maps,
//! parameters and criteria appear at the step, workflow and components
//! levels alike.

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::document::{Range, Ranged, ScalarValue};
use crate::expression::{self, ResolutionContext};
use crate::model::{Criterion, CriterionType, Output, Parameter};

/// Resolve one expression string, collecting its diagnostics.
pub fn check_expression(
    raw: &str,
    range: Range,
    ctx: &ResolutionContext,
    out: &mut Vec<Diagnostic>,
) {
    out.extend(expression::resolve(raw, range, ctx).diagnostics);
}

/// Check a scalar that is "expression or constant": only values starting
/// with `$` go through the resolver.
pub fn check_value(value: &Ranged<ScalarValue>, ctx: &ResolutionContext, out: &mut Vec<Diagnostic>) {
    if let Some(s) = value.node.as_str() {
        if s.starts_with('$') {
            check_expression(s, value.range, ctx, out);
        }
    }
}

/// Check every binding of an `outputs` map.
pub fn check_outputs(outputs: &[Output], ctx: &ResolutionContext, out: &mut Vec<Diagnostic>) {
    for output in outputs {
        if let Some(value) = &output.value {
            check_value(value, ctx, out);
        }
    }
}

/// Check one parameter, in either literal or reusable-reference form.
pub fn check_parameter(param: &Parameter, ctx: &ResolutionContext, out: &mut Vec<Diagnostic>) {
    if !param.is_valid {
        return;
    }

    if let Some(reference) = &param.reference {
        // Reusable form: the reference must resolve into components.
        check_expression(&reference.node, reference.range, ctx, out);
        return;
    }

    if param.name.is_none() {
        out.push(Diagnostic::error(
            DiagnosticCode::StructuralError,
            param.range,
            "Missing required field: name",
        ));
    }
    if param.value.is_none() {
        out.push(Diagnostic::error(
            DiagnosticCode::StructuralError,
            param.range,
            "Missing required field: value",
        ));
    } else if let Some(value) = &param.value {
        check_value(value, ctx, out);
    }

    if let Some(location) = &param.location {
        const LOCATIONS: [&str; 4] = ["path", "query", "header", "cookie"];
        if !LOCATIONS.contains(&location.node.as_str()) {
            out.push(Diagnostic::error(
                DiagnosticCode::StructuralError,
                location.range,
                format!(
                    "Parameter `in` must be one of path, query, header, cookie; found `{}`",
                    location.node
                ),
            ));
        }
    }
}

/// Check one criterion: required condition, context rules per type, and any
/// embedded expressions.
pub fn check_criterion(criterion: &Criterion, ctx: &ResolutionContext, out: &mut Vec<Diagnostic>) {
    if !criterion.is_valid {
        return;
    }

    match &criterion.condition {
        None => out.push(Diagnostic::error(
            DiagnosticCode::StructuralError,
            criterion.range,
            "Missing required field: condition",
        )),
        Some(condition) => {
            // Simple conditions (the default) embed expressions directly;
            // other types apply the condition to the `context` value.
            let simple = criterion
                .criterion_type
                .as_ref()
                .map(|t| t.node == CriterionType::Simple)
                .unwrap_or(true);
            if simple {
                for (token, _) in expression::extract(&condition.node) {
                    check_expression(&token, condition.range, ctx, out);
                }
            }
        }
    }

    if let Some(criterion_type) = &criterion.criterion_type {
        if let CriterionType::Unknown(raw) = &criterion_type.node {
            out.push(Diagnostic::error(
                DiagnosticCode::StructuralError,
                criterion_type.range,
                format!(
                    "Unknown criterion type `{raw}`; expected simple, regex, jsonpath or xpath"
                ),
            ));
        } else if criterion_type.node.requires_context() && criterion.context.is_none() {
            out.push(Diagnostic::error(
                DiagnosticCode::StructuralError,
                criterion.range,
                "Criteria of type regex, jsonpath or xpath require `context`",
            ));
        }
    }

    if let Some(context) = &criterion.context {
        check_expression(&context.node, context.range, ctx, out);
    }
}
