//! Structural and referential validation.
//!
//! An extensible rule-based system in the same shape on every level: each
//! rule implements [`ValidationRule`], the [`Validator`] owns the registry
//! and runs them all, and the output is a flat list of [`Diagnostic`]s.
//! Rules never short-circuit - every entity is visited exactly once per
//! rule, however broken the rest of the document is.
//!
//! # Adding a new rule
//!
//! 1. Create a new file in `validation/rules/`
//! 2. Implement `ValidationRule` for your struct
//! 3. Add it to the `Validator::new()` constructor
//!
//! # Division of labor
//!
//! Shape problems the model builder could not interpret arrive as stub
//! entities; their diagnostics are emitted by the analysis pipeline from the
//! stub records, so rules skip entities with `is_valid = false`. Dangling
//! `goto`/`retry` targets on *step* actions are reported by the transition
//! graph builder (which must resolve them anyway to decide whether to draw
//! the edge); the rules here resolve everything the graph pass never sees
//! (workflow-level defaults, `dependsOn`, sub-workflow references,
//! component references).

pub mod rules;

#[cfg(test)]
mod tests;

use crate::diagnostics::Diagnostic;
use crate::model::DocumentModel;

/// Trait that all validation rules must implement.
///
/// Rules should be:
/// - **Independent** - no rule depends on another rule's results
/// - **Total** - visit the whole model, collect everything, never bail early
/// - **Clear** - produce actionable messages anchored to a useful range
pub trait ValidationRule: Send + Sync {
    /// Unique identifier for this rule (e.g., "step-structure")
    fn id(&self) -> &'static str;

    /// Human-readable description of what this rule checks
    fn description(&self) -> &'static str;

    /// Run the validation and return any diagnostics found.
    fn validate(&self, model: &DocumentModel) -> Vec<Diagnostic>;
}

/// The main validator that orchestrates all validation rules.
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    /// Create a new validator with all built-in rules.
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(rules::DocumentRootRule),
                Box::new(rules::WorkflowStructureRule),
                Box::new(rules::StepStructureRule),
                Box::new(rules::ActionRule),
            ],
        }
    }

    /// Run all validation rules and collect diagnostics.
    pub fn validate(&self, model: &DocumentModel) -> Vec<Diagnostic> {
        self.rules
            .iter()
            .flat_map(|rule| {
                let found = rule.validate(model);
                tracing::trace!(rule = rule.id(), count = found.len(), "rule finished");
                found
            })
            .collect()
    }

    /// All registered rules, for documentation and tooling.
    pub fn rules(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.rules.iter().map(|r| (r.id(), r.description()))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a document model with the built-in rule set.
pub fn validate_document(model: &DocumentModel) -> Vec<Diagnostic> {
    Validator::new().validate(model)
}
