//! Symbol tree projection.
//!
//! Projects the model into a navigable outline for the hosting editor. No
//! validation happens here: a document full of errors still gets a (partial)
//! tree, using the ranges stub entities preserved.

use serde::Serialize;

use crate::document::Range;
use crate::model::{DocumentModel, Step, Workflow};

/// Kind of an outline symbol, named after what the entity is rather than any
/// particular editor protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SymbolKind {
    SourceDescription,
    Workflow,
    Step,
    Output,
    Components,
}

#[derive(Debug, Clone, Serialize)]
pub struct SymbolNode {
    pub name: String,
    /// Secondary text shown next to the name (operation reference, url, ...)
    pub detail: Option<String>,
    pub kind: SymbolKind,
    pub range: Range,
    pub children: Vec<SymbolNode>,
}

/// Build the symbol tree for a document model.
pub fn build_symbols(model: &DocumentModel) -> Vec<SymbolNode> {
    let mut symbols = Vec::new();

    for source in &model.source_descriptions {
        symbols.push(SymbolNode {
            name: source
                .name
                .as_ref()
                .map(|n| n.node.clone())
                .unwrap_or_else(|| "<source>".to_string()),
            detail: source.url.as_ref().map(|u| u.node.clone()),
            kind: SymbolKind::SourceDescription,
            range: source.range,
            children: Vec::new(),
        });
    }

    for workflow in &model.workflows {
        symbols.push(workflow_symbol(workflow));
    }

    if let Some(components) = &model.components {
        let count = components.inputs.len()
            + components.parameters.len()
            + components.success_actions.len()
            + components.failure_actions.len();
        symbols.push(SymbolNode {
            name: "components".to_string(),
            detail: Some(format!("{count} reusable objects")),
            kind: SymbolKind::Components,
            range: components.range,
            children: Vec::new(),
        });
    }

    symbols
}

fn workflow_symbol(workflow: &Workflow) -> SymbolNode {
    let mut children: Vec<SymbolNode> = workflow.steps.iter().map(step_symbol).collect();

    for output in &workflow.outputs {
        children.push(SymbolNode {
            name: output.name.node.clone(),
            detail: output
                .value
                .as_ref()
                .and_then(|v| v.node.as_str().map(str::to_string)),
            kind: SymbolKind::Output,
            range: output.range,
            children: Vec::new(),
        });
    }

    SymbolNode {
        name: workflow
            .id()
            .map(str::to_string)
            .unwrap_or_else(|| "<workflow>".to_string()),
        detail: workflow.summary.clone(),
        kind: SymbolKind::Workflow,
        range: workflow.range,
        children,
    }
}

fn step_symbol(step: &Step) -> SymbolNode {
    let detail = step
        .operation_id
        .as_ref()
        .map(|op| op.node.clone())
        .or_else(|| step.operation_path.as_ref().map(|op| op.node.clone()))
        .or_else(|| step.workflow_id.as_ref().map(|wf| format!("workflow {}", wf.node)));

    SymbolNode {
        name: step
            .id()
            .map(str::to_string)
            .unwrap_or_else(|| "<step>".to_string()),
        detail,
        kind: SymbolKind::Step,
        range: step.range,
        children: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::from_json;
    use crate::model::builder;
    use serde_json::json;

    fn symbols_for(doc: serde_json::Value) -> Vec<SymbolNode> {
        let build = builder::build(&from_json(&doc));
        build_symbols(&build.model)
    }

    #[test]
    fn test_workflow_with_steps_and_outputs() {
        let symbols = symbols_for(json!({
            "sourceDescriptions": [{"name": "petstore", "url": "./petstore.yaml"}],
            "workflows": [{
                "workflowId": "buyPet",
                "steps": [
                    {"stepId": "loginStep", "operationId": "login"},
                    {"stepId": "getPetStep", "operationId": "getPet"}
                ],
                "outputs": {"available": "$steps.getPetStep.outputs.availability"}
            }]
        }));

        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].kind, SymbolKind::SourceDescription);
        assert_eq!(symbols[0].name, "petstore");

        let workflow = &symbols[1];
        assert_eq!(workflow.kind, SymbolKind::Workflow);
        assert_eq!(workflow.name, "buyPet");
        assert_eq!(workflow.children.len(), 3);
        assert_eq!(workflow.children[0].name, "loginStep");
        assert_eq!(workflow.children[0].detail.as_deref(), Some("login"));
        assert_eq!(workflow.children[2].kind, SymbolKind::Output);
        assert_eq!(workflow.children[2].name, "available");
    }

    #[test]
    fn test_broken_entities_still_project() {
        let symbols = symbols_for(json!({
            "workflows": [
                {"steps": [{"description": "no ids anywhere"}]},
                "not a workflow at all"
            ]
        }));

        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].name, "<workflow>");
        assert_eq!(symbols[0].children[0].name, "<step>");
        assert_eq!(symbols[1].name, "<workflow>");
        // The stub still points at its source range
        assert_ne!(symbols[1].range, symbols[0].range);
    }

    #[test]
    fn test_sub_workflow_step_detail() {
        let symbols = symbols_for(json!({
            "workflows": [{
                "workflowId": "outer",
                "steps": [{"stepId": "delegate", "workflowId": "inner"}]
            }]
        }));
        assert_eq!(
            symbols[0].children[0].detail.as_deref(),
            Some("workflow inner")
        );
    }
}
