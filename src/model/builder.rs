//! Document model builder.
//!
//! Walks the generic map/sequence/scalar tree and produces the typed
//! entities of [`super`]. This is a pure transform: it emits no diagnostics
//! and performs no validation beyond shape interpretation. Shapes it cannot
//! interpret become stub entities (`is_valid = false`, range preserved) plus
//! an [`EntityStub`] record, so every downstream stage keeps working on
//! broken documents.

use crate::document::{Node, Ranged, ScalarValue};

use super::{
    Action, ActionKind, Components, Criterion, CriterionType, DocumentModel, EntityKind,
    EntityStub, Info, ModelBuild, Output, Parameter, RequestBody, SourceDescription, Step,
    Workflow,
};

/// Build the typed model from a document tree.
pub fn build(tree: &Node) -> ModelBuild {
    let mut stubs = Vec::new();

    if !tree.is_map() {
        stubs.push(stub(
            EntityKind::Document,
            tree,
            format!(
                "Expected a mapping at the document root, found {}",
                tree.kind_name()
            ),
        ));
        let model = DocumentModel {
            range: tree.range(),
            ..Default::default()
        };
        return ModelBuild { model, stubs };
    }

    let model = DocumentModel {
        arazzo: str_field(tree, "arazzo", EntityKind::Document, &mut stubs),
        info: tree.get("info").map(|n| build_info(n, &mut stubs)),
        source_descriptions: build_source_descriptions(tree, &mut stubs),
        workflows: build_workflows(tree, &mut stubs),
        components: tree.get("components").map(|n| build_components(n, &mut stubs)),
        range: tree.range(),
    };

    ModelBuild { model, stubs }
}

fn build_info(node: &Node, stubs: &mut Vec<EntityStub>) -> Info {
    if !node.is_map() {
        stubs.push(wrong_kind(EntityKind::Info, node));
        return Info {
            range: node.range(),
            ..Default::default()
        };
    }
    Info {
        title: str_field(node, "title", EntityKind::Info, stubs),
        version: str_field(node, "version", EntityKind::Info, stubs),
        summary: text_field(node, "summary"),
        description: text_field(node, "description"),
        range: node.range(),
        is_valid: true,
    }
}

fn build_source_descriptions(tree: &Node, stubs: &mut Vec<EntityStub>) -> Vec<SourceDescription> {
    let Some(node) = tree.get("sourceDescriptions") else {
        return Vec::new();
    };
    if !node.is_seq() {
        stubs.push(stub(
            EntityKind::SourceDescription,
            node,
            format!(
                "Expected a sequence for `sourceDescriptions`, found {}",
                node.kind_name()
            ),
        ));
        return Vec::new();
    }
    node.items()
        .iter()
        .map(|item| {
            if !item.is_map() {
                stubs.push(wrong_kind(EntityKind::SourceDescription, item));
                return SourceDescription {
                    range: item.range(),
                    ..Default::default()
                };
            }
            SourceDescription {
                name: str_field(item, "name", EntityKind::SourceDescription, stubs),
                url: str_field(item, "url", EntityKind::SourceDescription, stubs),
                source_type: str_field(item, "type", EntityKind::SourceDescription, stubs),
                range: item.range(),
                is_valid: true,
            }
        })
        .collect()
}

fn build_workflows(tree: &Node, stubs: &mut Vec<EntityStub>) -> Vec<Workflow> {
    let Some(node) = tree.get("workflows") else {
        return Vec::new();
    };
    if !node.is_seq() {
        stubs.push(stub(
            EntityKind::Workflow,
            node,
            format!("Expected a sequence for `workflows`, found {}", node.kind_name()),
        ));
        return Vec::new();
    }
    node.items()
        .iter()
        .map(|item| build_workflow(item, stubs))
        .collect()
}

fn build_workflow(node: &Node, stubs: &mut Vec<EntityStub>) -> Workflow {
    if !node.is_map() {
        stubs.push(wrong_kind(EntityKind::Workflow, node));
        return Workflow {
            range: node.range(),
            ..Default::default()
        };
    }

    let inputs = match node.get("inputs") {
        None => None,
        Some(inputs) if inputs.is_map() => {
            Some(Ranged::new(inputs.to_json(), inputs.range()))
        }
        Some(other) => {
            stubs.push(stub(
                EntityKind::Workflow,
                other,
                format!("Expected a mapping for `inputs`, found {}", other.kind_name()),
            ));
            None
        }
    };

    Workflow {
        workflow_id: str_field(node, "workflowId", EntityKind::Workflow, stubs),
        summary: text_field(node, "summary"),
        description: text_field(node, "description"),
        inputs,
        depends_on: build_depends_on(node, stubs),
        steps: build_steps(node, stubs),
        parameters: build_parameter_seq(node.get("parameters"), stubs),
        success_actions: build_action_seq(node.get("successActions"), stubs),
        failure_actions: build_action_seq(node.get("failureActions"), stubs),
        outputs: build_outputs(node.get("outputs"), stubs),
        range: node.range(),
        is_valid: true,
    }
}

fn build_depends_on(node: &Node, stubs: &mut Vec<EntityStub>) -> Vec<Ranged<String>> {
    let Some(list) = node.get("dependsOn") else {
        return Vec::new();
    };
    if !list.is_seq() {
        stubs.push(stub(
            EntityKind::Workflow,
            list,
            format!("Expected a sequence for `dependsOn`, found {}", list.kind_name()),
        ));
        return Vec::new();
    }
    list.items()
        .iter()
        .filter_map(|item| match item.as_str() {
            Some(s) => Some(Ranged::new(s.to_string(), item.range())),
            None => {
                stubs.push(stub(
                    EntityKind::Workflow,
                    item,
                    format!("Expected a string in `dependsOn`, found {}", item.kind_name()),
                ));
                None
            }
        })
        .collect()
}

fn build_steps(node: &Node, stubs: &mut Vec<EntityStub>) -> Vec<Step> {
    let Some(list) = node.get("steps") else {
        return Vec::new();
    };
    if !list.is_seq() {
        stubs.push(stub(
            EntityKind::Step,
            list,
            format!("Expected a sequence for `steps`, found {}", list.kind_name()),
        ));
        return Vec::new();
    }
    list.items()
        .iter()
        .map(|item| build_step(item, stubs))
        .collect()
}

fn build_step(node: &Node, stubs: &mut Vec<EntityStub>) -> Step {
    if !node.is_map() {
        stubs.push(wrong_kind(EntityKind::Step, node));
        return Step {
            range: node.range(),
            ..Default::default()
        };
    }

    Step {
        step_id: str_field(node, "stepId", EntityKind::Step, stubs),
        description: text_field(node, "description"),
        operation_id: str_field(node, "operationId", EntityKind::Step, stubs),
        operation_path: str_field(node, "operationPath", EntityKind::Step, stubs),
        workflow_id: str_field(node, "workflowId", EntityKind::Step, stubs),
        parameters: build_parameter_seq(node.get("parameters"), stubs),
        request_body: node.get("requestBody").map(|n| build_request_body(n, stubs)),
        success_criteria: build_criterion_seq(node.get("successCriteria"), stubs),
        on_success: build_action_seq(node.get("onSuccess"), stubs),
        on_failure: build_action_seq(node.get("onFailure"), stubs),
        outputs: build_outputs(node.get("outputs"), stubs),
        range: node.range(),
        is_valid: true,
    }
}

fn build_parameter_seq(node: Option<&Node>, stubs: &mut Vec<EntityStub>) -> Vec<Parameter> {
    let Some(list) = node else {
        return Vec::new();
    };
    if !list.is_seq() {
        stubs.push(stub(
            EntityKind::Parameter,
            list,
            format!("Expected a sequence for `parameters`, found {}", list.kind_name()),
        ));
        return Vec::new();
    }
    list.items()
        .iter()
        .map(|item| build_parameter(item, stubs))
        .collect()
}

fn build_parameter(node: &Node, stubs: &mut Vec<EntityStub>) -> Parameter {
    if !node.is_map() {
        stubs.push(wrong_kind(EntityKind::Parameter, node));
        return Parameter {
            range: node.range(),
            ..Default::default()
        };
    }
    Parameter {
        name: str_field(node, "name", EntityKind::Parameter, stubs),
        location: str_field(node, "in", EntityKind::Parameter, stubs),
        value: scalar_field(node, "value"),
        reference: str_field(node, "reference", EntityKind::Parameter, stubs),
        range: node.range(),
        is_valid: true,
    }
}

fn build_request_body(node: &Node, stubs: &mut Vec<EntityStub>) -> RequestBody {
    if !node.is_map() {
        stubs.push(wrong_kind(EntityKind::RequestBody, node));
        return RequestBody {
            range: node.range(),
            ..Default::default()
        };
    }
    RequestBody {
        content_type: str_field(node, "contentType", EntityKind::RequestBody, stubs),
        payload: node
            .get("payload")
            .map(|p| Ranged::new(p.to_json(), p.range())),
        range: node.range(),
        is_valid: true,
    }
}

fn build_criterion_seq(node: Option<&Node>, stubs: &mut Vec<EntityStub>) -> Vec<Criterion> {
    let Some(list) = node else {
        return Vec::new();
    };
    if !list.is_seq() {
        stubs.push(stub(
            EntityKind::Criterion,
            list,
            format!("Expected a sequence of criteria, found {}", list.kind_name()),
        ));
        return Vec::new();
    }
    list.items()
        .iter()
        .map(|item| build_criterion(item, stubs))
        .collect()
}

fn build_criterion(node: &Node, stubs: &mut Vec<EntityStub>) -> Criterion {
    if !node.is_map() {
        stubs.push(wrong_kind(EntityKind::Criterion, node));
        return Criterion {
            range: node.range(),
            ..Default::default()
        };
    }

    // `type` comes as either a bare string or a {type, version} mapping
    let (criterion_type, type_version) = match node.get("type") {
        None => (None, None),
        Some(Node::Scalar { value: ScalarValue::Str(s), range }) => (
            Some(Ranged::new(CriterionType::parse(s), *range)),
            None,
        ),
        Some(obj) if obj.is_map() => {
            let parsed = str_field(obj, "type", EntityKind::Criterion, stubs)
                .map(|t| Ranged::new(CriterionType::parse(&t.node), t.range));
            (parsed, text_field(obj, "version"))
        }
        Some(other) => {
            stubs.push(stub(
                EntityKind::Criterion,
                other,
                format!(
                    "Expected a string or mapping for criterion `type`, found {}",
                    other.kind_name()
                ),
            ));
            (None, None)
        }
    };

    Criterion {
        condition: str_field(node, "condition", EntityKind::Criterion, stubs),
        context: str_field(node, "context", EntityKind::Criterion, stubs),
        criterion_type,
        type_version,
        range: node.range(),
        is_valid: true,
    }
}

fn build_action_seq(node: Option<&Node>, stubs: &mut Vec<EntityStub>) -> Vec<Action> {
    let Some(list) = node else {
        return Vec::new();
    };
    if !list.is_seq() {
        stubs.push(stub(
            EntityKind::Action,
            list,
            format!("Expected a sequence of actions, found {}", list.kind_name()),
        ));
        return Vec::new();
    }
    list.items()
        .iter()
        .map(|item| build_action(item, stubs))
        .collect()
}

fn build_action(node: &Node, stubs: &mut Vec<EntityStub>) -> Action {
    if !node.is_map() {
        stubs.push(wrong_kind(EntityKind::Action, node));
        return Action {
            range: node.range(),
            ..Default::default()
        };
    }

    let kind = match node.get("type").and_then(Node::as_str) {
        Some("end") => ActionKind::End,
        Some("goto") => ActionKind::Goto,
        Some("retry") => ActionKind::Retry,
        Some(other) => ActionKind::Unknown(Some(other.to_string())),
        None => ActionKind::Unknown(None),
    };

    Action {
        name: str_field(node, "name", EntityKind::Action, stubs),
        kind,
        step_id: str_field(node, "stepId", EntityKind::Action, stubs),
        workflow_id: str_field(node, "workflowId", EntityKind::Action, stubs),
        retry_after: scalar_field(node, "retryAfter"),
        retry_limit: scalar_field(node, "retryLimit"),
        criteria: build_criterion_seq(node.get("criteria"), stubs),
        outputs: build_outputs(node.get("outputs"), stubs),
        range: node.range(),
        is_valid: true,
    }
}

fn build_outputs(node: Option<&Node>, stubs: &mut Vec<EntityStub>) -> Vec<Output> {
    let Some(map) = node else {
        return Vec::new();
    };
    if !map.is_map() {
        stubs.push(stub(
            EntityKind::Output,
            map,
            format!("Expected a mapping for `outputs`, found {}", map.kind_name()),
        ));
        return Vec::new();
    }
    map.entries()
        .iter()
        .map(|(key, value)| match value.as_scalar() {
            Some(scalar) => Output {
                name: key.clone(),
                value: Some(Ranged::new(scalar.clone(), value.range())),
                range: key.range.merge(&value.range()),
                is_valid: true,
            },
            None => {
                stubs.push(stub(
                    EntityKind::Output,
                    value,
                    format!(
                        "Expected a scalar value for output `{}`, found {}",
                        key.node,
                        value.kind_name()
                    ),
                ));
                Output {
                    name: key.clone(),
                    value: None,
                    range: key.range.merge(&value.range()),
                    is_valid: false,
                }
            }
        })
        .collect()
}

fn build_components(node: &Node, stubs: &mut Vec<EntityStub>) -> Components {
    if !node.is_map() {
        stubs.push(wrong_kind(EntityKind::Components, node));
        return Components {
            range: node.range(),
            ..Default::default()
        };
    }

    let inputs = node
        .get("inputs")
        .map(|inputs| {
            if !inputs.is_map() {
                stubs.push(stub(
                    EntityKind::Components,
                    inputs,
                    format!(
                        "Expected a mapping for `components.inputs`, found {}",
                        inputs.kind_name()
                    ),
                ));
                return Vec::new();
            }
            inputs.entries().iter().map(|(k, _)| k.clone()).collect()
        })
        .unwrap_or_default();

    Components {
        inputs,
        parameters: named_entries(node.get("parameters"), "components.parameters", stubs)
            .into_iter()
            .map(|(name, value)| (name, build_parameter(&value, stubs)))
            .collect(),
        success_actions: named_entries(node.get("successActions"), "components.successActions", stubs)
            .into_iter()
            .map(|(name, value)| (name, build_action(&value, stubs)))
            .collect(),
        failure_actions: named_entries(node.get("failureActions"), "components.failureActions", stubs)
            .into_iter()
            .map(|(name, value)| (name, build_action(&value, stubs)))
            .collect(),
        range: node.range(),
        is_valid: true,
    }
}

fn named_entries(
    node: Option<&Node>,
    what: &str,
    stubs: &mut Vec<EntityStub>,
) -> Vec<(Ranged<String>, Node)> {
    let Some(map) = node else {
        return Vec::new();
    };
    if !map.is_map() {
        stubs.push(stub(
            EntityKind::Components,
            map,
            format!("Expected a mapping for `{what}`, found {}", map.kind_name()),
        ));
        return Vec::new();
    }
    map.entries()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

// ============================================================================
// Field helpers
// ============================================================================

/// Extract a string field, recording a stub when the key holds the wrong
/// node kind. Absent keys are simply `None` - presence rules belong to the
/// validator.
fn str_field(
    node: &Node,
    key: &str,
    kind: EntityKind,
    stubs: &mut Vec<EntityStub>,
) -> Option<Ranged<String>> {
    match node.get(key) {
        None => None,
        Some(Node::Scalar {
            value: ScalarValue::Str(s),
            range,
        }) => Some(Ranged::new(s.clone(), *range)),
        Some(other) => {
            stubs.push(stub(
                kind,
                other,
                format!("Expected a string for `{key}`, found {}", other.kind_name()),
            ));
            None
        }
    }
}

/// Lenient string field for prose (summary, description): non-strings are
/// ignored without a stub.
fn text_field(node: &Node, key: &str) -> Option<String> {
    node.get(key).and_then(Node::as_str).map(str::to_string)
}

/// Any scalar field, kept raw so the validator can check its type itself.
fn scalar_field(node: &Node, key: &str) -> Option<Ranged<ScalarValue>> {
    node.get(key)
        .and_then(|n| n.as_scalar().map(|v| Ranged::new(v.clone(), n.range())))
}

fn stub(kind: EntityKind, node: &Node, message: String) -> EntityStub {
    EntityStub {
        kind,
        range: node.range(),
        message,
    }
}

fn wrong_kind(kind: EntityKind, node: &Node) -> EntityStub {
    EntityStub {
        kind,
        range: node.range(),
        message: format!("Expected a mapping for {kind}, found {}", node.kind_name()),
    }
}
