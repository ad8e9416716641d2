//! Typed document model.
//!
//! The builder (see [`builder`]) normalizes the loosely-typed document tree
//! into the entities below. Entities keep the source range they came from
//! and an `is_valid` flag: a shape the builder could not interpret is still
//! emitted - with partial fields and `is_valid = false` - so later stages
//! can keep going and still point at a source location. Nothing is dropped
//! silently.
//!
//! The model is an immutable snapshot. It is rebuilt from scratch on every
//! document change; consumers never mutate it in place.

pub mod builder;


use serde::Serialize;

use crate::document::{Range, Ranged, ScalarValue};

/// The whole Arazzo description document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentModel {
    /// The `arazzo` version string at the root
    pub arazzo: Option<Ranged<String>>,
    pub info: Option<Info>,
    pub source_descriptions: Vec<SourceDescription>,
    pub workflows: Vec<Workflow>,
    pub components: Option<Components>,
    pub range: Range,
}

impl DocumentModel {
    /// Find a workflow by its `workflowId`.
    pub fn workflow(&self, id: &str) -> Option<&Workflow> {
        self.workflows.iter().find(|w| w.id() == Some(id))
    }

    pub fn has_workflow(&self, id: &str) -> bool {
        self.workflow(id).is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Info {
    pub title: Option<Ranged<String>>,
    pub version: Option<Ranged<String>>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub range: Range,
    pub is_valid: bool,
}

/// Reference to an external API description that steps resolve against.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceDescription {
    pub name: Option<Ranged<String>>,
    pub url: Option<Ranged<String>>,
    /// Raw `type` value; the validator checks it against `openapi|arazzo`
    pub source_type: Option<Ranged<String>>,
    pub range: Range,
    pub is_valid: bool,
}

/// A named, ordered sequence of steps plus declared inputs/outputs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Workflow {
    pub workflow_id: Option<Ranged<String>>,
    pub summary: Option<String>,
    pub description: Option<String>,
    /// Opaque inputs schema; only its top-level `properties` keys are read
    pub inputs: Option<Ranged<serde_json::Value>>,
    pub depends_on: Vec<Ranged<String>>,
    /// Declaration order is significant: default sequential flow follows it
    pub steps: Vec<Step>,
    pub parameters: Vec<Parameter>,
    /// Workflow-level default actions; validated but not graph edges
    pub success_actions: Vec<Action>,
    pub failure_actions: Vec<Action>,
    pub outputs: Vec<Output>,
    pub range: Range,
    pub is_valid: bool,
}

impl Workflow {
    pub fn id(&self) -> Option<&str> {
        self.workflow_id.as_ref().map(|id| id.node.as_str())
    }

    /// Find a step by its `stepId`.
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id() == Some(id))
    }

    /// Top-level `properties` keys of the inputs schema, if declared.
    pub fn declared_input_names(&self) -> Vec<&str> {
        self.inputs
            .as_ref()
            .and_then(|i| i.node.get("properties"))
            .and_then(|p| p.as_object())
            .map(|o| o.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// One operation invocation (or sub-workflow invocation) within a workflow.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Step {
    pub step_id: Option<Ranged<String>>,
    pub description: Option<String>,
    pub operation_id: Option<Ranged<String>>,
    pub operation_path: Option<Ranged<String>>,
    /// Sub-workflow invocation target
    pub workflow_id: Option<Ranged<String>>,
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBody>,
    pub success_criteria: Vec<Criterion>,
    pub on_success: Vec<Action>,
    pub on_failure: Vec<Action>,
    pub outputs: Vec<Output>,
    pub range: Range,
    pub is_valid: bool,
}

impl Step {
    pub fn id(&self) -> Option<&str> {
        self.step_id.as_ref().map(|id| id.node.as_str())
    }

    /// How many of the mutually-exclusive operation references are set.
    pub fn operation_ref_count(&self) -> usize {
        [
            self.operation_id.is_some(),
            self.operation_path.is_some(),
            self.workflow_id.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }

    pub fn declares_output(&self, name: &str) -> bool {
        self.outputs.iter().any(|o| o.name.node == name)
    }
}

/// A step or workflow parameter, either literal (`name` + `value`) or a
/// reusable reference into `components.parameters`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Parameter {
    pub name: Option<Ranged<String>>,
    /// The `in` field: query, header, path, cookie
    pub location: Option<Ranged<String>>,
    pub value: Option<Ranged<ScalarValue>>,
    /// `$components.parameters.<name>` reference for the reusable form
    pub reference: Option<Ranged<String>>,
    pub range: Range,
    pub is_valid: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestBody {
    pub content_type: Option<Ranged<String>>,
    /// Opaque payload; the core never interprets it
    pub payload: Option<Ranged<serde_json::Value>>,
    pub range: Range,
    pub is_valid: bool,
}

/// Condition deciding whether a step succeeded or an action fires.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Criterion {
    pub condition: Option<Ranged<String>>,
    /// Expression naming the value the condition is applied to
    pub context: Option<Ranged<String>>,
    pub criterion_type: Option<Ranged<CriterionType>>,
    /// Version string from the `{type, version}` object form
    pub type_version: Option<String>,
    pub range: Range,
    pub is_valid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CriterionType {
    Simple,
    Regex,
    JsonPath,
    XPath,
    Unknown(String),
}

impl CriterionType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "simple" => CriterionType::Simple,
            "regex" => CriterionType::Regex,
            "jsonpath" => CriterionType::JsonPath,
            "xpath" => CriterionType::XPath,
            other => CriterionType::Unknown(other.to_string()),
        }
    }

    /// Types whose condition is applied to an explicit `context` value.
    pub fn requires_context(&self) -> bool {
        matches!(
            self,
            CriterionType::Regex | CriterionType::JsonPath | CriterionType::XPath
        )
    }
}

/// A declared transition taken after a step's outcome is determined.
///
/// The `type` discriminator is parsed exactly once, here; downstream stages
/// match on [`ActionKind`] instead of re-reading strings. The raw target and
/// retry fields are retained so the validator can point at the offending
/// scalar when the combination is wrong.
#[derive(Debug, Clone, Serialize)]
pub struct Action {
    pub name: Option<Ranged<String>>,
    pub kind: ActionKind,
    pub step_id: Option<Ranged<String>>,
    pub workflow_id: Option<Ranged<String>>,
    pub retry_after: Option<Ranged<ScalarValue>>,
    pub retry_limit: Option<Ranged<ScalarValue>>,
    pub criteria: Vec<Criterion>,
    pub outputs: Vec<Output>,
    pub range: Range,
    pub is_valid: bool,
}

impl Default for Action {
    fn default() -> Self {
        Self {
            name: None,
            kind: ActionKind::Unknown(None),
            step_id: None,
            workflow_id: None,
            retry_after: None,
            retry_limit: None,
            criteria: Vec::new(),
            outputs: Vec::new(),
            range: Range::default(),
            is_valid: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    End,
    Goto,
    Retry,
    /// Missing or unrecognized `type`; the raw value is kept for diagnostics
    Unknown(Option<String>),
}

/// The target view of an action's `stepId`/`workflowId` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTarget<'a> {
    Step(&'a Ranged<String>),
    Workflow(&'a Ranged<String>),
    /// Both set - mutually exclusive, the validator reports it
    Both,
    None,
}

impl Action {
    pub fn target(&self) -> ActionTarget<'_> {
        match (&self.step_id, &self.workflow_id) {
            (Some(step), None) => ActionTarget::Step(step),
            (None, Some(wf)) => ActionTarget::Workflow(wf),
            (Some(_), Some(_)) => ActionTarget::Both,
            (None, None) => ActionTarget::None,
        }
    }

    /// `retryLimit` with the documented default of 1 when absent.
    pub fn effective_retry_limit(&self) -> i64 {
        self.retry_limit
            .as_ref()
            .and_then(|l| l.node.as_int())
            .unwrap_or(1)
    }
}

/// One `name: expression` binding in an `outputs` map.
#[derive(Debug, Clone, Serialize)]
pub struct Output {
    pub name: Ranged<String>,
    /// Scalar value; `None` when the document had a non-scalar there
    pub value: Option<Ranged<ScalarValue>>,
    pub range: Range,
    pub is_valid: bool,
}

/// Reusable objects under the document's `components` key.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Components {
    /// Names of reusable input schemas; the schemas themselves are opaque
    pub inputs: Vec<Ranged<String>>,
    pub parameters: Vec<(Ranged<String>, Parameter)>,
    pub success_actions: Vec<(Ranged<String>, Action)>,
    pub failure_actions: Vec<(Ranged<String>, Action)>,
    pub range: Range,
    pub is_valid: bool,
}

impl Components {
    /// Membership check used by `$components.<category>.<name>` resolution.
    pub fn contains(&self, category: &str, name: &str) -> bool {
        match category {
            "inputs" => self.inputs.iter().any(|n| n.node == name),
            "parameters" => self.parameters.iter().any(|(n, _)| n.node == name),
            "successActions" => self.success_actions.iter().any(|(n, _)| n.node == name),
            "failureActions" => self.failure_actions.iter().any(|(n, _)| n.node == name),
            _ => false,
        }
    }
}

/// Kind tag for stub entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Document,
    Info,
    SourceDescription,
    Workflow,
    Step,
    Parameter,
    RequestBody,
    Criterion,
    Action,
    Output,
    Components,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::Document => "document",
            EntityKind::Info => "info",
            EntityKind::SourceDescription => "source description",
            EntityKind::Workflow => "workflow",
            EntityKind::Step => "step",
            EntityKind::Parameter => "parameter",
            EntityKind::RequestBody => "request body",
            EntityKind::Criterion => "criterion",
            EntityKind::Action => "action",
            EntityKind::Output => "output",
            EntityKind::Components => "components",
        };
        f.write_str(name)
    }
}

/// Record of an entity the builder could not fully interpret.
///
/// The entity itself still appears in the model with `is_valid = false`;
/// the stub carries the human-readable reason and the original range.
#[derive(Debug, Clone, Serialize)]
pub struct EntityStub {
    pub kind: EntityKind,
    pub range: Range,
    pub message: String,
}

/// Result of a model build: the typed model plus the stub records.
#[derive(Debug, Clone)]
pub struct ModelBuild {
    pub model: DocumentModel,
    pub stubs: Vec<EntityStub>,
}
