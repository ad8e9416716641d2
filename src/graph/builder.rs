//! Transition graph derivation.
//!
//! Combines the implicit sequential flow (declaration order) with explicit
//! success/failure actions into one directed graph per workflow. Reference
//! failures never abort construction: the offending edge is omitted, a
//! diagnostic is recorded, and everything else still builds.

use std::collections::{HashSet, VecDeque};

use tracing::debug;

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::model::{Action, ActionKind, ActionTarget, DocumentModel, Step, Workflow};

use super::{EdgeKind, GraphBuild, GraphEdge, GraphNode, NodeKind, TransitionGraph};

const INPUT_ID: &str = "input";
const OUTPUT_ID: &str = "output";
const ERROR_SINK_ID: &str = "error";

/// Derive the transition graph for one workflow.
pub fn build_graph(workflow: &Workflow, model: &DocumentModel) -> GraphBuild {
    let mut builder = GraphBuilder::new(workflow, model);
    builder.add_step_nodes();
    builder.add_edges();
    builder.finish()
}

struct GraphBuilder<'a> {
    workflow: &'a Workflow,
    model: &'a DocumentModel,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    diagnostics: Vec<Diagnostic>,
    /// Node id per step index; steps without a usable id get synthetic ones
    step_ids: Vec<String>,
    output_used: bool,
    error_sink_used: bool,
}

impl<'a> GraphBuilder<'a> {
    fn new(workflow: &'a Workflow, model: &'a DocumentModel) -> Self {
        let step_ids = workflow
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| match step.id() {
                Some(id) => id.to_string(),
                None => format!("step@{i}"),
            })
            .collect();

        Self {
            workflow,
            model,
            nodes: vec![GraphNode {
                id: INPUT_ID.to_string(),
                kind: NodeKind::Input,
                label: INPUT_ID.to_string(),
                range: None,
            }],
            edges: Vec::new(),
            diagnostics: Vec::new(),
            step_ids,
            // Declared outputs give the workflow a completion node up front
            output_used: !workflow.outputs.is_empty(),
            error_sink_used: false,
        }
    }

    fn add_step_nodes(&mut self) {
        for (i, step) in self.workflow.steps.iter().enumerate() {
            self.nodes.push(GraphNode {
                id: self.step_ids[i].clone(),
                kind: NodeKind::Step,
                label: self.step_ids[i].clone(),
                range: Some(step.range),
            });
        }
    }

    fn add_edges(&mut self) {
        let step_count = self.workflow.steps.len();
        if step_count > 0 {
            self.edge(INPUT_ID, &self.step_ids[0].clone(), EdgeKind::Sequential, None);
        }

        for i in 0..step_count {
            let from = self.step_ids[i].clone();
            let step = &self.workflow.steps[i];

            // An explicit goto/end on success replaces the default
            // continuation - by presence alone, independent of criteria.
            let suppressed = step
                .on_success
                .iter()
                .any(|a| matches!(a.kind, ActionKind::Goto | ActionKind::End));

            if i + 1 < step_count {
                if suppressed {
                    self.warn_redundant_suppression(step, &self.step_ids[i + 1].clone());
                } else {
                    self.edge(&from, &self.step_ids[i + 1].clone(), EdgeKind::Sequential, None);
                }
            } else if !suppressed {
                self.output_used = true;
                self.edge(&from, OUTPUT_ID, EdgeKind::Sequential, None);
            }
        }

        // Explicit success transitions.
        for i in 0..step_count {
            let from = self.step_ids[i].clone();
            for action in &self.workflow.steps[i].on_success {
                match action.kind {
                    ActionKind::End => {
                        self.output_used = true;
                        self.edge(&from, OUTPUT_ID, EdgeKind::Success, label(action));
                    }
                    ActionKind::Goto => self.action_edge(&from, action, EdgeKind::Success, None),
                    // Retry is failure-only; the validator reports it
                    ActionKind::Retry | ActionKind::Unknown(_) => {}
                }
            }
        }

        // Explicit failure transitions, structurally distinct from success.
        for i in 0..step_count {
            let from = self.step_ids[i].clone();
            for action in &self.workflow.steps[i].on_failure {
                match action.kind {
                    ActionKind::End => {
                        self.error_sink_used = true;
                        self.edge(&from, ERROR_SINK_ID, EdgeKind::Failure, label(action));
                    }
                    ActionKind::Goto => self.action_edge(&from, action, EdgeKind::Failure, None),
                    ActionKind::Retry | ActionKind::Unknown(_) => {}
                }
            }
        }

        // Retry transitions loop back to their target; cycles here are the
        // intended mechanism, not an error.
        for i in 0..step_count {
            let from = self.step_ids[i].clone();
            for action in &self.workflow.steps[i].on_failure {
                if action.kind == ActionKind::Retry {
                    self.action_edge(&from, action, EdgeKind::Failure, Some("retry"));
                }
            }
        }
    }

    /// Add the edge for a goto/retry action, or record why it was omitted.
    fn action_edge(
        &mut self,
        from: &str,
        action: &Action,
        kind: EdgeKind,
        fallback_label: Option<&str>,
    ) {
        let label = label(action).or_else(|| fallback_label.map(str::to_string));
        match action.target() {
            ActionTarget::Step(target) => {
                if self.workflow.step(&target.node).is_some() {
                    self.edge(from, &target.node.clone(), kind, label);
                } else {
                    self.diagnostics.push(Diagnostic::error(
                        DiagnosticCode::ReferenceError,
                        target.range,
                        format!("Unknown step: `{}`", target.node),
                    ));
                }
            }
            ActionTarget::Workflow(target) => {
                if self.model.has_workflow(&target.node) {
                    let id = self.ensure_workflow_node(&target.node);
                    self.edge(from, &id, kind, label);
                } else {
                    self.diagnostics.push(Diagnostic::error(
                        DiagnosticCode::ReferenceError,
                        target.range,
                        format!("Unknown workflow: `{}`", target.node),
                    ));
                }
            }
            // Structurally broken targets are the validator's findings;
            // no edge either way.
            ActionTarget::Both | ActionTarget::None => {}
        }
    }

    /// Placeholder node for a transition into another workflow.
    fn ensure_workflow_node(&mut self, workflow_id: &str) -> String {
        let id = format!("workflow:{workflow_id}");
        if self.nodes.iter().all(|n| n.id != id) {
            self.nodes.push(GraphNode {
                id: id.clone(),
                kind: NodeKind::Workflow,
                label: workflow_id.to_string(),
                range: None,
            });
        }
        id
    }

    /// An unconditional goto to the immediate next step suppresses a default
    /// edge just to redraw it.
    fn warn_redundant_suppression(&mut self, step: &Step, next_id: &str) {
        for action in &step.on_success {
            let unconditional = action.kind == ActionKind::Goto && action.criteria.is_empty();
            if !unconditional {
                continue;
            }
            if let ActionTarget::Step(target) = action.target() {
                if target.node == next_id {
                    self.diagnostics.push(Diagnostic::warning(
                        DiagnosticCode::GraphWarning,
                        action.range,
                        format!(
                            "Explicit goto duplicates the default sequential transition to `{next_id}`"
                        ),
                    ));
                }
            }
        }
    }

    fn edge(&mut self, from: &str, to: &str, kind: EdgeKind, label: Option<String>) {
        self.edges.push(GraphEdge {
            from: from.to_string(),
            to: to.to_string(),
            kind,
            label,
        });
    }

    fn finish(mut self) -> GraphBuild {
        if self.output_used {
            self.nodes.push(GraphNode {
                id: OUTPUT_ID.to_string(),
                kind: NodeKind::Output,
                label: OUTPUT_ID.to_string(),
                range: None,
            });
        }
        if self.error_sink_used {
            self.nodes.push(GraphNode {
                id: ERROR_SINK_ID.to_string(),
                kind: NodeKind::ErrorSink,
                label: ERROR_SINK_ID.to_string(),
                range: None,
            });
        }

        self.check_reachability();

        debug!(
            workflow = self.workflow.id().unwrap_or("<unnamed>"),
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            diagnostics = self.diagnostics.len(),
            "transition graph built"
        );

        GraphBuild {
            graph: TransitionGraph {
                workflow_id: self.workflow.id().map(str::to_string),
                nodes: self.nodes,
                edges: self.edges,
            },
            diagnostics: self.diagnostics,
        }
    }

    /// BFS from `input`; unreached steps stay in the node list but are
    /// flagged. The visited set guards against cycles.
    fn check_reachability(&mut self) {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue = VecDeque::from([INPUT_ID]);

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            for edge in self.edges.iter().filter(|e| e.from == current) {
                if !visited.contains(edge.to.as_str()) {
                    queue.push_back(edge.to.as_str());
                }
            }
        }

        let mut warnings = Vec::new();
        for node in &self.nodes {
            if node.kind == NodeKind::Step && !visited.contains(node.id.as_str()) {
                let range = node.range.unwrap_or_default();
                warnings.push(Diagnostic::warning(
                    DiagnosticCode::GraphWarning,
                    range,
                    format!("Unreachable step: `{}`", node.id),
                ));
            }
        }
        self.diagnostics.extend(warnings);
    }
}

fn label(action: &Action) -> Option<String> {
    action.name.as_ref().map(|n| n.node.clone())
}
