//! Transition graphs.
//!
//! A [`TransitionGraph`] is the static control-flow view of one workflow:
//! each step is a node with one default "continue" transition, zero or more
//! success transitions and zero or more failure transitions. Terminal states
//! are the synthetic `output` node (normal completion) and the `errorSink`
//! node (explicit failure termination). The graph captures all declared
//! alternatives; criterion evaluation is out of scope.

pub mod builder;
pub mod ir;


pub use builder::build_graph;
pub use ir::{to_ir, GraphIr};

use serde::Serialize;

use crate::diagnostics::Diagnostic;
use crate::document::Range;

/// Kind of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    /// Synthetic entry node
    Input,
    Step,
    /// Normal completion
    Output,
    /// Explicit failure termination
    ErrorSink,
    /// Placeholder for a cross-workflow transition target
    Workflow,
}

/// Kind of a graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeKind {
    Sequential,
    Success,
    Failure,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    /// Source range of the step this node came from; synthetic nodes have none
    pub range: Option<Range>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
    pub label: Option<String>,
}

/// The derived control-flow graph of one workflow.
///
/// Node order is creation order: `input`, steps in declared order,
/// cross-workflow placeholders in first-use order, then `output` and
/// `errorSink` when used. Edge order follows the derivation steps. Both are
/// deterministic so IR emission is idempotent.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionGraph {
    pub workflow_id: Option<String>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl TransitionGraph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edges_from<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        let id = id.to_string();
        self.edges.iter().filter(move |e| e.from == id)
    }
}

/// Result of deriving a graph: the graph plus any reference errors and
/// structural warnings found on the way.
#[derive(Debug, Clone)]
pub struct GraphBuild {
    pub graph: TransitionGraph,
    pub diagnostics: Vec<Diagnostic>,
}
