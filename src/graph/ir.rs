//! Neutral graph IR for external diagram renderers.
//!
//! The core never emits diagram markup; it hands renderers this plain
//! node/edge structure instead. Emission is a pure projection of the graph
//! in creation order, so an unchanged graph serializes byte-for-byte
//! identically.

use serde::Serialize;

use super::{EdgeKind, NodeKind, TransitionGraph};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphIr {
    pub nodes: Vec<IrNode>,
    pub edges: Vec<IrEdge>,
}

/// Serialize a transition graph into the neutral IR.
pub fn to_ir(graph: &TransitionGraph) -> GraphIr {
    GraphIr {
        nodes: graph
            .nodes
            .iter()
            .map(|n| IrNode {
                id: n.id.clone(),
                kind: n.kind,
                label: n.label.clone(),
            })
            .collect(),
        edges: graph
            .edges
            .iter()
            .map(|e| IrEdge {
                from: e.from.clone(),
                to: e.to.clone(),
                kind: e.kind,
                label: e.label.clone(),
            })
            .collect(),
    }
}
