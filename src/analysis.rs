//! One-shot analysis pipeline.
//!
//! Runs every stage over a document tree and returns a single immutable
//! snapshot: the typed model, the combined diagnostics (stub records first,
//! then validation, then graph findings), the per-workflow transition
//! graphs and the symbol tree. Sessions (see [`crate::session`]) wrap this
//! with supersedable rebuilds.

use tracing::debug;

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::document::Node;
use crate::graph::{build_graph, TransitionGraph};
use crate::model::{builder, DocumentModel, EntityStub};
use crate::symbols::{build_symbols, SymbolNode};
use crate::validation::validate_document;

/// Which derived artifacts to produce.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisOptions {
    pub build_graphs: bool,
    pub build_symbols: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            build_graphs: true,
            build_symbols: true,
        }
    }
}

/// Immutable result of analyzing one document revision.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub model: DocumentModel,
    pub stubs: Vec<EntityStub>,
    pub diagnostics: Vec<Diagnostic>,
    /// One graph per workflow, in declaration order
    pub graphs: Vec<TransitionGraph>,
    pub symbols: Vec<SymbolNode>,
}

impl Analysis {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Graph of a specific workflow.
    pub fn graph(&self, workflow_id: &str) -> Option<&TransitionGraph> {
        self.graphs
            .iter()
            .find(|g| g.workflow_id.as_deref() == Some(workflow_id))
    }
}

/// Analyze a document tree with default options.
pub fn analyze(tree: &Node) -> Analysis {
    analyze_with(tree, &AnalysisOptions::default())
}

/// Analyze a document tree.
pub fn analyze_with(tree: &Node, options: &AnalysisOptions) -> Analysis {
    let build = builder::build(tree);
    let model = build.model;
    let stubs = build.stubs;

    // Shapes the builder could not interpret come first; they usually
    // explain the follow-on findings.
    let mut diagnostics: Vec<Diagnostic> = stubs
        .iter()
        .map(|stub| {
            Diagnostic::error(DiagnosticCode::StructuralError, stub.range, stub.message.clone())
        })
        .collect();

    diagnostics.extend(validate_document(&model));

    let graphs = if options.build_graphs {
        model
            .workflows
            .iter()
            .map(|workflow| {
                let built = build_graph(workflow, &model);
                diagnostics.extend(built.diagnostics);
                built.graph
            })
            .collect()
    } else {
        Vec::new()
    };

    let symbols = if options.build_symbols {
        build_symbols(&model)
    } else {
        Vec::new()
    };

    debug!(
        workflows = model.workflows.len(),
        diagnostics = diagnostics.len(),
        stubs = stubs.len(),
        "document analyzed"
    );

    Analysis {
        model,
        stubs,
        diagnostics,
        graphs,
        symbols,
    }
}
