//! # arazzo-core
//!
//! Semantic core for Arazzo workflow documents: a typed, range-annotated
//! document model, a rule-based structural/referential validator, a runtime-
//! expression resolver, per-workflow transition graphs with a neutral IR for
//! diagram rendering, and a symbol-tree projection for outline views.
//!
//! The crate is host-agnostic. Documents arrive as a [`document::Node`]
//! tree from whatever parser the host uses; everything the core produces
//! (diagnostics, graphs, symbols) is an immutable snapshot the host can
//! publish however it likes. Nothing here performs I/O, and no input -
//! however broken - aborts an analysis: problems become diagnostics and
//! stub entities instead.
//!
//! ```
//! use arazzo_core::{analysis, document, graph};
//!
//! let tree = document::from_json(&serde_json::json!({
//!     "arazzo": "1.0.0",
//!     "info": {"title": "Pet purchase", "version": "1.0.0"},
//!     "sourceDescriptions": [{"name": "petstore", "url": "./petstore.yaml"}],
//!     "workflows": [{
//!         "workflowId": "buyPet",
//!         "steps": [
//!             {"stepId": "loginStep", "operationId": "login"},
//!             {"stepId": "getPetStep", "operationId": "getPet"}
//!         ],
//!         "outputs": {"available": "$steps.getPetStep.outputs.availability"}
//!     }]
//! }));
//!
//! let analysis = analysis::analyze(&tree);
//! assert!(!analysis.has_errors());
//! let ir = graph::to_ir(&analysis.graphs[0]);
//! assert_eq!(ir.nodes.len(), 4);
//! ```

pub mod analysis;
pub mod diagnostics;
pub mod document;
pub mod expression;
pub mod graph;
pub mod model;
pub mod session;
pub mod symbols;
pub mod validation;

pub use analysis::{analyze, Analysis, AnalysisOptions};
pub use diagnostics::{Diagnostic, DiagnosticCode, Severity};
pub use document::{from_json, load_json, Node, Range, Ranged};
pub use model::{DocumentModel, ModelBuild};
pub use session::{DocumentSession, SessionStore};
