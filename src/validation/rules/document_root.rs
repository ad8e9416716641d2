//! Rule: Document Root
//!
//! The root mapping requires `arazzo`, `info` (with `title` and `version`),
//! at least one source description and at least one workflow. Source
//! descriptions need a unique `name`, a `url`, and a recognized `type`.

use std::collections::HashSet;

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::model::DocumentModel;
use crate::validation::ValidationRule;

pub struct DocumentRootRule;

impl ValidationRule for DocumentRootRule {
    fn id(&self) -> &'static str {
        "document-root"
    }

    fn description(&self) -> &'static str {
        "Root fields, info and source descriptions are present and well-formed"
    }

    fn validate(&self, model: &DocumentModel) -> Vec<Diagnostic> {
        let mut out = Vec::new();

        if model.arazzo.is_none() {
            out.push(Diagnostic::error(
                DiagnosticCode::StructuralError,
                model.range,
                "Missing required field: arazzo",
            ));
        }

        match &model.info {
            None => out.push(Diagnostic::error(
                DiagnosticCode::StructuralError,
                model.range,
                "Missing required field: info",
            )),
            Some(info) if info.is_valid => {
                if info.title.is_none() {
                    out.push(Diagnostic::error(
                        DiagnosticCode::StructuralError,
                        info.range,
                        "Missing required field: title",
                    ));
                }
                if info.version.is_none() {
                    out.push(Diagnostic::error(
                        DiagnosticCode::StructuralError,
                        info.range,
                        "Missing required field: version",
                    ));
                }
            }
            Some(_) => {} // stub, reported from the build record
        }

        if model.source_descriptions.is_empty() {
            out.push(Diagnostic::error(
                DiagnosticCode::StructuralError,
                model.range,
                "`sourceDescriptions` must contain at least one source description",
            ));
        }

        let mut seen_names = HashSet::new();
        for source in &model.source_descriptions {
            if !source.is_valid {
                continue;
            }
            match &source.name {
                None => out.push(Diagnostic::error(
                    DiagnosticCode::StructuralError,
                    source.range,
                    "Missing required field: name",
                )),
                Some(name) => {
                    if !seen_names.insert(name.node.clone()) {
                        out.push(Diagnostic::error(
                            DiagnosticCode::StructuralError,
                            name.range,
                            format!("Duplicate source description name: `{}`", name.node),
                        ));
                    }
                }
            }
            if source.url.is_none() {
                out.push(Diagnostic::error(
                    DiagnosticCode::StructuralError,
                    source.range,
                    "Missing required field: url",
                ));
            }
            if let Some(source_type) = &source.source_type {
                if source_type.node != "openapi" && source_type.node != "arazzo" {
                    out.push(Diagnostic::error(
                        DiagnosticCode::StructuralError,
                        source_type.range,
                        format!(
                            "Source description type must be `openapi` or `arazzo`, found `{}`",
                            source_type.node
                        ),
                    ));
                }
            }
        }

        if model.workflows.is_empty() {
            out.push(Diagnostic::error(
                DiagnosticCode::StructuralError,
                model.range,
                "`workflows` must contain at least one workflow",
            ));
        }

        out
    }
}
